//! Property-based tests

mod cache_proptest;
mod receipt_proptest;
