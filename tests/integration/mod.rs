//! Integration tests
//!
//! Services are exercised through `AppState` over in-memory backends; the
//! HTTP surface is driven through the router with `tower::ServiceExt`.

mod api;
mod chat;
mod config_test;
mod realtime;
