//! Read Receipts Module
//!
//! - **`tracker`** - `ReadReceiptTracker`: the mark-read write chain, unread
//!   counts and "seen by" views
//! - **`handlers`** - REST handlers over the tracker

pub mod tracker;

pub mod handlers;

pub use tracker::ReadReceiptTracker;
