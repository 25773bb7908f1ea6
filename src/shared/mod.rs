//! Shared Module
//!
//! This module contains the types that travel over the wire and are shared
//! between the server internals and its clients: the chat data model,
//! real-time events, shared errors and configuration.
//!
//! # Overview
//!
//! Nothing in here touches a database, a cache or the network. All types are
//! plain data designed for JSON serialization.

/// Chat data model (rooms, messages, receipts, presence)
pub mod chat;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Chat core configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ChatConfig, ChatConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{topics, EventType, RealtimeEvent};
