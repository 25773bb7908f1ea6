//! Presence, hub fan-out and WebSocket session tests

mod ws_session_test;
