//! Data Transfer Objects (DTOs) for the hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket message envelopes
//! - `http`: HTTP API response DTOs

pub mod http;
pub mod websocket;
