//! Infrastructure layer: concrete implementations of the domain's
//! collaborator traits plus the wire-format DTOs.
//!
//! - `pusher`: WebSocket-backed message pusher (connection registry)
//! - `directory`: HTTP clients for the identity, room and game services
//! - `dto`: WebSocket and HTTP wire formats

pub mod directory;
pub mod dto;
pub mod pusher;
