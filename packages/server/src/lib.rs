//! Real-time coordination hub for turn-based drawing rooms.
//!
//! Layers:
//! - `domain`: entities, value objects and collaborator traits
//! - `hub`: the RoomHub service and its registries
//! - `infrastructure`: WebSocket pusher, directory HTTP clients, DTOs
//! - `ui`: axum server, WebSocket dispatcher and HTTP endpoints

pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
