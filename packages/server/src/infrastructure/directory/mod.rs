//! Directory service clients.

pub mod http;

pub use http::{HttpGameDirectory, HttpIdentityService, HttpRoomDirectory};
