//! Shared utilities for the Atelier game hub.
//!
//! Holds the pieces both the server and its tooling need: logging setup
//! and time utilities.

pub mod logger;
pub mod time;
