//! Lobby management and the game server actor

pub mod lobby;
pub mod service;
pub mod timer;

pub use service::{spawn, ServerHandle, ServerStats};
