//! WebSocket transport

pub mod broadcast;
pub mod handler;
pub mod protocol;
