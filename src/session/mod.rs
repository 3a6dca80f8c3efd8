//! Live connection tracking

pub mod registry;

pub use registry::{ConnectionId, Session, SessionPhase, SessionRegistry};
