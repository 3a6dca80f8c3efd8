//! Match simulation modules

pub mod collision;
pub mod r#match;
pub mod physics;
pub mod snapshot;

pub use r#match::{GameMatch, MatchState, Obstacle, PlayerState};

/// Arena width in world units
pub const ARENA_WIDTH: f32 = 800.0;
/// Arena height in world units
pub const ARENA_HEIGHT: f32 = 400.0;
