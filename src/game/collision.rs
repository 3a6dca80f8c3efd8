//! Player-versus-obstacle collision rules: stun, knockback and score penalty

use uuid::Uuid;

use crate::config::GameConfig;
use crate::ws::protocol::ObstacleKind;

use super::physics::PhysicsSystem;
use super::{Obstacle, PlayerState};

/// What happened when a player ran into an obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionOutcome {
    pub player_id: Uuid,
    pub obstacle_id: u32,
    pub kind: ObstacleKind,
    /// Position after knockback
    pub x: f32,
    pub y: f32,
    /// Score removed by the hit (0 or 1)
    pub penalty: u32,
    pub stunned_until: u64,
}

/// Collision resolution against the match's obstacles
pub struct CollisionSystem;

impl CollisionSystem {
    /// First obstacle, in match order, whose rectangle is within `radius` of the point
    pub fn first_hit(x: f32, y: f32, radius: f32, obstacles: &[Obstacle]) -> Option<&Obstacle> {
        obstacles
            .iter()
            .find(|obs| PhysicsSystem::circle_hits_rect(x, y, radius, &obs.rect()))
    }

    /// Resolve at most one collision for this player.
    ///
    /// Stunned players are skipped entirely.
    pub fn resolve(
        player: &mut PlayerState,
        obstacles: &[Obstacle],
        rules: &GameConfig,
        now: u64,
    ) -> Option<CollisionOutcome> {
        if player.is_stunned(now) {
            return None;
        }

        let obstacle = Self::first_hit(player.x, player.y, rules.collision_radius, obstacles)?;

        player.stunned_until = now + rules.stun_duration_ms;

        let (x, y) = PhysicsSystem::knockback(
            player.x,
            player.y,
            obstacle.x,
            obstacle.y,
            rules.knockback_distance,
        );
        player.x = x;
        player.y = y;

        let penalty = Self::score_penalty(obstacle.kind, player.score);
        player.score -= penalty;

        Some(CollisionOutcome {
            player_id: player.id,
            obstacle_id: obstacle.id,
            kind: obstacle.kind,
            x,
            y,
            penalty,
            stunned_until: player.stunned_until,
        })
    }

    /// Toxic waste costs one point, never taking the score below zero
    pub fn score_penalty(kind: ObstacleKind, score: u32) -> u32 {
        match kind {
            ObstacleKind::ToxicWaste if score > 0 => 1,
            _ => 0,
        }
    }
}
