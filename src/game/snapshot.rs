//! Snapshot building for network transmission

use crate::ws::protocol::{MatchSnapshot, ObstacleSnapshot, PlayerSnapshot, TokenSnapshot};

use super::MatchState;

/// Builds full-state snapshots; clients always receive the whole match, never deltas
pub struct SnapshotBuilder;

impl SnapshotBuilder {
    pub fn build(state: &MatchState) -> MatchSnapshot {
        let players = state
            .players
            .iter()
            .map(|p| PlayerSnapshot {
                id: p.id,
                x: p.x,
                y: p.y,
                score: p.score,
                stunned_until: p.stunned_until,
            })
            .collect();

        let tokens = state
            .tokens
            .iter()
            .map(|t| TokenSnapshot {
                id: t.id,
                x: t.x,
                y: t.y,
                value: t.value,
                collected: t.collected,
            })
            .collect();

        let obstacles = state
            .obstacles
            .iter()
            .map(|o| ObstacleSnapshot {
                id: o.id,
                kind: o.kind,
                x: o.x,
                y: o.y,
                width: o.width,
                height: o.height,
                dx: o.dx,
                dy: o.dy,
            })
            .collect();

        MatchSnapshot {
            match_id: state.id,
            tick: state.tick,
            players,
            tokens,
            obstacles,
            start_time: state.start_time,
        }
    }
}
