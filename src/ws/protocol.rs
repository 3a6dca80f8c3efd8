//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Obstacle varieties; only toxic waste costs score on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObstacleKind {
    ToxicWaste,
    SpinningTrash,
    OilSpill,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Join the lobby as a ready participant (idempotent)
    PlayerReady,

    /// Client-authoritative position update
    PlayerMove { x: f32, y: f32 },

    /// Claim a token
    CollectToken {
        #[serde(rename = "tokenId")]
        token_id: u32,
    },

    /// Ping for latency measurement
    Ping {
        /// Client timestamp
        t: u64,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Welcome message after connection
    Welcome {
        #[serde(rename = "playerId")]
        player_id: Uuid,
        #[serde(rename = "serverTime")]
        server_time: u64,
    },

    /// Lobby membership changed
    LobbyUpdate { count: usize },

    /// A match has begun; carries the initial state
    GameStart(MatchSnapshot),

    /// Full match state (every tick and after every applied intent)
    GameState(MatchSnapshot),

    /// The match is over
    GameOver {
        reason: MatchEndReason,
        standings: Vec<Standing>,
    },

    /// Pong response
    Pong {
        /// Echo back client timestamp
        t: u64,
    },
}

/// Why a match stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchEndReason {
    /// Server-side match duration elapsed
    TimeUp,
    /// Every roster member disconnected
    Abandoned,
}

/// Full authoritative match state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    /// Simulation steps run so far
    pub tick: u64,
    pub players: Vec<PlayerSnapshot>,
    pub tokens: Vec<TokenSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
    /// Unix ms when the match started
    pub start_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub score: u32,
    /// Unix ms until which movement is ignored (0 = never stunned)
    pub stunned_until: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub value: u32,
    pub collected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub dx: f32,
    pub dy: f32,
}

/// Final ranking entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub id: Uuid,
    pub score: u32,
}
