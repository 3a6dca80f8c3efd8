//! Application state shared across routes

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::matchmaking::{self, ServerHandle, ServerStats};
use crate::session::SessionRegistry;
use crate::ws::protocol::ServerMsg;

/// Buffered events per subscriber before a slow client starts skipping
const EVENT_BUFFER: usize = 256;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub stats: Arc<ServerStats>,
    /// Commands into the game server actor
    pub server: ServerHandle,
    /// Server-to-client event stream; each socket subscribes
    pub events: broadcast::Sender<ServerMsg>,
}

impl AppState {
    /// Build state and spawn the game server (must run inside a tokio runtime)
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let sessions = Arc::new(SessionRegistry::new());
        let stats = Arc::new(ServerStats::default());
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let server = matchmaking::spawn(
            config.game.clone(),
            sessions.clone(),
            stats.clone(),
            Box::new(events.clone()),
        );

        Self {
            config,
            sessions,
            stats,
            server,
            events,
        }
    }
}
