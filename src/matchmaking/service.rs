//! Game server actor - owns the lobby and the active match
//!
//! Every inbound command, timer fire and simulation tick runs to completion on a
//! single task, so lobby and match state are never observed half-updated.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GameConfig;
use crate::game::snapshot::SnapshotBuilder;
use crate::game::GameMatch;
use crate::session::{ConnectionId, SessionPhase, SessionRegistry};
use crate::util::time::unix_millis;
use crate::ws::broadcast::Broadcast;
use crate::ws::protocol::{ClientMsg, MatchEndReason, ServerMsg};

use super::lobby::{Lobby, StartDecision};
use super::timer::{Scheduler, TimerToken, TokioScheduler};

/// Capacity of the actor's inbound command queue
const COMMAND_BUFFER: usize = 1024;

/// Work delivered to the game server actor
#[derive(Debug)]
pub enum Command {
    /// Socket opened
    Connect(ConnectionId),
    /// Intent received from a client
    Client { id: ConnectionId, msg: ClientMsg },
    /// Socket closed
    Disconnect(ConnectionId),
    /// A scheduled timer elapsed
    TimerFired(TimerToken),
}

/// Counters mirrored out of the actor for the health endpoint
#[derive(Debug, Default)]
pub struct ServerStats {
    lobby_count: AtomicUsize,
    match_in_progress: AtomicBool,
    roster_size: AtomicUsize,
    matches_played: AtomicU64,
}

impl ServerStats {
    pub fn lobby_count(&self) -> usize {
        self.lobby_count.load(Ordering::Relaxed)
    }

    pub fn match_in_progress(&self) -> bool {
        self.match_in_progress.load(Ordering::Relaxed)
    }

    pub fn roster_size(&self) -> usize {
        self.roster_size.load(Ordering::Relaxed)
    }

    pub fn matches_played(&self) -> u64 {
        self.matches_played.load(Ordering::Relaxed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Game server is not running")]
    Stopped,
}

/// Cloneable handle for sending commands to the running game server
#[derive(Clone)]
pub struct ServerHandle {
    tx: mpsc::Sender<Command>,
}

impl ServerHandle {
    pub async fn send(&self, command: Command) -> Result<(), ServerError> {
        self.tx.send(command).await.map_err(|_| ServerError::Stopped)
    }

    pub async fn connect(&self, id: ConnectionId) -> Result<(), ServerError> {
        self.send(Command::Connect(id)).await
    }

    pub async fn client(&self, id: ConnectionId, msg: ClientMsg) -> Result<(), ServerError> {
        self.send(Command::Client { id, msg }).await
    }

    pub async fn disconnect(&self, id: ConnectionId) -> Result<(), ServerError> {
        self.send(Command::Disconnect(id)).await
    }
}

/// Spawn the game server actor on the current runtime
pub fn spawn(
    config: GameConfig,
    sessions: Arc<SessionRegistry>,
    stats: Arc<ServerStats>,
    transport: Box<dyn Broadcast>,
) -> ServerHandle {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    let scheduler = TokioScheduler::new(tx.downgrade());
    let server = GameServer::new(config, sessions, stats, Box::new(scheduler), transport);

    tokio::spawn(server.run(rx));

    ServerHandle { tx }
}

/// Authoritative lobby + match state
pub struct GameServer {
    config: GameConfig,
    lobby: Lobby,
    current: Option<GameMatch>,
    /// Pending start countdown, if armed
    countdown: Option<TimerToken>,
    sessions: Arc<SessionRegistry>,
    stats: Arc<ServerStats>,
    scheduler: Box<dyn Scheduler>,
    transport: Box<dyn Broadcast>,
    rng: ChaCha8Rng,
}

impl GameServer {
    pub fn new(
        config: GameConfig,
        sessions: Arc<SessionRegistry>,
        stats: Arc<ServerStats>,
        scheduler: Box<dyn Scheduler>,
        transport: Box<dyn Broadcast>,
    ) -> Self {
        let rng = match config.match_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            lobby: Lobby::new(config.min_players, config.lobby_capacity),
            config,
            current: None,
            countdown: None,
            sessions,
            stats,
            scheduler,
            transport,
            rng,
        }
    }

    /// Run the command loop and the fixed-cadence simulation until every handle is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            capacity = self.config.lobby_capacity,
            min_players = self.config.min_players,
            "Game server started"
        );

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(unix_millis()),
                command = commands.recv() => match command {
                    Some(command) => self.handle(command, unix_millis()),
                    None => break,
                },
            }
        }

        info!("Game server stopped");
    }

    /// Apply one command
    pub fn handle(&mut self, command: Command, now: u64) {
        match command {
            Command::Connect(id) => self.connect(id),
            Command::Client { id, msg } => match msg {
                ClientMsg::PlayerReady => self.player_ready(id, now),
                ClientMsg::PlayerMove { x, y } => self.player_move(id, x, y, now),
                ClientMsg::CollectToken { token_id } => self.collect_token(id, token_id),
                // Answered by the socket task itself
                ClientMsg::Ping { .. } => {}
            },
            Command::Disconnect(id) => self.disconnect(id, now),
            Command::TimerFired(token) => self.timer_fired(token, now),
        }
        self.sync_stats();
    }

    pub fn connect(&mut self, id: ConnectionId) {
        if self.sessions.register(id) {
            info!(player_id = %id, connections = self.sessions.len(), "Player connected");
        }
    }

    /// Admit a connection to the lobby, then re-check the start rules
    pub fn player_ready(&mut self, id: ConnectionId, now: u64) {
        match self.sessions.phase(&id) {
            None => {
                debug!(player_id = %id, "Ready from unknown connection ignored");
                return;
            }
            Some(SessionPhase::Match) => {
                debug!(player_id = %id, "Ready from player already in a match ignored");
                return;
            }
            Some(SessionPhase::Lobby) => {}
            Some(SessionPhase::Connected) => {
                if self.lobby.admit(id) {
                    self.sessions.set_phase(&id, SessionPhase::Lobby);
                    info!(player_id = %id, count = self.lobby_count(), "Player ready");
                    self.publish_lobby();
                }
            }
        }

        self.evaluate_start(now);
    }

    pub fn player_move(&mut self, id: ConnectionId, x: f32, y: f32, now: u64) {
        let Some(game) = self.current.as_mut() else {
            return;
        };
        if game.move_player(&id, x, y, now) {
            self.publish_state();
        }
    }

    pub fn collect_token(&mut self, id: ConnectionId, token_id: u32) {
        let Some(game) = self.current.as_mut() else {
            return;
        };
        if let Some(score) = game.collect_token(&id, token_id) {
            debug!(player_id = %id, token_id, score, "Token collected");
            self.publish_state();
        }
    }

    /// Drop a connection from whichever structure holds it and cascade the cleanup
    pub fn disconnect(&mut self, id: ConnectionId, now: u64) {
        let Some(phase) = self.sessions.remove(&id) else {
            return;
        };

        self.lobby.remove(&id);
        if let Some(game) = self.current.as_mut() {
            game.remove_player(&id);
        }

        info!(player_id = %id, ?phase, "Player disconnected");

        if self.current.is_some() {
            self.publish_state();
        }
        self.publish_lobby();

        if self.lobby.below_minimum() {
            self.cancel_countdown();
        }

        if self.lobby_count() == 0 {
            if self.current.is_some() {
                info!("Lobby empty, terminating match");
                self.end_match(MatchEndReason::Abandoned);
            }
            self.cancel_countdown();
        } else if self.current.as_ref().is_some_and(|game| game.roster_len() == 0) {
            info!(waiting = self.lobby.len(), "Match roster empty, returning to lobby");
            self.end_match(MatchEndReason::Abandoned);
            self.evaluate_start(now);
        }
    }

    /// Countdown expiry; anything but the currently pending token is stale
    pub fn timer_fired(&mut self, token: TimerToken, now: u64) {
        self.scheduler.cancel(token);

        if self.countdown != Some(token) {
            debug!(?token, "Stale timer ignored");
            return;
        }
        self.countdown = None;

        if self.current.is_none() && self.lobby.start_conditions_met() {
            self.start_match(now);
        } else {
            debug!(waiting = self.lobby.len(), "Countdown elapsed without start conditions");
        }
    }

    /// One simulation step, followed by an unconditional full-state broadcast
    pub fn tick(&mut self, now: u64) {
        let expired = match &self.current {
            Some(game) => game.is_expired(now),
            None => return,
        };

        if expired {
            self.end_match(MatchEndReason::TimeUp);
            self.publish_lobby();
            self.evaluate_start(now);
            self.sync_stats();
            return;
        }

        let outcomes = match self.current.as_mut() {
            Some(game) => game.step(now),
            None => return,
        };

        for hit in &outcomes {
            debug!(
                player_id = %hit.player_id,
                obstacle_id = hit.obstacle_id,
                kind = ?hit.kind,
                x = hit.x,
                y = hit.y,
                penalty = hit.penalty,
                stunned_until = hit.stunned_until,
                "Player hit obstacle"
            );
        }

        self.publish_state();
    }

    #[cfg(test)]
    pub fn match_in_progress(&self) -> bool {
        self.current.is_some()
    }

    #[cfg(test)]
    pub fn current_match(&self) -> Option<&GameMatch> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn countdown_pending(&self) -> bool {
        self.countdown.is_some()
    }

    /// Ready participants, waiting or playing
    pub fn lobby_count(&self) -> usize {
        self.lobby.len() + self.current.as_ref().map_or(0, GameMatch::roster_len)
    }

    fn evaluate_start(&mut self, now: u64) {
        match self
            .lobby
            .evaluate(self.current.is_some(), self.countdown.is_some())
        {
            StartDecision::StartNow => self.start_match(now),
            StartDecision::ArmCountdown => {
                let token = self.scheduler.schedule(self.config.countdown);
                self.countdown = Some(token);
                info!(
                    waiting = self.lobby.len(),
                    countdown_ms = self.config.countdown.as_millis() as u64,
                    "Start countdown armed"
                );
            }
            StartDecision::Hold => {}
        }
    }

    fn start_match(&mut self, now: u64) {
        if self.current.is_some() {
            warn!("Match start requested while a match is running");
            return;
        }

        self.cancel_countdown();

        let roster: Vec<Uuid> = self.lobby.take_roster().into_iter().map(|p| p.id).collect();
        for id in &roster {
            self.sessions.set_phase(id, SessionPhase::Match);
        }

        let game = GameMatch::new(Uuid::new_v4(), self.rng.gen(), &roster, now, self.config.clone());

        info!(
            match_id = %game.id(),
            seed = game.state().seed,
            players = game.roster_len(),
            tokens = game.state().tokens.len(),
            "Match started"
        );

        self.transport
            .publish(ServerMsg::GameStart(SnapshotBuilder::build(game.state())));
        self.current = Some(game);
        self.stats.matches_played.fetch_add(1, Ordering::Relaxed);
    }

    fn end_match(&mut self, reason: MatchEndReason) {
        let Some(game) = self.current.take() else {
            return;
        };

        for id in game.roster() {
            self.sessions.set_phase(&id, SessionPhase::Connected);
        }

        info!(
            match_id = %game.id(),
            ?reason,
            ticks = game.state().tick,
            "Match ended"
        );

        self.transport.publish(ServerMsg::GameOver {
            reason,
            standings: game.standings(),
        });
    }

    fn cancel_countdown(&mut self) {
        if let Some(token) = self.countdown.take() {
            self.scheduler.cancel(token);
            info!("Start countdown cancelled");
        }
    }

    fn publish_lobby(&self) {
        self.transport.publish(ServerMsg::LobbyUpdate {
            count: self.lobby_count(),
        });
    }

    fn publish_state(&self) {
        if let Some(game) = &self.current {
            self.transport
                .publish(ServerMsg::GameState(SnapshotBuilder::build(game.state())));
        }
    }

    fn sync_stats(&self) {
        self.stats
            .lobby_count
            .store(self.lobby_count(), Ordering::Relaxed);
        self.stats
            .match_in_progress
            .store(self.current.is_some(), Ordering::Relaxed);
        self.stats.roster_size.store(
            self.current.as_ref().map_or(0, GameMatch::roster_len),
            Ordering::Relaxed,
        );
    }
}
