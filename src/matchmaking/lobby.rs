//! Lobby membership and match start rules

use std::collections::VecDeque;
use uuid::Uuid;

/// Player waiting in the lobby
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: Uuid,
    pub ready: bool,
}

impl Participant {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ready: true,
        }
    }
}

/// What the lobby wants to happen after its membership changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartDecision {
    /// Leave things as they are
    Hold,
    /// Start a match right now (cancels any pending countdown)
    StartNow,
    /// Arm the grace-period countdown
    ArmCountdown,
}

/// The waiting pool, in arrival order
pub struct Lobby {
    participants: VecDeque<Participant>,
    /// Minimum players to start a match
    min_players: usize,
    /// Lobby size that starts a match without waiting
    capacity: usize,
}

impl Lobby {
    pub fn new(min_players: usize, capacity: usize) -> Self {
        Self {
            participants: VecDeque::new(),
            min_players,
            capacity,
        }
    }

    /// Add a ready participant. Returns false if already present.
    pub fn admit(&mut self, id: Uuid) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.participants.push_back(Participant::new(id));
        true
    }

    /// Remove a participant
    pub fn remove(&mut self, id: &Uuid) -> Option<Participant> {
        let pos = self.participants.iter().position(|p| &p.id == id)?;
        self.participants.remove(pos)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.participants.iter().any(|p| &p.id == id)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn all_ready(&self) -> bool {
        self.participants.iter().all(|p| p.ready)
    }

    /// Enough ready participants to start
    pub fn start_conditions_met(&self) -> bool {
        self.len() >= self.min_players && self.all_ready()
    }

    pub fn below_minimum(&self) -> bool {
        self.len() < self.min_players
    }

    /// Apply the start rules in order: running match, full lobby, countdown.
    pub fn evaluate(&self, match_in_progress: bool, countdown_pending: bool) -> StartDecision {
        if match_in_progress {
            return StartDecision::Hold;
        }

        if self.len() >= self.capacity && self.all_ready() {
            return StartDecision::StartNow;
        }

        if self.start_conditions_met() && !countdown_pending {
            return StartDecision::ArmCountdown;
        }

        StartDecision::Hold
    }

    /// Take the oldest participants, up to capacity, for a new match
    pub fn take_roster(&mut self) -> Vec<Participant> {
        let count = self.participants.len().min(self.capacity);
        self.participants.drain(..count).collect()
    }
}
