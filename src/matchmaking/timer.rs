//! Cancellable one-shot timers delivered to the game server actor

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::service::Command;

/// Handle identifying one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    #[cfg(test)]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Schedules one-shot timers. `cancel` must be safe to call after the timer fired
/// and more than once.
pub trait Scheduler: Send {
    fn schedule(&mut self, delay: Duration) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// Timers backed by tokio tasks that post `Command::TimerFired` to the actor
pub struct TokioScheduler {
    next_id: u64,
    commands: mpsc::WeakSender<Command>,
    pending: HashMap<TimerToken, JoinHandle<()>>,
}

impl TokioScheduler {
    /// Weak sender so pending timers never keep the actor alive
    pub fn new(commands: mpsc::WeakSender<Command>) -> Self {
        Self {
            next_id: 0,
            commands,
            pending: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&mut self, delay: Duration) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        let commands = self.commands.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::TimerFired(token)).await;
            }
        });

        self.pending.insert(token, handle);
        token
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(handle) = self.pending.remove(&token) {
            handle.abort();
            debug!(?token, "Timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}
