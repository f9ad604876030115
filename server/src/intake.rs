//! Per-player command intake between reader tasks and the tick loop.
//!
//! Each player has a single pending slot: a newer command overwrites an
//! unconsumed one, so between two ticks only the latest command counts.
//! The buffer has its own lock, separate from the game state, so reader
//! tasks never wait on simulation progress.

use shared::{Direction, PlayerId};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct CommandIntake {
    pending: Mutex<BTreeMap<PlayerId, Direction>>,
}

impl CommandIntake {
    pub fn new() -> Self {
        CommandIntake {
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Publishes the latest command for a player, replacing any unconsumed one.
    pub async fn submit(&self, id: PlayerId, command: Direction) {
        self.pending.lock().await.insert(id, command);
    }

    /// Atomically empties the buffer and returns its contents in ascending
    /// slot order. Commands submitted after this call wait for the next tick.
    pub async fn drain_all(&self) -> Vec<(PlayerId, Direction)> {
        let mut pending = self.pending.lock().await;
        std::mem::take(&mut *pending).into_iter().collect()
    }
}
