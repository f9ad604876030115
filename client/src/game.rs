//! Client-side view of the broadcast payload.
//!
//! The server is authoritative; the client keeps only the most recently
//! received snapshot and slices it into grid rows and the status text for
//! rendering.

use shared::{GRID_AREA, GRID_HEIGHT, GRID_WIDTH};

pub struct ClientGameState {
    latest: Option<String>,
}

impl ClientGameState {
    pub fn new() -> Self {
        ClientGameState { latest: None }
    }

    /// Replaces the current snapshot with a newer one.
    pub fn apply_snapshot(&mut self, payload: &str) {
        self.latest = Some(payload.to_string());
    }

    /// The grid rows of the latest snapshot, or `None` until a full grid has
    /// been received.
    pub fn rows(&self) -> Option<Vec<&str>> {
        let payload = self.latest.as_deref()?;
        if payload.len() < GRID_AREA {
            return None;
        }
        Some(
            (0..GRID_HEIGHT)
                .map(|y| &payload[y * GRID_WIDTH..(y + 1) * GRID_WIDTH])
                .collect(),
        )
    }

    /// Everything after the grid: the score line and any win banner.
    pub fn status(&self) -> Option<&str> {
        let payload = self.latest.as_deref()?;
        if payload.len() <= GRID_AREA {
            return None;
        }
        Some(payload[GRID_AREA..].trim_start_matches('\n'))
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        ClientGameState::new()
    }
}
