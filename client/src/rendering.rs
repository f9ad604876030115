//! Terminal rendering of the latest snapshot.

use crate::game::ClientGameState;
use std::io::{self, Write};

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    /// Clears the terminal and draws the instructions, the grid and the
    /// score/status text below it.
    pub fn render(&mut self, state: &ClientGameState) -> io::Result<()> {
        let mut out = io::stdout().lock();

        // ANSI clear-screen + cursor-home
        write!(out, "\x1b[2J\x1b[H")?;
        writeln!(out, "--- Capture The Flag (Real-Time) ---")?;
        writeln!(out, "Move with W, A, S, D (press Enter to send). Quit with 'q'.")?;
        writeln!(out, "--------------------------------------------------")?;

        match state.rows() {
            Some(rows) => {
                for row in rows {
                    writeln!(out, "{}", row)?;
                }
                if let Some(status) = state.status() {
                    writeln!(out)?;
                    writeln!(out, "{}", status)?;
                }
            }
            None => {
                writeln!(out, "Waiting for game state...")?;
            }
        }

        out.flush()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new()
    }
}
