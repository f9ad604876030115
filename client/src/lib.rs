//! # Capture-the-Flag Terminal Client
//!
//! Thin viewer and input driver for the game server. The server is fully
//! authoritative: the client sends single movement bytes and renders whatever
//! snapshot the server last broadcast, with no prediction or local
//! simulation.
//!
//! ## Structure
//!
//! - [`network`]: TCP connection and the `select!` loop combining socket
//!   reads, keyboard input and the redraw timer.
//! - [`game`]: the latest received snapshot, sliced into rows and status.
//! - [`input`]: keyboard-to-wire byte mapping.
//! - [`rendering`]: terminal drawing of the grid and score line.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
