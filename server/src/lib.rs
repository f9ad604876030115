//! # Capture-the-Flag Game Server
//!
//! Authoritative server for a two-player real-time capture-the-flag match on
//! a fixed 40x15 grid. The server owns the canonical world, consumes movement
//! commands from connected clients, advances the match on a fixed tick, and
//! broadcasts the serialized world to every participant.
//!
//! ## Architecture
//!
//! The engine is split along its concurrency seams:
//!
//! - One reader task per connection performs blocking reads from the socket
//!   and republishes the latest recognized command byte into the intake
//!   buffer. Readers never touch the game state directly.
//! - A single tick task drains the intake, applies at most one command per
//!   player per tick, and broadcasts the result. Applying and broadcasting
//!   happen under one lock acquisition so map cells, player positions and
//!   scores always change together.
//! - Disconnects are detected on the broadcast path: the first failed write
//!   to a peer removes its player and restores the map cell it covered.
//!
//! Two locks exist: one around the whole [`game::GameState`] aggregate and an
//! independent one inside [`intake::CommandIntake`], so readers submitting
//! commands never contend with a tick in progress. No task ever holds both at
//! once; the tick task takes them strictly one after the other.
//!
//! ## Module Organization
//!
//! - [`world`]: the grid map, its fixed layout, and tile access.
//! - [`game`]: player registry, movement/scoring rules, payload rendering.
//! - [`intake`]: the per-player latest-command buffer between readers and
//!   the tick loop.
//! - [`network`]: listener, per-connection readers, the tick loop, and
//!   broadcast with disconnect reconciliation.
//!
//! ## Wire Contract
//!
//! Inbound: single ASCII bytes `w`/`a`/`s`/`d` (case-insensitive); everything
//! else is ignored. Outbound, once per tick: all grid rows concatenated, one
//! newline, a score line, and a win banner once a score reaches 3. Grid
//! dimensions are compile-time constants shared with the client crate.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     // 15 Hz tick: drain commands, apply rules, broadcast the world
//!     let mut server = Server::bind("127.0.0.1:8080", Duration::from_millis(66)).await?;
//!     server.run().await
//! }
//! ```

pub mod game;
pub mod intake;
pub mod network;
pub mod world;
