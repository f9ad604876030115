//! TCP transport and the tick-driven simulation loop.
//!
//! One task per connection reads command bytes and republishes them into the
//! intake buffer; a single tick task drains the buffer, applies the commands
//! and broadcasts the world. Dead peers are detected on the broadcast path:
//! a failed write removes the player and restores their map cell in the same
//! critical section.

use crate::game::GameState;
use crate::intake::CommandIntake;
use log::{debug, info, warn};
use shared::{Direction, PlayerId};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Write halves of the connected peers, keyed by slot. Kept in lockstep with
/// the player registry: a peer is inserted when its player is admitted and
/// removed when the player is reconciled away.
pub type Peers = HashMap<PlayerId, OwnedWriteHalf>;

/// The game server: listener, shared state, and the two independent locks.
pub struct Server {
    listener: TcpListener,
    state: Arc<Mutex<GameState>>,
    intake: Arc<CommandIntake>,
    peers: Arc<Mutex<Peers>>,
    tick_period: Duration,
}

impl Server {
    pub async fn bind(addr: &str, tick_period: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            state: Arc::new(Mutex::new(GameState::new())),
            intake: Arc::new(CommandIntake::new()),
            peers: Arc::new(Mutex::new(HashMap::new())),
            tick_period,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Starts the tick task and accepts connections forever.
    pub async fn run(&mut self) -> io::Result<()> {
        self.spawn_tick_loop();

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => self.admit(stream, addr).await,
                Err(e) => warn!("Failed to accept connection: {}", e),
            }
        }
    }

    fn spawn_tick_loop(&self) {
        let state = Arc::clone(&self.state);
        let intake = Arc::clone(&self.intake);
        let peers = Arc::clone(&self.peers);
        let period = self.tick_period;

        tokio::spawn(async move {
            run_tick_loop(state, intake, peers, period).await;
        });
    }

    /// Assigns the connection a free slot, or closes it if the session is
    /// full. Admitted players get an immediate broadcast so they see the
    /// world before the next tick.
    async fn admit(&self, stream: TcpStream, addr: SocketAddr) {
        let (read_half, write_half) = stream.into_split();

        let mut state = self.state.lock().await;
        let Some(slot) = state.add_player() else {
            warn!("Rejecting connection from {}: session is full", addr);
            return;
        };
        let mut peers = self.peers.lock().await;
        peers.insert(slot, write_half);
        broadcast_state(&mut state, &mut peers).await;
        drop(peers);
        drop(state);

        info!("Player {} connected from {}", slot + 1, addr);
        tokio::spawn(run_reader(read_half, slot, Arc::clone(&self.intake)));
    }
}

/// One tick: drain the intake (under its own lock, briefly), then apply the
/// drained commands in order and broadcast, all under the game-state lock.
/// The loop sleeps the full period after each tick, so the effective rate
/// degrades rather than compensates when a tick overruns.
async fn run_tick_loop(
    state: Arc<Mutex<GameState>>,
    intake: Arc<CommandIntake>,
    peers: Arc<Mutex<Peers>>,
    period: Duration,
) {
    loop {
        let drained = intake.drain_all().await;
        {
            let mut state = state.lock().await;
            for (id, command) in drained {
                state.apply_command(id, command);
            }
            let mut peers = peers.lock().await;
            broadcast_state(&mut state, &mut peers).await;
        }
        sleep(period).await;
    }
}

/// Writes the serialized world to every registered peer. A failed write is a
/// disconnect: the player is reconciled out of the state and the peer is
/// dropped, atomically with the map-cell restoration.
pub async fn broadcast_state<W>(state: &mut GameState, peers: &mut HashMap<PlayerId, W>)
where
    W: AsyncWrite + Unpin,
{
    let payload = state.render();
    let mut dead = Vec::new();

    for (&id, writer) in peers.iter_mut() {
        if let Err(e) = writer.write_all(payload.as_bytes()).await {
            warn!("Write to player {} failed: {}", id + 1, e);
            dead.push(id);
        }
    }

    for id in dead {
        state.reconcile(id);
        peers.remove(&id);
    }
}

/// Reads command bytes from one peer until EOF or error, republishing the
/// first recognized byte of each read into the intake buffer. Cleanup of the
/// player happens on the broadcast path, not here.
async fn run_reader<R>(mut reader: R, slot: PlayerId, intake: Arc<CommandIntake>)
where
    R: AsyncRead + Unpin,
{
    let mut buffer = [0u8; 256];

    loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(len) => {
                if let Some(command) = Direction::first_in(&buffer[..len]) {
                    intake.submit(slot, command).await;
                }
            }
            Err(e) => {
                debug!("Read from player {} failed: {}", slot + 1, e);
                break;
            }
        }
    }

    debug!("Player {} reader stopped", slot + 1);
}
