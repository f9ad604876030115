//! Connection handling and the client's main loop.

use crate::game::ClientGameState;
use crate::input;
use crate::rendering::Renderer;
use log::{error, info};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::interval;

pub struct Client {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    game_state: ClientGameState,
    renderer: Renderer,
}

impl Client {
    pub async fn new(server_addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        info!("Connected to {}", server_addr);
        let (reader, writer) = stream.into_split();

        Ok(Client {
            reader,
            writer,
            game_state: ClientGameState::new(),
            renderer: Renderer::new(),
        })
    }

    /// Receives snapshots, forwards movement keys, and redraws at ~20 FPS,
    /// until the server goes away or the user quits.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let mut stdin = tokio::io::stdin();
        let mut net_buffer = [0u8; 2048];
        let mut key_buffer = [0u8; 64];
        let mut render_interval = interval(Duration::from_millis(50));

        loop {
            tokio::select! {
                result = self.reader.read(&mut net_buffer) => {
                    match result {
                        Ok(0) => {
                            info!("Disconnected from server. Game over.");
                            break;
                        }
                        Ok(len) => {
                            if let Ok(text) = std::str::from_utf8(&net_buffer[..len]) {
                                self.game_state.apply_snapshot(text);
                            }
                        }
                        Err(e) => {
                            error!("Error reading from server: {}", e);
                            break;
                        }
                    }
                },

                result = stdin.read(&mut key_buffer) => {
                    match result {
                        Ok(0) => break,
                        Ok(len) => {
                            for &byte in &key_buffer[..len] {
                                if input::is_quit(byte) {
                                    return Ok(());
                                }
                                if let Some(command) = input::command_for(byte) {
                                    self.writer.write_all(&[command]).await?;
                                }
                            }
                        }
                        Err(e) => {
                            error!("Error reading input: {}", e);
                            break;
                        }
                    }
                },

                _ = render_interval.tick() => {
                    self.renderer.render(&self.game_state)?;
                },
            }
        }

        Ok(())
    }
}
