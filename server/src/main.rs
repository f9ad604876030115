mod game;
mod intake;
mod network;
mod world;

use clap::Parser;
use network::Server;
use std::time::Duration;

/// Parses command-line arguments, binds the listener and runs the server
/// until the process is interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Tick rate (updates per second)
        #[clap(short, long, default_value_t = shared::DEFAULT_TICK_RATE)]
        tick_rate: u32,
    }

    env_logger::init();
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let tick_period = Duration::from_millis(1000 / args.tick_rate.max(1) as u64);

    let mut server = Server::bind(&address, tick_period).await?;

    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
