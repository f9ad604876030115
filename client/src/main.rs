mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = network::Client::new(&args.server).await?;

    client.run().await?;

    Ok(())
}
