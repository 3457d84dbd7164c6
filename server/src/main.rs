use clap::Parser;
use log::info;
use server::config::{MatchConfig, ServerConfig, DEFAULT_PARTY_SIZE, DEFAULT_WORKERS};
use server::network::Server;
use shared::DEFAULT_SERVER_PORT;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_SERVER_PORT)]
    port: u16,

    /// Players needed to start a match (2 or 3)
    #[arg(short = 'n', long, default_value_t = DEFAULT_PARTY_SIZE)]
    party_size: usize,

    /// Datagrams handled concurrently
    #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Resolve a round with the choices received after this many seconds
    #[arg(short = 't', long)]
    round_timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let game = MatchConfig::default()
        .with_party_size(args.party_size)
        .with_round_timeout(args.round_timeout_secs.map(Duration::from_secs));
    let config = ServerConfig::new(format!("{}:{}", args.host, args.port), args.workers, game);

    info!("Starting server...");
    let mut server = Server::new(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
