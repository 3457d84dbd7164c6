use clap::Parser;
use client::network::{Client, SessionEnd};
use log::info;
use rand::Rng;
use shared::DEFAULT_SERVER_PORT;
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value_t = format!("127.0.0.1:{}", DEFAULT_SERVER_PORT))]
    server: String,

    /// Nickname to register with (asked for when missing)
    #[arg(short = 'n', long)]
    nickname: Option<String>,

    /// Play automatically: join the match and pick random numbers
    #[arg(short = 'a', long)]
    auto: bool,
}

fn ask_nickname() -> io::Result<String> {
    print!("Enter your nickname: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = Client::new(&args.server, args.auto).await?;
    let mut nickname = match (&args.nickname, args.auto) {
        (Some(nickname), _) => nickname.clone(),
        (None, true) => format!("bot{}", rand::thread_rng().gen_range(1000..10000)),
        (None, false) => ask_nickname()?,
    };

    loop {
        match client.run(&nickname).await? {
            SessionEnd::Rejected(reason) if !args.auto && args.nickname.is_none() => {
                info!("Nickname refused: {}", reason);
                nickname = ask_nickname()?;
            }
            SessionEnd::Rejected(reason) => {
                return Err(reason.into());
            }
            SessionEnd::MatchEnded => {
                info!("Match ended, registering {} again", nickname);
            }
            end => {
                info!("Session ended: {:?}", end);
                return Ok(());
            }
        }
    }
}
