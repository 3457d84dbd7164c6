use crate::autoplay::AutoPlayer;
use log::{debug, info, warn};
use shared::{ServerCue, MAX_DATAGRAM_SIZE, QUIT_ALIAS};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::net::UdpSocket;

/// How a session with the server ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    Exited,
    Eliminated,
    Won,
    /// The nickname was refused; the server's reason is attached
    Rejected(String),
    /// Someone else won while we were only registered
    MatchEnded,
}

impl SessionEnd {
    fn from_terminal(text: &str) -> Self {
        if text.contains(shared::WINNER_NOTICE) {
            SessionEnd::Won
        } else if text.contains(shared::ELIMINATED_NOTICE) {
            SessionEnd::Eliminated
        } else {
            SessionEnd::Exited
        }
    }
}

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    autoplay: Option<AutoPlayer>,
    stdin: Option<Lines<BufReader<Stdin>>>,
    quiet: bool,
}

impl Client {
    pub async fn new(server_addr: &str, auto: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            autoplay: auto.then(AutoPlayer::new),
            stdin: None,
            quiet: false,
        })
    }

    /// Replaces the automatic player, e.g. with a seeded one
    pub fn with_autoplay(mut self, autoplay: AutoPlayer) -> Self {
        self.autoplay = Some(autoplay);
        self
    }

    /// Stops echoing server text to stdout
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        Ok(self.socket.local_addr()?)
    }

    async fn send_line(&self, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Sending '{}'", text);
        self.socket.send_to(text.as_bytes(), self.server_addr).await?;
        Ok(())
    }

    /// Reads the next console line; `None` once stdin is closed
    async fn read_line(&mut self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let stdin = self
            .stdin
            .get_or_insert_with(|| BufReader::new(tokio::io::stdin()).lines());
        Ok(stdin.next_line().await?)
    }

    /// Registers `nickname` and plays until the session ends
    pub async fn run(&mut self, nickname: &str) -> Result<SessionEnd, Box<dyn std::error::Error>> {
        info!("Registering as {} with {}", nickname, self.server_addr);
        self.send_line(nickname.trim()).await?;

        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            let (len, addr) = self.socket.recv_from(&mut buffer).await?;
            if addr != self.server_addr {
                warn!("Ignoring datagram from unknown sender {}", addr);
                continue;
            }

            let text = String::from_utf8_lossy(&buffer[..len]).to_string();
            if !self.quiet {
                println!("{}", text);
            }

            let cue = shared::classify(&text);
            match cue {
                ServerCue::Terminal => return Ok(SessionEnd::from_terminal(&text)),
                ServerCue::RegistrationRejected => return Ok(SessionEnd::Rejected(text)),
                ServerCue::MatchEnded => return Ok(SessionEnd::MatchEnded),
                ServerCue::MenuPrompt | ServerCue::ChoicePrompt => {
                    let reply = match self.autoplay.as_mut() {
                        Some(bot) => bot.reply(cue),
                        None => Some(
                            self.read_line()
                                .await?
                                .unwrap_or_else(|| QUIT_ALIAS.to_string()),
                        ),
                    };
                    if let Some(line) = reply {
                        self.send_line(line.trim()).await?;
                    }
                }
                ServerCue::Info => {}
            }
        }
    }
}
