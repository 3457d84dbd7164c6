use std::net::SocketAddr;
use thiserror::Error;

/// Rejections produced by the match coordinator.
///
/// None of these end the server or the match; each one is answered with a
/// notice and a reissue of the player's current menu or prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("nickname '{0}' is already registered")]
    DuplicateNickname(String),
    #[error("nickname '{0}' is empty or numeric")]
    InvalidNickname(String),
    #[error("match is full ({capacity} players)")]
    MatchFull { capacity: usize },
    #[error("player is already in the match")]
    AlreadyInMatch,
    #[error("'{0}' is not a choice between 0 and 100")]
    InvalidChoice(String),
    #[error("a choice was already submitted this round")]
    AlreadySubmitted,
    #[error("'{0}' is not a menu option")]
    InvalidMenuOption(String),
    #[error("round interrupted by a party change")]
    RoundInterrupted,
}

#[derive(Debug, Error)]
#[error("failed to deliver to {to}: {source}")]
pub struct DeliveryError {
    pub to: SocketAddr,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("party size {0} has no scoring table (supported: 2, 3)")]
    UnsupportedPartySize(usize),
    #[error("round timeout must be greater than zero")]
    ZeroRoundTimeout,
    #[error("{workers} workers cannot serve a party of {party_size}")]
    TooFewWorkers { workers: usize, party_size: usize },
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
