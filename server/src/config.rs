//! Match and server configuration
//!
//! The game constants are fixed; only the party size, the worker pool and
//! the optional round timeout can be changed from the command line.

use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_PARTY_SIZE: usize = 3;
pub const ELIMINATION_THRESHOLD: i32 = -6;
pub const TARGET_MULTIPLIER: f64 = 0.8;
pub const DEFAULT_WORKERS: usize = 10;

/// Party sizes that have a penalty table.
pub const SUPPORTED_PARTY_SIZES: [usize; 2] = [2, 3];

/// Rules of a single match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Number of admissions required to start a match
    pub party_size: usize,
    /// A score at or below this value eliminates the player
    pub elimination_threshold: i32,
    /// Factor applied to the mean of the submitted choices
    pub target_multiplier: f64,
    /// When set, a waiting submitter resolves the round with the choices
    /// received so far once this much time has passed.
    pub round_timeout: Option<Duration>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            party_size: DEFAULT_PARTY_SIZE,
            elimination_threshold: ELIMINATION_THRESHOLD,
            target_multiplier: TARGET_MULTIPLIER,
            round_timeout: None,
        }
    }
}

impl MatchConfig {
    pub fn with_party_size(mut self, party_size: usize) -> Self {
        self.party_size = party_size;
        self
    }

    pub fn with_round_timeout(mut self, round_timeout: Option<Duration>) -> Self {
        self.round_timeout = round_timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_PARTY_SIZES.contains(&self.party_size) {
            return Err(ConfigError::UnsupportedPartySize(self.party_size));
        }
        if let Some(timeout) = self.round_timeout {
            if timeout.is_zero() {
                return Err(ConfigError::ZeroRoundTimeout);
            }
        }
        Ok(())
    }
}

/// Everything the server binary needs to start
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upper bound on datagrams handled concurrently
    pub workers: usize,
    pub game: MatchConfig,
}

impl ServerConfig {
    pub fn new(bind_addr: impl Into<String>, workers: usize, game: MatchConfig) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            workers,
            game,
        }
    }

    /// Checks the match rules and the worker pool.
    ///
    /// Submitters suspended at the round barrier keep their worker, so the
    /// pool must leave room for the submission that completes the round.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()?;
        if self.workers <= self.game.party_size {
            return Err(ConfigError::TooFewWorkers {
                workers: self.workers,
                party_size: self.game.party_size,
            });
        }
        Ok(())
    }
}
