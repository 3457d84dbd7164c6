//! Automatic player that answers prompts without a human at the console

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{MenuCode, ServerCue, MAX_CHOICE, MIN_CHOICE, QUIT_ALIAS};

/// Join requests sent before giving up on a full match
pub const MAX_JOIN_ATTEMPTS: u32 = 5;

pub struct AutoPlayer {
    rng: StdRng,
    join_attempts: u32,
}

impl AutoPlayer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            join_attempts: 0,
        }
    }

    /// Deterministic picks, for tests and reproducible bots
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            join_attempts: 0,
        }
    }

    /// Line to send in answer to a server cue, if any
    ///
    /// The menu is always answered with a join request; once the match has
    /// turned us away too many times the bot quits instead.
    pub fn reply(&mut self, cue: ServerCue) -> Option<String> {
        match cue {
            ServerCue::MenuPrompt => {
                if self.join_attempts >= MAX_JOIN_ATTEMPTS {
                    warn!("Could not join after {} attempts, quitting", self.join_attempts);
                    return Some(QUIT_ALIAS.to_string());
                }
                self.join_attempts += 1;
                Some(MenuCode::JoinMatch.code().to_string())
            }
            ServerCue::ChoicePrompt => {
                let pick = self.rng.gen_range(MIN_CHOICE..=MAX_CHOICE);
                debug!("Auto player picks {}", pick);
                Some(pick.to_string())
            }
            _ => None,
        }
    }
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self::new()
    }
}
