//! Player registry for the match coordinator
//!
//! This module owns every connected player and their match status:
//! - Registration with nickname validation and uniqueness
//! - Lookup by session (the sender's UDP endpoint)
//! - Per-round choice bookkeeping
//! - Ordered snapshots of the players currently in the match
//!
//! The registry is not synchronized by itself; the coordinator keeps it
//! behind the same lock as the admission gate and the round barrier.

use crate::error::CoordinatorError;
use log::info;
use shared::{parse_number, MAX_NICKNAME_LEN};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Stable identity of a sender. UDP has no handshake, so the endpoint is
/// the session.
pub type SessionId = SocketAddr;

/// Where a player stands with respect to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipationState {
    /// Signed up, browsing the menu
    Registered,
    /// Admitted to the match and expected to submit every round
    InRound,
    Eliminated,
    Winner,
}

/// A number submitted for the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: u8,
    /// Arrival position within the round, starting at 0
    pub order: usize,
}

/// A registered player
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique, immutable once registered
    pub nickname: String,
    /// Endpoint used to reach the player
    pub session: SessionId,
    pub score: i32,
    /// Cleared at the start and at the end of every round
    pub choice: Option<Choice>,
    pub state: ParticipationState,
    registered_seq: u64,
}

impl Player {
    fn new(nickname: String, session: SessionId, registered_seq: u64) -> Self {
        Self {
            nickname,
            session,
            score: 0,
            choice: None,
            state: ParticipationState::Registered,
            registered_seq,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ParticipationState::InRound
    }

    /// Position in registration order, used to keep snapshots stable
    pub fn registered_seq(&self) -> u64 {
        self.registered_seq
    }
}

/// Rejects empty, numeric and overlong nicknames.
///
/// A numeric nickname would be indistinguishable from a menu code or a move.
pub fn validate_nickname(nickname: &str) -> Result<(), CoordinatorError> {
    if nickname.is_empty()
        || nickname.chars().count() > MAX_NICKNAME_LEN
        || parse_number(nickname).is_some()
    {
        return Err(CoordinatorError::InvalidNickname(nickname.to_string()));
    }
    Ok(())
}

/// Registered players indexed by nickname
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
    next_seq: u64,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a nickname for a session
    ///
    /// Fails with `InvalidNickname` for empty or numeric input and with
    /// `DuplicateNickname` when the nickname is taken.
    pub fn register(
        &mut self,
        nickname: &str,
        session: SessionId,
    ) -> Result<&Player, CoordinatorError> {
        validate_nickname(nickname)?;
        if self.players.contains_key(nickname) {
            return Err(CoordinatorError::DuplicateNickname(nickname.to_string()));
        }

        let seq = self.next_seq;
        self.next_seq += 1;

        info!("Player {} registered from {}", nickname, session);
        let player = self
            .players
            .entry(nickname.to_string())
            .or_insert_with(|| Player::new(nickname.to_string(), session, seq));
        Ok(player)
    }

    /// Finds the player registered from the given session
    pub fn find(&self, session: SessionId) -> Option<&Player> {
        self.players.values().find(|p| p.session == session)
    }

    pub fn get(&self, nickname: &str) -> Option<&Player> {
        self.players.get(nickname)
    }

    pub fn get_mut(&mut self, nickname: &str) -> Option<&mut Player> {
        self.players.get_mut(nickname)
    }

    /// Removes a player, returning them if they were registered
    pub fn remove(&mut self, nickname: &str) -> Option<Player> {
        let removed = self.players.remove(nickname);
        if let Some(player) = &removed {
            info!("Player {} removed", player.nickname);
        }
        removed
    }

    /// Copies the players currently in the match
    ///
    /// Players who submitted this round come first, in arrival order,
    /// followed by the rest in registration order.
    pub fn snapshot_active(&self) -> Vec<Player> {
        let mut active: Vec<Player> = self
            .players
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        active.sort_by_key(|p| {
            (
                p.choice.map(|c| c.order).unwrap_or(usize::MAX),
                p.registered_seq,
            )
        });
        active
    }

    /// Sessions of every registered player in registration order
    pub fn sessions(&self) -> Vec<SessionId> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by_key(|p| p.registered_seq);
        players.iter().map(|p| p.session).collect()
    }

    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.is_active()).count()
    }

    /// Drops every player's pending choice
    pub fn clear_choices(&mut self) {
        for player in self.players.values_mut() {
            player.choice = None;
        }
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut()
    }

    /// Empties the registry, returning whoever was still registered
    pub fn clear(&mut self) -> Vec<Player> {
        let mut drained: Vec<Player> = self.players.drain().map(|(_, p)| p).collect();
        drained.sort_by_key(|p| p.registered_seq);
        drained
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
