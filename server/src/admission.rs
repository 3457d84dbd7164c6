//! Admission gate bounding how many players may be in the match at once

use crate::error::CoordinatorError;
use crate::registry::{ParticipationState, Player};
use log::{debug, warn};

/// Counting gate with one slot per seat in the match.
///
/// A slot is tied to the player's `InRound` state: admitting moves the player
/// into the match, and releasing only happens for a player who is still in
/// it, so a slot can never be returned twice.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    available: usize,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            available: capacity,
        }
    }

    /// Takes a slot for `player` without blocking
    pub fn try_admit(&mut self, player: &mut Player) -> Result<(), CoordinatorError> {
        if player.is_active() {
            return Err(CoordinatorError::AlreadyInMatch);
        }
        if self.available == 0 {
            return Err(CoordinatorError::MatchFull {
                capacity: self.capacity,
            });
        }

        self.available -= 1;
        player.state = ParticipationState::InRound;
        player.choice = None;
        debug!(
            "Admitted {} ({}/{} slots taken)",
            player.nickname,
            self.admitted(),
            self.capacity
        );
        Ok(())
    }

    /// Returns the slot held by `player`, moving them to `next_state`
    ///
    /// Returns false, and changes nothing, if the player holds no slot.
    pub fn release(&mut self, player: &mut Player, next_state: ParticipationState) -> bool {
        if !player.is_active() {
            return false;
        }
        if self.available == self.capacity {
            warn!(
                "Admission gate has no slot to return for {}",
                player.nickname
            );
            return false;
        }

        self.available += 1;
        player.state = next_state;
        player.choice = None;
        debug!(
            "Released {} ({}/{} slots taken)",
            player.nickname,
            self.admitted(),
            self.capacity
        );
        true
    }

    /// Returns every slot at once, used when a match ends
    pub fn reset(&mut self) {
        self.available = self.capacity;
    }

    pub fn admitted(&self) -> usize {
        self.capacity - self.available
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_saturated(&self) -> bool {
        self.available == 0
    }
}
