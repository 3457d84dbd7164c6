//! Round barrier: the rendezvous every in-match player crosses once per round
//!
//! A barrier is sized to the number of players in the match when it is
//! built. The crossing that fills it trips it; the tripping caller resolves
//! the round while still holding the coordinator lock and only then
//! releases the other crossers. Membership changes never resize a barrier
//! in place: the coordinator swaps in a new generation and the old one
//! releases its waiters as interrupted.

use crate::error::CoordinatorError;
use crate::registry::SessionId;
use log::debug;
use tokio::sync::oneshot;

/// How a barrier generation ended for the players waiting on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// The round was scored
    Resolved { generation: u64 },
    /// The party changed before the round could be scored
    Interrupted { generation: u64 },
}

impl RoundOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            RoundOutcome::Resolved { generation } | RoundOutcome::Interrupted { generation } => {
                *generation
            }
        }
    }

    pub fn into_result(self) -> Result<u64, CoordinatorError> {
        match self {
            RoundOutcome::Resolved { generation } => Ok(generation),
            RoundOutcome::Interrupted { .. } => Err(CoordinatorError::RoundInterrupted),
        }
    }
}

/// Handed to a crosser that has to wait for the rest of the party
#[derive(Debug)]
pub struct RoundTicket {
    generation: u64,
    session: SessionId,
    receiver: oneshot::Receiver<RoundOutcome>,
}

impl RoundTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Waits until the generation is resolved or torn down
    pub async fn outcome(&mut self) -> RoundOutcome {
        match (&mut self.receiver).await {
            Ok(outcome) => outcome,
            // The barrier went away without notifying; treat as torn down
            Err(_) => RoundOutcome::Interrupted {
                generation: self.generation,
            },
        }
    }
}

/// Result of crossing the barrier
#[derive(Debug)]
pub enum Crossing {
    /// Not everyone has submitted yet
    Waiting(RoundTicket),
    /// This crossing filled the barrier; the caller must resolve the round
    Tripped { generation: u64 },
}

/// One generation of the round barrier
#[derive(Debug)]
pub struct RoundBarrier {
    generation: u64,
    size: usize,
    arrived: Vec<SessionId>,
    waiters: Vec<oneshot::Sender<RoundOutcome>>,
    tripped: bool,
}

impl RoundBarrier {
    pub fn new(generation: u64, size: usize) -> Self {
        Self {
            generation,
            size,
            arrived: Vec::with_capacity(size),
            waiters: Vec::with_capacity(size),
            tripped: false,
        }
    }

    /// Registers `session`'s submission for this generation
    pub fn cross(&mut self, session: SessionId) -> Result<Crossing, CoordinatorError> {
        if self.tripped || self.size == 0 {
            return Err(CoordinatorError::RoundInterrupted);
        }
        if self.arrived.contains(&session) {
            return Err(CoordinatorError::AlreadySubmitted);
        }

        self.arrived.push(session);
        debug!(
            "Barrier generation {}: {}/{} arrived",
            self.generation,
            self.arrived.len(),
            self.size
        );

        if self.arrived.len() >= self.size {
            self.tripped = true;
            return Ok(Crossing::Tripped {
                generation: self.generation,
            });
        }

        let (sender, receiver) = oneshot::channel();
        self.waiters.push(sender);
        Ok(Crossing::Waiting(RoundTicket {
            generation: self.generation,
            session,
            receiver,
        }))
    }

    /// Trips the barrier before it is full
    ///
    /// Returns false if it had already tripped, so a generation can only be
    /// resolved once.
    pub fn force_trip(&mut self) -> bool {
        if self.tripped {
            return false;
        }
        self.tripped = true;
        true
    }

    /// Replaces this generation with a fresh one of `size`
    ///
    /// Waiters of the old generation are told it was resolved if it tripped
    /// and interrupted otherwise. Returns the new generation number.
    pub fn advance(&mut self, size: usize) -> u64 {
        let next = RoundBarrier::new(self.generation + 1, size);
        let old = std::mem::replace(self, next);
        let outcome = if old.tripped {
            RoundOutcome::Resolved {
                generation: old.generation,
            }
        } else {
            RoundOutcome::Interrupted {
                generation: old.generation,
            }
        };
        debug!(
            "Barrier generation {} ended ({:?}), generation {} sized {}",
            old.generation, outcome, self.generation, size
        );
        for waiter in old.waiters {
            // The waiting task may have gone away; nothing to notify then
            let _ = waiter.send(outcome);
        }
        self.generation
    }

    pub fn has_arrived(&self, session: SessionId) -> bool {
        self.arrived.contains(&session)
    }

    pub fn arrived_count(&self) -> usize {
        self.arrived.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready_eq, task};

    fn addr(port: u16) -> SessionId {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    #[test]
    fn test_new_barrier() {
        let barrier = RoundBarrier::new(4, 3);
        assert_eq!(barrier.generation(), 4);
        assert_eq!(barrier.size(), 3);
        assert_eq!(barrier.arrived_count(), 0);
        assert!(!barrier.is_tripped());
    }

    #[test]
    fn test_last_crossing_trips() {
        let mut barrier = RoundBarrier::new(1, 3);
        assert!(matches!(barrier.cross(addr(1)), Ok(Crossing::Waiting(_))));
        assert!(matches!(barrier.cross(addr(2)), Ok(Crossing::Waiting(_))));
        assert!(matches!(
            barrier.cross(addr(3)),
            Ok(Crossing::Tripped { generation: 1 })
        ));
        assert!(barrier.is_tripped());
    }

    #[test]
    fn test_same_session_cannot_cross_twice() {
        let mut barrier = RoundBarrier::new(1, 3);
        let _ticket = barrier.cross(addr(1)).unwrap();
        assert!(matches!(
            barrier.cross(addr(1)),
            Err(CoordinatorError::AlreadySubmitted)
        ));
        assert_eq!(barrier.arrived_count(), 1);
    }

    #[test]
    fn test_tripped_barrier_rejects_crossings() {
        let mut barrier = RoundBarrier::new(1, 1);
        assert!(matches!(barrier.cross(addr(1)), Ok(Crossing::Tripped { .. })));
        assert!(matches!(
            barrier.cross(addr(2)),
            Err(CoordinatorError::RoundInterrupted)
        ));
    }

    #[test]
    fn test_empty_barrier_rejects_crossings() {
        let mut barrier = RoundBarrier::new(0, 0);
        assert!(matches!(
            barrier.cross(addr(1)),
            Err(CoordinatorError::RoundInterrupted)
        ));
    }

    #[test]
    fn test_waiters_released_after_resolution() {
        let mut barrier = RoundBarrier::new(7, 2);
        let mut ticket = match barrier.cross(addr(1)).unwrap() {
            Crossing::Waiting(ticket) => ticket,
            other => panic!("unexpected crossing {:?}", other),
        };
        assert_eq!(ticket.generation(), 7);
        assert_eq!(ticket.session(), addr(1));

        let mut wait = task::spawn(async move { ticket.outcome().await });
        assert_pending!(wait.poll());

        assert!(matches!(barrier.cross(addr(2)), Ok(Crossing::Tripped { .. })));
        // Still pending: the round has not been resolved yet
        assert_pending!(wait.poll());

        assert_eq!(barrier.advance(2), 8);
        assert!(wait.is_woken());
        assert_ready_eq!(wait.poll(), RoundOutcome::Resolved { generation: 7 });
    }

    #[test]
    fn test_advance_before_trip_interrupts() {
        let mut barrier = RoundBarrier::new(3, 3);
        let mut ticket = match barrier.cross(addr(1)).unwrap() {
            Crossing::Waiting(ticket) => ticket,
            other => panic!("unexpected crossing {:?}", other),
        };

        barrier.advance(2);
        assert_eq!(barrier.size(), 2);
        assert_eq!(barrier.arrived_count(), 0);
        assert!(!barrier.has_arrived(addr(1)));

        let mut wait = task::spawn(async move { ticket.outcome().await });
        assert_ready_eq!(wait.poll(), RoundOutcome::Interrupted { generation: 3 });
    }

    #[test]
    fn test_force_trip_only_once() {
        let mut barrier = RoundBarrier::new(1, 3);
        let _ticket = barrier.cross(addr(1)).unwrap();
        assert!(barrier.force_trip());
        assert!(!barrier.force_trip());
        assert!(matches!(
            barrier.cross(addr(2)),
            Err(CoordinatorError::RoundInterrupted)
        ));
    }

    #[test]
    fn test_outcome_into_result() {
        assert_eq!(
            RoundOutcome::Resolved { generation: 2 }.into_result(),
            Ok(2)
        );
        assert_eq!(
            RoundOutcome::Interrupted { generation: 2 }.into_result(),
            Err(CoordinatorError::RoundInterrupted)
        );
        assert_eq!(RoundOutcome::Interrupted { generation: 5 }.generation(), 5);
    }
}
