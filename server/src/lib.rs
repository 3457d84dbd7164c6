//! # Number Survival Server Library
//!
//! This library provides the match coordinator for the Number Survival game:
//! a multiplayer elimination game played over UDP with a line-oriented text
//! protocol. Every round each player in the match picks a number between 0
//! and 100; the player closest to 80% of the average loses nothing and the
//! others lose points. A player whose score reaches the elimination
//! threshold is out, and the last one standing wins.
//!
//! ## Core Responsibilities
//!
//! ### Player Sessions
//! Each sender endpoint is one session. The first datagram registers a
//! nickname; after that the session moves through the menu, the match and
//! the rounds according to what the player sends and what happens to the
//! rest of the party.
//!
//! ### Round Synchronization
//! Every player in the match crosses a round barrier once per round by
//! submitting a number. The last crossing scores the round while the other
//! submitters wait. When the party changes mid-round the barrier is rebuilt
//! for the new head count and the waiting players are asked to resubmit.
//!
//! ### Authoritative Scoring
//! Targets, rankings and penalties are computed only here. Clients never
//! see each other's numbers, only the round's average and target.
//!
//! ## Architecture Design
//!
//! ### One Task Per Datagram
//! A receive task feeds a dispatch loop, which hands each datagram to a
//! spawned task. A semaphore bounds how many of those run at once, since a
//! submitter keeps its task suspended until the round resolves.
//!
//! ### Single Coarse Lock
//! The registry, the admission gate and the current barrier generation are
//! only touched together under one mutex. State transitions are
//! synchronous and return an outbox of notices; delivery happens after the
//! lock is released, so a slow or failing send never stalls the match.
//!
//! ## Module Organization
//!
//! ### Registry Module (`registry`)
//! Registered players, their nicknames, scores, pending choices and
//! participation state.
//!
//! ### Admission Module (`admission`)
//! The counting gate that caps the match at the party size.
//!
//! ### Barrier Module (`barrier`)
//! Round barrier generations and the tickets waiting submitters hold.
//!
//! ### Scoring Module (`scoring`)
//! Pure round scoring: mean, target, stable ranking and penalty tables.
//!
//! ### Coordinator Module (`coordinator`)
//! The session state machine and the lock-guarded match coordinator.
//!
//! ### Network Module (`network`)
//! UDP transport, notice delivery and the dispatch loop.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::{MatchConfig, ServerConfig};
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::new("127.0.0.1:3000", 10, MatchConfig::default());
//!     let mut server = Server::new(config).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod admission;
pub mod barrier;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod network;
pub mod registry;
pub mod scoring;
