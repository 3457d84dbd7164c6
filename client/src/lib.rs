//! # Number Survival Client Library
//!
//! Console client for the Number Survival server. The server drives the
//! whole conversation: the client only forwards lines and prints what comes
//! back. It stays silent until a datagram carries the menu prompt or the
//! choice prompt, and only then reads the next line from the console.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! UDP socket handling and the session loop:
//! - Registration with a nickname
//! - Printing server notices as they arrive
//! - Answering prompts from the console or from the automatic player
//! - Stopping on exit, elimination, victory or a refused nickname
//!
//! ### Autoplay Module (`autoplay`)
//! A player that needs no console: it joins the match and picks random
//! numbers. Handy for filling a party while testing.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, SessionEnd};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::new("127.0.0.1:3000", true).await?;
//!     if client.run("robot").await? == SessionEnd::Won {
//!         println!("The robot won");
//!     }
//!     Ok(())
//! }
//! ```

pub mod autoplay;
pub mod network;
