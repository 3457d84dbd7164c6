//! Integration tests for the match server
//!
//! These tests run a real server on an ephemeral UDP port and drive it with
//! real sockets, the same way console clients do.

use client::autoplay::AutoPlayer;
use client::network::{Client, SessionEnd};
use server::config::{MatchConfig, ServerConfig};
use server::network::Server;
use shared::{CHOICE_PROMPT, MAX_DATAGRAM_SIZE, MENU_PROMPT};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

async fn start_server(game: MatchConfig) -> SocketAddr {
    let config = ServerConfig::new("127.0.0.1:0", 10, game);
    let mut server = Server::new(config).await.expect("Failed to start server");
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// A raw protocol participant
struct TestPlayer {
    socket: UdpSocket,
    server: SocketAddr,
}

impl TestPlayer {
    async fn connect(server: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind player socket");
        TestPlayer { socket, server }
    }

    async fn send(&self, text: &str) {
        self.socket.send_to(text.as_bytes(), self.server).await.unwrap();
    }

    async fn recv(&self) -> String {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = timeout(RECV_TIMEOUT, self.socket.recv_from(&mut buf))
            .await
            .expect("Timed out waiting for the server")
            .unwrap();
        String::from_utf8_lossy(&buf[..len]).to_string()
    }

    /// Reads until a datagram contains `needle`, returning everything read
    async fn expect(&self, needle: &str) -> Vec<String> {
        let mut seen = Vec::new();
        loop {
            let text = self.recv().await;
            let found = text.contains(needle);
            seen.push(text);
            if found {
                return seen;
            }
        }
    }
}

/// Registers every player and joins them into one match
async fn join_all(players: &[(&TestPlayer, &str)]) {
    for (player, name) in players {
        player.send(name).await;
        player.expect(MENU_PROMPT).await;
    }
    for (player, _) in players {
        player.send("2").await;
    }
    for (player, _) in players {
        player.expect(CHOICE_PROMPT).await;
    }
}

/// MATCH FLOW TESTS
mod match_tests {
    use super::*;

    /// Plays one full round and checks the penalties each player receives
    #[tokio::test]
    async fn three_player_round_over_udp() {
        let server = start_server(MatchConfig::default()).await;
        let alice = TestPlayer::connect(server).await;
        let bob = TestPlayer::connect(server).await;
        let carol = TestPlayer::connect(server).await;
        join_all(&[(&alice, "alice"), (&bob, "bob"), (&carol, "carol")]).await;

        alice.send("10").await;
        bob.send("50").await;
        carol.send("90").await;

        let report = bob.expect(&shared::current_score(0)).await;
        assert!(report.contains(&shared::round_summary(50.0, 40.0)));
        assert!(report.iter().any(|t| t == shared::NO_POINTS_LOST));
        alice.expect(&shared::current_score(-1)).await;
        carol.expect(&shared::current_score(-2)).await;

        // The next round starts right away
        for player in [&alice, &bob, &carol] {
            player.expect(CHOICE_PROMPT).await;
        }
    }

    /// A player leaving mid-round releases the others without a deadlock
    #[tokio::test]
    async fn exit_mid_round_restarts_for_survivors() {
        let server = start_server(MatchConfig::default()).await;
        let alice = TestPlayer::connect(server).await;
        let bob = TestPlayer::connect(server).await;
        let carol = TestPlayer::connect(server).await;
        join_all(&[(&alice, "alice"), (&bob, "bob"), (&carol, "carol")]).await;

        alice.send("10").await;
        alice.expect(&shared::choice_acknowledged(10)).await;

        carol.send("quit").await;
        carol.expect(shared::EXIT_NOTICE).await;

        alice.expect(shared::ROUND_INTERRUPTED).await;
        alice.expect(CHOICE_PROMPT).await;
        bob.expect(&shared::player_left("carol", 2)).await;
        bob.expect(CHOICE_PROMPT).await;

        alice.send("20").await;
        bob.send("80").await;
        alice.expect(&shared::current_score(0)).await;
        bob.expect(&shared::current_score(-1)).await;
    }

    /// The last player standing after an exit wins
    #[tokio::test]
    async fn exit_leaves_winner_in_two_player_match() {
        let server = start_server(MatchConfig::default().with_party_size(2)).await;
        let alice = TestPlayer::connect(server).await;
        let bob = TestPlayer::connect(server).await;
        join_all(&[(&alice, "alice"), (&bob, "bob")]).await;

        alice.send("quit").await;
        alice.expect(shared::EXIT_NOTICE).await;
        bob.expect(shared::WINNER_NOTICE).await;

        // Alice may register again for the next match
        alice.send("alice").await;
        alice.expect(MENU_PROMPT).await;
    }

    /// A fourth player is turned away while the match is full
    #[tokio::test]
    async fn full_match_turns_players_away() {
        let server = start_server(MatchConfig::default()).await;
        let alice = TestPlayer::connect(server).await;
        let bob = TestPlayer::connect(server).await;
        let carol = TestPlayer::connect(server).await;
        join_all(&[(&alice, "alice"), (&bob, "bob"), (&carol, "carol")]).await;

        let dave = TestPlayer::connect(server).await;
        dave.send("dave").await;
        dave.expect(MENU_PROMPT).await;
        dave.send("2").await;
        let replies = dave.expect(MENU_PROMPT).await;
        assert!(replies.iter().any(|t| t == shared::MATCH_FULL));
    }

    /// A silent player cannot stall the round once a timeout is configured
    #[tokio::test]
    async fn round_timeout_resolves_without_silent_player() {
        let game = MatchConfig::default()
            .with_party_size(2)
            .with_round_timeout(Some(Duration::from_millis(200)));
        let server = start_server(game).await;
        let alice = TestPlayer::connect(server).await;
        let bob = TestPlayer::connect(server).await;
        join_all(&[(&alice, "alice"), (&bob, "bob")]).await;

        alice.send("30").await;
        alice.expect(&shared::current_score(0)).await;
        bob.expect(&shared::current_score(0)).await;
        alice.expect(CHOICE_PROMPT).await;
    }
}

/// REGISTRATION TESTS
mod registration_tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_and_numeric_nicknames_are_refused() {
        let server = start_server(MatchConfig::default()).await;
        let first = TestPlayer::connect(server).await;
        let second = TestPlayer::connect(server).await;
        let third = TestPlayer::connect(server).await;

        first.send("alice").await;
        first.expect(MENU_PROMPT).await;

        second.send("alice").await;
        assert_eq!(second.recv().await, shared::NICKNAME_TAKEN);

        third.send("42").await;
        assert_eq!(third.recv().await, shared::REGISTRATION_REJECTED);

        // A refused session can try again
        second.send("bob").await;
        second.expect(MENU_PROMPT).await;
    }

    #[tokio::test]
    async fn rules_are_sent_before_the_menu() {
        let server = start_server(MatchConfig::default()).await;
        let player = TestPlayer::connect(server).await;
        player.send("alice").await;
        player.expect(MENU_PROMPT).await;

        player.send("1").await;
        let replies = player.expect(MENU_PROMPT).await;
        assert!(replies.iter().any(|t| t == shared::RULES));
    }
}

/// CLIENT TESTS
mod client_tests {
    use super::*;

    /// Three automatic clients play a whole match against a real server
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn auto_clients_play_to_a_single_winner() {
        let server = start_server(MatchConfig::default()).await;
        let server = server.to_string();

        let mut sessions = Vec::new();
        for (seed, name) in [(1, "ann"), (2, "ben"), (3, "cat")] {
            let mut client = Client::new(&server, true)
                .await
                .unwrap()
                .with_autoplay(AutoPlayer::with_seed(seed))
                .quiet();
            sessions.push(tokio::spawn(async move {
                client.run(name).await.map_err(|e| e.to_string())
            }));
        }

        let mut ends = Vec::new();
        for session in sessions {
            let end = timeout(Duration::from_secs(30), session)
                .await
                .expect("Match did not finish")
                .unwrap()
                .unwrap();
            ends.push(end);
        }

        let winners = ends.iter().filter(|e| **e == SessionEnd::Won).count();
        let eliminated = ends.iter().filter(|e| **e == SessionEnd::Eliminated).count();
        assert_eq!(winners, 1);
        assert_eq!(eliminated, 2);
    }
}
