//! Performance benchmarks for the scoring engine and the match coordinator

use server::barrier::{Crossing, RoundBarrier};
use server::config::{MatchConfig, TARGET_MULTIPLIER};
use server::coordinator::{MatchPhase, MatchState};
use server::scoring::{score_round, Submission};
use std::net::SocketAddr;
use std::time::Instant;

fn addr(port: u16) -> SocketAddr {
    format!("127.0.0.1:{}", port).parse().unwrap()
}

/// Benchmarks scoring of three-player rounds
#[test]
fn benchmark_round_scoring() {
    let submissions = vec![
        Submission::new("alice", 10),
        Submission::new("bob", 50),
        Submission::new("carol", 90),
    ];

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = score_round(&submissions, TARGET_MULTIPLIER);
    }

    let duration = start.elapsed();
    println!(
        "Round scoring: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds even without optimizations
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks barrier crossings and generation swaps
#[test]
fn benchmark_barrier_generations() {
    let mut barrier = RoundBarrier::new(0, 3);
    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let mut tickets = Vec::with_capacity(2);
        for port in 1..=3 {
            match barrier.cross(addr(port)).unwrap() {
                Crossing::Waiting(ticket) => tickets.push(ticket),
                Crossing::Tripped { .. } => {}
            }
        }
        barrier.advance(3);
        drop(tickets);
    }

    let duration = start.elapsed();
    println!(
        "Barrier generations: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(barrier.generation(), iterations);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks whole matches through the session state machine
#[test]
fn benchmark_full_matches() {
    let players = [(1, "alice"), (2, "bob"), (3, "carol")];
    let matches = 500;
    let mut rounds = 0;
    let start = Instant::now();

    for _ in 0..matches {
        let mut state = MatchState::new(MatchConfig::default());
        for (port, name) in players {
            state.handle_input(addr(port), name);
        }
        for (port, _) in players {
            state.handle_input(addr(port), "2");
        }

        let mut round = 0u32;
        while state.phase() == MatchPhase::InProgress {
            for (i, (port, _)) in players.iter().enumerate() {
                let choice = (round * 37 + i as u32 * 29) % 101;
                state.handle_input(addr(*port), &choice.to_string());
            }
            round += 1;
        }
        rounds += state.rounds_resolved();
        assert!(state.registry().is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Full matches: {} matches ({} rounds) in {:?} ({:.2} μs/round)",
        matches,
        rounds,
        duration,
        duration.as_micros() as f64 / rounds as f64
    );

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}
