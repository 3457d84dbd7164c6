//! Match coordinator and per-player session state machine
//!
//! All shared match state lives in [`MatchState`]: the player registry, the
//! admission gate, the current round barrier generation and the match phase.
//! [`MatchCoordinator`] keeps it behind a single lock, so joins, exits,
//! submissions and round resolution are serialized against each other and no
//! lock ordering is ever needed.
//!
//! State transitions never perform I/O. Each one returns an [`Outbox`] of
//! notices that the caller delivers after the lock has been released.

use crate::admission::AdmissionGate;
use crate::barrier::{Crossing, RoundBarrier, RoundOutcome, RoundTicket};
use crate::config::MatchConfig;
use crate::error::CoordinatorError;
use crate::registry::{Choice, ParticipationState, Player, PlayerRegistry, SessionId};
use crate::scoring::{self, Submission};
use log::{debug, info, warn};
use shared::MenuCode;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::Mutex;

/// Phase of the match as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Admissions open, fewer than the party size have joined
    AwaitingPlayers,
    /// Rounds are being played
    InProgress,
    /// A winner was declared or everyone left; the registry is being reset
    Finished,
}

/// A text payload for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub to: SessionId,
    pub text: String,
}

/// Notices produced by one state transition, in delivery order
#[derive(Debug, Default)]
pub struct Outbox {
    notices: Vec<Notice>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, to: SessionId, text: impl Into<String>) {
        self.notices.push(Notice {
            to,
            text: text.into(),
        });
    }

    pub fn extend(&mut self, other: Outbox) {
        self.notices.extend(other.notices);
    }

    /// Texts addressed to `session`, in order
    pub fn texts_for(&self, session: SessionId) -> Vec<&str> {
        self.notices
            .iter()
            .filter(|n| n.to == session)
            .map(|n| n.text.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

impl IntoIterator for Outbox {
    type Item = Notice;
    type IntoIter = std::vec::IntoIter<Notice>;

    fn into_iter(self) -> Self::IntoIter {
        self.notices.into_iter()
    }
}

/// Result of handling one inbound message
#[derive(Debug, Default)]
pub struct Step {
    pub outbox: Outbox,
    /// Present when the message was a submission that has to wait for the
    /// rest of the party
    pub ticket: Option<RoundTicket>,
}

impl Step {
    fn notices(outbox: Outbox) -> Self {
        Self {
            outbox,
            ticket: None,
        }
    }
}

/// What an input means for the player who sent it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Move(u8),
    Menu(MenuCode),
    Quit,
}

/// Shared match state. Every method expects to run under the coordinator lock.
#[derive(Debug)]
pub struct MatchState {
    config: MatchConfig,
    phase: MatchPhase,
    registry: PlayerRegistry,
    gate: AdmissionGate,
    barrier: RoundBarrier,
    /// Sessions that ended as eliminated or winner
    closed: HashSet<SessionId>,
    rounds_resolved: u64,
}

impl MatchState {
    pub fn new(config: MatchConfig) -> Self {
        let gate = AdmissionGate::new(config.party_size);
        Self {
            config,
            phase: MatchPhase::AwaitingPlayers,
            registry: PlayerRegistry::new(),
            gate,
            barrier: RoundBarrier::new(0, 0),
            closed: HashSet::new(),
            rounds_resolved: 0,
        }
    }

    /// Routes one trimmed message from `session` through the state machine
    pub fn handle_input(&mut self, session: SessionId, raw: &str) -> Step {
        let text = raw.trim();

        if self.closed.contains(&session) {
            debug!("Dropping message from closed session {}", session);
            return Step::default();
        }

        let Some(player) = self.registry.find(session) else {
            return Step::notices(self.register(session, text));
        };
        let nickname = player.nickname.clone();

        match self.interpret(player, text) {
            Ok(Input::Move(value)) => self.submit(&nickname, value),
            Ok(Input::Menu(MenuCode::Rules)) => {
                let mut outbox = Outbox::new();
                outbox.push(session, shared::RULES);
                self.reissue_prompt(&nickname, &mut outbox);
                Step::notices(outbox)
            }
            Ok(Input::Menu(MenuCode::JoinMatch)) => Step::notices(self.join(&nickname)),
            Ok(Input::Menu(MenuCode::Exit)) | Ok(Input::Quit) => {
                Step::notices(self.leave(&nickname))
            }
            Err(err) => Step::notices(self.reject(&nickname, err)),
        }
    }

    /// Same as a voluntary exit, for senders the transport gave up on
    pub fn disconnect(&mut self, session: SessionId) -> Outbox {
        match self.registry.find(session) {
            Some(player) => {
                let nickname = player.nickname.clone();
                self.leave(&nickname)
            }
            None => Outbox::new(),
        }
    }

    /// Resolves barrier generation `generation` with the choices received
    /// so far, unless it already ended.
    pub fn expire_round(&mut self, generation: u64) -> Outbox {
        let mut outbox = Outbox::new();
        if self.phase != MatchPhase::InProgress || self.barrier.generation() != generation {
            return outbox;
        }
        if !self.barrier.force_trip() {
            return outbox;
        }

        warn!(
            "Round {} timed out with {}/{} choices",
            generation,
            self.barrier.arrived_count(),
            self.barrier.size()
        );
        self.resolve_round(&mut outbox);
        outbox
    }

    /// A number in range is a move only for a player in a running match;
    /// otherwise numbers are menu codes.
    fn interpret(&self, player: &Player, text: &str) -> Result<Input, CoordinatorError> {
        if text == shared::QUIT_ALIAS {
            return Ok(Input::Quit);
        }
        if player.is_active() && self.phase == MatchPhase::InProgress {
            if let Some(value) = shared::parse_choice(text) {
                return Ok(Input::Move(value));
            }
        }
        match shared::parse_number(text) {
            Some(number) => MenuCode::from_number(number)
                .map(Input::Menu)
                .ok_or_else(|| CoordinatorError::InvalidMenuOption(text.to_string())),
            None => Err(CoordinatorError::InvalidChoice(text.to_string())),
        }
    }

    fn register(&mut self, session: SessionId, nickname: &str) -> Outbox {
        let mut outbox = Outbox::new();
        match self.registry.register(nickname, session) {
            Ok(player) => {
                outbox.push(session, shared::menu(&player.nickname));
                self.broadcast_ready_count(&mut outbox);
            }
            Err(err) => {
                info!("Rejected registration from {}: {}", session, err);
                outbox.push(session, self.notice_for(&err));
            }
        }
        outbox
    }

    fn join(&mut self, nickname: &str) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(player) = self.registry.get_mut(nickname) else {
            return outbox;
        };
        let session = player.session;

        if let Err(err) = self.gate.try_admit(player) {
            let mut outbox = self.reject(nickname, err);
            self.broadcast_ready_count(&mut outbox);
            return outbox;
        }

        info!(
            "Player {} joined the match ({}/{})",
            nickname,
            self.gate.admitted(),
            self.gate.capacity()
        );

        if self.phase == MatchPhase::InProgress || self.gate.is_saturated() {
            self.start_round(&mut outbox);
        } else {
            outbox.push(
                session,
                shared::waiting_for_players(self.gate.admitted(), self.gate.capacity()),
            );
        }
        self.broadcast_ready_count(&mut outbox);
        outbox
    }

    /// Rebuilds the barrier for everyone in the match and prompts them
    fn start_round(&mut self, outbox: &mut Outbox) {
        let restarting = self.phase == MatchPhase::InProgress;
        if !restarting {
            info!(
                "{} players ready, starting the match",
                self.gate.admitted()
            );
            // Sessions closed in earlier matches may register again
            self.closed.clear();
        }
        self.phase = MatchPhase::InProgress;

        let active = self.registry.snapshot_active();
        self.registry.clear_choices();
        self.barrier.advance(active.len());

        let opening = if restarting {
            shared::ROUND_RESTARTED
        } else {
            shared::MATCH_STARTED
        };
        for player in &active {
            outbox.push(player.session, opening);
            outbox.push(player.session, shared::CHOICE_PROMPT);
        }
    }

    fn submit(&mut self, nickname: &str, value: u8) -> Step {
        let mut outbox = Outbox::new();
        let Some(session) = self.registry.get(nickname).map(|p| p.session) else {
            return Step::default();
        };

        let order = self.barrier.arrived_count();
        let crossing = match self.barrier.cross(session) {
            Ok(crossing) => crossing,
            Err(err) => return Step::notices(self.reject(nickname, err)),
        };

        if let Some(player) = self.registry.get_mut(nickname) {
            player.choice = Some(Choice { value, order });
        }
        info!("Player {} chose {}", nickname, value);
        outbox.push(session, shared::choice_acknowledged(value));

        match crossing {
            Crossing::Tripped { generation } => {
                debug!("Player {} completed round {}", nickname, generation);
                self.resolve_round(&mut outbox);
                Step::notices(outbox)
            }
            Crossing::Waiting(ticket) => Step {
                outbox,
                ticket: Some(ticket),
            },
        }
    }

    /// Scores the tripped barrier generation, applies eliminations and
    /// decides what comes next.
    fn resolve_round(&mut self, outbox: &mut Outbox) {
        self.rounds_resolved += 1;
        let active = self.registry.snapshot_active();
        let submissions: Vec<Submission> = active
            .iter()
            .filter_map(|p| p.choice.map(|c| Submission::new(p.nickname.clone(), c.value)))
            .collect();

        let Some(score) = scoring::score_round(&submissions, self.config.target_multiplier) else {
            info!("No choices this round, replaying it");
            self.registry.clear_choices();
            self.barrier.advance(active.len());
            for player in &active {
                outbox.push(player.session, shared::NO_CHOICES);
                outbox.push(player.session, shared::current_score(player.score));
                outbox.push(player.session, shared::CHOICE_PROMPT);
            }
            return;
        };

        info!(
            "Round {}: {} choices, mean {:.2}, target {:.2}",
            self.barrier.generation(),
            submissions.len(),
            score.mean,
            score.target
        );

        let mut eliminated = Vec::new();
        for snapshot in &active {
            let delta = score.delta_for(&snapshot.nickname);
            let Some(player) = self.registry.get_mut(&snapshot.nickname) else {
                continue;
            };
            player.score += delta;
            player.choice = None;
            info!("Score of {}: {} ({})", player.nickname, player.score, delta);

            outbox.push(player.session, shared::round_summary(score.mean, score.target));
            if delta < 0 {
                outbox.push(player.session, shared::points_lost(-delta));
            } else {
                outbox.push(player.session, shared::NO_POINTS_LOST);
            }
            outbox.push(player.session, shared::current_score(player.score));
            outbox.push(player.session, shared::ROUND_END);

            if scoring::is_eliminated(player.score, self.config.elimination_threshold) {
                outbox.push(player.session, shared::ELIMINATED_NOTICE);
                eliminated.push(player.nickname.clone());
            }
        }

        for nickname in &eliminated {
            if let Some(mut player) = self.registry.remove(nickname) {
                self.gate
                    .release(&mut player, ParticipationState::Eliminated);
                self.closed.insert(player.session);
                info!("Player {} was eliminated", nickname);
            }
        }

        match self.registry.active_count() {
            0 => self.abandon_match(outbox),
            1 => self.declare_winner(outbox),
            remaining => {
                self.barrier.advance(remaining);
                for player in self.registry.snapshot_active() {
                    outbox.push(player.session, shared::CHOICE_PROMPT);
                }
            }
        }
    }

    fn leave(&mut self, nickname: &str) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(mut player) = self.registry.remove(nickname) else {
            return outbox;
        };
        let was_active = self
            .gate
            .release(&mut player, ParticipationState::Registered);
        info!("Player {} left the game", nickname);
        outbox.push(player.session, shared::EXIT_NOTICE);

        if !was_active || self.phase != MatchPhase::InProgress {
            self.broadcast_ready_count(&mut outbox);
            return outbox;
        }

        match self.registry.active_count() {
            0 => self.abandon_match(&mut outbox),
            1 => self.declare_winner(&mut outbox),
            remaining => {
                let active = self.registry.snapshot_active();
                self.registry.clear_choices();
                let generation = self.barrier.advance(remaining);
                info!(
                    "Party shrank to {}, round barrier rebuilt as generation {}",
                    remaining, generation
                );
                for survivor in &active {
                    if survivor.choice.is_some() {
                        outbox.push(survivor.session, shared::ROUND_INTERRUPTED);
                    } else {
                        outbox.push(
                            survivor.session,
                            shared::player_left(nickname, remaining),
                        );
                    }
                    outbox.push(survivor.session, shared::CHOICE_PROMPT);
                }
                self.broadcast_ready_count(&mut outbox);
            }
        }
        outbox
    }

    /// Ends the match with the single player left in it
    fn declare_winner(&mut self, outbox: &mut Outbox) {
        self.phase = MatchPhase::Finished;
        for mut player in self.registry.clear() {
            if player.is_active() {
                player.state = ParticipationState::Winner;
                self.closed.insert(player.session);
                info!("Player {} won the match", player.nickname);
                outbox.push(player.session, shared::WINNER_NOTICE);
            } else {
                outbox.push(player.session, shared::MATCH_ENDED);
            }
        }
        self.reset_match();
    }

    /// Ends a match nobody is playing any more; registered players stay
    fn abandon_match(&mut self, outbox: &mut Outbox) {
        self.phase = MatchPhase::Finished;
        info!("No players left in the match");
        for player in self.registry.players_mut() {
            player.score = 0;
            player.choice = None;
            player.state = ParticipationState::Registered;
            outbox.push(player.session, shared::NOT_ENOUGH_PLAYERS);
            outbox.push(player.session, shared::menu(&player.nickname));
        }
        self.reset_match();
    }

    fn reset_match(&mut self) {
        self.gate.reset();
        self.barrier.advance(0);
        self.phase = MatchPhase::AwaitingPlayers;
        info!("Ready for a new match");
    }

    fn reject(&self, nickname: &str, err: CoordinatorError) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(player) = self.registry.get(nickname) else {
            return outbox;
        };
        debug!("Rejected input from {}: {}", nickname, err);
        outbox.push(player.session, self.notice_for(&err));
        self.reissue_prompt(nickname, &mut outbox);
        outbox
    }

    /// Repeats whatever the player is expected to answer next
    fn reissue_prompt(&self, nickname: &str, outbox: &mut Outbox) {
        let Some(player) = self.registry.get(nickname) else {
            return;
        };
        if player.is_active() && self.phase == MatchPhase::InProgress {
            if !self.barrier.has_arrived(player.session) {
                outbox.push(player.session, shared::CHOICE_PROMPT);
            }
        } else {
            outbox.push(player.session, shared::menu(&player.nickname));
        }
    }

    fn notice_for(&self, err: &CoordinatorError) -> String {
        match err {
            CoordinatorError::DuplicateNickname(_) => shared::NICKNAME_TAKEN.to_string(),
            CoordinatorError::InvalidNickname(_) => shared::REGISTRATION_REJECTED.to_string(),
            CoordinatorError::MatchFull { .. } => shared::MATCH_FULL.to_string(),
            CoordinatorError::AlreadyInMatch => {
                shared::already_in_match(self.gate.admitted(), self.gate.capacity())
            }
            CoordinatorError::InvalidChoice(_) => shared::INVALID_INPUT.to_string(),
            CoordinatorError::AlreadySubmitted => shared::ALREADY_SUBMITTED.to_string(),
            CoordinatorError::InvalidMenuOption(_) => shared::INVALID_MENU_OPTION.to_string(),
            CoordinatorError::RoundInterrupted => shared::ROUND_INTERRUPTED.to_string(),
        }
    }

    fn broadcast_ready_count(&self, outbox: &mut Outbox) {
        let text = shared::ready_count(
            self.registry.len(),
            self.gate.admitted(),
            self.gate.capacity(),
        );
        for session in self.registry.sessions() {
            outbox.push(session, text.clone());
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn barrier(&self) -> &RoundBarrier {
        &self.barrier
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Number of rounds scored since startup, including replayed empty ones
    pub fn rounds_resolved(&self) -> u64 {
        self.rounds_resolved
    }

    pub fn is_closed(&self, session: SessionId) -> bool {
        self.closed.contains(&session)
    }
}

/// Handle shared by every message-handling task
#[derive(Debug)]
pub struct MatchCoordinator {
    state: Mutex<MatchState>,
    round_timeout: Option<Duration>,
}

impl MatchCoordinator {
    pub fn new(config: MatchConfig) -> Self {
        let round_timeout = config.round_timeout;
        Self {
            state: Mutex::new(MatchState::new(config)),
            round_timeout,
        }
    }

    /// Handles one inbound message under the coordinator lock
    pub async fn handle(&self, session: SessionId, text: &str) -> Step {
        self.state.lock().await.handle_input(session, text)
    }

    pub async fn disconnect(&self, session: SessionId) -> Outbox {
        self.state.lock().await.disconnect(session)
    }

    pub async fn expire_round(&self, generation: u64) -> Outbox {
        self.state.lock().await.expire_round(generation)
    }

    /// Suspends a submitter until its round is resolved or interrupted
    ///
    /// With a round timeout configured, the first waiter to time out
    /// resolves the round with the choices received so far; the notices
    /// that produces are returned alongside the outcome.
    pub async fn wait_for_round(&self, mut ticket: RoundTicket) -> (RoundOutcome, Outbox) {
        let mut outbox = Outbox::new();
        if let Some(limit) = self.round_timeout {
            match tokio::time::timeout(limit, ticket.outcome()).await {
                Ok(outcome) => return (outcome, outbox),
                Err(_) => {
                    debug!(
                        "{} timed out waiting for round {}",
                        ticket.session(),
                        ticket.generation()
                    );
                    outbox.extend(self.expire_round(ticket.generation()).await);
                }
            }
        }
        let outcome = ticket.outcome().await;
        (outcome, outbox)
    }

    /// Runs `f` against the current state under the lock
    pub async fn inspect<R>(&self, f: impl FnOnce(&MatchState) -> R) -> R {
        let state = self.state.lock().await;
        f(&state)
    }
}
