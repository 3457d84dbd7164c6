//! Text protocol shared by the game server and the console client.
//!
//! Every datagram is a UTF-8 line (or a few lines) of plain text. Clients
//! send nicknames, menu codes and numeric choices; the server answers with
//! the notices built here. The client never parses structure out of a
//! notice, it only needs to know which [`ServerCue`] a datagram carries.

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Keeps the menu greeting well inside one datagram.
pub const MAX_NICKNAME_LEN: usize = 32;

pub const MIN_CHOICE: u8 = 0;
pub const MAX_CHOICE: u8 = 100;

/// Non-numeric exit command, accepted in every non-terminal state.
pub const QUIT_ALIAS: &str = "quit";

pub const MENU_PROMPT: &str = "What would you like to do:";
pub const CHOICE_PROMPT: &str = "Choose a number between 0 and 100:";

pub const EXIT_NOTICE: &str = "You chose to leave the game. See you!";
pub const ELIMINATED_NOTICE: &str = "You have been eliminated!";
pub const WINNER_NOTICE: &str = "Congratulations! You are the winner!";

pub const REGISTRATION_REJECTED: &str =
    "Sorry, the registration input is invalid (empty, a number or longer than 32 characters).";
pub const NICKNAME_TAKEN: &str = "Sorry, this nickname is already taken.";

pub const INVALID_INPUT: &str =
    "Invalid input. Type a number for the menu option or for your move.";
pub const INVALID_MENU_OPTION: &str = "Invalid menu option. Type 1, 2 or 3.";
pub const MATCH_FULL: &str = "The match is full. Please try again later.";
pub const MATCH_STARTED: &str = "Opponents found. Let the games begin...";
pub const ROUND_INTERRUPTED: &str =
    "Round interrupted: the party changed. Please submit your number again.";
pub const ROUND_RESTARTED: &str = "The party changed. A new round starts now.";
pub const ALREADY_SUBMITTED: &str =
    "You already chose a number this round. Waiting for the other players...";
pub const NO_CHOICES: &str = "No valid number was chosen this round. Scores stay the same.";
pub const NO_POINTS_LOST: &str = "You did not lose points this round.";
pub const ROUND_END: &str = "------------------------------------\nEnd of round.";
pub const MATCH_ENDED: &str =
    "The current match has ended. Send your nickname to register again.";
pub const NOT_ENOUGH_PLAYERS: &str =
    "Every player left the match. Type 2 to join a new match.";

pub const RULES: &str = "==\nRules of the Number Survival Game:\n\
==\n\
At the start three players play, each choosing a number from 0 to 100.\n\
The server collects the chosen numbers and computes their average.\n\
The average is multiplied by 0.8; the result is the target value.\n\
Each chosen number is compared against the target value.\n\
The player furthest from the target loses two points.\n\
The player closest to the target loses no points.\n\
The remaining player loses one point.\n\
The first player to reach minus six points is eliminated.\n\
When only two players remain the rules change:\n\
the player furthest from the target loses one point,\n\
the other player loses no points.\n\
The last player standing wins the Number Survival Game.\n\
================================================================";

/// Codes accepted from the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCode {
    Rules,
    JoinMatch,
    Exit,
}

impl MenuCode {
    pub fn from_number(value: i64) -> Option<Self> {
        match value {
            1 => Some(MenuCode::Rules),
            2 => Some(MenuCode::JoinMatch),
            3 => Some(MenuCode::Exit),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            MenuCode::Rules => "1",
            MenuCode::JoinMatch => "2",
            MenuCode::Exit => "3",
        }
    }
}

/// Parses a trimmed line as an integer, the way nicknames and moves are
/// told apart. Leading `+`/`-` signs count as numeric.
pub fn parse_number(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Returns the choice if `text` is an integer inside `[MIN_CHOICE, MAX_CHOICE]`.
pub fn parse_choice(text: &str) -> Option<u8> {
    parse_number(text)
        .filter(|n| (MIN_CHOICE as i64..=MAX_CHOICE as i64).contains(n))
        .map(|n| n as u8)
}

pub fn menu(nickname: &str) -> String {
    format!(
        "Welcome, {}.\n\
         Type {} - to see the game rules.\n\
         Type {} - to join the match.\n\
         Type {} - to leave the game.\n\
         {}",
        nickname,
        MenuCode::Rules.code(),
        MenuCode::JoinMatch.code(),
        MenuCode::Exit.code(),
        MENU_PROMPT
    )
}

pub fn ready_count(registered: usize, ready: usize, party_size: usize) -> String {
    format!(
        "Registered players: {}. {}/{} ready for the match.",
        registered, ready, party_size
    )
}

pub fn waiting_for_players(ready: usize, party_size: usize) -> String {
    format!(
        "Waiting for more players to start the match... ({}/{} ready)",
        ready, party_size
    )
}

pub fn already_in_match(ready: usize, party_size: usize) -> String {
    if ready >= party_size {
        "You are already in the match! Please choose a number.".to_string()
    } else {
        format!(
            "You are already in the match. {}",
            waiting_for_players(ready, party_size)
        )
    }
}

pub fn choice_acknowledged(choice: u8) -> String {
    format!(
        "You chose the number: {}.\nWaiting for the other players...",
        choice
    )
}

pub fn round_summary(mean: f64, target: f64) -> String {
    format!("Average: {:.2}. Target value: {:.2}.", mean, target)
}

pub fn points_lost(points: i32) -> String {
    format!("You lost {} point(s) this round.", points)
}

pub fn current_score(score: i32) -> String {
    format!("Your current score is: {}", score)
}

pub fn player_left(nickname: &str, remaining: usize) -> String {
    format!(
        "{} left the match. {} player(s) remain.",
        nickname, remaining
    )
}

/// What a server datagram asks of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerCue {
    /// The main menu is waiting for a code.
    MenuPrompt,
    /// A number for the current round is expected.
    ChoicePrompt,
    /// The session is over: exit, elimination or victory.
    Terminal,
    /// The nickname was refused; the client should restart.
    RegistrationRejected,
    /// The match this session belonged to is over; register again.
    MatchEnded,
    Info,
}

pub fn classify(text: &str) -> ServerCue {
    if text.contains(EXIT_NOTICE) || text.contains(ELIMINATED_NOTICE) || text.contains(WINNER_NOTICE)
    {
        ServerCue::Terminal
    } else if text.contains(REGISTRATION_REJECTED) || text.contains(NICKNAME_TAKEN) {
        ServerCue::RegistrationRejected
    } else if text.contains(MATCH_ENDED) {
        ServerCue::MatchEnded
    } else if text.contains(CHOICE_PROMPT) {
        ServerCue::ChoicePrompt
    } else if text.contains(MENU_PROMPT) {
        ServerCue::MenuPrompt
    } else {
        ServerCue::Info
    }
}
