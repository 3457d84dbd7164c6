//! Scoring engine
//!
//! Pure functions from the choices submitted in a round to the target
//! value, the ranking and each submitter's penalty. Equidistant choices
//! keep their submission order: the ranking uses a stable sort over the
//! submissions as given, and callers pass them in arrival order.

/// A choice as it arrived at the barrier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub nickname: String,
    pub value: u8,
}

impl Submission {
    pub fn new(nickname: impl Into<String>, value: u8) -> Self {
        Self {
            nickname: nickname.into(),
            value,
        }
    }
}

/// A submission's place in the round's ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub nickname: String,
    pub value: u8,
    /// Absolute distance from the target value
    pub distance: f64,
    /// Score change, zero or negative
    pub delta: i32,
}

/// Outcome of scoring one round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundScore {
    pub mean: f64,
    pub target: f64,
    /// Closest first
    pub ranking: Vec<Ranked>,
}

impl RoundScore {
    /// Score change for `nickname`, zero if they did not submit
    pub fn delta_for(&self, nickname: &str) -> i32 {
        self.ranking
            .iter()
            .find(|r| r.nickname == nickname)
            .map(|r| r.delta)
            .unwrap_or(0)
    }
}

/// Penalties from closest to farthest for a given number of submitters
///
/// Only the three- and two-player regimes lose points; any other count
/// (a lone submitter after departures) is scored without penalties.
pub fn penalty_table(submitters: usize) -> &'static [i32] {
    match submitters {
        3 => &[0, -1, -2],
        2 => &[0, -1],
        _ => &[],
    }
}

pub fn mean(values: &[u8]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    Some(sum / values.len() as f64)
}

/// `mean(values) * multiplier`, or None without values
pub fn target_value(values: &[u8], multiplier: f64) -> Option<f64> {
    mean(values).map(|m| m * multiplier)
}

/// Scores a round. Returns None if nobody submitted.
pub fn score_round(submissions: &[Submission], multiplier: f64) -> Option<RoundScore> {
    let values: Vec<u8> = submissions.iter().map(|s| s.value).collect();
    let mean = mean(&values)?;
    let target = mean * multiplier;

    let mut ranking: Vec<Ranked> = submissions
        .iter()
        .map(|s| Ranked {
            nickname: s.nickname.clone(),
            value: s.value,
            distance: (s.value as f64 - target).abs(),
            delta: 0,
        })
        .collect();

    // sort_by is stable: ties keep submission order
    ranking.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let table = penalty_table(ranking.len());
    for (ranked, delta) in ranking.iter_mut().zip(table) {
        ranked.delta = *delta;
    }

    Some(RoundScore {
        mean,
        target,
        ranking,
    })
}

pub fn is_eliminated(score: i32, threshold: i32) -> bool {
    score <= threshold
}
