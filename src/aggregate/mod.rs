//! Aggregations over the joined answer rows.
//!
//! Every function here is a pure function of its inputs: answers in,
//! rows out, no storage access. Rankings always carry a deterministic
//! secondary sort key so repeated runs produce identical artifacts.

mod content;
mod leaderboard;
mod region;
mod standing;

pub use content::compute_song_stats;
pub use leaderboard::{build_leaderboard, compute_top_players};
pub use region::{compute_region_stats, players_per_day};
pub use standing::compute_player_standing;

use thiserror::Error;

use crate::models::{DateWindow, InvertedWindow, PlayerAnswer};

/// How many players the leaderboard artifacts keep by default.
pub const DEFAULT_PLAYER_LIMIT: usize = 30;
/// How many songs the content artifacts keep by default.
pub const DEFAULT_SONG_LIMIT: usize = 20;
/// Answers a player needs before counting toward a region's guess rate.
pub const DEFAULT_REGION_MIN_ANSWERS: u64 = 850;
/// How many of a region's most accurate players feed its average.
pub const DEFAULT_REGION_TOP_PLAYERS: usize = 150;
/// Answer floor for a song label to enter the spam ranking.
pub const DEFAULT_SPAM_MIN_PLAYERS: u64 = 100;
/// Plays a song needs to qualify as "easy".
pub const DEFAULT_EASY_MIN_PLAYS: u64 = 1;
/// Plays a song needs to qualify as "hard".
pub const DEFAULT_HARD_MIN_PLAYS: u64 = 2;
/// Upper score bound (inclusive) of the low-pointer buckets.
pub const DEFAULT_LOW_POINTER_BOUND: u32 = 5;
/// Example songs listed per low-pointer bucket.
pub const DEFAULT_LOW_POINTER_EXAMPLES: usize = 10;
/// Best ranked matches shown in a player report.
pub const DEFAULT_BEST_MATCHES: usize = 5;

/// Errors for invalid aggregation parameters.
///
/// Raised at the boundary (CLI, config) before any aggregation runs;
/// the aggregators themselves assume validated inputs.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error(transparent)]
    Window(#[from] InvertedWindow),
    #[error("limit must be at least 1, got {0}")]
    InvalidLimit(usize),
}

/// Reject limits that would always produce empty tables.
pub fn validate_limit(limit: usize) -> Result<(), ParamError> {
    if limit == 0 {
        return Err(ParamError::InvalidLimit(limit));
    }
    Ok(())
}

/// Eligibility floors for the region guess-rate average.
#[derive(Debug, Clone)]
pub struct RegionThresholds {
    pub min_answers: u64,
    pub top_players: usize,
}

impl Default for RegionThresholds {
    fn default() -> Self {
        Self {
            min_answers: DEFAULT_REGION_MIN_ANSWERS,
            top_players: DEFAULT_REGION_TOP_PLAYERS,
        }
    }
}

/// Eligibility floors for the song tables.
#[derive(Debug, Clone)]
pub struct ContentThresholds {
    pub spam_min_players: u64,
    pub easy_min_plays: u64,
    pub hard_min_plays: u64,
}

impl Default for ContentThresholds {
    fn default() -> Self {
        Self {
            spam_min_players: DEFAULT_SPAM_MIN_PLAYERS,
            easy_min_plays: DEFAULT_EASY_MIN_PLAYS,
            hard_min_plays: DEFAULT_HARD_MIN_PLAYS,
        }
    }
}

/// Knobs for the per-player report.
#[derive(Debug, Clone)]
pub struct StandingOptions {
    pub low_pointer_bound: u32,
    pub max_examples: usize,
    pub best_matches: usize,
}

impl Default for StandingOptions {
    fn default() -> Self {
        Self {
            low_pointer_bound: DEFAULT_LOW_POINTER_BOUND,
            max_examples: DEFAULT_LOW_POINTER_EXAMPLES,
            best_matches: DEFAULT_BEST_MATCHES,
        }
    }
}

/// Answers falling inside the window, in input order.
pub(crate) fn in_window<'a>(
    answers: &'a [PlayerAnswer],
    window: &'a DateWindow,
) -> impl Iterator<Item = &'a PlayerAnswer> {
    answers.iter().filter(|a| window.contains(a.date))
}

/// Round to two decimals, the precision of the published artifacts.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(30).is_ok());
        assert!(matches!(
            validate_limit(0),
            Err(ParamError::InvalidLimit(0))
        ));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.12345), 0.12);
        assert_eq!(round2(66.666), 66.67);
        assert_eq!(round2(50.0), 50.0);
    }

    #[test]
    fn test_default_thresholds() {
        let region = RegionThresholds::default();
        assert_eq!(region.min_answers, 850);
        assert_eq!(region.top_players, 150);

        let content = ContentThresholds::default();
        assert_eq!(content.spam_min_players, 100);
        assert_eq!(content.easy_min_plays, 1);
        assert_eq!(content.hard_min_plays, 2);

        let standing = StandingOptions::default();
        assert_eq!(standing.low_pointer_bound, 5);
        assert_eq!(standing.max_examples, 10);
        assert_eq!(standing.best_matches, 5);
    }
}
