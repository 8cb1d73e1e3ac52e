//! Derived statistic rows produced by the aggregation layer.
//!
//! These are the shapes written to the derived CSV artifacts, so the
//! serde renames pin the exact column headers the dashboards read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Region;

/// One row of the best-score leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRow {
    pub player_name: String,
    /// Best single-match score: correct answers within one ranked.
    pub score: u32,
    /// Date of the match where the best score was set.
    pub date: NaiveDate,
    /// Region of that match.
    pub region: Region,
}

/// One per-region row of the songs-played leaderboard.
///
/// A player active in several regions gets one row per region, so the
/// dashboard can stack them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRow {
    pub player_name: String,
    pub region: Region,
    #[serde(rename = "nbSongs")]
    pub song_count: u64,
}

/// One row of the solo-correct leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoloRow {
    pub player_name: String,
    pub solo_count: u64,
}

/// A per-player count, used by the full (untruncated) leaderboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCount {
    pub player_name: String,
    pub count: u64,
}

/// Full leaderboards over a window: sorted descending, one entry per
/// player seen in the window. Truncated views and rank lookups both
/// derive from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub scores: Vec<ScoreRow>,
    pub times: Vec<PlayerCount>,
    pub solos: Vec<PlayerCount>,
}

/// Truncated leaderboards ready for the derived artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopPlayers {
    pub top_score: Vec<ScoreRow>,
    pub top_time: Vec<TimeRow>,
    pub top_solo: Vec<SoloRow>,
}

/// Per-region aggregate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionRow {
    pub region: Region,

    /// Distinct players seen in the region over the window.
    pub player_count: u64,

    /// Mean number of distinct players per active day.
    pub player_average: f64,

    /// Mean guess rate of the region's qualifying top players, as a
    /// percentage. `None` when nobody cleared the eligibility floor.
    pub average_guess_rate: Option<f64>,
}

/// Distinct players on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPlayers {
    pub date: NaiveDate,
    pub player_count: u64,
}

/// Per-anime play volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSpamRow {
    pub anime_id: i64,
    pub anime_name: String,
    pub play_count: u64,
}

/// Per-song aggregate, grouped on the song's info label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongStatsRow {
    pub song_info: String,
    pub song_name: String,
    pub song_artist: String,
    pub anime_name: String,

    /// Distinct ranked matches the song appeared in.
    pub play_count: u64,

    /// Total answers recorded against the song.
    pub player_count: u64,

    /// Percentage of those answers that were correct.
    pub guess_rate: f64,
}

/// The four derived song tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSongs {
    pub top_spam_anime: Vec<AnimeSpamRow>,
    pub top_spam_songs: Vec<SongStatsRow>,
    pub top_easy_songs: Vec<SongStatsRow>,
    pub top_hard_songs: Vec<SongStatsRow>,
}

/// Inclusive 1-indexed rank range on a leaderboard.
///
/// Players tied on a value share the whole range their group spans:
/// `{min: 2, max: 3}` reads "tied between 2nd and 3rd".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankRange {
    pub min: usize,
    pub max: usize,
}

impl RankRange {
    pub fn is_tied(&self) -> bool {
        self.min != self.max
    }
}

impl std::fmt::Display for RankRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_tied() {
            write!(f, "#{}-{}", self.min, self.max)
        } else {
            write!(f, "#{}", self.min)
        }
    }
}

/// A player's value and rank range on one leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStanding {
    pub value: u64,
    pub rank: RankRange,
}

/// How many ranked matches a player joined in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCount {
    pub region: Region,
    pub ranked_count: u64,
}

/// Headline numbers for one player over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    /// Distinct ranked matches joined.
    pub ranked_count: u64,

    /// Songs the player was present for.
    pub song_count: u64,

    /// Estimated hours in game, at two songs a minute.
    pub play_time_hours: u64,

    pub regions: Vec<RegionCount>,
    pub correct: u64,
    pub incorrect: u64,
}

/// Occurrences where the player was among `correct_count` correct
/// answerers, with up to a handful of example song labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowPointerBucket {
    pub correct_count: u32,
    pub occurrences: u64,
    pub examples: Vec<String>,
}

/// One of a player's highest-scoring matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestMatch {
    pub ranked_id: i64,
    pub score: u32,
    pub date: NaiveDate,
    pub region: Region,
}

/// Guess rate (percentage) on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRate {
    pub date: NaiveDate,
    pub guess_rate: f64,
}

/// A song the player missed more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorstSong {
    pub song_id: i64,
    pub miss_count: u64,
    pub song_name: String,
    pub song_artist: String,
}

/// Everything the per-player view needs, computed in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerReport {
    pub player_name: String,
    pub score: MetricStanding,
    pub time: MetricStanding,
    pub solo: MetricStanding,
    pub profile: ProfileSummary,
    pub low_pointers: Vec<LowPointerBucket>,
    pub best_matches: Vec<BestMatch>,
    pub score_by_date: Vec<DateRate>,
    pub worst_songs: Vec<WorstSong>,
}
