//! Per-player report: rank ranges against the leaderboards plus the
//! profile summary shown on a player page.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    BestMatch, DateRate, DateWindow, Leaderboard, LowPointerBucket, MetricStanding, PlayerAnswer,
    PlayerReport, ProfileSummary, RankRange, Region, RegionCount, Song, WorstSong,
};

use super::{in_window, round2, StandingOptions};

struct MatchInfo {
    score: u32,
    date: NaiveDate,
    region: Region,
}

/// Standing for a tied metric: the rank range spans every player
/// holding the same value in a list sorted descending.
fn metric_standing<T>(
    list: &[T],
    player: &str,
    name_of: impl Fn(&T) -> &str,
    value_of: impl Fn(&T) -> u64,
) -> Option<MetricStanding> {
    let value = list.iter().find(|r| name_of(r) == player).map(&value_of)?;
    let min = list
        .iter()
        .position(|r| value_of(r) == value)
        .map(|i| i + 1)
        .unwrap_or(1);
    let max = list
        .iter()
        .rposition(|r| value_of(r) == value)
        .map(|i| i + 1)
        .unwrap_or(min);
    Some(MetricStanding {
        value,
        rank: RankRange { min, max },
    })
}

/// Full report for one player, or `None` when the player has no
/// answers in the window.
///
/// `leaderboard` must be built from the same answers and window;
/// the rank ranges are positions within it. A player missing from the
/// solo list ranks in the tie group of every player without a solo
/// point.
pub fn compute_player_standing(
    player_name: &str,
    answers: &[PlayerAnswer],
    songs: &[Song],
    leaderboard: &Leaderboard,
    window: &DateWindow,
    options: &StandingOptions,
) -> Option<PlayerReport> {
    let rows: Vec<&PlayerAnswer> = in_window(answers, window)
        .filter(|a| a.player_name == player_name)
        .collect();
    if rows.is_empty() {
        return None;
    }

    let score = metric_standing(
        &leaderboard.scores,
        player_name,
        |r| r.player_name.as_str(),
        |r| r.score as u64,
    )?;
    let time = metric_standing(
        &leaderboard.times,
        player_name,
        |r| r.player_name.as_str(),
        |r| r.count,
    )?;
    let solo = metric_standing(
        &leaderboard.solos,
        player_name,
        |r| r.player_name.as_str(),
        |r| r.count,
    )
    .unwrap_or(MetricStanding {
        value: 0,
        rank: RankRange {
            min: leaderboard.solos.len() + 1,
            max: leaderboard.times.len().max(leaderboard.solos.len() + 1),
        },
    });

    let mut catalog: HashMap<i64, &Song> = HashMap::new();
    for s in songs {
        catalog.entry(s.song_id).or_insert(s);
    }

    // Per-match view of the player's window.
    let mut matches: HashMap<i64, MatchInfo> = HashMap::new();
    let mut correct = 0u64;
    for a in &rows {
        let m = matches.entry(a.ranked_id).or_insert(MatchInfo {
            score: 0,
            date: a.date,
            region: a.region,
        });
        m.score += a.is_correct as u32;
        correct += a.is_correct as u64;
    }

    let song_count = rows.len() as u64;
    let incorrect = song_count - correct;

    let mut region_counts: HashMap<Region, u64> = HashMap::new();
    for m in matches.values() {
        *region_counts.entry(m.region).or_default() += 1;
    }
    let regions: Vec<RegionCount> = Region::ALL
        .into_iter()
        .filter_map(|region| {
            region_counts.get(&region).map(|&ranked_count| RegionCount {
                region,
                ranked_count,
            })
        })
        .collect();

    let profile = ProfileSummary {
        ranked_count: matches.len() as u64,
        song_count,
        // One song is roughly thirty seconds of play.
        play_time_hours: (song_count as f64 / 2.0 / 60.0).round() as u64,
        regions,
        correct,
        incorrect,
    };

    let mut best_matches: Vec<BestMatch> = matches
        .iter()
        .map(|(&ranked_id, m)| BestMatch {
            ranked_id,
            score: m.score,
            date: m.date,
            region: m.region,
        })
        .collect();
    best_matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.date.cmp(&b.date))
            .then_with(|| a.ranked_id.cmp(&b.ranked_id))
    });
    best_matches.truncate(options.best_matches);

    let label = |song_id: i64| -> String {
        catalog
            .get(&song_id)
            .map(|s| s.info_label())
            .unwrap_or_else(|| song_id.to_string())
    };

    let mut low_pointers: Vec<LowPointerBucket> = (1..=options.low_pointer_bound)
        .map(|correct_count| LowPointerBucket {
            correct_count,
            occurrences: 0,
            examples: Vec::new(),
        })
        .collect();
    for a in &rows {
        if a.correct() && (1..=options.low_pointer_bound).contains(&a.correct_count) {
            let bucket = &mut low_pointers[(a.correct_count - 1) as usize];
            bucket.occurrences += 1;
            if bucket.examples.len() < options.max_examples {
                bucket.examples.push(label(a.song_id));
            }
        }
    }

    let mut by_date: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
    for a in &rows {
        let e = by_date.entry(a.date).or_default();
        e.0 += 1;
        e.1 += a.is_correct as u64;
    }
    let mut score_by_date: Vec<DateRate> = by_date
        .into_iter()
        .map(|(date, (total, right))| DateRate {
            date,
            guess_rate: round2(right as f64 / total as f64 * 100.0),
        })
        .collect();
    score_by_date.sort_by_key(|r| r.date);

    let mut misses: HashMap<i64, u64> = HashMap::new();
    for a in &rows {
        if a.is_correct == 0 {
            *misses.entry(a.song_id).or_default() += 1;
        }
    }
    let mut worst_songs: Vec<WorstSong> = misses
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(song_id, miss_count)| {
            let (song_name, song_artist) = match catalog.get(&song_id) {
                Some(s) => (s.song_name.clone(), s.song_artist.clone()),
                None => (song_id.to_string(), song_id.to_string()),
            };
            WorstSong {
                song_id,
                miss_count,
                song_name,
                song_artist,
            }
        })
        .collect();
    worst_songs.sort_by(|a, b| {
        b.miss_count
            .cmp(&a.miss_count)
            .then_with(|| a.song_id.cmp(&b.song_id))
    });

    debug!(
        "Report for {}: {} rankeds, {} songs in {}",
        player_name, profile.ranked_count, profile.song_count, window
    );

    Some(PlayerReport {
        player_name: player_name.to_string(),
        score,
        time,
        solo,
        profile,
        low_pointers,
        best_matches,
        score_by_date,
        worst_songs,
    })
}
