//! Player leaderboards: best match score, songs played, solo points.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    DateWindow, Leaderboard, PlayerAnswer, PlayerCount, Region, ScoreRow, SoloRow, TimeRow,
    TopPlayers,
};

use super::in_window;

struct BestScore {
    score: u32,
    date: NaiveDate,
    region: Region,
    ranked_id: i64,
}

/// Full, untruncated leaderboards for the window.
///
/// Each list is sorted descending with ties broken by player name, so
/// rank lookups against it are reproducible run to run. Players appear
/// only in the lists they scored in: no solo point, no solo row.
pub fn build_leaderboard(answers: &[PlayerAnswer], window: &DateWindow) -> Leaderboard {
    let mut match_scores: HashMap<(String, i64), BestScore> = HashMap::new();
    let mut songs_played: HashMap<String, u64> = HashMap::new();
    let mut solo_points: HashMap<String, u64> = HashMap::new();

    for a in in_window(answers, window) {
        let entry = match_scores
            .entry((a.player_name.clone(), a.ranked_id))
            .or_insert(BestScore {
                score: 0,
                date: a.date,
                region: a.region,
                ranked_id: a.ranked_id,
            });
        entry.score += a.is_correct as u32;

        *songs_played.entry(a.player_name.clone()).or_default() += 1;

        if a.is_solo() {
            *solo_points.entry(a.player_name.clone()).or_default() += 1;
        }
    }

    // Best match per player. Equal scores resolve to the earliest
    // match (then lowest id) so the reported date never flaps.
    let mut best: HashMap<String, BestScore> = HashMap::new();
    for ((player, _), m) in match_scores {
        let replace = match best.get(&player) {
            None => true,
            Some(b) => {
                m.score > b.score
                    || (m.score == b.score && (m.date, m.ranked_id) < (b.date, b.ranked_id))
            }
        };
        if replace {
            best.insert(player, m);
        }
    }

    let mut scores: Vec<ScoreRow> = best
        .into_iter()
        .map(|(player_name, b)| ScoreRow {
            player_name,
            score: b.score,
            date: b.date,
            region: b.region,
        })
        .collect();
    scores.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });

    let mut times: Vec<PlayerCount> = songs_played
        .into_iter()
        .map(|(player_name, count)| PlayerCount { player_name, count })
        .collect();
    times.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });

    let mut solos: Vec<PlayerCount> = solo_points
        .into_iter()
        .map(|(player_name, count)| PlayerCount { player_name, count })
        .collect();
    solos.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.player_name.cmp(&b.player_name))
    });

    debug!(
        "Leaderboards for {}: {} scored, {} played, {} soloed",
        window,
        scores.len(),
        times.len(),
        solos.len()
    );

    Leaderboard {
        scores,
        times,
        solos,
    }
}

/// Top `limit` players on each leaderboard.
///
/// The songs-played table is built in two stages: total counts pick
/// the player set, then the kept players are expanded back into one
/// row per region they played in. A player outside the top set never
/// contributes a region row, however active they were there.
pub fn compute_top_players(
    answers: &[PlayerAnswer],
    window: &DateWindow,
    limit: usize,
) -> TopPlayers {
    let leaderboard = build_leaderboard(answers, window);

    let mut top_score = leaderboard.scores;
    top_score.truncate(limit);

    let mut totals = leaderboard.times;
    totals.truncate(limit);

    let mut per_region: HashMap<(String, Region), u64> = HashMap::new();
    for a in in_window(answers, window) {
        *per_region
            .entry((a.player_name.clone(), a.region))
            .or_default() += 1;
    }

    let mut top_time = Vec::new();
    for player in &totals {
        for region in Region::ALL {
            if let Some(&count) = per_region.get(&(player.player_name.clone(), region)) {
                top_time.push(TimeRow {
                    player_name: player.player_name.clone(),
                    region,
                    song_count: count,
                });
            }
        }
    }

    let top_solo = leaderboard
        .solos
        .into_iter()
        .take(limit)
        .map(|p| SoloRow {
            player_name: p.player_name,
            solo_count: p.count,
        })
        .collect();

    TopPlayers {
        top_score,
        top_time,
        top_solo,
    }
}
