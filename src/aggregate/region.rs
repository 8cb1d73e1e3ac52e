//! Per-region participation and accuracy stats.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{DailyPlayers, DateWindow, PlayerAnswer, Region, RegionRow};

use super::{in_window, round2, RegionThresholds};

/// Participation and guess-rate summary per region.
///
/// The guess rate averages only the region's most accurate players:
/// players below the answer floor are dropped, the rest are ranked by
/// accuracy and truncated to the configured pool before averaging.
/// A region with no eligible players reports no rate rather than NaN.
/// Regions without any answers in the window are omitted; the rest
/// come out in fixed region order.
pub fn compute_region_stats(
    answers: &[PlayerAnswer],
    window: &DateWindow,
    thresholds: &RegionThresholds,
) -> Vec<RegionRow> {
    let mut players: HashMap<Region, HashSet<&str>> = HashMap::new();
    let mut daily: HashMap<(Region, NaiveDate), HashSet<&str>> = HashMap::new();
    // Per (region, player): answers given and answers correct.
    let mut totals: HashMap<(Region, &str), (u64, u64)> = HashMap::new();

    for a in in_window(answers, window) {
        players
            .entry(a.region)
            .or_default()
            .insert(a.player_name.as_str());
        daily
            .entry((a.region, a.date))
            .or_default()
            .insert(a.player_name.as_str());
        let t = totals
            .entry((a.region, a.player_name.as_str()))
            .or_default();
        t.0 += 1;
        t.1 += a.is_correct as u64;
    }

    let mut rows = Vec::new();
    for region in Region::ALL {
        let Some(names) = players.get(&region) else {
            continue;
        };

        // At least one answer means at least one active day.
        let day_counts: Vec<usize> = daily
            .iter()
            .filter(|((r, _), _)| *r == region)
            .map(|(_, set)| set.len())
            .collect();
        let player_average = day_counts.iter().sum::<usize>() as f64 / day_counts.len() as f64;

        let mut rates: Vec<(f64, &str)> = totals
            .iter()
            .filter(|((r, _), (count, _))| *r == region && *count >= thresholds.min_answers)
            .map(|((_, name), (count, correct))| (*correct as f64 / *count as f64, *name))
            .collect();
        rates.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        rates.truncate(thresholds.top_players);

        let average_guess_rate = if rates.is_empty() {
            None
        } else {
            let mean = rates.iter().map(|(rate, _)| rate).sum::<f64>() / rates.len() as f64;
            Some(round2(mean * 100.0))
        };

        rows.push(RegionRow {
            region,
            player_count: names.len() as u64,
            player_average: round2(player_average),
            average_guess_rate,
        });
    }

    debug!("Region stats for {}: {} regions seen", window, rows.len());
    rows
}

/// Distinct players per day across all regions, oldest day first.
pub fn players_per_day(answers: &[PlayerAnswer], window: &DateWindow) -> Vec<DailyPlayers> {
    let mut daily: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    for a in in_window(answers, window) {
        daily
            .entry(a.date)
            .or_default()
            .insert(a.player_name.as_str());
    }

    let mut rows: Vec<DailyPlayers> = daily
        .into_iter()
        .map(|(date, set)| DailyPlayers {
            date,
            player_count: set.len() as u64,
        })
        .collect();
    rows.sort_by_key(|r| r.date);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(player: &str, date: &str, region: Region, is_correct: u8) -> PlayerAnswer {
        PlayerAnswer {
            ranked_id: 1,
            date: date.parse().unwrap(),
            region,
            ranked_song_id: 100,
            ranked_song_number: 1,
            song_id: 9000,
            start_time: 50.0,
            correct_count: 10,
            active_players: 200,
            player_id: 1,
            player_name: player.to_string(),
            anime_id: 185,
            guess_time: 8.0,
            is_correct,
        }
    }

    fn window() -> DateWindow {
        DateWindow::new(
            "2022-10-01".parse().unwrap(),
            "2022-12-31".parse().unwrap(),
        )
        .unwrap()
    }

    fn thresholds(min_answers: u64, top_players: usize) -> RegionThresholds {
        RegionThresholds {
            min_answers,
            top_players,
        }
    }

    #[test]
    fn test_distinct_players_per_region() {
        let answers = vec![
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("miyu", "2022-10-05", Region::Asia, 0),
            row("rin", "2022-10-06", Region::Europe, 1),
        ];

        let rows = compute_region_stats(&answers, &window(), &thresholds(1, 150));
        assert_eq!(rows.len(), 2);
        // Fixed region order: Asia first.
        assert_eq!(rows[0].region, Region::Asia);
        assert_eq!(rows[0].player_count, 1);
        assert_eq!(rows[1].region, Region::Europe);
        assert_eq!(rows[1].player_count, 1);
    }

    #[test]
    fn test_player_average_over_days() {
        let answers = vec![
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("rin", "2022-10-05", Region::Asia, 1),
            row("miyu", "2022-10-06", Region::Asia, 1),
        ];

        let rows = compute_region_stats(&answers, &window(), &thresholds(1, 150));
        // Two players on the 5th, one on the 6th.
        assert_eq!(rows[0].player_average, 1.5);
    }

    #[test]
    fn test_rate_floor_is_inclusive() {
        let answers = vec![
            // miyu: 3 answers, 2 correct. Meets the floor exactly.
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("miyu", "2022-10-05", Region::Asia, 0),
            // rin: 2 perfect answers, below the floor.
            row("rin", "2022-10-05", Region::Asia, 1),
            row("rin", "2022-10-05", Region::Asia, 1),
        ];

        let rows = compute_region_stats(&answers, &window(), &thresholds(3, 150));
        // Only miyu is eligible: 2/3 = 66.67.
        assert_eq!(rows[0].average_guess_rate, Some(66.67));
    }

    #[test]
    fn test_rate_pool_truncated_to_best() {
        let answers = vec![
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("rin", "2022-10-05", Region::Asia, 1),
            row("rin", "2022-10-05", Region::Asia, 0),
        ];

        let rows = compute_region_stats(&answers, &window(), &thresholds(1, 1));
        // Pool of one: rin's 50% never enters the average.
        assert_eq!(rows[0].average_guess_rate, Some(100.0));
    }

    #[test]
    fn test_no_eligible_players_reports_no_rate() {
        let answers = vec![row("miyu", "2022-10-05", Region::Asia, 1)];

        let rows = compute_region_stats(&answers, &window(), &thresholds(850, 150));
        assert_eq!(rows[0].player_count, 1);
        assert_eq!(rows[0].average_guess_rate, None);
    }

    #[test]
    fn test_players_per_day_sorted_and_distinct() {
        let answers = vec![
            row("miyu", "2022-10-06", Region::Asia, 1),
            row("miyu", "2022-10-05", Region::Europe, 1),
            row("miyu", "2022-10-05", Region::Asia, 1),
            row("rin", "2022-10-05", Region::Asia, 1),
        ];

        let rows = players_per_day(&answers, &window());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2022-10-05".parse::<NaiveDate>().unwrap());
        assert_eq!(rows[0].player_count, 2);
        assert_eq!(rows[1].player_count, 1);
    }
}
