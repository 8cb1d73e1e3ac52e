//! Song and anime play statistics: spam rankings, easiest and hardest
//! songs.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::{AnimeSpamRow, DateWindow, PlayerAnswer, Song, SongStatsRow, TopSongs};

use super::{in_window, round2, ContentThresholds};

struct SongAccum {
    ranked_ids: HashSet<i64>,
    answers: u64,
    correct: u64,
    // First anime seen for this song in the window.
    anime_id: i64,
}

struct LabelGroup {
    song_name: String,
    song_artist: String,
    play_count: u64,
    player_count: u64,
    rate_sum: f64,
    members: u64,
    anime_name: String,
    // Keeps the anime of the most-played variant.
    best_plays: u64,
    best_song_id: i64,
}

/// The four song tables for the window.
///
/// Songs are first measured individually by `songId` (plays = distinct
/// ranked matches, players = answers, rate = mean correctness), then
/// folded into groups sharing a "{name} by {artist}" label. Different
/// recordings of the same song merge: counts sum, rates average. Songs
/// never played inside the window produce no rows at all, and songs
/// absent from the catalog keep aggregating with the id standing in
/// for their name fields.
pub fn compute_song_stats(
    answers: &[PlayerAnswer],
    songs: &[Song],
    window: &DateWindow,
    limit: usize,
    thresholds: &ContentThresholds,
) -> TopSongs {
    let mut per_song: HashMap<i64, SongAccum> = HashMap::new();
    for a in in_window(answers, window) {
        let acc = per_song.entry(a.song_id).or_insert_with(|| SongAccum {
            ranked_ids: HashSet::new(),
            answers: 0,
            correct: 0,
            anime_id: a.anime_id,
        });
        acc.ranked_ids.insert(a.ranked_id);
        acc.answers += 1;
        acc.correct += a.is_correct as u64;
    }

    let mut catalog: HashMap<i64, &Song> = HashMap::new();
    let mut anime_names: HashMap<i64, &str> = HashMap::new();
    for s in songs {
        catalog.entry(s.song_id).or_insert(s);
        anime_names.entry(s.anime_id).or_insert(s.anime_name.as_str());
    }
    let anime_label = |anime_id: i64| -> String {
        anime_names
            .get(&anime_id)
            .map(|n| n.to_string())
            .unwrap_or_else(|| anime_id.to_string())
    };

    // Anime spam: distinct-match plays summed over each anime's songs.
    let mut anime_counts: HashMap<i64, u64> = HashMap::new();
    for acc in per_song.values() {
        *anime_counts.entry(acc.anime_id).or_default() += acc.ranked_ids.len() as u64;
    }
    let mut top_spam_anime: Vec<AnimeSpamRow> = anime_counts
        .into_iter()
        .map(|(anime_id, play_count)| AnimeSpamRow {
            anime_id,
            anime_name: anime_label(anime_id),
            play_count,
        })
        .collect();
    top_spam_anime.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| a.anime_name.cmp(&b.anime_name))
            .then_with(|| a.anime_id.cmp(&b.anime_id))
    });
    top_spam_anime.truncate(limit);

    // Fold per-song measures into label groups.
    let mut groups: HashMap<String, LabelGroup> = HashMap::new();
    for (&song_id, acc) in &per_song {
        let (song_name, song_artist) = match catalog.get(&song_id) {
            Some(s) => (s.song_name.clone(), s.song_artist.clone()),
            None => (song_id.to_string(), song_id.to_string()),
        };
        let label = format!("{} by {}", song_name, song_artist);
        let plays = acc.ranked_ids.len() as u64;
        let rate = round2(acc.correct as f64 / acc.answers as f64 * 100.0);
        let anime = anime_label(acc.anime_id);

        let group = groups.entry(label).or_insert_with(|| LabelGroup {
            song_name,
            song_artist,
            play_count: 0,
            player_count: 0,
            rate_sum: 0.0,
            members: 0,
            anime_name: anime.clone(),
            best_plays: 0,
            best_song_id: song_id,
        });
        group.play_count += plays;
        group.player_count += acc.answers;
        group.rate_sum += rate;
        group.members += 1;
        if plays > group.best_plays
            || (plays == group.best_plays && song_id < group.best_song_id)
        {
            group.best_plays = plays;
            group.best_song_id = song_id;
            group.anime_name = anime;
        }
    }

    let grouped: Vec<SongStatsRow> = groups
        .into_iter()
        .map(|(song_info, g)| SongStatsRow {
            song_info,
            song_name: g.song_name,
            song_artist: g.song_artist,
            anime_name: g.anime_name,
            play_count: g.play_count,
            player_count: g.player_count,
            guess_rate: round2(g.rate_sum / g.members as f64),
        })
        .collect();

    let mut top_spam_songs: Vec<SongStatsRow> = grouped
        .iter()
        .filter(|r| r.player_count > thresholds.spam_min_players)
        .cloned()
        .collect();
    top_spam_songs.sort_by(|a, b| {
        b.play_count
            .cmp(&a.play_count)
            .then_with(|| a.song_info.cmp(&b.song_info))
    });
    top_spam_songs.truncate(limit);

    let mut top_easy_songs: Vec<SongStatsRow> = grouped
        .iter()
        .filter(|r| r.play_count > thresholds.easy_min_plays)
        .cloned()
        .collect();
    top_easy_songs.sort_by(|a, b| {
        b.guess_rate
            .total_cmp(&a.guess_rate)
            .then_with(|| a.song_info.cmp(&b.song_info))
    });
    top_easy_songs.truncate(limit);

    let mut top_hard_songs: Vec<SongStatsRow> = grouped
        .iter()
        .filter(|r| r.play_count > thresholds.hard_min_plays)
        .cloned()
        .collect();
    top_hard_songs.sort_by(|a, b| {
        a.guess_rate
            .total_cmp(&b.guess_rate)
            .then_with(|| a.song_info.cmp(&b.song_info))
    });
    top_hard_songs.truncate(limit);

    debug!(
        "Song stats for {}: {} labels grouped, {} anime ranked",
        window,
        grouped.len(),
        top_spam_anime.len()
    );

    TopSongs {
        top_spam_anime,
        top_spam_songs,
        top_easy_songs,
        top_hard_songs,
    }
}
