//! Song catalog rows from the collector's `anime_songs` table.

use serde::{Deserialize, Serialize};

/// One song as catalogued by the collector.
///
/// A song can appear under several anime entries (openings reused
/// across seasons, character song compilations), so `song_id` is not
/// unique on its own; the `(anime_id, song_id)` pair is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub anime_id: i64,
    pub ann_id: i64,
    pub anime_name: String,
    pub song_id: i64,
    pub song_name: String,
    pub song_artist: String,
    pub song_type: u32,
    pub song_number: u32,
    pub song_difficulty: f64,
}

impl Song {
    /// Human-readable label used when grouping plays of the same song
    /// across anime entries.
    pub fn info_label(&self) -> String {
        format!("{} by {}", self.song_name, self.song_artist)
    }
}
