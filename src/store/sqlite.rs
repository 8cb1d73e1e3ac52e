//! SQLite backend reading the collector's database.
//!
//! The collector stores `players_answers` denormalized (every answer
//! row repeats its occurrence context) and keeps regions as integer
//! codes. Loading splits the rows back into the canonical tables and
//! maps the codes through [`Region::from_code`], so an unmapped code
//! aborts the load instead of polluting downstream tables.

use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info};

use super::{Dataset, StoreError};
use crate::models::{Answer, RankedSongOccurrence, Region, Song};

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

/// Occurrence columns as stored, before code and date mapping.
struct RawOccurrence {
    ranked_id: i64,
    date: String,
    region: i64,
    ranked_song_id: i64,
    ranked_song_number: u32,
    song_id: i64,
    start_time: f64,
    correct_count: u32,
    active_players: u32,
}

impl SqliteStore {
    /// Open an existing collector database.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::PathNotFound(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Load all three canonical tables.
    pub fn load(&self) -> Result<Dataset, StoreError> {
        let songs = self.load_songs()?;
        let occurrences = self.load_occurrences()?;
        let answers = self.load_answers()?;

        info!(
            "Loaded {} songs, {} occurrences, {} answers from SQLite",
            songs.len(),
            occurrences.len(),
            answers.len()
        );

        Ok(Dataset {
            songs,
            occurrences,
            answers,
        })
    }

    fn load_songs(&self) -> Result<Vec<Song>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT animeId, annId, animeName, songId, songName, songArtist,
                    songType, songNumber, songDifficulty
             FROM anime_songs",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Song {
                    anime_id: row.get(0)?,
                    ann_id: row.get(1)?,
                    anime_name: row.get(2)?,
                    song_id: row.get(3)?,
                    song_name: row.get(4)?,
                    song_artist: row.get(5)?,
                    song_type: row.get(6)?,
                    song_number: row.get(7)?,
                    song_difficulty: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} songs", rows.len());
        Ok(rows)
    }

    fn load_occurrences(&self) -> Result<Vec<RankedSongOccurrence>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT rankedId, date, region, rankedSongId, rankedSongNumber,
                    songId, startTime, correctCount, activePlayers
             FROM rankeds_games",
        )?;

        let raw = stmt
            .query_map([], |row| {
                Ok(RawOccurrence {
                    ranked_id: row.get(0)?,
                    date: row.get(1)?,
                    region: row.get(2)?,
                    ranked_song_id: row.get(3)?,
                    ranked_song_number: row.get(4)?,
                    song_id: row.get(5)?,
                    start_time: row.get(6)?,
                    correct_count: row.get(7)?,
                    active_players: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let rows = raw
            .into_iter()
            .map(|r| {
                let date = r.date.parse().map_err(|e| {
                    StoreError::MalformedRow(format!(
                        "bad date {:?} in rankeds_games: {}",
                        r.date, e
                    ))
                })?;
                Ok(RankedSongOccurrence {
                    ranked_id: r.ranked_id,
                    date,
                    region: Region::from_code(r.region)?,
                    ranked_song_id: r.ranked_song_id,
                    ranked_song_number: r.ranked_song_number,
                    song_id: r.song_id,
                    start_time: r.start_time,
                    correct_count: r.correct_count,
                    active_players: r.active_players,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        debug!("Read {} occurrences", rows.len());
        Ok(rows)
    }

    fn load_answers(&self) -> Result<Vec<Answer>, StoreError> {
        // Only the answer-side columns; the occurrence context repeats
        // what rankeds_games already carries.
        let mut stmt = self.conn.prepare(
            "SELECT rankedSongId, playerId, playerName, animeId, guessTime, isCorrect
             FROM players_answers",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Answer {
                    ranked_song_id: row.get(0)?,
                    player_id: row.get(1)?,
                    player_name: row.get(2)?,
                    anime_id: row.get(3)?,
                    guess_time: row.get(4)?,
                    is_correct: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} answers", rows.len());
        Ok(rows)
    }
}
