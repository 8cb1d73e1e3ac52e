//! Data lake operations for the ranked pipeline.
//!
//! Layout under the data directory:
//! - `raw/` — the collector's SQLite database
//! - `csv/` — canonical tables as delimited files
//! - `derived/` — aggregated CSV artifacts, named by their parameters
//! - `parquet/` — canonical tables exported for analytics tooling

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Answer, PlayerAnswer, RankedSongOccurrence, Song, UnknownRegion};

pub mod csv;
pub mod parquet;
pub mod sqlite;

pub use csv::{CsvStore, DerivedWriter};
pub use parquet::{ParquetExporter, ParquetReader, TableType};
pub use sqlite::SqliteStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("bad region code in source row: {0}")]
    Region(#[from] UnknownRegion),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("malformed source row: {0}")]
    MalformedRow(String),
}

/// Configuration for store paths.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.data_dir.join("csv")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }

    pub fn parquet_dir(&self) -> PathBuf {
        self.data_dir.join("parquet")
    }

    /// The collector's database file.
    pub fn db_path(&self) -> PathBuf {
        self.raw_dir().join("rankedData.db")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// The three canonical tables, loaded from either backend.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub songs: Vec<Song>,
    pub occurrences: Vec<RankedSongOccurrence>,
    pub answers: Vec<Answer>,
}

impl Dataset {
    /// Join answers with their song occurrences into the denormalized
    /// view the aggregators read.
    ///
    /// Answers whose occurrence is missing from `rankeds_games` carry
    /// no date or region and cannot enter any window, so they are
    /// dropped here with a warning rather than carried as half-rows.
    pub fn player_answers(&self) -> Vec<PlayerAnswer> {
        let by_song_occurrence: HashMap<i64, &RankedSongOccurrence> = self
            .occurrences
            .iter()
            .map(|occ| (occ.ranked_song_id, occ))
            .collect();

        let mut joined = Vec::with_capacity(self.answers.len());
        let mut orphans = 0usize;

        for answer in &self.answers {
            match by_song_occurrence.get(&answer.ranked_song_id) {
                Some(occurrence) => joined.push(PlayerAnswer::join(occurrence, answer)),
                None => orphans += 1,
            }
        }

        if orphans > 0 {
            warn!(
                "Dropped {} answers with no matching song occurrence",
                orphans
            );
        }
        debug!("Joined {} player answers", joined.len());

        joined
    }
}
