//! CSV storage for canonical tables and derived artifacts.
//!
//! The canonical tables use the collector's filenames and camelCase
//! headers, so files exported from the SQLite backend and files dumped
//! by the collector itself both load. Derived artifacts carry their
//! parameters in the filename, which makes rewrites of the same window
//! idempotent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{Dataset, StoreConfig, StoreError};
use crate::models::{
    Answer, DailyPlayers, DateWindow, RankedSongOccurrence, RegionRow, Song, TopPlayers, TopSongs,
};

/// Canonical table filenames, as the collector names them.
pub const ANIME_SONGS_FILE: &str = "anime_songs.csv";
pub const PLAYERS_ANSWERS_FILE: &str = "players_answers.csv";
pub const RANKEDS_GAMES_FILE: &str = "rankeds_games.csv";

/// Read one CSV table, skipping rows that fail to parse.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Err(StoreError::PathNotFound(path.to_path_buf()));
    }

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                // +2: one for the header line, one for 1-based numbering
                warn!("Skipping row {} in {:?}: {}", index + 2, path, e);
            }
        }
    }

    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Write rows to one CSV file, creating parent directories.
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize, StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = ::csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

/// Canonical-table backend over delimited files.
pub struct CsvStore {
    config: StoreConfig,
}

impl CsvStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn table_path(&self, filename: &str) -> PathBuf {
        self.config.csv_dir().join(filename)
    }

    /// Load all three canonical tables.
    pub fn load(&self) -> Result<Dataset, StoreError> {
        let songs: Vec<Song> = read_table(&self.table_path(ANIME_SONGS_FILE))?;
        let occurrences: Vec<RankedSongOccurrence> =
            read_table(&self.table_path(RANKEDS_GAMES_FILE))?;
        let answers: Vec<Answer> = read_table(&self.table_path(PLAYERS_ANSWERS_FILE))?;

        info!(
            "Loaded {} songs, {} occurrences, {} answers from {:?}",
            songs.len(),
            occurrences.len(),
            answers.len(),
            self.config.csv_dir()
        );

        Ok(Dataset {
            songs,
            occurrences,
            answers,
        })
    }

    /// Write all three canonical tables.
    pub fn write(&self, dataset: &Dataset) -> Result<(), StoreError> {
        write_table(&self.table_path(ANIME_SONGS_FILE), &dataset.songs)?;
        write_table(&self.table_path(RANKEDS_GAMES_FILE), &dataset.occurrences)?;
        write_table(&self.table_path(PLAYERS_ANSWERS_FILE), &dataset.answers)?;

        info!(
            "Wrote canonical tables to {:?} ({} songs, {} occurrences, {} answers)",
            self.config.csv_dir(),
            dataset.songs.len(),
            dataset.occurrences.len(),
            dataset.answers.len()
        );

        Ok(())
    }
}

/// Writer for the derived CSV artifacts.
pub struct DerivedWriter {
    config: StoreConfig,
}

impl DerivedWriter {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn artifact_path(&self, filename: &str) -> PathBuf {
        self.config.derived_dir().join(filename)
    }

    fn write_artifact<T: Serialize>(
        &self,
        filename: &str,
        rows: &[T],
    ) -> Result<PathBuf, StoreError> {
        let path = self.artifact_path(filename);
        let count = write_table(&path, rows)?;
        info!("Wrote {} rows to {:?}", count, path);
        Ok(path)
    }

    /// Write the three leaderboard artifacts.
    pub fn write_top_players(
        &self,
        top: &TopPlayers,
        limit: usize,
        window: &DateWindow,
    ) -> Result<Vec<PathBuf>, StoreError> {
        Ok(vec![
            self.write_artifact(&format!("topScore_{}_{}.csv", limit, window), &top.top_score)?,
            self.write_artifact(&format!("topTime_{}_{}.csv", limit, window), &top.top_time)?,
            self.write_artifact(&format!("topSolo_{}_{}.csv", limit, window), &top.top_solo)?,
        ])
    }

    /// Write the per-region artifact.
    pub fn write_region_stats(
        &self,
        rows: &[RegionRow],
        window: &DateWindow,
    ) -> Result<PathBuf, StoreError> {
        self.write_artifact(&format!("topRegions_{}.csv", window), rows)
    }

    /// Write the four song/anime artifacts.
    pub fn write_top_songs(
        &self,
        top: &TopSongs,
        limit: usize,
        window: &DateWindow,
    ) -> Result<Vec<PathBuf>, StoreError> {
        Ok(vec![
            self.write_artifact(
                &format!("topSpamAnime_{}_{}.csv", limit, window),
                &top.top_spam_anime,
            )?,
            self.write_artifact(
                &format!("topSpamSongs_{}_{}.csv", limit, window),
                &top.top_spam_songs,
            )?,
            self.write_artifact(
                &format!("topEasySongs_{}_{}.csv", limit, window),
                &top.top_easy_songs,
            )?,
            self.write_artifact(
                &format!("topHardSongs_{}_{}.csv", limit, window),
                &top.top_hard_songs,
            )?,
        ])
    }

    /// Write the daily participation artifact.
    pub fn write_players_per_day(
        &self,
        rows: &[DailyPlayers],
        window: &DateWindow,
    ) -> Result<PathBuf, StoreError> {
        self.write_artifact(&format!("playersPerDay_{}.csv", window), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Region, ScoreRow};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> StoreConfig {
        StoreConfig::new(temp_dir.path().to_path_buf())
    }

    fn sample_dataset() -> Dataset {
        Dataset {
            songs: vec![Song {
                anime_id: 185,
                ann_id: 2025,
                anime_name: "Fullmetal Alchemist".to_string(),
                song_id: 9001,
                song_name: "Again".to_string(),
                song_artist: "YUI".to_string(),
                song_type: 1,
                song_number: 1,
                song_difficulty: 62.5,
            }],
            occurrences: vec![RankedSongOccurrence {
                ranked_id: 41,
                date: "2022-10-05".parse().unwrap(),
                region: Region::Europe,
                ranked_song_id: 501,
                ranked_song_number: 3,
                song_id: 9001,
                start_time: 42.5,
                correct_count: 12,
                active_players: 200,
            }],
            answers: vec![Answer {
                ranked_song_id: 501,
                player_id: 7,
                player_name: "miyu".to_string(),
                anime_id: 185,
                guess_time: 6.5,
                is_correct: 1,
            }],
        }
    }

    #[test]
    fn test_canonical_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(test_config(&temp_dir));

        let dataset = sample_dataset();
        store.write(&dataset).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.songs, dataset.songs);
        assert_eq!(loaded.occurrences, dataset.occurrences);
        assert_eq!(loaded.answers, dataset.answers);
    }

    #[test]
    fn test_load_missing_table_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = CsvStore::new(test_config(&temp_dir));

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound(_)));
    }

    #[test]
    fn test_read_skips_malformed_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.csv_dir()).unwrap();

        fs::write(
            config.csv_dir().join(RANKEDS_GAMES_FILE),
            "rankedId,date,region,rankedSongId,rankedSongNumber,songId,startTime,correctCount,activePlayers\n\
             41,2022-10-05,Europe,501,3,9001,42.5,12,200\n\
             42,not-a-date,Europe,502,4,9002,10.0,3,200\n\
             43,2022-10-06,Asia,503,1,9003,55.0,7,180\n",
        )
        .unwrap();

        let rows: Vec<RankedSongOccurrence> =
            read_table(&config.csv_dir().join(RANKEDS_GAMES_FILE)).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].ranked_id, 41);
        assert_eq!(rows[1].ranked_id, 43);
    }

    #[test]
    fn test_read_ignores_extra_index_column() {
        // Collector dumps carry a leading unnamed index column.
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.csv_dir()).unwrap();

        fs::write(
            config.csv_dir().join(RANKEDS_GAMES_FILE),
            ",rankedId,date,region,rankedSongId,rankedSongNumber,songId,startTime,correctCount,activePlayers\n\
             0,41,2022-10-05,North America,501,3,9001,42.5,12,200\n",
        )
        .unwrap();

        let rows: Vec<RankedSongOccurrence> =
            read_table(&config.csv_dir().join(RANKEDS_GAMES_FILE)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region, Region::NorthAmerica);
    }

    #[test]
    fn test_read_denormalized_answer_columns() {
        // The collector's players_answers dump carries occurrence
        // context columns; the answer reader only picks its own.
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(config.csv_dir()).unwrap();

        fs::write(
            config.csv_dir().join(PLAYERS_ANSWERS_FILE),
            "rankedId,date,region,rankedSongId,rankedSongNumber,songId,startTime,correctCount,activePlayers,playerId,playerName,animeId,guessTime,isCorrect\n\
             41,2022-10-05,Europe,501,3,9001,42.5,12,200,7,miyu,185,6.5,1\n",
        )
        .unwrap();

        let rows: Vec<Answer> =
            read_table(&config.csv_dir().join(PLAYERS_ANSWERS_FILE)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].player_name, "miyu");
        assert_eq!(rows[0].ranked_song_id, 501);
        assert_eq!(rows[0].is_correct, 1);
    }

    #[test]
    fn test_artifact_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let writer = DerivedWriter::new(config.clone());

        let window = DateWindow::new(
            "2022-10-01".parse().unwrap(),
            "2022-12-19".parse().unwrap(),
        )
        .unwrap();

        let rows = vec![ScoreRow {
            player_name: "miyu".to_string(),
            score: 38,
            date: "2022-11-05".parse().unwrap(),
            region: Region::Europe,
        }];
        let top = TopPlayers {
            top_score: rows,
            top_time: vec![],
            top_solo: vec![],
        };

        let paths = writer.write_top_players(&top, 30, &window).unwrap();
        assert_eq!(
            paths[0],
            config
                .derived_dir()
                .join("topScore_30_2022-10-01_2022-12-19.csv")
        );
        assert_eq!(
            paths[1],
            config
                .derived_dir()
                .join("topTime_30_2022-10-01_2022-12-19.csv")
        );
        assert_eq!(
            paths[2],
            config
                .derived_dir()
                .join("topSolo_30_2022-10-01_2022-12-19.csv")
        );

        let contents = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(
            contents,
            "playerName,score,date,region\nmiyu,38,2022-11-05,Europe\n"
        );
    }

    #[test]
    fn test_unparameterized_artifact_names() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let writer = DerivedWriter::new(config.clone());

        let window = DateWindow::new(
            "2022-10-01".parse().unwrap(),
            "2022-12-19".parse().unwrap(),
        )
        .unwrap();

        let path = writer
            .write_players_per_day(
                &[DailyPlayers {
                    date: "2022-10-01".parse().unwrap(),
                    player_count: 120,
                }],
                &window,
            )
            .unwrap();
        assert_eq!(
            path,
            config
                .derived_dir()
                .join("playersPerDay_2022-10-01_2022-12-19.csv")
        );

        let path = writer.write_region_stats(&[], &window).unwrap();
        assert_eq!(
            path,
            config
                .derived_dir()
                .join("topRegions_2022-10-01_2022-12-19.csv")
        );
    }
}
