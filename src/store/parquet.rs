//! Parquet export of the canonical tables.
//!
//! One file per table under `parquet/`, Snappy-compressed. Dates and
//! regions are written as strings so the files stay readable without
//! this crate's enums.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray, UInt32Array, UInt8Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::info;

use super::{Dataset, StoreConfig, StoreError};

/// Canonical tables that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    AnimeSongs,
    RankedGames,
    PlayerAnswers,
}

impl TableType {
    pub fn filename(&self) -> &'static str {
        match self {
            TableType::AnimeSongs => "anime_songs.parquet",
            TableType::RankedGames => "rankeds_games.parquet",
            TableType::PlayerAnswers => "players_answers.parquet",
        }
    }
}

/// Arrow schemas matching the canonical table columns.
pub mod schemas {
    use super::*;

    pub fn anime_songs() -> Schema {
        Schema::new(vec![
            Field::new("animeId", DataType::Int64, false),
            Field::new("annId", DataType::Int64, false),
            Field::new("animeName", DataType::Utf8, false),
            Field::new("songId", DataType::Int64, false),
            Field::new("songName", DataType::Utf8, false),
            Field::new("songArtist", DataType::Utf8, false),
            Field::new("songType", DataType::UInt32, false),
            Field::new("songNumber", DataType::UInt32, false),
            Field::new("songDifficulty", DataType::Float64, false),
        ])
    }

    pub fn rankeds_games() -> Schema {
        Schema::new(vec![
            Field::new("rankedId", DataType::Int64, false),
            Field::new("date", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("rankedSongId", DataType::Int64, false),
            Field::new("rankedSongNumber", DataType::UInt32, false),
            Field::new("songId", DataType::Int64, false),
            Field::new("startTime", DataType::Float64, false),
            Field::new("correctCount", DataType::UInt32, false),
            Field::new("activePlayers", DataType::UInt32, false),
        ])
    }

    pub fn players_answers() -> Schema {
        Schema::new(vec![
            Field::new("rankedSongId", DataType::Int64, false),
            Field::new("playerId", DataType::Int64, false),
            Field::new("playerName", DataType::Utf8, false),
            Field::new("animeId", DataType::Int64, false),
            Field::new("guessTime", DataType::Float64, false),
            Field::new("isCorrect", DataType::UInt8, false),
        ])
    }
}

/// Writes canonical tables as Parquet files.
pub struct ParquetExporter {
    config: StoreConfig,
}

impl ParquetExporter {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    fn table_path(&self, table: TableType) -> PathBuf {
        self.config.parquet_dir().join(table.filename())
    }

    fn ensure_dir(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.config.parquet_dir())?;
        Ok(())
    }

    /// Export all three canonical tables.
    pub fn export(&self, dataset: &Dataset) -> Result<(), StoreError> {
        self.write_songs(dataset)?;
        self.write_occurrences(dataset)?;
        self.write_answers(dataset)?;
        Ok(())
    }

    pub fn write_songs(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let rows = &dataset.songs;
        let batch = RecordBatch::try_new(
            Arc::new(schemas::anime_songs()),
            vec![
                Arc::new(Int64Array::from(
                    rows.iter().map(|s| s.anime_id).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|s| s.ann_id).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|s| s.anime_name.clone()).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|s| s.song_id).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|s| s.song_name.clone()).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|s| s.song_artist.clone()).collect::<Vec<_>>(),
                )),
                Arc::new(UInt32Array::from(
                    rows.iter().map(|s| s.song_type).collect::<Vec<_>>(),
                )),
                Arc::new(UInt32Array::from(
                    rows.iter().map(|s| s.song_number).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    rows.iter().map(|s| s.song_difficulty).collect::<Vec<_>>(),
                )),
            ],
        )
        .map_err(|e| StoreError::Parquet(e.to_string()))?;

        self.write_batch(TableType::AnimeSongs, batch)
    }

    pub fn write_occurrences(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let rows = &dataset.occurrences;
        let batch = RecordBatch::try_new(
            Arc::new(schemas::rankeds_games()),
            vec![
                Arc::new(Int64Array::from(
                    rows.iter().map(|o| o.ranked_id).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|o| o.date.to_string()).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter()
                        .map(|o| o.region.name().to_string())
                        .collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|o| o.ranked_song_id).collect::<Vec<_>>(),
                )),
                Arc::new(UInt32Array::from(
                    rows.iter().map(|o| o.ranked_song_number).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|o| o.song_id).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    rows.iter().map(|o| o.start_time).collect::<Vec<_>>(),
                )),
                Arc::new(UInt32Array::from(
                    rows.iter().map(|o| o.correct_count).collect::<Vec<_>>(),
                )),
                Arc::new(UInt32Array::from(
                    rows.iter().map(|o| o.active_players).collect::<Vec<_>>(),
                )),
            ],
        )
        .map_err(|e| StoreError::Parquet(e.to_string()))?;

        self.write_batch(TableType::RankedGames, batch)
    }

    pub fn write_answers(&self, dataset: &Dataset) -> Result<(), StoreError> {
        let rows = &dataset.answers;
        let batch = RecordBatch::try_new(
            Arc::new(schemas::players_answers()),
            vec![
                Arc::new(Int64Array::from(
                    rows.iter().map(|a| a.ranked_song_id).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|a| a.player_id).collect::<Vec<_>>(),
                )),
                Arc::new(StringArray::from(
                    rows.iter().map(|a| a.player_name.clone()).collect::<Vec<_>>(),
                )),
                Arc::new(Int64Array::from(
                    rows.iter().map(|a| a.anime_id).collect::<Vec<_>>(),
                )),
                Arc::new(Float64Array::from(
                    rows.iter().map(|a| a.guess_time).collect::<Vec<_>>(),
                )),
                Arc::new(UInt8Array::from(
                    rows.iter().map(|a| a.is_correct).collect::<Vec<_>>(),
                )),
            ],
        )
        .map_err(|e| StoreError::Parquet(e.to_string()))?;

        self.write_batch(TableType::PlayerAnswers, batch)
    }

    fn write_batch(&self, table: TableType, batch: RecordBatch) -> Result<(), StoreError> {
        self.ensure_dir()?;
        let path = self.table_path(table);
        let file = File::create(&path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        writer
            .write(&batch)
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        writer
            .close()
            .map_err(|e| StoreError::Parquet(e.to_string()))?;

        info!("Wrote {} rows to {:?}", batch.num_rows(), path);
        Ok(())
    }
}

/// Reads back exported tables, mainly for verification.
pub struct ParquetReader {
    config: StoreConfig,
}

impl ParquetReader {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn exists(&self, table: TableType) -> bool {
        self.config.parquet_dir().join(table.filename()).exists()
    }

    pub fn read_batches(&self, table: TableType) -> Result<Vec<RecordBatch>, StoreError> {
        let path = self.config.parquet_dir().join(table.filename());
        if !path.exists() {
            return Err(StoreError::PathNotFound(path));
        }
        let file = File::open(&path)?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .map_err(|e| StoreError::Parquet(e.to_string()))?;
        let reader = builder
            .build()
            .map_err(|e| StoreError::Parquet(e.to_string()))?;

        reader
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::Parquet(e.to_string()))
    }

    pub fn count(&self, table: TableType) -> Result<usize, StoreError> {
        let batches = self.read_batches(table)?;
        Ok(batches.iter().map(|b| b.num_rows()).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Answer, RankedSongOccurrence, Region, Song};
    use tempfile::TempDir;

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
    fn test_export_creates_all_tables() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let exporter = ParquetExporter::new(config.clone());
        exporter.export(&sample_dataset()).unwrap();

        let reader = ParquetReader::new(config);
        assert!(reader.exists(TableType::AnimeSongs));
        assert!(reader.exists(TableType::RankedGames));
        assert!(reader.exists(TableType::PlayerAnswers));
    }

    #[test]
    fn test_count_matches_rows() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let exporter = ParquetExporter::new(config.clone());
        exporter.export(&sample_dataset()).unwrap();

        let reader = ParquetReader::new(config);
        assert_eq!(reader.count(TableType::AnimeSongs).unwrap(), 1);
        assert_eq!(reader.count(TableType::RankedGames).unwrap(), 1);
        assert_eq!(reader.count(TableType::PlayerAnswers).unwrap(), 1);
    }

    #[test]
    fn test_region_written_as_label() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let exporter = ParquetExporter::new(config.clone());
        exporter.write_occurrences(&sample_dataset()).unwrap();

        let reader = ParquetReader::new(config);
        let batches = reader.read_batches(TableType::RankedGames).unwrap();
        assert_eq!(batches.len(), 1);

        let regions = batches[0]
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(regions.value(0), "Europe");
    }

    #[test]
    fn test_read_missing_table() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let reader = ParquetReader::new(config);
        let err = reader.read_batches(TableType::AnimeSongs).unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound(_)));
    }

    #[test]
    fn test_export_empty_dataset() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let exporter = ParquetExporter::new(config.clone());
        exporter
            .export(&Dataset {
                songs: vec![],
                occurrences: vec![],
                answers: vec![],
            })
            .unwrap();

        let reader = ParquetReader::new(config);
        assert_eq!(reader.count(TableType::PlayerAnswers).unwrap(), 0);
    }
}
