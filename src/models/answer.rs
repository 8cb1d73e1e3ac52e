//! Answer events and the denormalized rows aggregators consume.
//!
//! The collector stores two tables: one row per song occurrence in a
//! ranked match, and one row per player answer to an occurrence. The
//! aggregation layer works on [`PlayerAnswer`], the answer joined with
//! its occurrence, so every row carries the match date and region.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Region;

/// One song occurrence inside a ranked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedSongOccurrence {
    /// Identifier of the ranked match this occurrence belongs to.
    pub ranked_id: i64,
    pub date: NaiveDate,
    pub region: Region,
    /// Unique identifier of this occurrence across all matches.
    pub ranked_song_id: i64,
    /// Position of the song within its match, 1-based.
    pub ranked_song_number: u32,
    pub song_id: i64,
    /// Playback offset the clip started at, in seconds.
    pub start_time: f64,
    /// How many players answered this occurrence correctly.
    pub correct_count: u32,
    /// How many players were still active when the song played.
    pub active_players: u32,
}

/// One player's answer to a song occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub ranked_song_id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub anime_id: i64,
    /// Seconds the player took to submit, 0 when they never answered.
    pub guess_time: f64,
    /// 1 for a correct answer, 0 otherwise.
    pub is_correct: u8,
}

/// An answer joined with its song occurrence.
///
/// Field order mirrors the collector's denormalized export so CSV
/// round trips preserve column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAnswer {
    pub ranked_id: i64,
    pub date: NaiveDate,
    pub region: Region,
    pub ranked_song_id: i64,
    pub ranked_song_number: u32,
    pub song_id: i64,
    pub start_time: f64,
    pub correct_count: u32,
    pub active_players: u32,
    pub player_id: i64,
    pub player_name: String,
    pub anime_id: i64,
    pub guess_time: f64,
    pub is_correct: u8,
}

impl PlayerAnswer {
    /// Fuse an answer with the occurrence it belongs to.
    pub fn join(occurrence: &RankedSongOccurrence, answer: &Answer) -> Self {
        PlayerAnswer {
            ranked_id: occurrence.ranked_id,
            date: occurrence.date,
            region: occurrence.region,
            ranked_song_id: occurrence.ranked_song_id,
            ranked_song_number: occurrence.ranked_song_number,
            song_id: occurrence.song_id,
            start_time: occurrence.start_time,
            correct_count: occurrence.correct_count,
            active_players: occurrence.active_players,
            player_id: answer.player_id,
            player_name: answer.player_name.clone(),
            anime_id: answer.anime_id,
            guess_time: answer.guess_time,
            is_correct: answer.is_correct,
        }
    }

    pub fn correct(&self) -> bool {
        self.is_correct == 1
    }

    /// Whether this answer was the only correct one for its occurrence.
    pub fn is_solo(&self) -> bool {
        self.correct_count == 1 && self.is_correct == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrence() -> RankedSongOccurrence {
        RankedSongOccurrence {
            ranked_id: 4200,
            date: "2023-04-12".parse().unwrap(),
            region: Region::Europe,
            ranked_song_id: 99001,
            ranked_song_number: 7,
            song_id: 512,
            start_time: 45.0,
            correct_count: 1,
            active_players: 180,
        }
    }

    fn answer() -> Answer {
        Answer {
            ranked_song_id: 99001,
            player_id: 31,
            player_name: "miyu".to_string(),
            anime_id: 185,
            guess_time: 8.2,
            is_correct: 1,
        }
    }

    #[test]
    fn test_join_carries_both_sides() {
        let joined = PlayerAnswer::join(&occurrence(), &answer());
        assert_eq!(joined.ranked_id, 4200);
        assert_eq!(joined.region, Region::Europe);
        assert_eq!(joined.ranked_song_id, 99001);
        assert_eq!(joined.player_name, "miyu");
        assert_eq!(joined.guess_time, 8.2);
    }

    #[test]
    fn test_solo_requires_sole_correct_answer() {
        let mut joined = PlayerAnswer::join(&occurrence(), &answer());
        assert!(joined.is_solo());

        joined.correct_count = 2;
        assert!(!joined.is_solo());

        joined.correct_count = 1;
        joined.is_correct = 0;
        assert!(!joined.is_solo());
    }

    #[test]
    fn test_csv_header_order_matches_collector() {
        let joined = PlayerAnswer::join(&occurrence(), &answer());
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&joined).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "rankedId,date,region,rankedSongId,rankedSongNumber,songId,\
             startTime,correctCount,activePlayers,playerId,playerName,\
             animeId,guessTime,isCorrect"
        );
    }
}
