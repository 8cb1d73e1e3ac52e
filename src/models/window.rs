//! Inclusive date windows for aggregation queries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error constructing a window whose start falls after its end.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("window start {start} is after end {end}")]
pub struct InvertedWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// An inclusive `[start, end]` date range.
///
/// Construction validates the ordering, so any window handed to an
/// aggregator is already known to be well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvertedWindow> {
        if start > end {
            return Err(InvertedWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the window, endpoints included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.start, self.end)
    }
}
