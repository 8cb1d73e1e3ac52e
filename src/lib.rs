//! # Ranked Stats
//!
//! An aggregation pipeline for AMQ ranked game statistics.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (songs, answers, regions, derived rows)
//! - **store**: Data lake operations (SQLite, CSV, Parquet)
//! - **aggregate**: Leaderboard, region, content and per-player aggregators
//! - **cache**: Keyed pass-through cache for derived results
//! - **config**: Configuration loading and validation

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod models;
pub mod store;

pub use models::*;
