//! Core data models for the ranked stats pipeline.

mod answer;
mod region;
mod song;
mod stats;
mod window;

pub use answer::*;
pub use region::*;
pub use song::*;
pub use stats::*;
pub use window::*;
