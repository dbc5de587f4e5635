//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `FrontierState`: visited set and breadth-first queue of one crawler
//! - `RunStats`: counters reported back to the caller after a run

mod frontier_state;
mod run_stats;

// Re-export main types
pub use frontier_state::{FrontierState, QueuedCandidate};
pub use run_stats::RunStats;
