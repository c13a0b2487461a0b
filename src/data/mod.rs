//! Data ingestion
//!
//! CSV loading of the scraped match dataset and the in-memory match table.

pub mod loader;
pub mod table;

pub use loader::{load_matches, read_matches, save_augmented, write_augmented};
pub use table::MatchTable;
