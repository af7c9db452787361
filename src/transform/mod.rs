//! Reshaping raw records into the destination tables
//!
//! Each processor projects typed records into dimension and fact rows,
//! deduplicates the dimensions, and hands the rows to the
//! [`Database`](crate::load::Database) for bulk insertion.

pub mod logs;
pub mod songs;
pub mod time;

pub use logs::{derive_songplays, derive_users, next_song_events, process_logs, transform_logs, LogTables};
pub use songs::{process_songs, transform_songs, SongTables};
pub use time::{derive_time, derive_time_rows};

use crate::error::Result;
use std::collections::HashSet;
use std::hash::Hash;

/// Ids of a song already present in the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Resolves a played song to the ids stored in the songs and artists tables
pub trait SongLookup {
    /// Exact match on song title, artist name and duration.
    /// `Ok(None)` means no such song, which is not an error.
    fn find_song(&self, title: &str, artist: &str, duration: f64) -> Result<Option<SongMatch>>;
}

/// Rows handled for one destination table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLoad {
    pub table: &'static str,
    /// Rows handed to the writer
    pub rows: usize,
    /// Rows the destination accepted
    pub inserted: usize,
}

/// Outcome of one processor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub records_read: usize,
    pub tables: Vec<TableLoad>,
    pub songplays_resolved: usize,
    pub songplays_unresolved: usize,
}

impl LoadReport {
    pub fn record(&mut self, table: &'static str, rows: usize, inserted: usize) {
        self.tables.push(TableLoad {
            table,
            rows,
            inserted,
        });
    }

    pub fn table(&self, name: &str) -> Option<&TableLoad> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn merge(&mut self, other: LoadReport) {
        self.records_read += other.records_read;
        self.tables.extend(other.tables);
        self.songplays_resolved += other.songplays_resolved;
        self.songplays_unresolved += other.songplays_unresolved;
    }
}

/// Keep only the last item for each key, preserving the relative order
/// of the survivors.
pub fn dedup_keep_last<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut kept: Vec<T> = items
        .into_iter()
        .rev()
        .filter(|item| seen.insert(key(item)))
        .collect();
    kept.reverse();
    kept
}
