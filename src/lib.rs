//! # Sparkify ETL - song plays into a star schema
//!
//! Loads newline-delimited JSON song metadata and user-activity logs
//! into a small relational schema (songs, artists, users, time,
//! songplays) in a SQLite database.
//!
//! ## Modules
//!
//! - **extract**: discover NDJSON files and load them into a [`RecordTable`]
//! - **transform**: project, deduplicate and resolve rows per table
//! - **load**: the destination [`Schema`] and the bulk-inserting [`Database`]
//!
//! ## Quick Start
//!
//! ```rust
//! use sparkify_etl::{transform_songs, Database, NullPolicy, Schema, SongRecord};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let record: SongRecord = serde_json::from_value(json!({
//!     "song_id": "SOUPIRU12A6D4FA1E1",
//!     "title": "Der Kleine Dompfaff",
//!     "artist_id": "ARJIE2Y1187B994AB7",
//!     "artist_name": "Line Renaud",
//!     "year": 0,
//!     "duration": 152.92036
//! }))?;
//!
//! let tables = transform_songs(&[record]);
//!
//! let db = Database::open_in_memory(Schema::default(), NullPolicy::Null)?;
//! db.create_tables()?;
//! db.bulk_insert(&db.schema().songs, &tables.songs)?;
//! db.bulk_insert(&db.schema().artists, &tables.artists)?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use tracing::info;

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod logging;
pub mod transform;
pub mod types;

pub use config::{EtlConfig, FileConfig};
pub use error::{EtlError, Result};
pub use extract::{get_files, FilePattern, RecordTable};
pub use load::{Database, NullPolicy, Schema, TableDef};
pub use transform::{process_logs, process_songs, transform_logs, transform_songs, LoadReport, SongLookup};
pub use types::{Artist, LogRecord, Song, SongRecord, Songplay, TimeRow, User};

/// Which kind of input tree is being processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SongData,
    LogData,
}

/// Load every input file under `root` and run the processor for `mode`
pub fn process_data<P: AsRef<Path>>(
    db: &Database,
    root: P,
    mode: Mode,
    pattern: &FilePattern,
) -> Result<LoadReport> {
    let table = RecordTable::load_dir(root, pattern)?;

    match mode {
        Mode::SongData => process_songs(db, &table),
        Mode::LogData => process_logs(db, &table),
    }
}

/// Full run: song data first, so that log processing can resolve
/// songplays against the freshly loaded songs and artists.
pub fn run(config: &EtlConfig) -> Result<LoadReport> {
    let db = Database::open(&config.database, Schema::default(), config.null_policy)?;
    db.ensure_tables()?;

    info!(root = %config.song_data.display(), "Processing song data");
    let mut report = process_data(&db, &config.song_data, Mode::SongData, &config.file_pattern)?;

    info!(root = %config.log_data.display(), "Processing log data");
    report.merge(process_data(
        &db,
        &config.log_data,
        Mode::LogData,
        &config.file_pattern,
    )?);

    info!("ETL Completed");
    Ok(report)
}
