//! Reading the raw NDJSON trees into memory
//!
//! Discovery walks a root directory for input files; the loader parses
//! each one and concatenates everything into a single [`RecordTable`].

pub mod discover;
pub mod table;

pub use discover::{get_files, FilePattern, DEFAULT_FILE_PATTERN};
pub use table::RecordTable;
