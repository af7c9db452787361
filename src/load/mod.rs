//! Writing rows into the destination database
//!
//! [`Schema`] describes the star schema; [`Database`] owns the single
//! connection of a run and bulk-inserts rows into it.

pub mod schema;
pub mod writer;

pub use schema::{Column, ColumnType, Schema, TableDef};
pub use writer::{Database, NullPolicy, Row, SqlValue, NUMERIC_SENTINEL};
