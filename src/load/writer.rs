use crate::error::Result;
use crate::load::schema::{Column, ColumnType, Schema, TableDef};
use crate::transform::{SongLookup, SongMatch};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

pub type SqlValue = rusqlite::types::Value;

/// Value written for missing numeric fields under [`NullPolicy::Sentinel`]
pub const NUMERIC_SENTINEL: i64 = -1;

/// A destination row, flattened into one value per insert column
pub trait Row {
    fn values(&self) -> Vec<SqlValue>;
}

/// How missing values reach the destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// Write SQL NULL
    #[default]
    Null,
    /// Write -1 into numeric columns, NULL elsewhere.
    /// A stored -1 can no longer be told apart from a missing value.
    Sentinel,
}

impl NullPolicy {
    fn apply(&self, columns: &[&Column], values: Vec<SqlValue>) -> Vec<SqlValue> {
        if *self == NullPolicy::Null {
            return values;
        }

        columns
            .iter()
            .zip(values)
            .map(|(column, value)| match (value, column.sql_type) {
                (SqlValue::Null, ColumnType::Integer) => SqlValue::Integer(NUMERIC_SENTINEL),
                (SqlValue::Null, ColumnType::Real) => SqlValue::Real(NUMERIC_SENTINEL as f64),
                (value, _) => value,
            })
            .collect()
    }
}

/// The single connection a run writes through
pub struct Database {
    conn: Connection,
    schema: Schema,
    null_policy: NullPolicy,
    song_lookup_sql: String,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P, schema: Schema, null_policy: NullPolicy) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "Opened destination database");
        Ok(Self::with_connection(conn, schema, null_policy))
    }

    pub fn open_in_memory(schema: Schema, null_policy: NullPolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::with_connection(conn, schema, null_policy))
    }

    pub fn with_connection(conn: Connection, schema: Schema, null_policy: NullPolicy) -> Self {
        let song_lookup_sql = schema.song_lookup_sql();
        Database {
            conn,
            schema,
            null_policy,
            song_lookup_sql,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop every table and create it again empty
    pub fn create_tables(&self) -> Result<()> {
        for table in self.schema.tables().iter().rev() {
            debug!(table = table.name, "Dropping table");
            self.conn.execute(&table.drop_sql(), [])?;
        }
        self.ensure_tables()?;
        info!("Created destination tables");
        Ok(())
    }

    /// Create any table that does not exist yet
    pub fn ensure_tables(&self) -> Result<()> {
        for table in self.schema.tables() {
            self.conn.execute(&table.create_sql(), [])?;
        }
        Ok(())
    }

    /// Insert all rows into `table` in one transaction.
    ///
    /// Returns the number of rows actually inserted, which is lower than
    /// `rows.len()` when a dimension table already holds some of the keys.
    pub fn bulk_insert<R: Row>(&self, table: &TableDef, rows: &[R]) -> Result<usize> {
        let sql = table.insert_sql();
        let columns: Vec<&Column> = table.insert_columns().collect();

        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(&sql)?;
            for row in rows {
                let values = self.null_policy.apply(&columns, row.values());
                debug_assert_eq!(values.len(), columns.len());
                inserted += stmt.execute(rusqlite::params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;

        info!(
            table = table.name,
            rows = rows.len(),
            inserted,
            "Bulk insert committed"
        );
        Ok(inserted)
    }

    pub fn count_rows(&self, table: &TableDef) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.name);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

impl SongLookup for Database {
    fn find_song(&self, title: &str, artist: &str, duration: f64) -> Result<Option<SongMatch>> {
        let mut stmt = self.conn.prepare_cached(&self.song_lookup_sql)?;
        let found = stmt
            .query_row(params![title, artist, duration], |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()?;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Artist, Song, TimeRow, User};

    fn database(policy: NullPolicy) -> Database {
        let db = Database::open_in_memory(Schema::default(), policy).unwrap();
        db.create_tables().unwrap();
        db
    }

    fn user(id: &str, level: &str) -> User {
        User {
            user_id: id.to_string(),
            first_name: Some("Lily".to_string()),
            last_name: Some("Koch".to_string()),
            gender: Some("F".to_string()),
            level: Some(level.to_string()),
        }
    }

    #[test]
    fn test_dimension_conflicts_keep_existing_row() {
        let db = database(NullPolicy::Null);
        let users = db.schema().users;

        assert_eq!(db.bulk_insert(&users, &[user("15", "free")]).unwrap(), 1);
        assert_eq!(db.bulk_insert(&users, &[user("15", "paid")]).unwrap(), 0);

        let level: String = db
            .connection()
            .query_row("SELECT level FROM users WHERE user_id = '15'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "free");
        assert_eq!(db.count_rows(&users).unwrap(), 1);
    }

    #[test]
    fn test_time_rows_append() {
        let db = database(NullPolicy::Null);
        let time = db.schema().time;
        let row = TimeRow {
            start_time: 1541990258796,
            hour: 2,
            day: 12,
            week: 46,
            month: 11,
            year: 2018,
            weekday: 0,
        };

        db.bulk_insert(&time, &[row]).unwrap();
        db.bulk_insert(&time, &[row]).unwrap();
        assert_eq!(db.count_rows(&time).unwrap(), 2);
    }

    #[test]
    fn test_null_policies() {
        let song = Song {
            song_id: "SO1".to_string(),
            title: "Title".to_string(),
            artist_id: "AR1".to_string(),
            year: None,
            duration: None,
        };

        let db = database(NullPolicy::Null);
        db.bulk_insert(&db.schema().songs, &[song.clone()]).unwrap();
        let year: Option<i64> = db
            .connection()
            .query_row("SELECT year FROM songs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(year, None);

        let db = database(NullPolicy::Sentinel);
        db.bulk_insert(&db.schema().songs, &[song]).unwrap();
        let (year, duration): (i64, f64) = db
            .connection()
            .query_row("SELECT year, duration FROM songs", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(year, NUMERIC_SENTINEL);
        assert_eq!(duration, -1.0);
    }

    #[test]
    fn test_sentinel_leaves_text_null() {
        let db = database(NullPolicy::Sentinel);
        let artist = Artist {
            artist_id: "AR1".to_string(),
            name: Some("Casual".to_string()),
            location: None,
            latitude: None,
            longitude: Some(-118.0),
        };
        db.bulk_insert(&db.schema().artists, &[artist]).unwrap();

        let (location, latitude, longitude): (Option<String>, f64, f64) = db
            .connection()
            .query_row("SELECT location, latitude, longitude FROM artists", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(location, None);
        assert_eq!(latitude, -1.0);
        assert_eq!(longitude, -118.0);
    }

    #[test]
    fn test_song_lookup() {
        let db = database(NullPolicy::Null);
        let song = Song {
            song_id: "SOZCTXZ12AB0182364".to_string(),
            title: "Setanta matins".to_string(),
            artist_id: "AR5KOSW1187FB35FF4".to_string(),
            year: Some(0),
            duration: Some(269.58322),
        };
        let artist = Artist {
            artist_id: "AR5KOSW1187FB35FF4".to_string(),
            name: Some("Elena".to_string()),
            location: Some("Dubai UAE".to_string()),
            latitude: Some(49.80388),
            longitude: Some(15.47491),
        };
        db.bulk_insert(&db.schema().songs, &[song]).unwrap();
        db.bulk_insert(&db.schema().artists, &[artist]).unwrap();

        let found = db.find_song("Setanta matins", "Elena", 269.58322).unwrap().unwrap();
        assert_eq!(found.song_id, "SOZCTXZ12AB0182364");
        assert_eq!(found.artist_id, "AR5KOSW1187FB35FF4");

        assert!(db.find_song("Setanta matins", "Elena", 100.0).unwrap().is_none());
        assert!(db.find_song("Other", "Elena", 269.58322).unwrap().is_none());
    }
}
