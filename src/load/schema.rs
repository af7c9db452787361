//! The destination star schema as plain values.
//!
//! SQL for creating, dropping and inserting into each table is generated
//! from these definitions instead of living in hand-written strings.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: ColumnType,
    /// Extra column constraints, e.g. "NOT NULL"
    pub constraints: &'static str,
}

const fn col(name: &'static str, sql_type: ColumnType) -> Column {
    Column {
        name,
        sql_type,
        constraints: "",
    }
}

const fn col_not_null(name: &'static str, sql_type: ColumnType) -> Column {
    Column {
        name,
        sql_type,
        constraints: "NOT NULL",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Primary key of a dimension table; inserts that collide on it are ignored
    pub conflict_key: Option<&'static str>,
    /// Auto-increment primary key, never written by inserts
    pub generated_key: Option<&'static str>,
}

impl TableDef {
    /// Columns an insert provides values for, in row order
    pub fn insert_columns(&self) -> impl Iterator<Item = &'static Column> {
        let columns: &'static [Column] = self.columns;
        let generated = self.generated_key;
        columns.iter().filter(move |c| Some(c.name) != generated)
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", c.name, c.sql_type.sql());
                if Some(c.name) == self.generated_key {
                    def.push_str(" PRIMARY KEY AUTOINCREMENT");
                } else if Some(c.name) == self.conflict_key {
                    def.push_str(" PRIMARY KEY");
                }
                if !c.constraints.is_empty() {
                    def.push(' ');
                    def.push_str(c.constraints);
                }
                def
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" ({});",
            self.name,
            columns.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\";", self.name)
    }

    pub fn insert_sql(&self) -> String {
        let names: Vec<&str> = self.insert_columns().map(|c| c.name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();

        let mut sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.name,
            names.join(", "),
            placeholders.join(", ")
        );
        if let Some(key) = self.conflict_key {
            sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", key));
        }
        sql
    }
}

const USERS_TABLE: TableDef = TableDef {
    name: "users",
    columns: &[
        col("user_id", ColumnType::Text),
        col("first_name", ColumnType::Text),
        col("last_name", ColumnType::Text),
        col("gender", ColumnType::Text),
        col("level", ColumnType::Text),
    ],
    conflict_key: Some("user_id"),
    generated_key: None,
};

const SONGS_TABLE: TableDef = TableDef {
    name: "songs",
    columns: &[
        col("song_id", ColumnType::Text),
        col_not_null("title", ColumnType::Text),
        col_not_null("artist_id", ColumnType::Text),
        col("year", ColumnType::Integer),
        col("duration", ColumnType::Real),
    ],
    conflict_key: Some("song_id"),
    generated_key: None,
};

const ARTISTS_TABLE: TableDef = TableDef {
    name: "artists",
    columns: &[
        col("artist_id", ColumnType::Text),
        col("name", ColumnType::Text),
        col("location", ColumnType::Text),
        col("latitude", ColumnType::Real),
        col("longitude", ColumnType::Real),
    ],
    conflict_key: Some("artist_id"),
    generated_key: None,
};

const TIME_TABLE: TableDef = TableDef {
    name: "time",
    columns: &[
        col("start_time", ColumnType::Integer),
        col("hour", ColumnType::Integer),
        col("day", ColumnType::Integer),
        col("week", ColumnType::Integer),
        col("month", ColumnType::Integer),
        col("year", ColumnType::Integer),
        col("weekday", ColumnType::Integer),
    ],
    conflict_key: None,
    generated_key: None,
};

const SONGPLAYS_TABLE: TableDef = TableDef {
    name: "songplays",
    columns: &[
        col("songplay_id", ColumnType::Integer),
        col("start_time", ColumnType::Integer),
        col("user_id", ColumnType::Text),
        col("song_id", ColumnType::Text),
        col("artist_id", ColumnType::Text),
        col("session_id", ColumnType::Integer),
        col("location", ColumnType::Text),
        col("user_agent", ColumnType::Text),
    ],
    conflict_key: None,
    generated_key: Some("songplay_id"),
};

/// The full set of destination tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub users: TableDef,
    pub songs: TableDef,
    pub artists: TableDef,
    pub time: TableDef,
    pub songplays: TableDef,
}

impl Schema {
    /// Tables in creation order
    pub fn tables(&self) -> [&TableDef; 5] {
        [
            &self.users,
            &self.artists,
            &self.songs,
            &self.time,
            &self.songplays,
        ]
    }

    /// Find the (song_id, artist_id) pair matching a played song by
    /// title, artist name and duration.
    pub fn song_lookup_sql(&self) -> String {
        format!(
            "SELECT s.song_id, a.artist_id FROM \"{songs}\" s \
             JOIN \"{artists}\" a ON s.artist_id = a.artist_id \
             WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3",
            songs = self.songs.name,
            artists = self.artists.name,
        )
    }
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            users: USERS_TABLE,
            songs: SONGS_TABLE,
            artists: ARTISTS_TABLE,
            time: TIME_TABLE,
            songplays: SONGPLAYS_TABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_insert_ignores_conflicts() {
        let sql = Schema::default().users.insert_sql();
        assert_eq!(
            sql,
            "INSERT INTO \"users\" (user_id, first_name, last_name, gender, level) \
             VALUES (?1, ?2, ?3, ?4, ?5) ON CONFLICT (user_id) DO NOTHING"
        );
    }

    #[test]
    fn test_fact_insert_skips_generated_key() {
        let schema = Schema::default();
        let sql = schema.songplays.insert_sql();

        assert!(!sql.contains("songplay_id"));
        assert!(!sql.contains("ON CONFLICT"));
        assert_eq!(schema.songplays.insert_columns().count(), 7);
    }

    #[test]
    fn test_create_sql() {
        let schema = Schema::default();

        assert_eq!(
            schema.songs.create_sql(),
            "CREATE TABLE IF NOT EXISTS \"songs\" (song_id TEXT PRIMARY KEY, title TEXT NOT NULL, \
             artist_id TEXT NOT NULL, year INTEGER, duration REAL);"
        );
        assert!(schema
            .songplays
            .create_sql()
            .contains("songplay_id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(!schema.time.create_sql().contains("PRIMARY KEY"));
    }
}
