use crate::load::{Row, SqlValue};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One line of a song-metadata file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: Option<i64>,
    pub duration: Option<f64>,
    pub artist_name: Option<String>,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
}

/// One line of a user-activity log file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub page: Option<String>,

    /// Event time in epoch milliseconds
    pub ts: i64,

    #[serde(default, deserialize_with = "de_user_id")]
    pub user_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,

    /// Song title as reported by the player
    pub song: Option<String>,
    /// Artist name as reported by the player
    pub artist: Option<String>,
    /// Song duration in seconds
    pub length: Option<f64>,
}

impl LogRecord {
    pub const NEXT_SONG: &'static str = "NextSong";

    pub fn is_next_song(&self) -> bool {
        self.page.as_deref() == Some(Self::NEXT_SONG)
    }
}

/// The log files carry `userId` either as a string or as a number, and
/// logged-out events carry an empty string.
fn de_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(id) => Some(id.to_string()),
            // 39.0 and friends come out of float-typed exports
            None => n.as_f64().map(|f| (f as i64).to_string()),
        },
        _ => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: Option<i64>,
    pub duration: Option<f64>,
}

impl From<&SongRecord> for Song {
    fn from(record: &SongRecord) -> Self {
        Song {
            song_id: record.song_id.clone(),
            title: record.title.clone(),
            artist_id: record.artist_id.clone(),
            year: record.year,
            duration: record.duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&SongRecord> for Artist {
    fn from(record: &SongRecord) -> Self {
        Artist {
            artist_id: record.artist_id.clone(),
            name: record.artist_name.clone(),
            location: record.artist_location.clone(),
            latitude: record.artist_latitude,
            longitude: record.artist_longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// Calendar breakdown of a single event timestamp (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRow {
    /// Epoch milliseconds, same representation as `Songplay::start_time`
    pub start_time: i64,
    pub hour: u32,
    pub day: u32,
    /// ISO week number
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Songplay {
    pub start_time: i64,
    pub user_id: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl Songplay {
    pub fn is_resolved(&self) -> bool {
        self.song_id.is_some() && self.artist_id.is_some()
    }
}

impl Row for Song {
    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.song_id.clone()),
            SqlValue::from(self.title.clone()),
            SqlValue::from(self.artist_id.clone()),
            SqlValue::from(self.year),
            SqlValue::from(self.duration),
        ]
    }
}

impl Row for Artist {
    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.artist_id.clone()),
            SqlValue::from(self.name.clone()),
            SqlValue::from(self.location.clone()),
            SqlValue::from(self.latitude),
            SqlValue::from(self.longitude),
        ]
    }
}

impl Row for User {
    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::from(self.user_id.clone()),
            SqlValue::from(self.first_name.clone()),
            SqlValue::from(self.last_name.clone()),
            SqlValue::from(self.gender.clone()),
            SqlValue::from(self.level.clone()),
        ]
    }
}

impl Row for TimeRow {
    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(self.start_time),
            SqlValue::Integer(self.hour.into()),
            SqlValue::Integer(self.day.into()),
            SqlValue::Integer(self.week.into()),
            SqlValue::Integer(self.month.into()),
            SqlValue::Integer(self.year.into()),
            SqlValue::Integer(self.weekday.into()),
        ]
    }
}

impl Row for Songplay {
    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Integer(self.start_time),
            SqlValue::from(self.user_id.clone()),
            SqlValue::from(self.song_id.clone()),
            SqlValue::from(self.artist_id.clone()),
            SqlValue::from(self.session_id),
            SqlValue::from(self.location.clone()),
            SqlValue::from(self.user_agent.clone()),
        ]
    }
}
