use crate::error::Result;
use crate::extract::RecordTable;
use crate::load::Database;
use crate::transform::time::derive_time_rows;
use crate::transform::{dedup_keep_last, LoadReport, SongLookup};
use crate::types::{LogRecord, Songplay, TimeRow, User};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogTables {
    pub time: Vec<TimeRow>,
    pub users: Vec<User>,
    pub songplays: Vec<Songplay>,
}

/// Keep only song-play events; everything else in the logs is ignored
pub fn next_song_events(records: Vec<LogRecord>) -> Vec<LogRecord> {
    records.into_iter().filter(LogRecord::is_next_song).collect()
}

/// One user row per userId, taken from that user's last event so the
/// row carries the most recent subscription level.
pub fn derive_users(events: &[LogRecord]) -> Vec<User> {
    let users: Vec<User> = events
        .iter()
        .filter_map(|event| {
            let user_id = event.user_id.clone()?;
            Some(User {
                user_id,
                first_name: event.first_name.clone(),
                last_name: event.last_name.clone(),
                gender: event.gender.clone(),
                level: event.level.clone(),
            })
        })
        .collect();

    dedup_keep_last(users, |u: &User| u.user_id.clone())
}

/// One songplay per event. Song and artist ids stay empty when the lookup
/// has nothing for the event's (song, artist, length).
pub fn derive_songplays<L: SongLookup + ?Sized>(
    events: &[LogRecord],
    lookup: &L,
) -> Result<Vec<Songplay>> {
    let mut songplays = Vec::with_capacity(events.len());

    for event in events {
        let found = match (&event.song, &event.artist, event.length) {
            (Some(title), Some(artist), Some(length)) => lookup.find_song(title, artist, length)?,
            _ => None,
        };
        let (song_id, artist_id) = match found {
            Some(m) => (Some(m.song_id), Some(m.artist_id)),
            None => (None, None),
        };

        songplays.push(Songplay {
            start_time: event.ts,
            user_id: event.user_id.clone(),
            song_id,
            artist_id,
            session_id: event.session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
        });
    }

    Ok(songplays)
}

/// Derive the time, users and songplays rows from raw log records
pub fn transform_logs<L: SongLookup + ?Sized>(
    records: Vec<LogRecord>,
    lookup: &L,
) -> Result<LogTables> {
    let events = next_song_events(records);
    debug!(events = events.len(), "Filtered NextSong events");

    let time = derive_time_rows(events.iter().map(|e| e.ts))?;
    let users = derive_users(&events);
    let songplays = derive_songplays(&events, lookup)?;

    Ok(LogTables {
        time,
        users,
        songplays,
    })
}

/// Load time, users and songplays from a combined log table.
///
/// Songplay ids are resolved against whatever songs and artists the
/// database already holds, so song data has to be processed first.
pub fn process_logs(db: &Database, table: &RecordTable) -> Result<LoadReport> {
    // Other pages never reach typing, whatever shape their rows have
    let events = table.filter_eq("page", LogRecord::NEXT_SONG);
    let records: Vec<LogRecord> = events.records("log")?;
    let mut report = LoadReport {
        records_read: table.len(),
        ..Default::default()
    };

    info!("Load time, user and songplay data...");
    let LogTables {
        time,
        users,
        songplays,
    } = transform_logs(records, db)?;
    let schema = *db.schema();

    info!(rows = time.len(), "Insert time data...");
    let inserted = db.bulk_insert(&schema.time, &time)?;
    report.record(schema.time.name, time.len(), inserted);

    info!(rows = users.len(), "Insert users data...");
    let inserted = db.bulk_insert(&schema.users, &users)?;
    report.record(schema.users.name, users.len(), inserted);

    report.songplays_resolved = songplays.iter().filter(|s| s.is_resolved()).count();
    report.songplays_unresolved = songplays.len() - report.songplays_resolved;
    info!(
        rows = songplays.len(),
        resolved = report.songplays_resolved,
        "Insert songplay data..."
    );
    let inserted = db.bulk_insert(&schema.songplays, &songplays)?;
    report.record(schema.songplays.name, songplays.len(), inserted);

    Ok(report)
}
