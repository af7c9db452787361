use crate::error::Result;
use crate::extract::RecordTable;
use crate::load::Database;
use crate::transform::{dedup_keep_last, LoadReport};
use crate::types::{Artist, Song, SongRecord};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongTables {
    pub songs: Vec<Song>,
    pub artists: Vec<Artist>,
}

/// Project song metadata into one row per song_id and one per artist_id.
/// Later records win over earlier ones with the same key.
pub fn transform_songs(records: &[SongRecord]) -> SongTables {
    let songs = dedup_keep_last(records.iter().map(Song::from).collect(), |s: &Song| {
        s.song_id.clone()
    });
    let artists = dedup_keep_last(records.iter().map(Artist::from).collect(), |a: &Artist| {
        a.artist_id.clone()
    });

    SongTables { songs, artists }
}

/// Load songs and artists from a combined song-metadata table
pub fn process_songs(db: &Database, table: &RecordTable) -> Result<LoadReport> {
    let records: Vec<SongRecord> = table.records("song")?;
    let mut report = LoadReport {
        records_read: records.len(),
        ..Default::default()
    };

    info!("Loading songs...");
    let SongTables { songs, artists } = transform_songs(&records);

    info!(rows = songs.len(), "Inserting songs...");
    let schema = *db.schema();
    let inserted = db.bulk_insert(&schema.songs, &songs)?;
    report.record(schema.songs.name, songs.len(), inserted);

    info!(rows = artists.len(), "Inserting artists...");
    let inserted = db.bulk_insert(&schema.artists, &artists)?;
    report.record(schema.artists.name, artists.len(), inserted);

    Ok(report)
}
