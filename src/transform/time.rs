use crate::error::{EtlError, Result};
use crate::types::TimeRow;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::collections::HashSet;

/// Break an epoch-millisecond timestamp down into its UTC calendar parts
pub fn derive_time(ts: i64) -> Result<TimeRow> {
    let instant: DateTime<Utc> =
        DateTime::<Utc>::from_timestamp_millis(ts).ok_or_else(|| EtlError::InvalidRecord {
            entity: "time",
            reason: format!("timestamp {} is out of range", ts),
        })?;

    Ok(TimeRow {
        start_time: ts,
        hour: instant.hour(),
        day: instant.day(),
        week: instant.iso_week().week(),
        month: instant.month(),
        year: instant.year(),
        weekday: instant.weekday().num_days_from_monday(),
    })
}

/// Derive one time row per distinct timestamp, keeping first-seen order
pub fn derive_time_rows<I: IntoIterator<Item = i64>>(timestamps: I) -> Result<Vec<TimeRow>> {
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for ts in timestamps {
        if seen.insert(ts) {
            rows.push(derive_time(ts)?);
        }
    }

    Ok(rows)
}
