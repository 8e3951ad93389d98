//! The current window: most recent rows of `filming_events` in `DuckDB`.

use std::path::Path;

use duckdb::Connection;
use film_hotspots_zones_models::{FilmingEvent, PointSet};

use crate::EventsError;

/// Opens the events database read-only.
///
/// # Errors
///
/// Returns [`EventsError::Database`] if the file cannot be opened.
pub fn open_read_only(path: &Path) -> Result<Connection, EventsError> {
    let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
    Ok(Connection::open_with_flags(path, config)?)
}

/// Loads the `limit` most recent events, newest year first.
///
/// Rows with out-of-range coordinates are dropped.
///
/// # Errors
///
/// Returns [`EventsError::Database`] if the query fails (including a
/// missing `filming_events` table).
pub fn load_current_window(conn: &Connection, limit: usize) -> Result<PointSet, EventsError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    let mut stmt = conn.prepare(
        "SELECT lat, lon, year FROM filming_events \
         WHERE lat IS NOT NULL AND lon IS NOT NULL \
         ORDER BY year DESC NULLS LAST \
         LIMIT ?",
    )?;

    let rows = stmt.query_map(duckdb::params![limit], |row| {
        Ok(FilmingEvent {
            lat: row.get(0)?,
            lon: row.get(1)?,
            year: row.get(2)?,
        })
    })?;

    let mut events = Vec::new();
    for row in rows {
        let event = row?;
        if event.coordinate().is_valid() {
            events.push(event);
        }
    }

    log::info!("Loaded {} current-window events", events.len());
    Ok(PointSet::new(events))
}
