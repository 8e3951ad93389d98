//! CSV point sets.
//!
//! Columns are matched by header name: `lat` and `lon` are required,
//! `year` is optional, anything else is ignored. A `year` that does not
//! parse is dropped without dropping the row.

use std::io::Read;

use film_hotspots_zones_models::{FilmingEvent, PointSet};
use serde::Deserialize;

use crate::EventsError;

const REQUIRED_COLUMNS: &[&str] = &["lat", "lon"];

#[derive(Debug, Deserialize)]
struct CsvRow {
    lat: f64,
    lon: f64,
    #[serde(default)]
    year: Option<String>,
}

impl CsvRow {
    fn into_event(self) -> FilmingEvent {
        FilmingEvent {
            lat: self.lat,
            lon: self.lon,
            year: self.year.as_deref().and_then(parse_year),
        }
    }
}

/// Accepts integer years and whole-number floats (`2016.0`, as written by
/// exports of integer columns that contain blanks).
#[allow(clippy::float_cmp)]
fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= f64::from(i32::MAX) {
        #[allow(clippy::cast_possible_truncation)]
        let year = value as i32;
        return Some(year);
    }

    log::trace!("  ignoring unparsable year {raw:?}");
    None
}

/// Reads a point set from CSV.
///
/// Rows whose coordinates are malformed or out of range are skipped.
///
/// # Errors
///
/// Returns [`EventsError::MissingColumn`] if `lat` or `lon` is absent, or
/// [`EventsError::Csv`] if the header cannot be read.
pub fn points_from_csv(reader: impl Read) -> Result<PointSet, EventsError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(EventsError::MissingColumn {
                name: (*column).to_string(),
            });
        }
    }

    let mut events = Vec::new();
    let mut skipped = 0u64;

    for result in csv_reader.deserialize::<CsvRow>() {
        match result.map(CsvRow::into_event) {
            Ok(event) if event.coordinate().is_valid() => events.push(event),
            Ok(_) => skipped += 1,
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} CSV rows with missing or invalid coordinates");
    }

    Ok(PointSet::new(events))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lat_lon_and_optional_year() {
        let csv = "id,lat,lon,year,title\n\
                   1,48.8566,2.3522,2019,Amelie\n\
                   2,48.8606,2.3376,,Lupin\n";
        let points = points_from_csv(csv.as_bytes()).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points.events()[0].year, Some(2019));
        assert_eq!(points.events()[1].year, None);
        assert!((points.events()[1].lon - 2.3376).abs() < 1e-12);
    }

    #[test]
    fn works_without_year_column() {
        let points = points_from_csv("lon,lat\n2.35,48.85\n".as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
        assert!((points.events()[0].lat - 48.85).abs() < 1e-12);
    }

    #[test]
    fn skips_bad_rows() {
        let csv = "lat,lon\n48.85,2.35\nnot-a-number,2.35\n95.0,2.35\n48.86,\n";
        let points = points_from_csv(csv.as_bytes()).unwrap();
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn float_years_are_read_as_integers() {
        let csv = "lat,lon,year\n48.85,2.35,2016.0\n48.86,2.36,\n";
        let points = points_from_csv(csv.as_bytes()).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points.events()[0].year, Some(2016));
        assert_eq!(points.events()[1].year, None);
    }

    #[test]
    fn bad_year_keeps_the_row() {
        let csv = "lat,lon,year\n48.85,2.35,circa 2010\n48.86,2.36,2017.5\n";
        let points = points_from_csv(csv.as_bytes()).unwrap();

        assert_eq!(points.len(), 2);
        assert!(points.events().iter().all(|e| e.year.is_none()));
        assert!((points.events()[1].lat - 48.86).abs() < 1e-12);
    }

    #[test]
    fn parse_year_forms() {
        assert_eq!(parse_year("2019"), Some(2019));
        assert_eq!(parse_year(" 2016.0 "), Some(2016));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("NaN"), None);
        assert_eq!(parse_year("n/a"), None);
    }

    #[test]
    fn missing_column_is_an_error() {
        let result = points_from_csv("latitude,lon\n48.85,2.35\n".as_bytes());
        assert!(matches!(
            result,
            Err(EventsError::MissingColumn { ref name }) if name == "lat"
        ));
    }

    #[test]
    fn empty_body_is_empty_point_set() {
        let points = points_from_csv("lat,lon\n".as_bytes()).unwrap();
        assert!(points.is_empty());
    }
}
