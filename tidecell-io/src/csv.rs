//! Site tide and salinity tables
//!
//! One CSV file per site, with a header row. Only three columns are used:
//!
//! | column         | meaning                        |
//! |----------------|--------------------------------|
//! | `timestamp`    | observation time               |
//! | `tide_NAVD88`  | tide height relative to NAVD88 |
//! | `Salinity_ppt` | salinity                       |
//!
//! Other columns are ignored. An empty numeric cell is a missing value and is read
//! as NaN.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tidecell_core::errors::{TideCellError, TideCellResult};
use tidecell_core::timeseries::{FloatValue, SiteRecord, SiteSeries, Time};

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const TIDE_COLUMN: &str = "tide_NAVD88";
pub const SALINITY_COLUMN: &str = "Salinity_ppt";

/// Naive formats tried in order
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Deserialize)]
struct RawRecord {
    timestamp: String,
    #[serde(rename = "tide_NAVD88")]
    tide: String,
    #[serde(rename = "Salinity_ppt")]
    salinity: String,
}

/// Load the table of one site from disk
pub fn load_site_series(path: impl AsRef<Path>, site: &str) -> TideCellResult<SiteSeries> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TideCellError::load(path, e))?;
    let series = read_site_series(BufReader::new(file), path, site)?;
    log::info!(
        "Loaded {} records for {} from {}",
        series.len(),
        site,
        path.display()
    );
    Ok(series)
}

/// Read the table of one site from any reader
///
/// `source` only labels errors.
pub fn read_site_series<R: Read>(
    reader: R,
    source: impl AsRef<Path>,
    site: &str,
) -> TideCellResult<SiteSeries> {
    let source = source.as_ref();
    let mut csv_reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| TideCellError::load(source, format!("failed to read header: {e}")))?
        .clone();
    for column in [TIMESTAMP_COLUMN, TIDE_COLUMN, SALINITY_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(TideCellError::load(
                source,
                format!("missing column `{column}`"),
            ));
        }
    }

    let mut records = Vec::new();
    for (row, result) in csv_reader.deserialize::<RawRecord>().enumerate() {
        // header is line 1
        let line = row + 2;
        let raw = result.map_err(|e| TideCellError::load(source, format!("line {line}: {e}")))?;
        let timestamp = parse_timestamp(&raw.timestamp).ok_or_else(|| {
            TideCellError::load(
                source,
                format!("line {line}: unrecognised timestamp `{}`", raw.timestamp),
            )
        })?;
        records.push(SiteRecord {
            timestamp,
            tide_height: parse_value(&raw.tide, TIDE_COLUMN, line, source)?,
            salinity: parse_value(&raw.salinity, SALINITY_COLUMN, line, source)?,
        });
    }

    let missing = records
        .iter()
        .filter(|r| r.tide_height.is_nan() || r.salinity.is_nan())
        .count();
    if missing > 0 {
        log::debug!("{}: {} records with missing values", site, missing);
    }
    Ok(SiteSeries::new(site, records))
}

/// Parse a timestamp in one of the accepted layouts
///
/// Offsets are converted to UTC. A bare date is midnight.
pub fn parse_timestamp(s: &str) -> Option<Time> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_value(s: &str, column: &str, line: usize, source: &Path) -> TideCellResult<FloatValue> {
    if s.is_empty() {
        return Ok(FloatValue::NAN);
    }
    s.parse::<FloatValue>().map_err(|_| {
        TideCellError::load(source, format!("line {line}: invalid {column} value `{s}`"))
    })
}
