use crate::error::{InsightsError, Result};
use crate::structs::{DailyRecord, DailySeries, StationCount, TripRecord};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{Reader, ReaderBuilder, StringRecord};
use log::{debug, info};
use rayon::prelude::*;
use std::{fs, fs::File, io::Read, path::Path, path::PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const STATION_COLUMN: &str = "start_station_name";
pub const TRIP_COUNT_COLUMN: &str = "trip_count";
pub const DATE_COLUMN: &str = "date";
pub const RIDE_COUNT_COLUMN: &str = "daily_ride_count";
pub const TEMPERATURE_COLUMN: &str = "TAVG";

/// Loads the start station of every trip from a directory of monthly CSV files.
///
/// Files are picked up by the `.csv` extension and read in parallel. The
/// returned records keep file-name order, then row order within each file.
///
/// # Errors
///
/// Returns error if the directory cannot be listed, a file cannot be read, or
/// a file has no `start_station_name` column.
pub fn load_station_trips(trip_dir: &Path) -> Result<Vec<TripRecord>> {
    let files = list_csv_files(trip_dir)?;
    info!(
        "Reading {} trip files from {}",
        files.len(),
        trip_dir.display()
    );

    let per_file: Vec<Vec<TripRecord>> = files
        .par_iter()
        .map(|path| -> Result<Vec<TripRecord>> {
            debug!("Reading trip file {}", path.display());
            let file = File::open(path)?;
            read_trip_records(file, &path.display().to_string())
        })
        .collect::<Result<_>>()?;

    let records: Vec<TripRecord> = per_file.into_iter().flatten().collect();
    debug!("Loaded {} trip records", records.len());
    Ok(records)
}

/// Sorted list of `*.csv` files directly inside `dir`.
fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// CSV reader over data with a header row. Short rows are accepted; their
/// missing trailing cells read as absent.
fn csv_reader<R: Read>(input: R) -> Reader<R> {
    ReaderBuilder::new().flexible(true).from_reader(input)
}

/// Reads trip records from CSV data with a header row.
///
/// Only the `start_station_name` column is used. Names are kept exactly as
/// written; blank or missing cells become `None`.
pub fn read_trip_records<R: Read>(input: R, source_name: &str) -> Result<Vec<TripRecord>> {
    let mut reader = csv_reader(input);
    let headers = reader.headers()?.clone();
    let [station_idx] = require_columns(&headers, [STATION_COLUMN], source_name)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let name = row.get(station_idx).filter(|s| !s.trim().is_empty());
        records.push(TripRecord::new(name));
    }
    Ok(records)
}

/// Loads the weather-joined daily series from a CSV file, sorted by date.
///
/// # Errors
///
/// Returns `InsightsError::MissingColumns` if `date` or `daily_ride_count` is
/// absent from the header, or an I/O / CSV error. A missing `TAVG` column is
/// recorded in [`DailySeries::has_temperature`] instead.
pub fn load_daily_weather(csv_path: &Path) -> Result<DailySeries> {
    debug!("Reading daily weather file: {}", csv_path.display());
    let file = File::open(csv_path)?;
    read_daily_records(file, &csv_path.display().to_string())
}

/// Reads daily records from CSV data with a header row.
///
/// Rows whose date or ride count cannot be parsed are skipped. An empty or
/// missing temperature cell becomes `None`. The result is sorted ascending
/// by date.
pub fn read_daily_records<R: Read>(input: R, source_name: &str) -> Result<DailySeries> {
    let mut reader = csv_reader(input);
    let headers = reader.headers()?.clone();
    let [date_idx, rides_idx] =
        require_columns(&headers, [DATE_COLUMN, RIDE_COUNT_COLUMN], source_name)?;
    let temp_idx = column_index(&headers, TEMPERATURE_COLUMN);
    if temp_idx.is_none() {
        debug!("{} has no {} column", source_name, TEMPERATURE_COLUMN);
    }

    let mut records = Vec::new();
    let mut total_rows = 0usize;
    for row in reader.records() {
        let row = row?;
        total_rows += 1;

        let Some(date) = row.get(date_idx).and_then(parse_date) else {
            continue;
        };
        let Some(ride_count) = row.get(rides_idx).and_then(parse_count) else {
            continue;
        };
        let avg_temperature = temp_idx
            .and_then(|idx| row.get(idx))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|t| t.is_finite());

        records.push(DailyRecord {
            date,
            ride_count,
            avg_temperature,
        });
    }

    let skipped = total_rows - records.len();
    if skipped > 0 {
        debug!(
            "Skipped {} of {} rows in {} (unparsable date or ride count)",
            skipped, total_rows, source_name
        );
    }

    records.sort_by_key(|r| r.date);
    Ok(DailySeries {
        source_name: source_name.to_string(),
        records,
        has_temperature: temp_idx.is_some(),
    })
}

/// Loads a precomputed station ranking (`start_station_name`, `trip_count`).
pub fn load_station_counts(csv_path: &Path) -> Result<Vec<StationCount>> {
    let file = File::open(csv_path)?;
    read_station_counts(file, &csv_path.display().to_string())
}

/// Reads a precomputed station ranking from CSV data, keeping file order.
pub fn read_station_counts<R: Read>(input: R, source_name: &str) -> Result<Vec<StationCount>> {
    let mut reader = csv_reader(input);
    let headers = reader.headers()?.clone();
    let [station_idx, count_idx] =
        require_columns(&headers, [STATION_COLUMN, TRIP_COUNT_COLUMN], source_name)?;

    let mut counts = Vec::new();
    for (line, row) in reader.records().enumerate() {
        let row = row?;
        let station_name = row.get(station_idx).unwrap_or_default().to_string();
        let trip_count = row
            .get(count_idx)
            .and_then(parse_count)
            .ok_or_else(|| {
                InsightsError::Data(format!(
                    "Invalid trip_count on data row {} of {}",
                    line + 1,
                    source_name
                ))
            })?;
        counts.push(StationCount {
            station_name,
            trip_count,
        });
    }
    Ok(counts)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Resolves the index of each required column, reporting all missing ones at once.
fn require_columns<const N: usize>(
    headers: &StringRecord,
    names: [&str; N],
    source_name: &str,
) -> Result<[usize; N]> {
    let positions = names.map(|name| column_index(headers, name));

    let missing: Vec<String> = names
        .iter()
        .zip(positions.iter())
        .filter(|(_, pos)| pos.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(InsightsError::MissingColumns {
            source_name: source_name.to_string(),
            missing,
        });
    }

    Ok(positions.map(|pos| pos.unwrap_or_default()))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parses a non-negative count, accepting integral floats such as `"1234.0"`.
fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u64>() {
        return Some(count);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}
