use crate::cache::FileCache;
use crate::error::{InsightsError, Result};
use crate::extract::{load_daily_weather, load_station_counts, load_station_trips};
use crate::structs::{DailySeries, StationCount};
use crate::transform::{filter_year, top_stations, years_present};
use log::{info, warn};
use std::{path::Path, sync::Arc};

/// Ranks stations from the raw trip files, falling back to a precomputed ranking.
///
/// The precomputed ranking is re-sorted by descending trip count (stable, so
/// equal counts keep file order) and cut to `top` entries.
///
/// # Arguments
///
/// * `trip_dir` - Directory of monthly trip CSV files
/// * `stations_csv` - Precomputed `start_station_name,trip_count` file
/// * `top` - Number of stations to keep
///
/// # Returns
///
/// `Ok(None)` after a warning when neither source exists or the usable
/// source holds malformed data.
///
/// # Errors
///
/// Returns error for I/O failures other than a missing source.
pub fn station_ranking(
    trip_dir: &Path,
    stations_csv: &Path,
    top: usize,
) -> Result<Option<Vec<StationCount>>> {
    if trip_dir.is_dir() {
        let Some(trips) = skip_on_bad_data(load_station_trips(trip_dir))? else {
            return Ok(None);
        };
        info!("Aggregating {} trips", trips.len());
        return Ok(Some(top_stations(&trips, top)));
    }

    warn!("Tripdata folder not found: {}", trip_dir.display());
    if !stations_csv.is_file() {
        warn!("File not found: {}", stations_csv.display());
        return Ok(None);
    }

    let Some(mut counts) = skip_on_bad_data(load_station_counts(stations_csv))? else {
        return Ok(None);
    };
    info!("Using precomputed ranking {}", stations_csv.display());
    counts.sort_by(|a, b| b.trip_count.cmp(&a.trip_count));
    counts.truncate(top);
    Ok(Some(counts))
}

/// Daily series through the cache, narrowed to `year` when given.
///
/// A series spanning several years without a `year` filter is reported once,
/// when the file is loaded.
///
/// # Arguments
///
/// * `cache` - Cache shared by every section of one run
/// * `path` - Daily weather-joined CSV file
/// * `year` - Optional calendar year to keep
/// * `needs_temperature` - Whether the caller reads `TAVG`
///
/// # Returns
///
/// `Ok(None)` after a warning when the file is missing, holds malformed data,
/// lacks `date`/`daily_ride_count`, or lacks `TAVG` while `needs_temperature`
/// is set.
///
/// # Errors
///
/// Returns error for I/O failures other than a missing file.
pub fn daily_series(
    cache: &mut FileCache<DailySeries>,
    path: &Path,
    year: Option<i32>,
    needs_temperature: bool,
) -> Result<Option<Arc<DailySeries>>> {
    if !path.is_file() {
        warn!("Daily weather CSV not found: {}", path.display());
        return Ok(None);
    }

    let loads_before = cache.loads();
    let Some(series) = skip_on_bad_data(cache.get_or_load(path, load_daily_weather))? else {
        return Ok(None);
    };
    let freshly_loaded = cache.loads() > loads_before;

    if needs_temperature && skip_on_bad_data(series.require_temperature())?.is_none() {
        return Ok(None);
    }

    match year {
        Some(year) => Ok(Some(Arc::new(DailySeries {
            source_name: series.source_name.clone(),
            records: filter_year(&series.records, year),
            has_temperature: series.has_temperature,
        }))),
        None => {
            if freshly_loaded {
                if let Some(years) = spanned_years(&series) {
                    warn!(
                        "Daily series spans years {:?}; months of different years are merged (use --year)",
                        years
                    );
                }
            }
            Ok(Some(series))
        }
    }
}

/// Years of a series that covers more than one calendar year.
pub fn spanned_years(series: &DailySeries) -> Option<Vec<i32>> {
    let years = years_present(&series.records);
    (years.len() > 1).then_some(years)
}

/// Turns malformed-data errors into a warning and `None`; other errors pass through.
fn skip_on_bad_data<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(
            e @ (InsightsError::MissingColumns { .. }
            | InsightsError::Csv(_)
            | InsightsError::Data(_)),
        ) => {
            warn!("{}", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
