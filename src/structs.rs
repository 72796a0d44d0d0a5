use chrono::NaiveDate;
use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};

/// Simple logger implementation writing `[LEVEL] message` lines to stderr
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// One rental event. Only the start station is read from the trip files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRecord {
    pub start_station_name: Option<String>,
}

impl TripRecord {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            start_station_name: name.map(str::to_string),
        }
    }
}

/// Number of trips started at one station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCount {
    #[serde(rename = "start_station_name")]
    pub station_name: String,
    pub trip_count: u64,
}

/// One calendar day of rides joined with the weather observation for that day
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub ride_count: u64,
    pub avg_temperature: Option<f64>,
}

/// Daily records as loaded from one file.
///
/// The temperature column is optional at load time: ride-only sections work
/// without it, temperature sections ask for it through
/// [`DailySeries::require_temperature`].
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    pub source_name: String,
    pub records: Vec<DailyRecord>,
    pub has_temperature: bool,
}

impl DailySeries {
    /// Records of a series that carries the `TAVG` column.
    ///
    /// # Errors
    /// Returns `InsightsError::MissingColumns` naming `TAVG` when the source
    /// file had no temperature column.
    pub fn require_temperature(&self) -> crate::error::Result<&[DailyRecord]> {
        if self.has_temperature {
            Ok(&self.records)
        } else {
            Err(crate::error::InsightsError::MissingColumns {
                source_name: self.source_name.clone(),
                missing: vec![crate::extract::TEMPERATURE_COLUMN.to_string()],
            })
        }
    }
}

/// Average daily ride count for one calendar month (year ignored)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: u32,
    pub avg_ride_count: f64,
    pub day_count: usize,
}

/// Peak and low months plus the winter-vs-summer demand comparison.
///
/// Every derived value is optional: empty input, empty month sets and a zero
/// summer average leave the affected fields as `None` instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonalComparison {
    pub peak: Option<MonthlySummary>,
    pub low: Option<MonthlySummary>,
    pub winter_avg: Option<f64>,
    pub summer_avg: Option<f64>,
    pub winter_to_summer_pct: Option<f64>,
    pub winter_reduction_pct: Option<f64>,
}

impl SeasonalComparison {
    pub fn peak_month(&self) -> Option<u32> {
        self.peak.as_ref().map(|m| m.month)
    }

    pub fn peak_value(&self) -> Option<f64> {
        self.peak.as_ref().map(|m| m.avg_ride_count)
    }

    pub fn low_month(&self) -> Option<u32> {
        self.low.as_ref().map(|m| m.month)
    }

    pub fn low_value(&self) -> Option<f64> {
        self.low.as_ref().map(|m| m.avg_ride_count)
    }
}

/// How daily ridership moves with the average temperature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureRelation {
    /// Days that carry a temperature observation
    pub days: usize,
    pub mean_temperature: f64,
    /// Pearson correlation of ride count against temperature
    pub correlation: Option<f64>,
}

/// Month groupings used for the seasonal comparison
#[derive(Debug, Clone)]
pub struct SeasonConfig {
    pub winter_months: Vec<u32>,
    pub summer_months: Vec<u32>,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            winter_months: vec![11, 12, 1, 2, 3, 4],
            summer_months: vec![6, 7, 8],
        }
    }
}

/// Everything written to the JSON summary report
#[derive(Debug, Serialize)]
pub struct InsightsReport<'a> {
    pub top_stations: &'a [StationCount],
    pub monthly: &'a [MonthlySummary],
    pub seasonal: Option<&'a SeasonalComparison>,
    pub temperature: Option<&'a TemperatureRelation>,
}
