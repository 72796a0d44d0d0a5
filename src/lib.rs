pub mod cache;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod report;
pub mod structs;
pub mod transform;

// Re-export public API
pub use cache::FileCache;
pub use error::{InsightsError, Result};
pub use extract::{load_daily_weather, load_station_counts, load_station_trips};
pub use load::{write_json, write_monthly_csv, write_monthly_parquet, write_stations_csv};
pub use structs::{
    DailyRecord, DailySeries, InsightsReport, MonthlySummary, SeasonConfig, SeasonalComparison,
    SimpleLogger, StationCount, TemperatureRelation, TripRecord,
};
pub use transform::{
    filter_year, monthly_averages, summarize, temperature_relation, top_stations, years_present,
};
