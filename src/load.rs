use crate::error::Result;
use crate::structs::{InsightsReport, MonthlySummary, StationCount};
use crate::transform::month_abbrev;
use arrow_array::{Float64Array, RecordBatch, StringArray, UInt32Array, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use csv::Writer;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::{fs::File, path::Path, sync::Arc};

/// Writes the station ranking to a CSV file.
///
/// The columns match the precomputed ranking read by
/// [`crate::extract::read_station_counts`].
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_stations_csv(stations: &[StationCount], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["start_station_name", "trip_count"])?;
    for station in stations {
        writer.write_record(&[station.station_name.clone(), station.trip_count.to_string()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes monthly ride averages to a CSV file with formatted numeric values.
///
/// # Arguments
/// * `monthly` - Monthly summaries in month order
/// * `output_path` - Path where the CSV file will be created
///
/// # Errors
/// Returns error if file cannot be created or written to.
pub fn write_monthly_csv(monthly: &[MonthlySummary], output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record(["month", "month_name", "avg_daily_rides", "days"])?;
    for summary in monthly {
        writer.write_record(&[
            summary.month.to_string(),
            month_abbrev(summary.month).to_string(),
            format!("{:.2}", summary.avg_ride_count),
            summary.day_count.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the full report to a pretty-formatted JSON file.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json(report: &InsightsReport<'_>, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Writes monthly ride averages to a columnar Parquet file using Arrow format.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_monthly_parquet(monthly: &[MonthlySummary], output_path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("month", DataType::UInt32, false),
        Field::new("month_name", DataType::Utf8, false),
        Field::new("avg_daily_rides", DataType::Float64, false),
        Field::new("days", DataType::UInt64, false),
    ]));

    let months: UInt32Array = monthly.iter().map(|m| m.month).collect();
    let names = StringArray::from_iter_values(monthly.iter().map(|m| month_abbrev(m.month)));
    let averages: Float64Array = monthly.iter().map(|m| m.avg_ride_count).collect();
    let days: UInt64Array = monthly.iter().map(|m| m.day_count as u64).collect();

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(months),
            Arc::new(names),
            Arc::new(averages),
            Arc::new(days),
        ],
    )?;

    let file = File::create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::read_station_counts;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::fs;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "citibike-insights-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_monthly() -> Vec<MonthlySummary> {
        vec![
            MonthlySummary { month: 1, avg_ride_count: 10.5, day_count: 31 },
            MonthlySummary { month: 7, avg_ride_count: 155.0, day_count: 31 },
        ]
    }

    #[test]
    fn stations_csv_reads_back() {
        let dir = scratch_dir("stations");
        let path = dir.join("top.csv");
        let stations = vec![
            StationCount { station_name: "W 21 St, 6 Ave".into(), trip_count: 9 },
            StationCount { station_name: "Pier 40".into(), trip_count: 4 },
        ];
        write_stations_csv(&stations, &path).unwrap();

        let back = read_station_counts(File::open(&path).unwrap(), "top.csv").unwrap();
        assert_eq!(back, stations);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn monthly_csv_has_names_and_rounding() {
        let dir = scratch_dir("monthly-csv");
        let path = dir.join("monthly.csv");
        write_monthly_csv(&sample_monthly(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "month,month_name,avg_daily_rides,days");
        assert_eq!(lines[1], "1,Jan,10.50,31");
        assert_eq!(lines[2], "7,Jul,155.00,31");
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn monthly_parquet_has_one_row_per_month() {
        let dir = scratch_dir("monthly-parquet");
        let path = dir.join("monthly.parquet");
        write_monthly_parquet(&sample_monthly(), &path).unwrap();

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path).unwrap())
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 2);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn json_report_marks_undefined_fields_as_null() {
        let dir = scratch_dir("json");
        let path = dir.join("summary.json");
        let seasonal = crate::structs::SeasonalComparison::default();
        let report = InsightsReport {
            top_stations: &[],
            monthly: &[],
            seasonal: Some(&seasonal),
            temperature: None,
        };
        write_json(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["seasonal"]["winter_to_summer_pct"].is_null());
        assert!(value["temperature"].is_null());
        fs::remove_dir_all(dir).ok();
    }
}
