use clap::{Parser, ValueEnum};
use insights::pipeline::{daily_series, station_ranking};
use insights::report::{
    describe_months, render_key_numbers, render_monthly, render_recommendations,
    render_stations, render_temperature,
};
use insights::{
    DailySeries, FileCache, InsightsError, InsightsReport, SeasonConfig, SimpleLogger,
    StationCount, monthly_averages, summarize, temperature_relation, write_json,
    write_monthly_csv, write_monthly_parquet, write_stations_csv,
};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

/// Report sections, printed in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    Stations,
    Temperature,
    Monthly,
    Recommendations,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory of monthly trip CSV files (reads the start_station_name column)
    #[arg(long, default_value = "data/2022-citibike-tripdata")]
    trip_dir: PathBuf,

    /// Precomputed station ranking, used when the trip directory is not available
    #[arg(long, default_value = "top10_stations_2022.csv")]
    stations_csv: PathBuf,

    /// Daily ride counts joined with weather (date, daily_ride_count, TAVG)
    #[arg(long, default_value = "citibike_2022_daily_with_weather.csv")]
    daily_csv: PathBuf,

    /// Number of top start stations to report
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Winter month numbers (e.g., 11,12,1,2,3,4). Defaults to Nov-Apr.
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32).range(1..=12))]
    winter_months: Vec<u32>,

    /// Summer month numbers (e.g., 6,7,8). Defaults to Jun-Aug.
    #[arg(long, value_delimiter = ',', value_parser = clap::value_parser!(u32).range(1..=12))]
    summer_months: Vec<u32>,

    /// Restrict the daily series to one calendar year
    #[arg(long)]
    year: Option<i32>,

    /// Sections to print (e.g., stations,monthly). If not specified, prints all.
    #[arg(short, long, value_delimiter = ',')]
    sections: Vec<Section>,

    /// Output base name (will create dir containing .csv, .json, and .parquet files)
    #[arg(short, long, default_value = "citibike_2022")]
    output: String,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

fn main() -> Result<(), InsightsError> {
    let total_start = Instant::now();
    log::set_logger(&LOGGER).map_err(|e| InsightsError::Logger(e.to_string()))?;

    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let defaults = SeasonConfig::default();
    let config = SeasonConfig {
        winter_months: if args.winter_months.is_empty() {
            defaults.winter_months
        } else {
            args.winter_months.clone()
        },
        summer_months: if args.summer_months.is_empty() {
            defaults.summer_months
        } else {
            args.summer_months.clone()
        },
    };
    let wants = |section: Section| args.sections.is_empty() || args.sections.contains(&section);

    println!("Citi Bike Insights");
    debug!(
        "Trip dir: {} | Daily CSV: {} | Top: {}",
        args.trip_dir.display(),
        args.daily_csv.display(),
        args.top
    );
    debug!(
        "Winter: {} | Summer: {} | Year: {:?}",
        describe_months(&config.winter_months),
        describe_months(&config.summer_months),
        args.year
    );

    let mut daily_cache: FileCache<DailySeries> = FileCache::new();
    let mut stations: Vec<StationCount> = Vec::new();

    if wants(Section::Stations) {
        println!("\n== Top {} Most Popular Start Stations ==", args.top);
        let started = Instant::now();
        if let Some(ranked) = station_ranking(&args.trip_dir, &args.stations_csv, args.top)? {
            stations = ranked;
            print!("{}", render_stations(&stations));
            debug!("Station ranking took {:.2?}", started.elapsed());
        }
    }

    let mut temperature = None;
    if wants(Section::Temperature) {
        println!("\n== Daily Trips vs Average Temperature ==");
        if let Some(series) = daily_series(&mut daily_cache, &args.daily_csv, args.year, true)? {
            temperature = temperature_relation(&series.records);
            match &temperature {
                Some(relation) => print!("{}", render_temperature(relation)),
                None => warn!("No day in {} has a temperature value", args.daily_csv.display()),
            }
        }
    }

    let mut monthly = Vec::new();
    if wants(Section::Monthly) {
        println!("\n== Average Daily Rides per Month ==");
        if let Some(series) = daily_series(&mut daily_cache, &args.daily_csv, args.year, false)? {
            monthly = monthly_averages(&series.records);
            print!("{}", render_monthly(&monthly));
        }
    }

    let mut seasonal = None;
    if wants(Section::Recommendations) {
        println!("\n== Recommendations ==");
        match daily_series(&mut daily_cache, &args.daily_csv, args.year, true)? {
            Some(series) => {
                let comparison =
                    summarize(&series.records, &config.winter_months, &config.summer_months);
                println!("Key numbers:");
                print!("{}", render_key_numbers(&comparison));
                println!();
                seasonal = Some(comparison);
            }
            None => warn!("Recommendations will display without computed metrics"),
        }
        print!("{}", render_recommendations(seasonal.as_ref(), &config));
    }
    debug!("Daily series loaded {} time(s)", daily_cache.loads());

    // Write reports
    let output_dir = PathBuf::from(format!("./output/{}", args.output));
    fs::create_dir_all(&output_dir)?;
    let output_name = args
        .output
        .split(['/', '\\'])
        .next_back()
        .unwrap_or(&args.output);
    let io_start = Instant::now();

    if !stations.is_empty() {
        let path = output_dir.join(format!("{}_top_stations.csv", output_name));
        write_stations_csv(&stations, &path)?;
        debug!("  - {}", path.display());
    }
    if !monthly.is_empty() {
        let csv_path = output_dir.join(format!("{}_monthly.csv", output_name));
        let parquet_path = output_dir.join(format!("{}_monthly.parquet", output_name));
        write_monthly_csv(&monthly, &csv_path)?;
        write_monthly_parquet(&monthly, &parquet_path)?;
        debug!("  - {}", csv_path.display());
        debug!("  - {}", parquet_path.display());
    }
    let json_path = output_dir.join(format!("{}_summary.json", output_name));
    write_json(
        &InsightsReport {
            top_stations: &stations,
            monthly: &monthly,
            seasonal: seasonal.as_ref(),
            temperature: temperature.as_ref(),
        },
        &json_path,
    )?;
    debug!("  - {}", json_path.display());

    println!(
        "\nWrote reports to {} in {:.2?}",
        output_dir.display(),
        io_start.elapsed()
    );
    println!("Total runtime: {:.2?}", total_start.elapsed());
    Ok(())
}
