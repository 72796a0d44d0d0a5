use crate::structs::{
    DailyRecord, MonthlySummary, SeasonalComparison, StationCount, TemperatureRelation,
    TripRecord,
};
use chrono::Datelike;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Ranks start stations by the number of trips that began there.
///
/// Records without a station name are ignored. Names are grouped by exact,
/// case-sensitive equality. Stations with equal counts keep the order in
/// which they were first encountered.
///
/// # Arguments
///
/// * `records` - Trip records, possibly empty
/// * `n` - Maximum number of stations to return
///
/// # Returns
///
/// At most `n` entries sorted by descending trip count.
pub fn top_stations(records: &[TripRecord], n: usize) -> Vec<StationCount> {
    if n == 0 {
        return Vec::new();
    }

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        let Some(name) = record.start_station_name.as_deref() else {
            skipped += 1;
            continue;
        };
        match index.get(name) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(name, counts.len());
                counts.push((name, 1));
            }
        }
    }

    debug!(
        "Counted {} distinct stations, skipped {} trips without a start station",
        counts.len(),
        skipped
    );

    // sort_by is stable, so ties stay in encounter order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(name, trip_count)| StationCount {
            station_name: name.to_string(),
            trip_count,
        })
        .collect()
}

/// Averages daily ride counts per calendar month.
///
/// The year is ignored, so multi-year input merges the same month of
/// different years. Use [`filter_year`] first when that is not wanted.
/// Returns one entry per month present, ascending by month number.
pub fn monthly_averages(series: &[DailyRecord]) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<u32, (u64, usize)> = BTreeMap::new();
    for record in series {
        let entry = by_month.entry(record.date.month()).or_default();
        entry.0 += record.ride_count;
        entry.1 += 1;
    }

    by_month
        .into_iter()
        .map(|(month, (total, days))| MonthlySummary {
            month,
            avg_ride_count: total as f64 / days as f64,
            day_count: days,
        })
        .collect()
}

/// Builds the peak/low month and winter-vs-summer comparison for a daily series.
///
/// Seasonal averages are taken directly over the matching days, so longer
/// months weigh more than shorter ones. Ties for peak and low go to the
/// lowest month number.
///
/// # Arguments
///
/// * `series` - Daily records, single year expected
/// * `winter_months` - Month numbers (1-12) treated as winter
/// * `summer_months` - Month numbers (1-12) treated as summer
///
/// # Returns
///
/// A `SeasonalComparison` whose fields are `None` wherever the input does not
/// support a value (empty series, no matching days, zero summer average).
pub fn summarize(
    series: &[DailyRecord],
    winter_months: &[u32],
    summer_months: &[u32],
) -> SeasonalComparison {
    let monthly = monthly_averages(series);

    let mut peak: Option<&MonthlySummary> = None;
    let mut low: Option<&MonthlySummary> = None;
    for summary in &monthly {
        if peak.is_none_or(|p| summary.avg_ride_count > p.avg_ride_count) {
            peak = Some(summary);
        }
        if low.is_none_or(|l| summary.avg_ride_count < l.avg_ride_count) {
            low = Some(summary);
        }
    }

    let winter_avg = season_average(series, winter_months);
    let summer_avg = season_average(series, summer_months);

    let winter_to_summer_pct = match (winter_avg, summer_avg) {
        (Some(winter), Some(summer)) if summer != 0.0 => Some(winter / summer * 100.0),
        _ => None,
    };
    if winter_to_summer_pct.is_none() {
        debug!("Winter-to-summer ratio undefined (summer average missing or zero)");
    }

    SeasonalComparison {
        peak: peak.cloned(),
        low: low.cloned(),
        winter_avg,
        summer_avg,
        winter_to_summer_pct,
        winter_reduction_pct: winter_to_summer_pct.map(|pct| 100.0 - pct),
    }
}

/// Mean ride count over the days whose month is in `months`.
fn season_average(series: &[DailyRecord], months: &[u32]) -> Option<f64> {
    let (total, days) = series
        .iter()
        .filter(|r| months.contains(&r.date.month()))
        .fold((0u64, 0usize), |(total, days), r| {
            (total + r.ride_count, days + 1)
        });

    (days > 0).then(|| total as f64 / days as f64)
}

/// Relates daily ride counts to the average temperature.
///
/// Only days with a temperature take part. Returns `None` when no day has one.
/// The correlation is `None` with fewer than two days or when either series
/// is constant.
pub fn temperature_relation(series: &[DailyRecord]) -> Option<TemperatureRelation> {
    let pairs: Vec<(f64, f64)> = series
        .iter()
        .filter_map(|r| r.avg_temperature.map(|t| (r.ride_count as f64, t)))
        .collect();

    if pairs.is_empty() {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_rides = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_temperature = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let correlation = if pairs.len() < 2 {
        None
    } else {
        let (mut cov, mut var_rides, mut var_temp) = (0.0, 0.0, 0.0);
        for (rides, temp) in &pairs {
            let dr = rides - mean_rides;
            let dt = temp - mean_temperature;
            cov += dr * dt;
            var_rides += dr * dr;
            var_temp += dt * dt;
        }
        (var_rides > 0.0 && var_temp > 0.0).then(|| cov / (var_rides * var_temp).sqrt())
    };

    Some(TemperatureRelation {
        days: pairs.len(),
        mean_temperature,
        correlation,
    })
}

/// Distinct years present in the series, ascending.
pub fn years_present(series: &[DailyRecord]) -> Vec<i32> {
    series
        .iter()
        .map(|r| r.date.year())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Keeps only the records of one calendar year.
pub fn filter_year(series: &[DailyRecord], year: i32) -> Vec<DailyRecord> {
    series
        .iter()
        .filter(|r| r.date.year() == year)
        .cloned()
        .collect()
}

/// Three-letter English abbreviation of a month number, `"?"` outside 1-12.
pub fn month_abbrev(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBREVIATIONS.get(i as usize))
        .copied()
        .unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32, rides: u64) -> DailyRecord {
        DailyRecord {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            ride_count: rides,
            avg_temperature: None,
        }
    }

    fn trips(names: &[Option<&str>]) -> Vec<TripRecord> {
        names.iter().map(|n| TripRecord::new(*n)).collect()
    }

    #[test]
    fn top_stations_counts_and_drops_missing_names() {
        let records = trips(&[Some("A"), Some("A"), Some("B"), None, Some("A")]);
        let top = top_stations(&records, 2);
        assert_eq!(
            top,
            vec![
                StationCount { station_name: "A".into(), trip_count: 3 },
                StationCount { station_name: "B".into(), trip_count: 1 },
            ]
        );
    }

    #[test]
    fn top_stations_respects_limit_and_sums_counts() {
        let records = trips(&[
            Some("x"), Some("y"), Some("z"), Some("y"), None, Some("x"), Some("w"),
        ]);
        assert_eq!(top_stations(&records, 2).len(), 2);

        let all = top_stations(&records, 100);
        assert_eq!(all.len(), 4);
        assert_eq!(all.iter().map(|s| s.trip_count).sum::<u64>(), 6);
        assert!(all.iter().all(|s| !s.station_name.is_empty()));
    }

    #[test]
    fn top_stations_ties_keep_first_seen_order() {
        let records = trips(&[Some("b"), Some("a"), Some("c"), Some("a"), Some("b")]);
        let names: Vec<_> = top_stations(&records, 3)
            .into_iter()
            .map(|s| s.station_name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn top_stations_is_case_sensitive() {
        let records = trips(&[Some("Pier 40"), Some("pier 40")]);
        assert_eq!(top_stations(&records, 5).len(), 2);
    }

    #[test]
    fn top_stations_empty_cases() {
        assert!(top_stations(&[], 10).is_empty());
        assert!(top_stations(&trips(&[Some("A")]), 0).is_empty());
        assert!(top_stations(&trips(&[None, None]), 3).is_empty());
    }

    #[test]
    fn monthly_averages_sorted_by_month() {
        let series = vec![
            day(2022, 7, 1, 10),
            day(2022, 1, 1, 4),
            day(2022, 7, 2, 20),
            day(2022, 1, 2, 6),
            day(2022, 3, 1, 9),
        ];
        let monthly = monthly_averages(&series);
        let months: Vec<u32> = monthly.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 3, 7]);
        assert_eq!(monthly[0].avg_ride_count, 5.0);
        assert_eq!(monthly[2].avg_ride_count, 15.0);
        assert_eq!(monthly[2].day_count, 2);
    }

    #[test]
    fn summarize_winter_and_summer_example() {
        let series = vec![
            day(2022, 1, 10, 9),
            day(2022, 1, 11, 11),
            day(2022, 6, 1, 100),
            day(2022, 6, 2, 120),
            day(2022, 7, 1, 150),
            day(2022, 7, 2, 160),
            day(2022, 8, 1, 200),
            day(2022, 8, 2, 210),
            day(2022, 12, 1, 10),
            day(2022, 12, 2, 12),
        ];
        let summary = summarize(&series, &[11, 12, 1, 2, 3, 4], &[6, 7, 8]);

        let summer = summary.summer_avg.unwrap();
        assert!((summer - 156.666_666).abs() < 1e-3);
        assert_eq!(summary.winter_avg, Some(10.5));
        let pct = summary.winter_to_summer_pct.unwrap();
        assert!((pct - 6.7).abs() < 0.05);
        assert!((summary.winter_reduction_pct.unwrap() - 93.3).abs() < 0.05);

        assert_eq!(summary.peak_month(), Some(8));
        assert_eq!(summary.peak_value(), Some(205.0));
        assert_eq!(summary.low_month(), Some(1));
        assert_eq!(summary.low_value(), Some(10.0));
    }

    #[test]
    fn summarize_weights_seasons_by_day() {
        // month 6 has three days at 10, month 7 one day at 50
        let series = vec![
            day(2022, 6, 1, 10),
            day(2022, 6, 2, 10),
            day(2022, 6, 3, 10),
            day(2022, 7, 1, 50),
        ];
        let summary = summarize(&series, &[], &[6, 7]);
        assert_eq!(summary.summer_avg, Some(20.0));
        assert_eq!(summary.winter_avg, None);
        assert_eq!(summary.winter_to_summer_pct, None);
    }

    #[test]
    fn summarize_ties_go_to_lowest_month() {
        let series = vec![day(2022, 5, 1, 7), day(2022, 2, 1, 7), day(2022, 9, 1, 7)];
        let summary = summarize(&series, &[2], &[5]);
        assert_eq!(summary.peak_month(), Some(2));
        assert_eq!(summary.low_month(), Some(2));
    }

    #[test]
    fn summarize_zero_summer_leaves_ratio_undefined() {
        let series = vec![day(2022, 1, 1, 5), day(2022, 7, 1, 0)];
        let summary = summarize(&series, &[1], &[7]);
        assert_eq!(summary.summer_avg, Some(0.0));
        assert_eq!(summary.winter_avg, Some(5.0));
        assert!(summary.winter_to_summer_pct.is_none());
        assert!(summary.winter_reduction_pct.is_none());
    }

    #[test]
    fn summarize_empty_series() {
        assert!(monthly_averages(&[]).is_empty());
        let summary = summarize(&[], &[1], &[7]);
        assert_eq!(summary, SeasonalComparison::default());
        assert_eq!(summary.peak_month(), None);
    }

    #[test]
    fn summarize_is_idempotent() {
        let series = vec![day(2022, 1, 1, 3), day(2022, 6, 1, 30), day(2022, 6, 2, 40)];
        let first = summarize(&series, &[1], &[6]);
        let second = summarize(&series, &[1], &[6]);
        assert_eq!(first, second);
    }

    #[test]
    fn temperature_relation_positive_correlation() {
        let mut series = vec![day(2022, 1, 1, 10), day(2022, 4, 1, 20), day(2022, 7, 1, 30)];
        for (record, temp) in series.iter_mut().zip([0.0, 10.0, 20.0]) {
            record.avg_temperature = Some(temp);
        }
        series.push(day(2022, 8, 1, 999));

        let relation = temperature_relation(&series).unwrap();
        assert_eq!(relation.days, 3);
        assert_eq!(relation.mean_temperature, 10.0);
        assert!((relation.correlation.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn temperature_relation_degenerate_inputs() {
        assert!(temperature_relation(&[day(2022, 1, 1, 1)]).is_none());

        let mut single = day(2022, 1, 1, 1);
        single.avg_temperature = Some(3.0);
        let relation = temperature_relation(&[single]).unwrap();
        assert!(relation.correlation.is_none());
    }

    #[test]
    fn years_and_year_filter() {
        let series = vec![day(2021, 12, 31, 1), day(2022, 1, 1, 2), day(2022, 1, 2, 3)];
        assert_eq!(years_present(&series), vec![2021, 2022]);
        let only_2022 = filter_year(&series, 2022);
        assert_eq!(only_2022.len(), 2);
        assert_eq!(monthly_averages(&only_2022)[0].avg_ride_count, 2.5);
    }

    #[test]
    fn month_names() {
        assert_eq!(month_abbrev(1), "Jan");
        assert_eq!(month_abbrev(12), "Dec");
        assert_eq!(month_abbrev(0), "?");
        assert_eq!(month_abbrev(13), "?");
    }
}
