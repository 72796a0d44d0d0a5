use crate::structs::{
    MonthlySummary, SeasonConfig, SeasonalComparison, StationCount, TemperatureRelation,
};
use crate::transform::month_abbrev;

/// Formats a value rounded to whole units with `,` thousands separators.
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Describes a month set as a range (`"Nov-Apr"`) when the months are
/// consecutive, wrapping over the year end, or as a list otherwise.
pub fn describe_months(months: &[u32]) -> String {
    let mut set: Vec<u32> = months.iter().copied().filter(|m| (1..=12).contains(m)).collect();
    set.sort_unstable();
    set.dedup();

    match set.len() {
        0 => return "none".to_string(),
        1 => return month_abbrev(set[0]).to_string(),
        12 => return "all year".to_string(),
        _ => {}
    }

    let len = set.len() as u32;
    for &start in &set {
        let run = (0..len).all(|offset| set.contains(&((start - 1 + offset) % 12 + 1)));
        if run {
            let end = (start - 1 + len - 1) % 12 + 1;
            return format!("{}-{}", month_abbrev(start), month_abbrev(end));
        }
    }

    set.iter()
        .map(|&m| month_abbrev(m))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a winter reduction as a signed change of demand: a positive
/// reduction reads `-55%`, a negative one (winter busier) reads `+5%`.
pub fn format_change(reduction_pct: f64) -> String {
    let sign = if reduction_pct >= 0.0 { '-' } else { '+' };
    format!("{}{}%", sign, format_thousands(reduction_pct.abs()))
}

/// Renders the station ranking as a numbered table.
///
/// # Arguments
/// * `stations` - Ranking in display order
///
/// # Returns
/// One line per station, names padded to the longest one.
pub fn render_stations(stations: &[StationCount]) -> String {
    let width = stations
        .iter()
        .map(|s| s.station_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (rank, station) in stations.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {:<width$}  {:>9} trips\n",
            rank + 1,
            station.station_name,
            format_thousands(station.trip_count as f64),
        ));
    }
    out
}

/// Renders monthly averages, one line per month.
pub fn render_monthly(monthly: &[MonthlySummary]) -> String {
    monthly
        .iter()
        .map(|summary| {
            format!(
                "  {}  {:>9} rides/day  ({} days)\n",
                month_abbrev(summary.month),
                format_thousands(summary.avg_ride_count),
                summary.day_count
            )
        })
        .collect()
}

/// Renders the ride/temperature relation; an undefined correlation prints as `undefined`.
pub fn render_temperature(relation: &TemperatureRelation) -> String {
    let correlation = match relation.correlation {
        Some(r) => format!("{:+.2}", r),
        None => "undefined".to_string(),
    };
    format!(
        "  Days with temperature: {}\n  Mean temperature: {:.1}°C\n  Rides/temperature correlation: {}\n",
        relation.days, relation.mean_temperature, correlation
    )
}

/// Key numbers behind the recommendations.
///
/// # Arguments
/// * `seasonal` - Seasonal comparison of the daily series
///
/// # Returns
/// Peak month, lowest month and the winter-vs-summer share. Undefined values
/// are left out.
pub fn render_key_numbers(seasonal: &SeasonalComparison) -> String {
    let mut out = String::new();
    if let Some(peak) = &seasonal.peak {
        out.push_str(&format!(
            "  Peak month (avg/day):   {}  {} rides/day\n",
            month_abbrev(peak.month),
            format_thousands(peak.avg_ride_count)
        ));
    }
    if let Some(low) = &seasonal.low {
        out.push_str(&format!(
            "  Lowest month (avg/day): {}  {} rides/day\n",
            month_abbrev(low.month),
            format_thousands(low.avg_ride_count)
        ));
    }
    if let (Some(pct), Some(reduction)) =
        (seasonal.winter_to_summer_pct, seasonal.winter_reduction_pct)
    {
        out.push_str(&format!(
            "  Winter vs Summer:       {}% of summer demand ({})\n",
            format_thousands(pct),
            format_change(reduction)
        ));
    }
    out
}

/// Operational recommendations, backed by the seasonal numbers when available.
///
/// # Arguments
/// * `seasonal` - Seasonal comparison, `None` when the daily data was unusable
/// * `config` - Month sets named in the text
///
/// # Returns
/// The recommendation text. The data-support paragraph appears only when the
/// winter-to-summer ratio is defined.
pub fn render_recommendations(
    seasonal: Option<&SeasonalComparison>,
    config: &SeasonConfig,
) -> String {
    let winter = describe_months(&config.winter_months);
    let summer = describe_months(&config.summer_months);

    let mut out = String::new();
    out.push_str(
        "1) Prioritize high-demand stations\n\
         \x20  - Demand concentrates at the top start stations.\n\
         \x20  - Action: rebalance these stations more often and consider higher dock capacity.\n\n",
    );
    out.push_str(&format!(
        "2) Use seasonality to scale supply ({} vs {})\n\
         \x20  - Daily trips rise with temperature and peak in the warm months.\n\
         \x20  - Action: plan more redistribution in warm months and less in winter.\n",
        winter, summer
    ));
    if let Some((pct, reduction)) = seasonal
        .and_then(|s| s.winter_to_summer_pct.zip(s.winter_reduction_pct))
    {
        let direction = if reduction >= 0.0 { "down" } else { "up" };
        out.push_str(&format!(
            "   - Data support: winter demand ({}) averages about {}% of summer demand ({}).\n\
             \x20    Start by scaling winter redistribution {} by roughly {}%, then tune per station.\n",
            winter,
            format_thousands(pct),
            summer,
            direction,
            format_thousands(reduction.abs())
        ));
    }
    out.push_str(
        "\n3) Improve reliability at peak stations\n\
         \x20  - Action: early morning restocking, mid-day check cycles at the busiest stations,\n\
         \x20    targeted evening rebalancing along commuter corridors.\n\n\
         4) Expand service in high-growth corridors\n\
         \x20  - Action: use trip hotspots and repeated flows to justify new stations or dock expansions.\n",
    );
    out
}
