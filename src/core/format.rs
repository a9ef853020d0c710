//! Display formatting for rates and dates.

use chrono::NaiveDate;

/// Picks how many decimals to show for a rate of the given magnitude.
///
/// Larger values need fewer decimals, smaller values need more precision.
pub fn get_optimal_decimals(value: f64) -> usize {
    if value >= 100.0 {
        2
    } else if value >= 10.0 {
        3
    } else if value >= 1.0 {
        4
    } else if value >= 0.1 {
        5
    } else {
        6
    }
}

/// Formats a value with a fixed number of decimals.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Short axis label, e.g. `2024-12-13` -> `Dec 13`.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// Publication stamp of a rates snapshot. Rates are published end of day UTC.
pub fn format_rates_date(date: NaiveDate) -> String {
    date.format("%A %b %-d, %Y, 23:59 UTC").to_string()
}
