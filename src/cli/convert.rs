use super::ui::{self, StyleType};
use crate::core::RateProvider;
use crate::core::config::{AppConfig, ConverterConfig, DefaultsConfig};
use crate::core::format::{format_fixed, format_short_date, get_optimal_decimals};
use crate::dashboard::{ChartLayout, ConverterState, ConverterView};
use anyhow::Result;
use comfy_table::{Cell, Table};
use std::sync::Arc;

/// Converts `amount` once and prints the result with a summary of the pair's
/// recent history.
pub async fn run(
    provider: Arc<dyn RateProvider>,
    config: &AppConfig,
    amount: f64,
    from: &str,
    to: &str,
) -> Result<()> {
    let defaults = DefaultsConfig {
        base_currency: from.to_string(),
        target_currency: to.to_string(),
    };
    // A one-shot conversion has nothing to debounce.
    let immediate = ConverterConfig { debounce_ms: 0 };

    let spinner = ui::new_spinner(&format!("Converting {from} to {to}..."));
    let mut view =
        ConverterView::with_amount(provider, &defaults, &immediate, &config.history, amount);
    let state = view.settle().await;
    spinner.finish_and_clear();

    if let Some(message) = &state.error {
        anyhow::bail!("{message}");
    }

    println!("\n{}", ui::style_text(&conversion_line(amount, from, to, &state), StyleType::Value));

    ui::print_separator();
    println!(
        "{}",
        ui::style_text(
            &format!("{from} to {to} exchange rate, last {} days", config.history.days),
            StyleType::Title
        )
    );
    if let Some(message) = &state.history_error {
        println!("{}", ui::style_text(message, StyleType::Error));
        return Ok(());
    }

    let layout = state.history.as_deref().and_then(|points| {
        ChartLayout::compute(
            points,
            &config.chart,
            config.history.interactive_points_limit,
        )
    });
    match layout {
        Some(layout) => println!("{}", history_table(&layout)),
        None => println!(
            "{}",
            ui::style_text("No historical data available.", StyleType::Subtle)
        ),
    }
    Ok(())
}

fn conversion_line(amount: f64, from: &str, to: &str, state: &ConverterState) -> String {
    let converted = state
        .result
        .map(|value| format_fixed(value, get_optimal_decimals(value)))
        .unwrap_or_else(|| "N/A".to_string());
    format!("{amount} {from} = {converted} {to}")
}

fn history_table(layout: &ChartLayout) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Low"),
        ui::header_cell("Median"),
        ui::header_cell("High"),
        ui::header_cell("Latest"),
    ]);

    let first = layout.points[0];
    let last = layout.points[layout.points.len() - 1];
    table.add_row(vec![
        Cell::new(format!(
            "{} - {}",
            format_short_date(first.date),
            format_short_date(last.date)
        )),
        ui::number_cell(layout.format_rate(layout.min_raw)),
        ui::number_cell(layout.format_rate(layout.median_raw)),
        ui::number_cell(layout.format_rate(layout.max_raw)),
        ui::number_cell(layout.format_rate(last.rate)),
    ]);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::HistoryPoint;
    use crate::core::config::ChartConfig;
    use chrono::{Days, NaiveDate};

    #[test]
    fn test_conversion_line() {
        let state = ConverterState {
            result: Some(108.0),
            ..Default::default()
        };
        assert_eq!(conversion_line(100.0, "EUR", "USD", &state), "100 EUR = 108.00 USD");

        let state = ConverterState::default();
        assert_eq!(conversion_line(2.5, "EUR", "USD", &state), "2.5 EUR = N/A USD");
    }

    #[test]
    fn test_history_table() {
        let start = NaiveDate::from_ymd_opt(2024, 11, 14).unwrap();
        let points: Vec<_> = [1.04, 1.08, 1.06]
            .into_iter()
            .enumerate()
            .map(|(i, rate)| HistoryPoint {
                date: start + Days::new(i as u64),
                rate,
            })
            .collect();
        let layout = ChartLayout::compute(&points, &ChartConfig::default(), 30).unwrap();

        let rendered = history_table(&layout).to_string();
        assert!(rendered.contains("Nov 14 - Nov 16"));
        assert!(rendered.contains("1.0400"));
        assert!(rendered.contains("1.0600"));
        assert!(rendered.contains("1.0800"));
    }

    #[tokio::test]
    async fn test_run_same_currency_needs_no_upstream() {
        let stub = Arc::new(crate::dashboard::testing::StubProvider::default());
        let result = run(stub.clone(), &AppConfig::default(), 5.0, "EUR", "EUR").await;

        assert!(result.is_ok());
        assert_eq!(stub.convert_calls(), 0);
        assert_eq!(stub.series_calls(), 0);
    }
}
