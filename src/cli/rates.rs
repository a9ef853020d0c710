use super::ui::{self, StyleType};
use crate::core::RateProvider;
use crate::core::config::AppConfig;
use crate::dashboard::RatesTableView;
use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use std::sync::Arc;

/// Prints the rates table, optionally rebased on `base`.
pub async fn run(
    provider: Arc<dyn RateProvider>,
    config: &AppConfig,
    base: Option<&str>,
) -> Result<()> {
    let default_base = config.defaults.base_currency.as_str();

    let spinner = ui::new_spinner("Fetching latest rates...");
    let fetched = futures::try_join!(
        provider.list_currencies(),
        provider.latest_rates(default_base)
    );
    let (currencies, initial) = match fetched {
        Ok(fetched) => fetched,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e).context("Failed to fetch rates");
        }
    };

    let mut view = RatesTableView::new(
        provider,
        config.rates.clone(),
        currencies,
        default_base,
        initial,
    );
    if let Some(base) = base {
        view.set_base(base).await;
    }
    spinner.finish_and_clear();

    if let Some(message) = &view.error {
        anyhow::bail!("{message}");
    }

    println!(
        "\n{}",
        ui::style_text(
            &format!("Exchange Rates Overview ({})", view.current_base),
            StyleType::Title
        )
    );
    println!("{}", ui::style_text(&view.date_label(), StyleType::Subtle));
    println!("{}", rates_table(&view));
    Ok(())
}

fn rates_table(view: &RatesTableView) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Code"),
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (1 {})", view.current_base)),
    ]);

    for row in view.rows() {
        let rate = row.formatted_rate();
        table.add_row(vec![
            Cell::new(row.code),
            Cell::new(row.name),
            ui::number_cell(rate),
        ]);
    }
    table
}
