//! Dashboard widgets: rates table, converter and history chart.

pub mod chart;
pub mod converter;
pub mod rates_table;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use chart::{ChartLayout, ChartView};
pub use converter::{ConverterState, ConverterView};
pub use rates_table::{RatesTableView, select_display_codes};
