//! Server-rendered dashboard page.
//!
//! The page works without scripts: inputs are plain GET forms and chart
//! hover targets are links carrying the selected point index.

use super::AppState;
use super::routes::present;
use crate::core::config::{ConverterConfig, DefaultsConfig};
use crate::core::{CurrencyMap, UpstreamError};
use crate::dashboard::chart::{ChartLayout, ChartView};
use crate::dashboard::converter::{ConverterState, ConverterView};
use crate::dashboard::rates_table::RatesTableView;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

const INVALID_AMOUNT_MESSAGE: &str = "Invalid amount. Enter a number.";

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#111}\
main{max-width:64rem;margin:0 auto}\
section{background:#f9fafb;border:1px solid #e5e7eb;border-radius:1.5rem;padding:1.5rem;margin-bottom:3rem}\
.converter{display:flex;gap:1.5rem;flex-wrap:wrap}.converter form{flex:2}.chart{flex:1;position:relative}\
select,input{border:0.5px solid #d1d5db;border-radius:4px;padding:0.4rem;background:#fff}\
table{width:100%;border-collapse:collapse;background:#fff}th,td{padding:0.75rem 1rem;text-align:left}\
td.rate,th.rate{text-align:right}tr{border-bottom:1px solid #e5e7eb}\
.error{color:#dc2626}.muted{color:#6b7280;font-size:0.8rem}\
.tooltip{position:absolute;background:#000;color:#fff;font-size:0.75rem;padding:0.25rem 0.5rem;\
border-radius:4px;transform:translate(-50%,-100%);white-space:nowrap;pointer-events:none}";

#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    base: Option<String>,
    amount: Option<String>,
    from: Option<String>,
    to: Option<String>,
    point: Option<String>,
}

/// Current page inputs, used to build links that change one of them.
#[derive(Debug, Clone)]
struct PageInputs {
    base: String,
    amount: String,
    from: String,
    to: String,
}

impl PageInputs {
    fn href(&self, point: Option<usize>) -> String {
        let point = point.map(|p| p.to_string());
        let mut params = vec![
            ("base", self.base.as_str()),
            ("amount", self.amount.as_str()),
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
        ];
        if let Some(point) = point.as_deref() {
            params.push(("point", point));
        }
        Url::parse_with_params("http://localhost/", &params)
            .ok()
            .and_then(|url| url.query().map(|q| format!("/?{q}")))
            .unwrap_or_else(|| "/".to_string())
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    params: Result<Query<DashboardParams>, QueryRejection>,
) -> Response {
    // A malformed query string renders the default dashboard.
    let params = params.map(|Query(params)| params).unwrap_or_default();
    match build_page(&state, params).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(route = "/", error = %e, "Failed to load dashboard data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_error_page()),
            )
                .into_response()
        }
    }
}

async fn build_page(state: &AppState, params: DashboardParams) -> Result<String, UpstreamError> {
    let config = &state.config;
    let defaults = &config.defaults;
    let provider = Arc::clone(&state.provider);

    let (currencies, initial_rates) = futures::try_join!(
        provider.list_currencies(),
        provider.latest_rates(&defaults.base_currency)
    )?;

    let inputs = PageInputs {
        base: present(params.base).unwrap_or_else(|| defaults.base_currency.clone()),
        amount: present(params.amount).unwrap_or_else(|| "1".to_string()),
        from: present(params.from).unwrap_or_else(|| defaults.base_currency.clone()),
        to: present(params.to).unwrap_or_else(|| defaults.target_currency.clone()),
    };
    let amount = inputs.amount.trim().parse::<f64>().ok();

    // Requests are independent, the page settles both widgets at once.
    let mut converter = ConverterView::with_amount(
        Arc::clone(&provider),
        &DefaultsConfig {
            base_currency: inputs.from.clone(),
            target_currency: inputs.to.clone(),
        },
        &ConverterConfig { debounce_ms: 0 },
        &config.history,
        amount.unwrap_or(f64::NAN),
    );

    let mut table = RatesTableView::new(
        provider,
        config.rates.clone(),
        currencies.clone(),
        &defaults.base_currency,
        initial_rates,
    );

    let (converter_state, ()) = tokio::join!(converter.settle(), table.set_base(&inputs.base));

    let chart = converter_state
        .history
        .as_deref()
        .and_then(|points| {
            ChartLayout::compute(
                points,
                &config.chart,
                config.history.interactive_points_limit,
            )
        })
        .map(|layout| {
            let mut view = ChartView::new(layout);
            if let Some(index) = params.point.and_then(|p| p.parse::<usize>().ok()) {
                view.enter(index);
            }
            view
        });

    let mut html = String::new();
    html.push_str("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Currency Dashboard</title>");
    html.push_str(&format!("<style>{STYLE}</style></head><body><main>"));
    html.push_str(&render_converter(
        &inputs,
        &currencies,
        &converter_state,
        amount.is_none(),
        chart.as_ref(),
        config.history.days,
    ));
    html.push_str(&render_rates_table(&inputs, &table));
    html.push_str("</main></body></html>");
    Ok(html)
}

fn render_currency_options(currencies: &CurrencyMap, selected: &str) -> String {
    currencies
        .iter()
        .map(|(code, name)| {
            let marker = if code == selected { " selected" } else { "" };
            format!(
                "<option value=\"{code}\"{marker}>{code} - {name}</option>",
                code = escape(code),
                name = escape(name)
            )
        })
        .collect()
}

fn render_converter(
    inputs: &PageInputs,
    currencies: &CurrencyMap,
    state: &ConverterState,
    invalid_amount: bool,
    chart: Option<&ChartView>,
    days: u32,
) -> String {
    let result = state.result.map(|r| r.to_string()).unwrap_or_default();
    let mut html = String::from("<h2>Currency Converter</h2><section class=\"converter\">");

    html.push_str("<form method=\"get\" action=\"/\">");
    html.push_str(&format!(
        "<input type=\"hidden\" name=\"base\" value=\"{}\">",
        escape(&inputs.base)
    ));
    html.push_str(&format!(
        "<p><label>From <select name=\"from\">{}</select></label> \
         <input type=\"number\" name=\"amount\" min=\"0\" step=\"any\" value=\"{}\" placeholder=\"Amount\"></p>",
        render_currency_options(currencies, &inputs.from),
        escape(&inputs.amount)
    ));
    html.push_str(&format!(
        "<p><label>To <select name=\"to\">{}</select></label> \
         <input type=\"number\" readonly value=\"{}\" placeholder=\"Result\"></p>",
        render_currency_options(currencies, &inputs.to),
        escape(&result)
    ));
    html.push_str("<button type=\"submit\">Convert</button>");

    if invalid_amount {
        html.push_str(&format!("<p class=\"error\">{INVALID_AMOUNT_MESSAGE}</p>"));
    } else if let Some(error) = &state.error {
        html.push_str(&format!("<p class=\"error\">{}</p>", escape(error)));
    }

    html.push_str(
        "<p class=\"muted\">Exchange rates are provided by \
         <a href=\"https://www.frankfurter.app/\" target=\"_blank\" rel=\"noopener noreferrer\">Frankfurter API</a>, \
         a free and open-source currency data service based on European Central Bank data. \
         Rates are updated daily and should be used for informational purposes only.</p>",
    );
    html.push_str("</form><div class=\"chart\">");

    if let Some(error) = &state.history_error {
        html.push_str(&format!("<p class=\"error\">{}</p>", escape(error)));
    } else if let Some(chart) = chart {
        html.push_str(&render_chart(inputs, chart, days));
    }

    html.push_str("</div></section>");
    html
}

/// SVG rendering of the history chart, including hover targets and the
/// tooltip of the selected point.
pub fn render_chart_svg(chart: &ChartView, href: impl Fn(Option<usize>) -> String) -> String {
    let layout = chart.layout();
    let area = &layout.area;
    let bottom = area.height - area.padding_y;

    let mut svg = format!(
        "<svg viewBox=\"0 0 {w} {h}\" width=\"100%\" role=\"img\" style=\"color:#2563eb\">",
        w = area.width,
        h = area.height
    );
    // Axes
    svg.push_str(&format!(
        "<line x1=\"{x1}\" y1=\"{bottom}\" x2=\"{x2}\" y2=\"{bottom}\" stroke=\"#000\" stroke-width=\"0.5\" opacity=\"0.3\"/>",
        x1 = area.padding_x,
        x2 = area.width - area.padding_x,
    ));
    svg.push_str(&format!(
        "<line x1=\"{x}\" y1=\"{top}\" x2=\"{x}\" y2=\"{bottom}\" stroke=\"#000\" stroke-width=\"0.5\" opacity=\"0.3\"/>",
        x = area.padding_x,
        top = area.padding_y,
    ));

    for label in layout.y_labels() {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"14\" opacity=\"0.6\">{}</text>",
            label.x, label.y, label.text
        ));
    }
    for (label, anchor) in layout.x_labels().into_iter().zip(["start", "middle", "end"]) {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"{anchor}\" font-size=\"14\" opacity=\"0.6\">{}</text>",
            label.x, label.y, label.text
        ));
    }

    svg.push_str(&format!(
        "<polyline fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" points=\"{}\"/>",
        layout.polyline()
    ));
    for end in [layout.first(), layout.last()] {
        svg.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"3\" fill=\"currentColor\"/>",
            end.x, end.y
        ));
    }

    for &index in &layout.hover_targets {
        let coord = layout.coords[index];
        let point = &layout.points[index];
        svg.push_str(&format!(
            "<a href=\"{href}\"><circle cx=\"{x}\" cy=\"{y}\" r=\"8\" fill=\"transparent\" style=\"cursor:pointer\">\
             <title>{date} {rate}</title></circle></a>",
            href = escape(&href(Some(index))),
            x = coord.x,
            y = coord.y,
            date = point.date,
            rate = layout.format_rate(point.rate),
        ));
    }

    if let Some(index) = chart.hovered() {
        let coord = layout.coords[index];
        svg.push_str(&format!(
            "<a href=\"{href}\"><circle cx=\"{}\" cy=\"{}\" r=\"4\" fill=\"#000\" stroke=\"#fff\" stroke-width=\"2\"/></a>",
            coord.x,
            coord.y,
            href = escape(&href(None)),
        ));
    }
    svg.push_str("</svg>");

    if let Some(tooltip) = chart.tooltip() {
        svg.push_str(&format!(
            "<div class=\"tooltip\" style=\"left:{:.2}%;top:{:.2}%\"><strong>{}</strong><br>{}</div>",
            tooltip.left_pct, tooltip.top_pct, tooltip.date, tooltip.rate
        ));
    }
    svg
}

fn render_chart(inputs: &PageInputs, chart: &ChartView, days: u32) -> String {
    format!(
        "<h3>{}/{} Last {days} days</h3>{}",
        escape(&inputs.from),
        escape(&inputs.to),
        render_chart_svg(chart, |point| inputs.href(point))
    )
}

fn render_rates_table(inputs: &PageInputs, table: &RatesTableView) -> String {
    let mut html = String::from("<h2>Exchange Rates Overview</h2><section class=\"rates\">");

    html.push_str("<form method=\"get\" action=\"/\">");
    for (name, value) in [
        ("amount", &inputs.amount),
        ("from", &inputs.from),
        ("to", &inputs.to),
    ] {
        html.push_str(&format!(
            "<input type=\"hidden\" name=\"{name}\" value=\"{}\">",
            escape(value)
        ));
    }
    let options: String = table
        .base_options()
        .into_iter()
        .map(|(code, name)| {
            let marker = if code == table.current_base { " selected" } else { "" };
            format!(
                "<option value=\"{code}\"{marker}>{code} - {name}</option>",
                code = escape(code),
                name = escape(name)
            )
        })
        .collect();
    html.push_str(&format!(
        "<label>Base currency: <select name=\"base\" onchange=\"this.form.submit()\">{options}</select></label> \
         <noscript><button type=\"submit\">Show</button></noscript>"
    ));

    if let Some(error) = &table.error {
        html.push_str(&format!("</form><p class=\"error\">{}</p>", escape(error)));
        html.push_str("</section>");
        return html;
    }

    html.push_str(&format!(
        " <strong class=\"muted\">{}</strong></form>",
        table.date_label()
    ));
    html.push_str(
        "<table><thead><tr><th>Code</th><th>Name</th><th class=\"rate\">Rate</th></tr></thead><tbody>",
    );
    for row in table.rows() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"rate\">{}</td></tr>",
            escape(&row.code),
            escape(&row.name),
            row.formatted_rate()
        ));
    }
    html.push_str("</tbody></table></section>");
    html
}

fn render_error_page() -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>Currency Dashboard</title>\
         <style>{STYLE}</style></head><body><main><p class=\"error\">\
         Failed to load exchange rates. Please try again later.</p></main></body></html>"
    )
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
