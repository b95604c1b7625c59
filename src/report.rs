//! Phase 3: The Report
//!
//! Everything the user sees. The engine hands over the full ranked list;
//! percent formatting, profit cut-offs and top-N truncation happen here.

use console::style;
use eyre::Result;
use serde::Serialize;

use crate::model::{ArbitrageOpportunity, Currency};
use crate::service::ScanReport;

/// `(profit - 1) * 100` with four decimals, e.g. `0.1234`
pub fn format_profit(opportunity: &ArbitrageOpportunity) -> String {
    format!("{:.4}", opportunity.profit_percentage())
}

/// Apply the optional profit cut-off and row limit, keeping rank order
pub fn select<'a>(
    opportunities: &'a [ArbitrageOpportunity],
    min_profit_pct: Option<f64>,
    limit: Option<usize>,
) -> Vec<&'a ArbitrageOpportunity> {
    opportunities
        .iter()
        .filter(|o| min_profit_pct.map_or(true, |min| o.profit_percentage() >= min))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

pub fn print_table(report: &ScanReport, rows: &[&ArbitrageOpportunity]) {
    println!();
    println!(
        "{}",
        style(format!(
            "═══ {} loops over {} currencies / {} quoted pairs ({}ms) ═══",
            report.opportunities.len(),
            report.currency_count,
            report.quoted_pair_count,
            report.elapsed_ms
        ))
        .magenta()
        .bold()
    );
    println!(
        "   scanned at {}",
        report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if rows.is_empty() {
        println!("{}", style("No loops match the current filters.").yellow());
        return;
    }

    println!("  {:>3}  {:>10}  {:>4}  {}", "#", "Profit %", "Hops", "Route");
    for (i, opportunity) in rows.iter().enumerate() {
        let profit = format_profit(opportunity);
        let profit = if opportunity.is_profitable() {
            style(profit).green().bold()
        } else {
            style(profit).dim()
        };

        println!(
            "  {:>3}  {:>10}  {:>4}  {}",
            i + 1,
            profit,
            opportunity.hop_count(),
            style(opportunity.format_route()).cyan()
        );
    }

    if rows.len() < report.opportunities.len() {
        println!();
        println!(
            "   … {} more not shown",
            report.opportunities.len() - rows.len()
        );
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    meta: JsonMeta<'a>,
    opportunities: Vec<JsonOpportunity<'a>>,
}

#[derive(Serialize)]
struct JsonMeta<'a> {
    scanned_at: &'a chrono::DateTime<chrono::Utc>,
    currency_count: usize,
    pair_count: usize,
    quoted_pair_count: usize,
    elapsed_ms: u128,
    total: usize,
}

#[derive(Serialize)]
struct JsonOpportunity<'a> {
    profit: f64,
    profit_pct: String,
    route: &'a [Currency],
}

pub fn render_json(report: &ScanReport, rows: &[&ArbitrageOpportunity]) -> Result<String> {
    let document = JsonReport {
        meta: JsonMeta {
            scanned_at: &report.scanned_at,
            currency_count: report.currency_count,
            pair_count: report.pair_count,
            quoted_pair_count: report.quoted_pair_count,
            elapsed_ms: report.elapsed_ms,
            total: report.opportunities.len(),
        },
        opportunities: rows
            .iter()
            .map(|o| JsonOpportunity {
                profit: o.profit,
                profit_pct: format_profit(o),
                route: &o.route,
            })
            .collect(),
    };

    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn print_currencies(currencies: &[Currency]) {
    println!();
    println!(
        "{}",
        style(format!("═══ {} currencies ═══", currencies.len()))
            .blue()
            .bold()
    );
    for (i, currency) in currencies.iter().enumerate() {
        println!("  {:>3}. {}", i + 1, currency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn opp(profit: f64) -> ArbitrageOpportunity {
        ArbitrageOpportunity {
            profit,
            route: vec!["BTC".into(), "USD".into(), "BTC".into()],
        }
    }

    fn report(opportunities: Vec<ArbitrageOpportunity>) -> ScanReport {
        ScanReport {
            scanned_at: Utc::now(),
            currency_count: 2,
            pair_count: 1,
            quoted_pair_count: 1,
            elapsed_ms: 3,
            opportunities,
        }
    }

    #[test]
    fn test_format_profit() {
        assert_eq!(format_profit(&opp(1.0)), "0.0000");
        assert_eq!(format_profit(&opp(1.0123456)), "1.2346");
        assert_eq!(format_profit(&opp(3600.0 / 3700.0)), "-2.7027");
    }

    #[test]
    fn test_select_filters_then_truncates() {
        let list = vec![opp(1.02), opp(1.01), opp(1.0), opp(0.99)];

        assert_eq!(select(&list, None, None).len(), 4);
        assert_eq!(select(&list, None, Some(2)).len(), 2);

        let picked = select(&list, Some(0.0), Some(10));
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0].profit, 1.02);
    }

    #[test]
    fn test_render_json() {
        let report = report(vec![opp(1.02), opp(0.99)]);
        let rows = select(&report.opportunities, None, Some(1));

        let json = render_json(&report, &rows).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["total"], 2);
        assert_eq!(value["opportunities"].as_array().unwrap().len(), 1);
        assert_eq!(value["opportunities"][0]["profit_pct"], "2.0000");
        assert_eq!(value["opportunities"][0]["route"][1], "USD");
    }
}
