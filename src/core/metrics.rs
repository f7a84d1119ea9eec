use serde::Serialize;

use super::types::{CostItem, FeasibilityResult, ProjectInputs};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricUnit {
    Currency,
    Percent,
    Area,
    CurrencyPerArea,
    Count,
}

impl MetricUnit {
    pub fn format(self, value: f64) -> String {
        match self {
            MetricUnit::Currency => format_currency(value),
            MetricUnit::Percent => format_percent(value),
            MetricUnit::Area => format_area(value),
            MetricUnit::CurrencyPerArea => format!("{}/sqm", format_currency(value)),
            MetricUnit::Count => format_grouped(value, 0),
        }
    }
}

/// A named output value. `value` keeps full precision; `display` is for
/// people.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    pub key: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub unit: MetricUnit,
    pub display: String,
}

impl Metric {
    pub fn new(key: &'static str, label: &'static str, value: f64, unit: MetricUnit) -> Self {
        Self {
            key,
            label,
            value,
            unit,
            display: unit.format(value),
        }
    }
}

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let digits = format_grouped(value.abs(), 0);
    if value < 0.0 && digits != "0" {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let text = format!("{value:.1}");
    if text == "-0.0" {
        return "0.0%".to_string();
    }
    format!("{text}%")
}

pub fn format_area(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    format!("{} sqm", format_grouped(value, 1))
}

/// Rounds to `decimals` places and inserts thousands separators.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let text = format!("{:.*}", decimals, value.abs());
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    let is_zero = text.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// The full metric table in presentation order.
pub fn metric_set(inputs: &ProjectInputs, result: &FeasibilityResult) -> Vec<Metric> {
    use MetricUnit::*;

    let derived = &result.derived;
    let p = &result.profitability;

    let mut metrics = vec![
        Metric::new("site_price", "Site Purchase Price", inputs.site_price, Currency),
        Metric::new("gross_floor_area", "Gross Floor Area (GFA)", derived.gross_floor_area, Area),
        Metric::new(
            "net_sellable_area",
            "Net Sellable Area (NSA)",
            derived.net_sellable_area,
            Area,
        ),
        Metric::new("dwellings", "Number of Dwellings", inputs.dwellings as f64, Count),
        Metric::new("avg_dwelling_size", "Average Dwelling Size", derived.avg_dwelling_size, Area),
        Metric::new(
            "price_per_dwelling",
            "Price per Dwelling",
            derived.price_per_dwelling,
            Currency,
        ),
        Metric::new(
            "construction_cost_per_area",
            "Construction Cost per GFA",
            derived.construction_cost_per_area,
            CurrencyPerArea,
        ),
        Metric::new(
            "land_cost_per_area",
            "Land Cost per GFA",
            derived.land_cost_per_area,
            CurrencyPerArea,
        ),
        Metric::new("total_build_cost", "Total Build Cost", derived.total_build_cost, Currency),
    ];

    metrics.extend(
        result
            .costs
            .lines
            .iter()
            .filter(|line| line.item != CostItem::Construction)
            .map(|line| Metric::new(line.item.key(), line.label, line.amount, Currency)),
    );

    metrics.extend([
        Metric::new("total_costs", "Total Costs", p.total_costs, Currency),
        Metric::new("expected_revenue", "Expected Revenue", p.expected_revenue, Currency),
        Metric::new("net_revenue", "Net Revenue (ex GST)", p.net_revenue, Currency),
        Metric::new("profit", "Profit", p.profit, Currency),
        Metric::new("profit_margin", "Profit Margin", p.profit_margin, Percent),
        Metric::new(
            "target_profit_margin",
            "Target Profit Margin",
            inputs.target_profit_margin * 100.0,
            Percent,
        ),
        Metric::new("minimum_roe", "Minimum ROE Target", inputs.minimum_roe * 100.0, Percent),
        Metric::new("total_loan", "Total Loan", p.total_loan, Currency),
        Metric::new("equity_required", "Equity Required", p.equity_required, Currency),
        Metric::new("return_on_equity", "Return on Equity (ROE)", p.return_on_equity, Percent),
        Metric::new(
            "internal_rate_of_return",
            "Internal Rate of Return (IRR)",
            p.internal_rate_of_return,
            Percent,
        ),
    ]);

    metrics
}

/// Headline figures used in summaries.
pub const KEY_METRICS: [&str; 7] = [
    "expected_revenue",
    "total_costs",
    "profit",
    "profit_margin",
    "equity_required",
    "return_on_equity",
    "internal_rate_of_return",
];
