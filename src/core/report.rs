use serde::Serialize;
use thiserror::Error;

use super::metrics::{KEY_METRICS, Metric, format_currency, format_percent, metric_set};
use super::types::{CostLine, FeasibilityResult, ProjectInputs};

pub const REPORT_TITLE: &str = "Property Development Feasibility Report";
const REPORT_FOOTER: &str = "Generated by Property Development Feasibility Calculator";

const EXCELLENT_ROE_PCT: f64 = 15.0;
const GOOD_ROE_PCT: f64 = 10.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output was not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InsightLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl InsightLevel {
    fn tag(self) -> &'static str {
        match self {
            InsightLevel::Success => "success",
            InsightLevel::Info => "info",
            InsightLevel::Warning => "warning",
            InsightLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub level: InsightLevel,
    pub message: String,
}

impl Insight {
    fn new(level: InsightLevel, message: String) -> Self {
        Self { level, message }
    }
}

/// Everything needed to render or export a feasibility study.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub address: Option<String>,
    pub key_metrics: Vec<Metric>,
    pub metrics: Vec<Metric>,
    pub cost_breakdown: Vec<CostLine>,
    pub insights: Vec<Insight>,
}

impl FeasibilityReport {
    pub fn build(inputs: &ProjectInputs, result: &FeasibilityResult) -> Self {
        let metrics = metric_set(inputs, result);
        let key_metrics = KEY_METRICS
            .iter()
            .filter_map(|key| metrics.iter().find(|m| m.key == *key).cloned())
            .collect();
        let address = Some(inputs.address.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Self {
            address,
            key_metrics,
            metrics,
            cost_breakdown: result.costs.sorted_ascending(),
            insights: key_insights(inputs, result),
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(REPORT_TITLE);
        out.push('\n');
        if let Some(address) = &self.address {
            out.push_str(&format!("Property: {address}\n"));
        }

        out.push_str("\nFinancial Summary:\n");
        for metric in &self.key_metrics {
            out.push_str(&format!("  {}: {}\n", metric.label, metric.display));
        }

        out.push_str("\nCost Breakdown:\n");
        for line in &self.cost_breakdown {
            out.push_str(&format!("  {}: {}\n", line.label, format_currency(line.amount)));
        }

        out.push_str("\nKey Insights:\n");
        for insight in &self.insights {
            out.push_str(&format!("  [{}] {}\n", insight.level.tag(), insight.message));
        }

        out.push('\n');
        out.push_str(REPORT_FOOTER);
        out.push('\n');
        out
    }

    /// One row per metric: key, label, raw value and display string.
    pub fn to_csv(&self) -> Result<String, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["key", "metric", "value", "display"])?;
        if let Some(address) = &self.address {
            writer.write_record(["address", "Property", address.as_str(), address.as_str()])?;
        }
        for metric in &self.metrics {
            let raw = metric.value.to_string();
            writer.write_record([metric.key, metric.label, raw.as_str(), metric.display.as_str()])?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }
}

pub fn key_insights(inputs: &ProjectInputs, result: &FeasibilityResult) -> Vec<Insight> {
    let p = &result.profitability;
    let mut insights = Vec::with_capacity(5);

    if p.profit > 0.0 {
        insights.push(Insight::new(
            InsightLevel::Success,
            format!(
                "This project shows a profit of {} with a {} margin",
                format_currency(p.profit),
                format_percent(p.profit_margin)
            ),
        ));
    } else {
        insights.push(Insight::new(
            InsightLevel::Error,
            format!(
                "This project shows a loss of {}",
                format_currency(p.profit.abs())
            ),
        ));
    }

    let roe = format_percent(p.return_on_equity);
    insights.push(if p.return_on_equity > EXCELLENT_ROE_PCT {
        Insight::new(
            InsightLevel::Success,
            format!("Excellent return on equity of {roe}"),
        )
    } else if p.return_on_equity > GOOD_ROE_PCT {
        Insight::new(InsightLevel::Info, format!("Good return on equity of {roe}"))
    } else {
        Insight::new(InsightLevel::Warning, format!("Low return on equity of {roe}"))
    });

    let target_margin = inputs.target_profit_margin * 100.0;
    let margin = format_percent(p.profit_margin);
    insights.push(if p.profit_margin >= target_margin {
        Insight::new(
            InsightLevel::Success,
            format!(
                "Profit margin of {margin} meets the {} target",
                format_percent(target_margin)
            ),
        )
    } else {
        Insight::new(
            InsightLevel::Warning,
            format!(
                "Profit margin of {margin} is below the {} target",
                format_percent(target_margin)
            ),
        )
    });

    let minimum_roe = inputs.minimum_roe * 100.0;
    insights.push(if p.return_on_equity >= minimum_roe {
        Insight::new(
            InsightLevel::Success,
            format!(
                "Return on equity of {roe} meets the {} minimum",
                format_percent(minimum_roe)
            ),
        )
    } else {
        Insight::new(
            InsightLevel::Warning,
            format!(
                "Return on equity of {roe} is below the {} minimum",
                format_percent(minimum_roe)
            ),
        )
    });

    if p.irr_is_indicative {
        insights.push(Insight::new(
            InsightLevel::Info,
            "IRR could not be solved from the cash flows and is shown as indicative".to_string(),
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, RevenueSource, evaluate};

    fn report_for(inputs: &ProjectInputs) -> FeasibilityReport {
        let result = evaluate(inputs, &EngineConfig::default()).expect("valid inputs");
        FeasibilityReport::build(inputs, &result)
    }

    fn profitable_inputs() -> ProjectInputs {
        ProjectInputs {
            revenue_source: RevenueSource::Fixed {
                amount: 4_000_000.0,
            },
            ..ProjectInputs::default()
        }
    }

    #[test]
    fn loss_making_project_flags_loss_and_low_roe() {
        let report = report_for(&ProjectInputs::default());

        assert_eq!(report.insights[0].level, InsightLevel::Error);
        assert_eq!(
            report.insights[0].message,
            "This project shows a loss of $1,034,112"
        );
        assert_eq!(report.insights[1].level, InsightLevel::Warning);
        assert_eq!(
            report.insights[1].message,
            "Low return on equity of -86.4%"
        );
        assert!(report.insights[2].message.contains("below the 20.0% target"));
        assert!(report.insights[3].message.contains("below the 15.0% minimum"));
    }

    #[test]
    fn profitable_project_reports_margin() {
        let report = report_for(&profitable_inputs());

        let first = &report.insights[0];
        assert_eq!(first.level, InsightLevel::Success);
        assert!(first.message.starts_with("This project shows a profit of $"));
        assert!(first.message.ends_with("% margin"));
    }

    #[test]
    fn key_metrics_follow_headline_order() {
        let report = report_for(&ProjectInputs::default());
        let keys: Vec<_> = report.key_metrics.iter().map(|m| m.key).collect();
        assert_eq!(keys, KEY_METRICS);
    }

    #[test]
    fn cost_breakdown_is_sorted_smallest_first() {
        let report = report_for(&ProjectInputs::default());

        assert_eq!(report.cost_breakdown.len(), 18);
        assert_eq!(report.cost_breakdown[0].label, "Solicitor Fees");
        assert!(
            report
                .cost_breakdown
                .windows(2)
                .all(|pair| pair[0].amount <= pair[1].amount)
        );
    }

    #[test]
    fn blank_address_is_omitted() {
        let report = report_for(&ProjectInputs {
            address: "   ".to_string(),
            ..ProjectInputs::default()
        });
        assert_eq!(report.address, None);
        assert!(!report.to_text().contains("Property:"));
    }

    #[test]
    fn text_report_has_title_summary_and_footer() {
        let report = report_for(&ProjectInputs {
            address: "12 Example St, Sydney".to_string(),
            ..ProjectInputs::default()
        });
        let text = report.to_text();

        assert!(text.starts_with(REPORT_TITLE));
        assert!(text.contains("Property: 12 Example St, Sydney\n"));
        assert!(text.contains("  Expected Revenue: $1,021,258\n"));
        assert!(text.contains("  Stamp Duty: $17,029\n"));
        assert!(text.contains("[error] This project shows a loss of $1,034,112"));
        assert!(text.trim_end().ends_with(REPORT_FOOTER));
    }

    #[test]
    fn csv_export_has_one_row_per_metric() {
        let report = report_for(&ProjectInputs {
            address: "1 Main Rd, Town".to_string(),
            ..ProjectInputs::default()
        });
        let csv = report.to_csv().expect("csv export");
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "key,metric,value,display");
        assert_eq!(lines[1], "address,Property,\"1 Main Rd, Town\",\"1 Main Rd, Town\"");
        assert_eq!(lines.len(), report.metrics.len() + 2);
        assert!(lines.contains(&"stamp_duty,Stamp Duty,17029,\"$17,029\""));
    }

    #[test]
    fn report_serializes_with_camel_case_keys() {
        let report = report_for(&ProjectInputs::default());
        let value = serde_json::to_value(&report).expect("serialize report");

        assert!(value.get("keyMetrics").is_some());
        assert!(value.get("costBreakdown").is_some());
        assert_eq!(value["insights"][0]["level"], "error");
    }
}
