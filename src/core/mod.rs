mod costs;
mod engine;
mod error;
mod metrics;
mod report;
mod solver;
mod stamp_duty;
mod types;

pub use costs::{CostEntry, CostModel, CostRule, SelfReferenceStrategy};
pub use engine::{
    DEFAULT_CONSTRUCTION_LOAN_FRACTION, EngineConfig, EnginePreset, LoanModel,
    assess_profitability, derive_quantities, evaluate,
};
pub use error::FeasibilityError;
pub use metrics::{
    KEY_METRICS, Metric, MetricUnit, format_area, format_currency, format_grouped,
    format_percent, metric_set,
};
pub use report::{FeasibilityReport, Insight, InsightLevel, REPORT_TITLE, ReportError, key_insights};
pub use solver::{
    Annualization, IMPLAUSIBLE_IRR_PCT, IrrEstimate, IrrMethod, IrrSettings, TerminalFlow,
    estimate_irr, irr, project_cash_flows, solve_periodic_rate,
};
pub use stamp_duty::{StampDutyBracket, StampDutyPolicy, StampDutySchedule, stamp_duty};
pub use types::{
    AreaSource, CostBreakdown, CostItem, CostLine, DerivedQuantities, FeasibilityResult,
    MAX_DEVELOPMENT_MONTHS, Profitability, ProjectInputs, RevenueSource,
};
