use serde::Serialize;
use tracing::debug;

/// Annualized IRR magnitudes above this percentage are reported as 0.
pub const IMPLAUSIBLE_IRR_PCT: f64 = 500.0;

const NEWTON_GUESS: f64 = 0.0;
const RATE_FLOOR: f64 = -0.999_999;
const RATE_CEILING: f64 = 10.0;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalFlow {
    /// Capital is returned with the profit at completion.
    #[default]
    ProfitPlusEquity,
    ProfitOnly,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Annualization {
    /// `(1 + r)^12 - 1`
    #[default]
    Compound,
    /// `r * 12`
    Simple,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IrrSettings {
    pub terminal_flow: TerminalFlow,
    pub annualization: Annualization,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for IrrSettings {
    fn default() -> Self {
        Self {
            terminal_flow: TerminalFlow::ProfitPlusEquity,
            annualization: Annualization::Compound,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IrrMethod {
    Newton,
    Bisection,
    ClosedForm,
    Unavailable,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IrrEstimate {
    pub annual_rate_pct: f64,
    pub periodic_rate: Option<f64>,
    pub method: IrrMethod,
}

impl IrrEstimate {
    fn unavailable() -> Self {
        Self {
            annual_rate_pct: 0.0,
            periodic_rate: None,
            method: IrrMethod::Unavailable,
        }
    }

    /// True when the figure did not come from a converged root-finder.
    pub fn is_indicative(&self) -> bool {
        matches!(self.method, IrrMethod::ClosedForm | IrrMethod::Unavailable)
    }
}

/// Monthly flows: equity out at 0, nothing while building, the terminal flow
/// in the final month.
pub fn project_cash_flows(
    equity_required: f64,
    profit: f64,
    period_months: u32,
    terminal_flow: TerminalFlow,
) -> Vec<f64> {
    let mut flows = vec![0.0; period_months as usize + 1];
    flows[0] = -equity_required;
    if period_months > 0 {
        flows[period_months as usize] = match terminal_flow {
            TerminalFlow::ProfitPlusEquity => profit + equity_required,
            TerminalFlow::ProfitOnly => profit,
        };
    }
    flows
}

/// Annualized IRR in percent. Never fails: degenerate or non-convergent cases
/// report 0.
pub fn irr(equity_required: f64, profit: f64, period_months: u32) -> f64 {
    estimate_irr(
        equity_required,
        profit,
        period_months,
        &IrrSettings::default(),
    )
    .annual_rate_pct
}

pub fn estimate_irr(
    equity_required: f64,
    profit: f64,
    period_months: u32,
    settings: &IrrSettings,
) -> IrrEstimate {
    if !equity_required.is_finite() || equity_required <= 0.0 || period_months == 0 {
        return IrrEstimate::unavailable();
    }
    if !profit.is_finite() {
        return IrrEstimate::unavailable();
    }

    let terminal = match settings.terminal_flow {
        TerminalFlow::ProfitPlusEquity => profit + equity_required,
        TerminalFlow::ProfitOnly => profit,
    };
    let mut points = vec![(0.0, -equity_required)];
    if terminal != 0.0 {
        points.push((f64::from(period_months), terminal));
    }
    let (periodic_rate, method) =
        match solve_points(&points, settings.max_iterations, settings.tolerance) {
            Some((rate, method)) => (rate, method),
            None => match closed_form_rate(&points) {
                Some(rate) => {
                    debug!(rate, "root finder did not converge; using closed-form rate");
                    (rate, IrrMethod::ClosedForm)
                }
                None => {
                    debug!(equity_required, profit, period_months, "cash flows have no IRR");
                    return IrrEstimate::unavailable();
                }
            },
        };

    let annual = match settings.annualization {
        Annualization::Compound => (1.0 + periodic_rate).powi(12) - 1.0,
        Annualization::Simple => periodic_rate * 12.0,
    } * 100.0;

    if !annual.is_finite() || annual.abs() > IMPLAUSIBLE_IRR_PCT {
        debug!(annual, "discarding implausible IRR");
        return IrrEstimate::unavailable();
    }

    IrrEstimate {
        annual_rate_pct: annual,
        periodic_rate: Some(periodic_rate),
        method,
    }
}

/// Non-zero flows as `(period, amount)`. Only these enter the NPV, so a long
/// programme with two flows costs the same as a short one.
type FlowPoints = Vec<(f64, f64)>;

fn flow_points(flows: &[f64]) -> FlowPoints {
    flows
        .iter()
        .enumerate()
        .filter(|(_, cf)| **cf != 0.0)
        .map(|(t, cf)| (t as f64, *cf))
        .collect()
}

fn npv_with_derivative(points: &[(f64, f64)], rate: f64) -> (f64, f64) {
    let base = 1.0 + rate;
    let mut npv = 0.0;
    let mut derivative = 0.0;
    for &(t, cf) in points {
        let discount = base.powf(-t);
        npv += cf * discount;
        derivative -= t * cf * discount / base;
    }
    (npv, derivative)
}

/// Periodic rate that zeroes the NPV of `flows`. Newton first, then bisection
/// over `(-1, 10]`. Both are bounded by `max_iterations`.
pub fn solve_periodic_rate(
    flows: &[f64],
    max_iterations: u32,
    tolerance: f64,
) -> Option<(f64, IrrMethod)> {
    if flows.len() < 2 {
        return None;
    }
    solve_points(&flow_points(flows), max_iterations, tolerance)
}

fn solve_points(
    points: &[(f64, f64)],
    max_iterations: u32,
    tolerance: f64,
) -> Option<(f64, IrrMethod)> {
    let scale = points.iter().fold(0.0_f64, |acc, (_, cf)| acc.max(cf.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    let threshold = tolerance * scale;

    if let Some(rate) = newton(points, max_iterations, threshold) {
        return Some((rate, IrrMethod::Newton));
    }
    bisection(points, max_iterations, threshold).map(|rate| (rate, IrrMethod::Bisection))
}

fn newton(points: &[(f64, f64)], max_iterations: u32, threshold: f64) -> Option<f64> {
    let mut rate = NEWTON_GUESS;
    for _ in 0..max_iterations {
        let (npv, derivative) = npv_with_derivative(points, rate);
        if !npv.is_finite() || !derivative.is_finite() {
            return None;
        }
        if npv.abs() <= threshold {
            return Some(rate);
        }
        if derivative == 0.0 {
            return None;
        }
        let next = (rate - npv / derivative).clamp(RATE_FLOOR, RATE_CEILING);
        if (next - rate).abs() <= 1e-14 {
            return None;
        }
        rate = next;
    }
    None
}

fn bisection(points: &[(f64, f64)], max_iterations: u32, threshold: f64) -> Option<f64> {
    let mut lo = -0.99;
    let mut hi = RATE_CEILING;
    let (mut npv_lo, _) = npv_with_derivative(points, lo);
    let (npv_hi, _) = npv_with_derivative(points, hi);
    if !npv_lo.is_finite() || !npv_hi.is_finite() || npv_lo.signum() == npv_hi.signum() {
        return None;
    }

    for _ in 0..max_iterations {
        let mid = (lo + hi) * 0.5;
        let (npv_mid, _) = npv_with_derivative(points, mid);
        if !npv_mid.is_finite() {
            return None;
        }
        if npv_mid.abs() <= threshold || (hi - lo) <= 1e-15 {
            return Some(mid);
        }
        if npv_mid.signum() == npv_lo.signum() {
            lo = mid;
            npv_lo = npv_mid;
        } else {
            hi = mid;
        }
    }
    None
}

/// Exact rate for a single outflow at period 0 followed by a single inflow.
fn closed_form_rate(points: &[(f64, f64)]) -> Option<f64> {
    let &[(start, first), (period, terminal)] = points else {
        return None;
    };
    let outlay = -first;
    if start != 0.0 || period <= 0.0 || outlay <= 0.0 || terminal <= 0.0 {
        return None;
    }
    let rate = (terminal / outlay).powf(1.0 / period) - 1.0;
    rate.is_finite().then_some(rate)
}
