use super::error::FeasibilityError;
use super::types::check_rate;

/// Excess over a bracket floor is rounded up to this step before the marginal
/// rate applies.
const ROUNDING_STEP: f64 = 100.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StampDutyBracket {
    /// Inclusive upper bound of the bracket; `None` for the open top bracket.
    pub upper_bound: Option<f64>,
    pub base_amount: f64,
    pub marginal_rate: f64,
    pub excess_over: f64,
}

impl StampDutyBracket {
    pub const fn new(
        upper_bound: Option<f64>,
        base_amount: f64,
        marginal_rate: f64,
        excess_over: f64,
    ) -> Self {
        Self {
            upper_bound,
            base_amount,
            marginal_rate,
            excess_over,
        }
    }

    fn contains(&self, price: f64) -> bool {
        self.upper_bound.is_none_or(|upper| price <= upper)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StampDutySchedule {
    brackets: Vec<StampDutyBracket>,
}

impl Default for StampDutySchedule {
    fn default() -> Self {
        Self {
            brackets: vec![
                StampDutyBracket::new(Some(17_000.0), 0.0, 0.0125, 0.0),
                StampDutyBracket::new(Some(36_000.0), 212.0, 0.015, 17_000.0),
                StampDutyBracket::new(Some(97_000.0), 497.0, 0.0175, 36_000.0),
                StampDutyBracket::new(Some(364_000.0), 1_564.0, 0.035, 97_000.0),
                StampDutyBracket::new(Some(1_212_000.0), 10_909.0, 0.045, 364_000.0),
                StampDutyBracket::new(None, 49_069.0, 0.055, 1_212_000.0),
            ],
        }
    }
}

impl StampDutySchedule {
    /// Builds a schedule from brackets ordered by ascending upper bound. The
    /// last bracket must be open-ended.
    pub fn new(brackets: Vec<StampDutyBracket>) -> Result<Self, FeasibilityError> {
        let Some(last) = brackets.last() else {
            return Err(FeasibilityError::invalid(
                "stamp_duty",
                "schedule needs at least one bracket",
            ));
        };
        if last.upper_bound.is_some() {
            return Err(FeasibilityError::invalid(
                "stamp_duty",
                "the last bracket must have no upper bound",
            ));
        }
        let mut previous = f64::NEG_INFINITY;
        for bracket in &brackets[..brackets.len() - 1] {
            let Some(upper) = bracket.upper_bound.filter(|upper| upper.is_finite()) else {
                return Err(FeasibilityError::invalid(
                    "stamp_duty",
                    "only the last bracket may be open-ended and bounds must be finite",
                ));
            };
            if upper <= previous {
                return Err(FeasibilityError::invalid(
                    "stamp_duty",
                    "bracket upper bounds must be strictly increasing",
                ));
            }
            previous = upper;
        }
        for bracket in &brackets {
            check_rate("stamp_duty", bracket.marginal_rate)?;
            for amount in [bracket.base_amount, bracket.excess_over] {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(FeasibilityError::invalid(
                        "stamp_duty",
                        format!("bracket amounts must be finite and non-negative, got {amount}"),
                    ));
                }
            }
        }
        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[StampDutyBracket] {
        &self.brackets
    }

    pub fn duty(&self, purchase_price: f64) -> f64 {
        let price = purchase_price.max(0.0);
        let Some(bracket) = self.brackets.iter().find(|b| b.contains(price)) else {
            return 0.0;
        };
        let excess = (price - bracket.excess_over).max(0.0);
        let rounded = (excess / ROUNDING_STEP).ceil() * ROUNDING_STEP;
        bracket.base_amount + bracket.marginal_rate * rounded
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum StampDutyPolicy {
    FlatRate { rate: f64 },
    Progressive(StampDutySchedule),
}

impl Default for StampDutyPolicy {
    fn default() -> Self {
        StampDutyPolicy::Progressive(StampDutySchedule::default())
    }
}

impl StampDutyPolicy {
    pub const DEFAULT_FLAT_RATE: f64 = 0.055;

    pub fn flat_default() -> Self {
        StampDutyPolicy::FlatRate {
            rate: Self::DEFAULT_FLAT_RATE,
        }
    }

    pub fn duty(&self, purchase_price: f64) -> f64 {
        match self {
            StampDutyPolicy::FlatRate { rate } => purchase_price.max(0.0) * rate,
            StampDutyPolicy::Progressive(schedule) => schedule.duty(purchase_price),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), FeasibilityError> {
        match self {
            StampDutyPolicy::FlatRate { rate } => check_rate("stamp_duty_rate", *rate),
            StampDutyPolicy::Progressive(_) => Ok(()),
        }
    }
}

/// Duty under the default progressive schedule.
pub fn stamp_duty(purchase_price: f64) -> f64 {
    StampDutyPolicy::default().duty(purchase_price)
}
