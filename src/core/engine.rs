use tracing::debug;

use super::costs::{CostModel, SelfReferenceStrategy};
use super::error::FeasibilityError;
use super::solver::{IrrSettings, estimate_irr};
use super::types::{
    AreaSource, CostBreakdown, CostItem, DerivedQuantities, FeasibilityResult, Profitability,
    ProjectInputs, RevenueSource,
};

pub const DEFAULT_CONSTRUCTION_LOAN_FRACTION: f64 = 0.8;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LoanModel {
    /// A construction loan covering a fixed share of the build cost.
    ConstructionOnly { fraction: f64 },
    /// Site and build cost financed at the project's loan-to-value ratio.
    FullLvr,
}

impl Default for LoanModel {
    fn default() -> Self {
        LoanModel::ConstructionOnly {
            fraction: DEFAULT_CONSTRUCTION_LOAN_FRACTION,
        }
    }
}

impl LoanModel {
    pub fn total_loan(self, inputs: &ProjectInputs, derived: &DerivedQuantities) -> f64 {
        match self {
            LoanModel::ConstructionOnly { fraction } => derived.total_build_cost * fraction,
            LoanModel::FullLvr => {
                (inputs.site_price + derived.total_build_cost) * inputs.loan_to_value_ratio
            }
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum EnginePreset {
    #[default]
    Standard,
    Leveraged,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub cost_model: CostModel,
    pub loan_model: LoanModel,
    pub self_reference: SelfReferenceStrategy,
    pub irr: IrrSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_preset(EnginePreset::Standard)
    }
}

impl EngineConfig {
    pub fn from_preset(preset: EnginePreset) -> Self {
        match preset {
            EnginePreset::Standard => Self {
                cost_model: CostModel::standard(),
                loan_model: LoanModel::default(),
                self_reference: SelfReferenceStrategy::Subtotal,
                irr: IrrSettings::default(),
            },
            EnginePreset::Leveraged => Self {
                cost_model: CostModel::leveraged(),
                loan_model: LoanModel::FullLvr,
                self_reference: SelfReferenceStrategy::Subtotal,
                irr: IrrSettings::default(),
            },
        }
    }

    fn validate(&self) -> Result<(), FeasibilityError> {
        if let LoanModel::ConstructionOnly { fraction } = self.loan_model {
            if !fraction.is_finite() || fraction < 0.0 {
                return Err(FeasibilityError::invalid(
                    "loan_fraction",
                    format!("must be a finite value >= 0, got {fraction}"),
                ));
            }
        }
        Ok(())
    }
}

/// Validates the inputs and runs the whole pipeline.
pub fn evaluate(
    inputs: &ProjectInputs,
    config: &EngineConfig,
) -> Result<FeasibilityResult, FeasibilityError> {
    inputs.validate()?;
    config.validate()?;

    let derived = derive_quantities(inputs);
    let costs = config
        .cost_model
        .aggregate(inputs, &derived, config.self_reference);
    let profitability = assess_profitability(inputs, &derived, &costs, config);
    debug!(
        total_costs = costs.total_costs,
        profit = profitability.profit,
        irr = profitability.internal_rate_of_return,
        "evaluated feasibility"
    );

    Ok(FeasibilityResult {
        derived,
        costs,
        profitability,
    })
}

pub fn derive_quantities(inputs: &ProjectInputs) -> DerivedQuantities {
    let (gross_floor_area, net_sellable_area) = match inputs.area_source {
        AreaSource::Planning {
            site_area,
            floor_space_ratio,
            nsa_ratio,
        } => {
            let gfa = site_area * floor_space_ratio;
            (gfa, gfa * nsa_ratio)
        }
        AreaSource::Measured { gfa, nsa } => (gfa, nsa),
    };
    let dwellings = inputs.dwellings.max(1) as f64;
    let expected_revenue = match inputs.revenue_source {
        RevenueSource::SalesRate { rate_per_area } => net_sellable_area * rate_per_area,
        RevenueSource::Fixed { amount } => amount,
    };
    let land_cost_per_area = if gross_floor_area > 0.0 {
        inputs.site_price / gross_floor_area
    } else {
        0.0
    };

    DerivedQuantities {
        gross_floor_area,
        net_sellable_area,
        avg_dwelling_size: net_sellable_area / dwellings,
        price_per_dwelling: expected_revenue / dwellings,
        land_cost_per_area,
        construction_cost_per_area: inputs.construction_cost_per_area,
        total_build_cost: gross_floor_area * inputs.construction_cost_per_area,
        expected_revenue,
    }
}

/// GST on sales is carried as a cost line, so profit is revenue less total
/// costs; `net_revenue` is informational.
pub fn assess_profitability(
    inputs: &ProjectInputs,
    derived: &DerivedQuantities,
    costs: &CostBreakdown,
    config: &EngineConfig,
) -> Profitability {
    let revenue = derived.expected_revenue;
    let total_costs = costs.total_costs;
    let gst = costs.amount(CostItem::GstOnSales).unwrap_or(0.0);

    let profit = revenue - total_costs;
    let profit_margin = if revenue > 0.0 {
        profit / revenue * 100.0
    } else {
        0.0
    };

    let total_loan = config.loan_model.total_loan(inputs, derived);
    let equity_required = total_costs - total_loan;
    let return_on_equity = if equity_required > 0.0 {
        profit / equity_required * 100.0
    } else {
        0.0
    };

    let irr = estimate_irr(
        equity_required,
        profit,
        inputs.development_period_months,
        &config.irr,
    );

    Profitability {
        expected_revenue: revenue,
        net_revenue: revenue - gst,
        total_costs,
        profit,
        profit_margin,
        total_loan,
        equity_required,
        return_on_equity,
        internal_rate_of_return: irr.annual_rate_pct,
        irr_is_indicative: irr.is_indicative(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::solver::TerminalFlow;
    use crate::core::stamp_duty::StampDutyPolicy;
    use crate::core::types::MAX_DEVELOPMENT_MONTHS;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx(actual: f64, expected: f64) {
        assert_approx_tol(actual, expected, 1e-6);
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn planning(site_area: f64, floor_space_ratio: f64, nsa_ratio: f64) -> AreaSource {
        AreaSource::Planning {
            site_area,
            floor_space_ratio,
            nsa_ratio,
        }
    }

    #[test]
    fn canonical_scenario_reproduces_hand_calculated_metrics() {
        let inputs = ProjectInputs::default();
        let result = evaluate(&inputs, &EngineConfig::default()).expect("valid inputs");

        let derived = result.derived;
        assert_approx(derived.gross_floor_area, 429.1);
        assert_approx(derived.net_sellable_area, 364.735);
        assert_approx(derived.total_build_cost, 1_072_750.0);
        assert_approx(derived.expected_revenue, 1_021_258.0);
        assert_approx(derived.avg_dwelling_size, 182.3675);
        assert_approx(derived.price_per_dwelling, 510_629.0);
        assert_approx(derived.land_cost_per_area, 500_000.0 / 429.1);

        let p = result.profitability;
        assert_approx(p.total_costs, 2_055_370.3125);
        assert_approx(p.profit, -1_034_112.3125);
        assert_approx(p.profit_margin, -101.258_674_350_653_8);
        assert_approx(p.total_loan, 858_200.0);
        assert_approx(p.equity_required, 1_197_170.3125);
        assert_approx(p.return_on_equity, -86.379_715_709_831_39);
        assert_approx_tol(p.internal_rate_of_return, -73.527_754_505_265_32, 1e-6);
        assert_approx(p.net_revenue, 1_021_258.0 - 102_125.8);
        assert!(!p.irr_is_indicative);
    }

    #[test]
    fn profitable_fixed_revenue_scenario() {
        let inputs = ProjectInputs {
            revenue_source: RevenueSource::Fixed {
                amount: 3_000_000.0,
            },
            ..ProjectInputs::default()
        };
        let result = evaluate(&inputs, &EngineConfig::default()).expect("valid inputs");
        let p = result.profitability;

        assert_approx(result.derived.expected_revenue, 3_000_000.0);
        assert_approx(result.derived.price_per_dwelling, 1_500_000.0);
        assert!(p.profit > 0.0);
        assert!(p.return_on_equity > 0.0);
        assert!(p.internal_rate_of_return > 0.0);

        let months = 18.0;
        let growth = (p.profit + p.equity_required) / p.equity_required;
        let monthly = growth.powf(1.0 / months) - 1.0;
        assert_approx_tol(
            p.internal_rate_of_return,
            ((1.0 + monthly).powi(12) - 1.0) * 100.0,
            1e-6,
        );
    }

    #[test]
    fn measured_areas_are_used_verbatim() {
        let inputs = ProjectInputs {
            area_source: AreaSource::Measured {
                gfa: 200.0,
                nsa: 180.0,
            },
            ..ProjectInputs::default()
        };
        let derived = derive_quantities(&inputs);
        assert_approx(derived.gross_floor_area, 200.0);
        assert_approx(derived.net_sellable_area, 180.0);
        assert_approx(derived.total_build_cost, 500_000.0);
        assert_approx(derived.land_cost_per_area, 2_500.0);
    }

    #[test]
    fn zero_gfa_gives_zero_land_cost_per_area() {
        let inputs = ProjectInputs {
            area_source: planning(0.0, 0.7, 0.85),
            ..ProjectInputs::default()
        };
        let derived = derive_quantities(&inputs);
        assert_eq!(derived.land_cost_per_area, 0.0);
        assert_eq!(derived.total_build_cost, 0.0);
    }

    #[test]
    fn zero_revenue_gives_zero_margin() {
        let inputs = ProjectInputs {
            revenue_source: RevenueSource::Fixed { amount: 0.0 },
            ..ProjectInputs::default()
        };
        let result = evaluate(&inputs, &EngineConfig::default()).expect("valid inputs");
        assert_eq!(result.profitability.profit_margin, 0.0);
        assert!(result.profitability.profit < 0.0);
    }

    fn build_cost_only_inputs() -> ProjectInputs {
        ProjectInputs {
            site_price: 0.0,
            demolition_cost: 0.0,
            consultant_costs: 0.0,
            marketing_costs: 0.0,
            council_fees: 0.0,
            statutory_fees: 0.0,
            legal_fees: 0.0,
            professional_fees: 0.0,
            solicitor_fees: 0.0,
            insurance_costs: 0.0,
            utilities_connection: 0.0,
            agents_commission_rate: 0.0,
            gst_rate: 0.0,
            contingency_rate: 0.0,
            interest_rate: 0.0,
            ..ProjectInputs::default()
        }
    }

    #[test]
    fn zero_equity_gives_zero_roe_and_irr() {
        let inputs = build_cost_only_inputs();
        let config = EngineConfig {
            loan_model: LoanModel::ConstructionOnly { fraction: 1.0 },
            ..EngineConfig::default()
        };
        let result = evaluate(&inputs, &config).expect("valid inputs");
        let p = result.profitability;
        assert_approx(p.total_costs, 1_072_750.0);
        assert_eq!(p.equity_required, 0.0);
        assert_eq!(p.return_on_equity, 0.0);
        assert_eq!(p.internal_rate_of_return, 0.0);
        assert!(p.irr_is_indicative);
    }

    #[test]
    fn over_financed_project_reports_negative_equity_and_zero_roe() {
        let inputs = build_cost_only_inputs();
        let config = EngineConfig {
            loan_model: LoanModel::ConstructionOnly { fraction: 1.5 },
            ..EngineConfig::default()
        };
        let result = evaluate(&inputs, &config).expect("valid inputs");
        let p = result.profitability;
        assert_approx(p.equity_required, -536_375.0);
        assert_eq!(p.return_on_equity, 0.0);
        assert_eq!(p.internal_rate_of_return, 0.0);
    }

    #[test]
    fn full_lvr_loan_covers_site_and_build() {
        let inputs = ProjectInputs::default();
        let derived = derive_quantities(&inputs);
        let loan = LoanModel::FullLvr.total_loan(&inputs, &derived);
        assert_approx(loan, (500_000.0 + 1_072_750.0) * 0.7);
    }

    #[test]
    fn leveraged_preset_runs_end_to_end() {
        let inputs = ProjectInputs {
            revenue_source: RevenueSource::Fixed {
                amount: 3_200_000.0,
            },
            ..ProjectInputs::default()
        };
        let result = evaluate(&inputs, &EngineConfig::from_preset(EnginePreset::Leveraged))
            .expect("valid inputs");
        let sum: f64 = result.costs.lines.iter().map(|l| l.amount).sum();
        assert_approx(result.costs.total_costs, sum);
        assert!(result.profitability.equity_required > 0.0);
        assert!(result.profitability.internal_rate_of_return.is_finite());
    }

    #[test]
    fn terminal_flow_flag_changes_irr() {
        let inputs = ProjectInputs {
            revenue_source: RevenueSource::Fixed {
                amount: 3_000_000.0,
            },
            ..ProjectInputs::default()
        };
        let with_capital = evaluate(&inputs, &EngineConfig::default()).expect("valid");
        let mut config = EngineConfig::default();
        config.irr.terminal_flow = TerminalFlow::ProfitOnly;
        let profit_only = evaluate(&inputs, &config).expect("valid");
        assert!(
            profit_only.profitability.internal_rate_of_return
                != with_capital.profitability.internal_rate_of_return
        );
    }

    #[test]
    fn flat_stamp_duty_policy_flows_into_costs() {
        let inputs = ProjectInputs {
            stamp_duty: StampDutyPolicy::flat_default(),
            ..ProjectInputs::default()
        };
        let result = evaluate(&inputs, &EngineConfig::default()).expect("valid inputs");
        assert_approx(result.costs.amount(CostItem::StampDuty).unwrap(), 27_500.0);
    }

    #[test]
    fn rejects_negative_amounts_and_out_of_range_rates() {
        let config = EngineConfig::default();

        let inputs = ProjectInputs {
            site_price: -1.0,
            ..ProjectInputs::default()
        };
        let err = evaluate(&inputs, &config).expect_err("negative price");
        assert!(matches!(
            err,
            FeasibilityError::InvalidInput {
                field: "site_price",
                ..
            }
        ));

        let inputs = ProjectInputs {
            gst_rate: 1.5,
            ..ProjectInputs::default()
        };
        let err = evaluate(&inputs, &config).expect_err("rate above one");
        assert!(err.to_string().contains("gst_rate"));

        let inputs = ProjectInputs {
            area_source: planning(-10.0, 0.7, 0.85),
            ..ProjectInputs::default()
        };
        assert!(evaluate(&inputs, &config).is_err());
    }

    #[test]
    fn rejects_zero_dwellings_and_zero_period() {
        let config = EngineConfig::default();
        let inputs = ProjectInputs {
            dwellings: 0,
            ..ProjectInputs::default()
        };
        assert!(evaluate(&inputs, &config).is_err());

        let inputs = ProjectInputs {
            development_period_months: 0,
            ..ProjectInputs::default()
        };
        assert!(evaluate(&inputs, &config).is_err());
    }

    #[test]
    fn development_period_is_capped() {
        let config = EngineConfig::default();
        let inputs = ProjectInputs {
            development_period_months: MAX_DEVELOPMENT_MONTHS,
            ..ProjectInputs::default()
        };
        assert!(evaluate(&inputs, &config).is_ok());

        for months in [MAX_DEVELOPMENT_MONTHS + 1, u32::MAX] {
            let inputs = ProjectInputs {
                development_period_months: months,
                ..ProjectInputs::default()
            };
            let err = evaluate(&inputs, &config).expect_err("period above the cap");
            assert!(matches!(
                err,
                FeasibilityError::InvalidInput {
                    field: "development_period_months",
                    ..
                }
            ));
        }
    }

    #[test]
    fn rejects_negative_loan_fraction() {
        let config = EngineConfig {
            loan_model: LoanModel::ConstructionOnly { fraction: -0.2 },
            ..EngineConfig::default()
        };
        assert!(evaluate(&ProjectInputs::default(), &config).is_err());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_area_identities_hold(
            site_area in 0.0f64..50_000.0,
            fsr in 0.0f64..10.0,
            nsa_ratio in 0.0f64..=1.0,
            dwellings in 1_u32..500,
        ) {
            let inputs = ProjectInputs {
                area_source: planning(site_area, fsr, nsa_ratio),
                dwellings,
                ..ProjectInputs::default()
            };
            let derived = derive_quantities(&inputs);
            prop_assert_eq!(derived.gross_floor_area, site_area * fsr);
            prop_assert_eq!(derived.net_sellable_area, site_area * fsr * nsa_ratio);
            let rebuilt = derived.avg_dwelling_size * dwellings as f64;
            let tolerance = 1e-9 * derived.net_sellable_area.max(1.0);
            prop_assert!((rebuilt - derived.net_sellable_area).abs() <= tolerance);
            prop_assert!(derived.land_cost_per_area.is_finite());
        }

        #[test]
        fn prop_higher_construction_rate_raises_build_cost_and_lowers_profit(
            rate in 500.0f64..6_000.0,
            bump in 1.0f64..1_000.0,
        ) {
            let config = EngineConfig::default();
            let low = ProjectInputs {
                construction_cost_per_area: rate,
                ..ProjectInputs::default()
            };
            let high = ProjectInputs {
                construction_cost_per_area: rate + bump,
                ..ProjectInputs::default()
            };
            let low = evaluate(&low, &config).expect("valid");
            let high = evaluate(&high, &config).expect("valid");
            prop_assert!(high.derived.total_build_cost > low.derived.total_build_cost);
            prop_assert!(high.profitability.profit < low.profitability.profit);
        }

        #[test]
        fn prop_total_costs_are_additive_for_standard_model(
            site_price in 0.0f64..5_000_000.0,
            sales_rate in 0.0f64..20_000.0,
            months in 1_u32..120,
        ) {
            let inputs = ProjectInputs {
                site_price,
                revenue_source: RevenueSource::SalesRate { rate_per_area: sales_rate },
                development_period_months: months,
                ..ProjectInputs::default()
            };
            let result = evaluate(&inputs, &EngineConfig::default()).expect("valid");
            let sum: f64 = result.costs.lines.iter().map(|l| l.amount).sum();
            prop_assert!((result.costs.total_costs - sum).abs() <= 1e-6);
            prop_assert!(result.profitability.internal_rate_of_return.is_finite());
            prop_assert!(result.profitability.return_on_equity.is_finite());
            prop_assert!(result.profitability.profit_margin.is_finite());
        }
    }
}
