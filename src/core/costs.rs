use std::collections::HashMap;

use tracing::warn;

use super::error::FeasibilityError;
use super::types::{CostBreakdown, CostItem, CostLine, DerivedQuantities, ProjectInputs};

/// How a single cost line is computed from the project inputs.
#[derive(Clone, Debug, PartialEq)]
pub enum CostRule {
    /// The item's fixed amount taken verbatim from the inputs.
    Amount,
    RateOfRevenue,
    RateOfBuildCost,
    /// Stamp duty policy applied to the site price.
    StampDuty,
    /// Site price carried at the interest rate over the development period.
    LandHolding,
    /// Construction interest on roughly half the period to model progressive
    /// drawdown.
    ConstructionFinance,
    /// Site and construction interest on the LVR-financed share.
    LeveragedFinance,
    /// Item rate applied to the sum of the listed direct items.
    RateOfSubset(Vec<CostItem>),
    /// Item rate applied to the project total, which includes the item itself.
    RateOfTotal,
}

impl CostRule {
    fn is_direct(&self) -> bool {
        !matches!(self, CostRule::RateOfSubset(_) | CostRule::RateOfTotal)
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SelfReferenceStrategy {
    /// Rate applied to the subtotal of all other items.
    #[default]
    Subtotal,
    /// Solves `fee = rate * (subtotal + fee)` exactly.
    FixedPoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CostEntry {
    pub item: CostItem,
    pub rule: CostRule,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CostModel {
    entries: Vec<CostEntry>,
}

impl Default for CostModel {
    fn default() -> Self {
        Self::standard()
    }
}

fn contingency_base() -> Vec<CostItem> {
    vec![
        CostItem::SitePurchase,
        CostItem::Construction,
        CostItem::Demolition,
        CostItem::Consultants,
        CostItem::Marketing,
    ]
}

impl CostModel {
    pub fn new(entries: Vec<CostEntry>) -> Result<Self, FeasibilityError> {
        let mut direct = HashMap::new();
        for entry in &entries {
            if direct.insert(entry.item, entry.rule.is_direct()).is_some() {
                return Err(FeasibilityError::InvalidCostModel(format!(
                    "{} appears more than once",
                    entry.item.key()
                )));
            }
            match &entry.rule {
                CostRule::Amount if !has_fixed_amount(entry.item) => {
                    return Err(FeasibilityError::InvalidCostModel(format!(
                        "{} has no fixed amount input",
                        entry.item.key()
                    )));
                }
                CostRule::RateOfRevenue
                | CostRule::RateOfBuildCost
                | CostRule::RateOfSubset(_)
                | CostRule::RateOfTotal
                    if !has_rate(entry.item) =>
                {
                    return Err(FeasibilityError::InvalidCostModel(format!(
                        "{} has no rate input",
                        entry.item.key()
                    )));
                }
                _ => {}
            }
        }

        for entry in &entries {
            if let CostRule::RateOfSubset(members) = &entry.rule {
                for member in members {
                    match direct.get(member) {
                        Some(true) => {}
                        Some(false) => {
                            return Err(FeasibilityError::InvalidCostModel(format!(
                                "{} may only sum direct items, but {} is derived from other items",
                                entry.item.key(),
                                member.key()
                            )));
                        }
                        None => {
                            return Err(FeasibilityError::InvalidCostModel(format!(
                                "{} refers to {} which is not in the model",
                                entry.item.key(),
                                member.key()
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Fixed consultant, marketing and statutory amounts, land holding at the
    /// interest rate and construction-only finance.
    pub fn standard() -> Self {
        use CostItem::*;
        Self {
            entries: vec![
                entry(SitePurchase, CostRule::Amount),
                entry(Construction, CostRule::Amount),
                entry(Demolition, CostRule::Amount),
                entry(Consultants, CostRule::Amount),
                entry(Marketing, CostRule::Amount),
                entry(AgentsFees, CostRule::RateOfRevenue),
                entry(StampDuty, CostRule::StampDuty),
                entry(GstOnSales, CostRule::RateOfRevenue),
                entry(CouncilFees, CostRule::Amount),
                entry(StatutoryFees, CostRule::Amount),
                entry(LegalFees, CostRule::Amount),
                entry(ProfessionalFees, CostRule::Amount),
                entry(SolicitorFees, CostRule::Amount),
                entry(Insurance, CostRule::Amount),
                entry(Utilities, CostRule::Amount),
                entry(LandHolding, CostRule::LandHolding),
                entry(Finance, CostRule::ConstructionFinance),
                entry(Contingency, CostRule::RateOfSubset(contingency_base())),
            ],
        }
    }

    /// Rate-driven consultant and marketing costs, statutory fees as a share
    /// of the total and LVR-based site plus construction finance.
    pub fn leveraged() -> Self {
        use CostItem::*;
        Self {
            entries: vec![
                entry(SitePurchase, CostRule::Amount),
                entry(Construction, CostRule::Amount),
                entry(Demolition, CostRule::Amount),
                entry(Consultants, CostRule::RateOfBuildCost),
                entry(Marketing, CostRule::RateOfRevenue),
                entry(AgentsFees, CostRule::RateOfRevenue),
                entry(StampDuty, CostRule::StampDuty),
                entry(GstOnSales, CostRule::RateOfRevenue),
                entry(CouncilFees, CostRule::Amount),
                entry(StatutoryFees, CostRule::RateOfTotal),
                entry(LegalFees, CostRule::Amount),
                entry(ProfessionalFees, CostRule::Amount),
                entry(SolicitorFees, CostRule::Amount),
                entry(Insurance, CostRule::Amount),
                entry(Utilities, CostRule::Amount),
                entry(Finance, CostRule::LeveragedFinance),
                entry(Contingency, CostRule::RateOfSubset(contingency_base())),
            ],
        }
    }

    pub fn entries(&self) -> &[CostEntry] {
        &self.entries
    }

    pub fn has_self_reference(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.rule == CostRule::RateOfTotal)
    }

    pub fn aggregate(
        &self,
        inputs: &ProjectInputs,
        derived: &DerivedQuantities,
        strategy: SelfReferenceStrategy,
    ) -> CostBreakdown {
        let mut amounts: HashMap<CostItem, f64> = HashMap::with_capacity(self.entries.len());

        for entry in self.entries.iter().filter(|e| e.rule.is_direct()) {
            let amount = direct_amount(entry, inputs, derived);
            amounts.insert(entry.item, amount);
        }

        for entry in &self.entries {
            if let CostRule::RateOfSubset(members) = &entry.rule {
                let base: f64 = members
                    .iter()
                    .map(|member| amounts.get(member).copied().unwrap_or(0.0))
                    .sum();
                amounts.insert(entry.item, base * rate(entry.item, inputs));
            }
        }

        let self_referencing: Vec<CostItem> = self
            .entries
            .iter()
            .filter(|e| e.rule == CostRule::RateOfTotal)
            .map(|e| e.item)
            .collect();
        if !self_referencing.is_empty() {
            let subtotal: f64 = self
                .entries
                .iter()
                .filter(|e| e.rule != CostRule::RateOfTotal)
                .filter_map(|e| amounts.get(&e.item))
                .sum();
            let rate_sum: f64 = self_referencing
                .iter()
                .map(|item| rate(*item, inputs))
                .sum();
            let base = match strategy {
                SelfReferenceStrategy::Subtotal => subtotal,
                SelfReferenceStrategy::FixedPoint if rate_sum < 1.0 => subtotal / (1.0 - rate_sum),
                SelfReferenceStrategy::FixedPoint => {
                    warn!(
                        rate_sum,
                        "self-referential fee rates sum to 100% or more; using the subtotal instead"
                    );
                    subtotal
                }
            };
            for item in self_referencing {
                amounts.insert(item, base * rate(item, inputs));
            }
        }

        let lines: Vec<CostLine> = self
            .entries
            .iter()
            .map(|entry| CostLine {
                item: entry.item,
                label: entry.item.label(),
                amount: amounts.get(&entry.item).copied().unwrap_or(0.0),
            })
            .collect();
        let total_costs = lines.iter().map(|line| line.amount).sum();

        CostBreakdown { lines, total_costs }
    }
}

fn entry(item: CostItem, rule: CostRule) -> CostEntry {
    CostEntry { item, rule }
}

fn direct_amount(entry: &CostEntry, inputs: &ProjectInputs, derived: &DerivedQuantities) -> f64 {
    let months = inputs.development_period_months as f64;
    let build = derived.total_build_cost;
    match entry.rule {
        CostRule::Amount => fixed_amount(entry.item, inputs, derived),
        CostRule::RateOfRevenue => derived.expected_revenue * rate(entry.item, inputs),
        CostRule::RateOfBuildCost => build * rate(entry.item, inputs),
        CostRule::StampDuty => inputs.stamp_duty.duty(inputs.site_price),
        CostRule::LandHolding => inputs.site_price * inputs.interest_rate * (months / 12.0),
        CostRule::ConstructionFinance => build * inputs.interest_rate * (months / 24.0),
        CostRule::LeveragedFinance => {
            let lvr = inputs.loan_to_value_ratio;
            let site_finance = inputs.site_price * lvr * inputs.interest_rate * (months / 12.0);
            let construction_finance = build * lvr * inputs.interest_rate * (months / 24.0);
            site_finance + construction_finance
        }
        CostRule::RateOfSubset(_) | CostRule::RateOfTotal => 0.0,
    }
}

fn has_fixed_amount(item: CostItem) -> bool {
    !matches!(
        item,
        CostItem::AgentsFees
            | CostItem::StampDuty
            | CostItem::GstOnSales
            | CostItem::LandHolding
            | CostItem::Finance
            | CostItem::Contingency
    )
}

fn fixed_amount(item: CostItem, inputs: &ProjectInputs, derived: &DerivedQuantities) -> f64 {
    match item {
        CostItem::SitePurchase => inputs.site_price,
        CostItem::Construction => derived.total_build_cost,
        CostItem::Demolition => inputs.demolition_cost,
        CostItem::Consultants => inputs.consultant_costs,
        CostItem::Marketing => inputs.marketing_costs,
        CostItem::CouncilFees => inputs.council_fees,
        CostItem::StatutoryFees => inputs.statutory_fees,
        CostItem::LegalFees => inputs.legal_fees,
        CostItem::ProfessionalFees => inputs.professional_fees,
        CostItem::SolicitorFees => inputs.solicitor_fees,
        CostItem::Insurance => inputs.insurance_costs,
        CostItem::Utilities => inputs.utilities_connection,
        CostItem::AgentsFees
        | CostItem::StampDuty
        | CostItem::GstOnSales
        | CostItem::LandHolding
        | CostItem::Finance
        | CostItem::Contingency => 0.0,
    }
}

fn has_rate(item: CostItem) -> bool {
    matches!(
        item,
        CostItem::Consultants
            | CostItem::Marketing
            | CostItem::AgentsFees
            | CostItem::GstOnSales
            | CostItem::StatutoryFees
            | CostItem::Contingency
    )
}

fn rate(item: CostItem, inputs: &ProjectInputs) -> f64 {
    match item {
        CostItem::Consultants => inputs.consultant_rate,
        CostItem::Marketing => inputs.marketing_rate,
        CostItem::AgentsFees => inputs.agents_commission_rate,
        CostItem::GstOnSales => inputs.gst_rate,
        CostItem::StatutoryFees => inputs.statutory_fee_rate,
        CostItem::Contingency => inputs.contingency_rate,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::derive_quantities;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn breakdown(model: &CostModel, strategy: SelfReferenceStrategy) -> CostBreakdown {
        let inputs = ProjectInputs::default();
        let derived = derive_quantities(&inputs);
        model.aggregate(&inputs, &derived, strategy)
    }

    #[test]
    fn standard_model_line_items_match_hand_calculation() {
        let costs = breakdown(&CostModel::standard(), SelfReferenceStrategy::Subtotal);
        let revenue = 1_021_258.0;
        let build = 1_072_750.0;

        assert_approx(costs.amount(CostItem::Construction).unwrap(), build);
        assert_approx(costs.amount(CostItem::AgentsFees).unwrap(), revenue * 0.025);
        assert_approx(costs.amount(CostItem::GstOnSales).unwrap(), revenue * 0.10);
        assert_approx(costs.amount(CostItem::StampDuty).unwrap(), 17_029.0);
        assert_approx(costs.amount(CostItem::LandHolding).unwrap(), 48_750.0);
        assert_approx(costs.amount(CostItem::Finance).unwrap(), 52_296.5625);
        assert_approx(costs.amount(CostItem::Contingency).unwrap(), 82_887.5);
        assert_eq!(costs.lines.len(), 18);
    }

    #[test]
    fn total_equals_sum_of_reported_lines() {
        let costs = breakdown(&CostModel::standard(), SelfReferenceStrategy::Subtotal);
        let sum: f64 = costs.lines.iter().map(|line| line.amount).sum();
        assert_approx(costs.total_costs, sum);
        assert_approx(costs.total_costs, 2_055_370.3125);
    }

    #[test]
    fn leveraged_model_applies_statutory_rate_to_pre_fee_subtotal() {
        let costs = breakdown(&CostModel::leveraged(), SelfReferenceStrategy::Subtotal);
        let statutory = costs.amount(CostItem::StatutoryFees).unwrap();
        let subtotal = costs.total_costs - statutory;
        assert_approx(statutory, subtotal * 0.01);
        assert!(costs.amount(CostItem::LandHolding).is_none());
    }

    #[test]
    fn fixed_point_strategy_solves_fee_on_full_total() {
        let costs = breakdown(&CostModel::leveraged(), SelfReferenceStrategy::FixedPoint);
        let statutory = costs.amount(CostItem::StatutoryFees).unwrap();
        assert_approx(statutory, costs.total_costs * 0.01);

        let approx = breakdown(&CostModel::leveraged(), SelfReferenceStrategy::Subtotal);
        assert!(statutory > approx.amount(CostItem::StatutoryFees).unwrap());
    }

    #[test]
    fn leveraged_model_rate_items_match_hand_calculation() {
        let costs = breakdown(&CostModel::leveraged(), SelfReferenceStrategy::Subtotal);
        let revenue = 1_021_258.0;
        let build = 1_072_750.0;

        assert_approx(costs.amount(CostItem::Consultants).unwrap(), build * 0.05);
        assert_approx(costs.amount(CostItem::Consultants).unwrap(), 53_637.5);
        assert_approx(costs.amount(CostItem::Marketing).unwrap(), revenue * 0.015);
        assert_approx(costs.amount(CostItem::Marketing).unwrap(), 15_318.87);
        assert_approx(
            costs.amount(CostItem::Contingency).unwrap(),
            0.05 * (500_000.0 + build + 20_000.0 + 53_637.5 + 15_318.87),
        );
        assert!(
            (costs.total_costs - 2_044_452.637_572_5).abs() <= 1e-4,
            "total {}",
            costs.total_costs
        );
    }

    #[test]
    fn leveraged_finance_covers_site_and_half_period_construction() {
        let costs = breakdown(&CostModel::leveraged(), SelfReferenceStrategy::Subtotal);
        let expected = 500_000.0 * 0.7 * 0.065 * 1.5 + 1_072_750.0 * 0.7 * 0.065 * 0.75;
        assert_approx(costs.amount(CostItem::Finance).unwrap(), expected);
    }

    #[test]
    fn rejects_duplicate_items() {
        let err = CostModel::new(vec![
            entry(CostItem::Demolition, CostRule::Amount),
            entry(CostItem::Demolition, CostRule::Amount),
        ])
        .expect_err("duplicates are rejected");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_subset_over_derived_items() {
        let err = CostModel::new(vec![
            entry(CostItem::StatutoryFees, CostRule::RateOfTotal),
            entry(
                CostItem::Contingency,
                CostRule::RateOfSubset(vec![CostItem::StatutoryFees]),
            ),
        ])
        .expect_err("subset may not include derived items");
        assert!(matches!(err, FeasibilityError::InvalidCostModel(_)));
    }

    #[test]
    fn rejects_rules_without_matching_inputs() {
        assert!(CostModel::new(vec![entry(CostItem::Finance, CostRule::Amount)]).is_err());
        assert!(
            CostModel::new(vec![entry(CostItem::LegalFees, CostRule::RateOfRevenue)]).is_err()
        );
    }

    #[test]
    fn presets_pass_validation() {
        for model in [CostModel::standard(), CostModel::leveraged()] {
            let rebuilt = CostModel::new(model.entries().to_vec()).expect("preset is valid");
            assert_eq!(rebuilt, model);
        }
        assert!(CostModel::leveraged().has_self_reference());
        assert!(!CostModel::standard().has_self_reference());
    }
}
