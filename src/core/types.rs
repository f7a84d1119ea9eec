use serde::Serialize;

use super::error::FeasibilityError;
use super::stamp_duty::StampDutyPolicy;

/// How floor areas are obtained.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AreaSource {
    /// GFA and NSA derived from the site area and planning controls.
    Planning {
        site_area: f64,
        floor_space_ratio: f64,
        nsa_ratio: f64,
    },
    /// GFA and NSA measured from drawings and supplied directly.
    Measured { gfa: f64, nsa: f64 },
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum RevenueSource {
    SalesRate { rate_per_area: f64 },
    Fixed { amount: f64 },
}

/// Fifty years; longer programmes are not development projects.
pub const MAX_DEVELOPMENT_MONTHS: u32 = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInputs {
    pub address: String,
    pub site_price: f64,
    pub area_source: AreaSource,
    pub dwellings: u32,
    pub revenue_source: RevenueSource,
    pub construction_cost_per_area: f64,
    pub demolition_cost: f64,
    pub consultant_costs: f64,
    pub consultant_rate: f64,
    pub marketing_costs: f64,
    pub marketing_rate: f64,
    pub agents_commission_rate: f64,
    pub stamp_duty: StampDutyPolicy,
    pub gst_rate: f64,
    pub council_fees: f64,
    pub statutory_fees: f64,
    pub statutory_fee_rate: f64,
    pub legal_fees: f64,
    pub professional_fees: f64,
    pub solicitor_fees: f64,
    pub insurance_costs: f64,
    pub utilities_connection: f64,
    pub contingency_rate: f64,
    pub interest_rate: f64,
    pub loan_to_value_ratio: f64,
    pub development_period_months: u32,
    pub target_profit_margin: f64,
    pub minimum_roe: f64,
}

impl Default for ProjectInputs {
    fn default() -> Self {
        Self {
            address: String::new(),
            site_price: 500_000.0,
            area_source: AreaSource::Planning {
                site_area: 613.0,
                floor_space_ratio: 0.7,
                nsa_ratio: 0.85,
            },
            dwellings: 2,
            revenue_source: RevenueSource::SalesRate {
                rate_per_area: 2_800.0,
            },
            construction_cost_per_area: 2_500.0,
            demolition_cost: 20_000.0,
            consultant_costs: 50_000.0,
            consultant_rate: 0.05,
            marketing_costs: 15_000.0,
            marketing_rate: 0.015,
            agents_commission_rate: 0.025,
            stamp_duty: StampDutyPolicy::default(),
            gst_rate: 0.10,
            council_fees: 15_000.0,
            statutory_fees: 5_000.0,
            statutory_fee_rate: 0.01,
            legal_fees: 8_000.0,
            professional_fees: 25_000.0,
            solicitor_fees: 3_000.0,
            insurance_costs: 5_000.0,
            utilities_connection: 8_000.0,
            contingency_rate: 0.05,
            interest_rate: 0.065,
            loan_to_value_ratio: 0.7,
            development_period_months: 18,
            target_profit_margin: 0.20,
            minimum_roe: 0.15,
        }
    }
}

impl ProjectInputs {
    /// Rejects values outside the declared domain before any computation runs.
    pub fn validate(&self) -> Result<(), FeasibilityError> {
        let mut amounts = vec![
            ("site_price", self.site_price),
            ("construction_cost_per_area", self.construction_cost_per_area),
            ("demolition_cost", self.demolition_cost),
            ("consultant_costs", self.consultant_costs),
            ("marketing_costs", self.marketing_costs),
            ("council_fees", self.council_fees),
            ("statutory_fees", self.statutory_fees),
            ("legal_fees", self.legal_fees),
            ("professional_fees", self.professional_fees),
            ("solicitor_fees", self.solicitor_fees),
            ("insurance_costs", self.insurance_costs),
            ("utilities_connection", self.utilities_connection),
        ];
        match self.area_source {
            AreaSource::Planning {
                site_area,
                floor_space_ratio,
                nsa_ratio,
            } => {
                amounts.push(("site_area", site_area));
                amounts.push(("floor_space_ratio", floor_space_ratio));
                check_rate("nsa_ratio", nsa_ratio)?;
            }
            AreaSource::Measured { gfa, nsa } => {
                amounts.push(("gfa", gfa));
                amounts.push(("nsa", nsa));
            }
        }
        match self.revenue_source {
            RevenueSource::SalesRate { rate_per_area } => {
                amounts.push(("sales_rate_per_area", rate_per_area))
            }
            RevenueSource::Fixed { amount } => amounts.push(("expected_revenue", amount)),
        }
        for (field, value) in amounts {
            if !value.is_finite() || value < 0.0 {
                return Err(FeasibilityError::invalid(
                    field,
                    format!("must be a finite value >= 0, got {value}"),
                ));
            }
        }

        for (field, rate) in [
            ("consultant_rate", self.consultant_rate),
            ("marketing_rate", self.marketing_rate),
            ("agents_commission_rate", self.agents_commission_rate),
            ("gst_rate", self.gst_rate),
            ("statutory_fee_rate", self.statutory_fee_rate),
            ("contingency_rate", self.contingency_rate),
            ("interest_rate", self.interest_rate),
            ("loan_to_value_ratio", self.loan_to_value_ratio),
            ("target_profit_margin", self.target_profit_margin),
            ("minimum_roe", self.minimum_roe),
        ] {
            check_rate(field, rate)?;
        }
        self.stamp_duty.validate()?;

        if self.dwellings < 1 {
            return Err(FeasibilityError::invalid("dwellings", "must be >= 1"));
        }
        if !(1..=MAX_DEVELOPMENT_MONTHS).contains(&self.development_period_months) {
            return Err(FeasibilityError::invalid(
                "development_period_months",
                format!(
                    "must be between 1 and {MAX_DEVELOPMENT_MONTHS}, got {}",
                    self.development_period_months
                ),
            ));
        }
        Ok(())
    }
}

pub(crate) fn check_rate(field: &'static str, rate: f64) -> Result<(), FeasibilityError> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(FeasibilityError::invalid(
            field,
            format!("must be between 0 and 1, got {rate}"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedQuantities {
    pub gross_floor_area: f64,
    pub net_sellable_area: f64,
    pub avg_dwelling_size: f64,
    pub price_per_dwelling: f64,
    pub land_cost_per_area: f64,
    pub construction_cost_per_area: f64,
    pub total_build_cost: f64,
    pub expected_revenue: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CostItem {
    SitePurchase,
    Construction,
    Demolition,
    Consultants,
    Marketing,
    AgentsFees,
    StampDuty,
    GstOnSales,
    CouncilFees,
    StatutoryFees,
    LegalFees,
    ProfessionalFees,
    SolicitorFees,
    Insurance,
    Utilities,
    LandHolding,
    Finance,
    Contingency,
}

impl CostItem {
    pub fn label(self) -> &'static str {
        match self {
            CostItem::SitePurchase => "Site Purchase",
            CostItem::Construction => "Construction",
            CostItem::Demolition => "Demolition",
            CostItem::Consultants => "Consultants",
            CostItem::Marketing => "Marketing",
            CostItem::AgentsFees => "Agents Fees",
            CostItem::StampDuty => "Stamp Duty",
            CostItem::GstOnSales => "GST on Sales",
            CostItem::CouncilFees => "Council Fees",
            CostItem::StatutoryFees => "Statutory Fees",
            CostItem::LegalFees => "Legal Fees",
            CostItem::ProfessionalFees => "Professional Fees",
            CostItem::SolicitorFees => "Solicitor Fees",
            CostItem::Insurance => "Insurance",
            CostItem::Utilities => "Utilities",
            CostItem::LandHolding => "Land Holding",
            CostItem::Finance => "Finance Cost",
            CostItem::Contingency => "Contingency",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            CostItem::SitePurchase => "site_purchase",
            CostItem::Construction => "construction",
            CostItem::Demolition => "demolition",
            CostItem::Consultants => "consultants",
            CostItem::Marketing => "marketing",
            CostItem::AgentsFees => "agents_fees",
            CostItem::StampDuty => "stamp_duty",
            CostItem::GstOnSales => "gst_on_sales",
            CostItem::CouncilFees => "council_fees",
            CostItem::StatutoryFees => "statutory_fees",
            CostItem::LegalFees => "legal_fees",
            CostItem::ProfessionalFees => "professional_fees",
            CostItem::SolicitorFees => "solicitor_fees",
            CostItem::Insurance => "insurance",
            CostItem::Utilities => "utilities",
            CostItem::LandHolding => "land_holding",
            CostItem::Finance => "finance_cost",
            CostItem::Contingency => "contingency",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostLine {
    pub item: CostItem,
    pub label: &'static str,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub lines: Vec<CostLine>,
    pub total_costs: f64,
}

impl CostBreakdown {
    pub fn amount(&self, item: CostItem) -> Option<f64> {
        self.lines
            .iter()
            .find(|line| line.item == item)
            .map(|line| line.amount)
    }

    /// Lines ordered from smallest to largest amount, as charted.
    pub fn sorted_ascending(&self) -> Vec<CostLine> {
        let mut lines = self.lines.clone();
        lines.sort_by(|a, b| a.amount.total_cmp(&b.amount));
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profitability {
    pub expected_revenue: f64,
    pub net_revenue: f64,
    pub total_costs: f64,
    pub profit: f64,
    pub profit_margin: f64,
    pub total_loan: f64,
    pub equity_required: f64,
    pub return_on_equity: f64,
    pub internal_rate_of_return: f64,
    pub irr_is_indicative: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityResult {
    pub derived: DerivedQuantities,
    pub costs: CostBreakdown,
    pub profitability: Profitability,
}
