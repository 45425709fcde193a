use serde::{Deserialize, Serialize};

/// Thresholds applied by the stage rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinciplePolicy {
    pub min_applicant_age: u32,
    pub max_applicant_age: u32,
    pub max_age_at_maturity: u32,
    pub max_asset_age_years: u32,
    pub max_asset_age_at_maturity: u32,
    pub max_overdue_days: u32,
    pub max_installment_ratio: f64,
}

impl Default for PrinciplePolicy {
    fn default() -> Self {
        Self {
            min_applicant_age: 21,
            max_applicant_age: 60,
            max_age_at_maturity: 65,
            max_asset_age_years: 12,
            max_asset_age_at_maturity: 15,
            max_overdue_days: 30,
            max_installment_ratio: 0.35,
        }
    }
}
