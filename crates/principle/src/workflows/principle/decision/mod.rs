mod policy;
pub(crate) mod rules;

pub use policy::PrinciplePolicy;

use serde::{Deserialize, Serialize};

/// Outcome of a stage. Reject and cancel close the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Pass,
    Reject,
    Cancel,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Pass => "PASS",
            Decision::Reject => "REJECT",
            Decision::Cancel => "CANCEL",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Decision::Reject | Decision::Cancel)
    }
}

/// Stable reason codes surfaced to channels and downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    AssetVerified,
    BranchInactive,
    AssetNotFound,
    AssetTooOld,
    VehicleBlacklisted,
    VehicleActiveContract,
    ApplicantVerified,
    ApplicantUnderage,
    ApplicantOverage,
    CustomerBlacklisted,
    SpouseBlacklisted,
    CustomerOverdue,
    FinancingApproved,
    LoanExceedsLtv,
    AssetAgeAtMaturity,
    ApplicantAgeAtMaturity,
    ProgramNotEligible,
    NoEligibleProgram,
    InstallmentExceedsCapacity,
    PrincipleCompleted,
    Cancelled,
}

impl ReasonCode {
    pub const fn code(self) -> &'static str {
        match self {
            ReasonCode::AssetVerified => "1000",
            ReasonCode::BranchInactive => "1101",
            ReasonCode::AssetNotFound => "1102",
            ReasonCode::AssetTooOld => "1103",
            ReasonCode::VehicleBlacklisted => "1104",
            ReasonCode::VehicleActiveContract => "1105",
            ReasonCode::ApplicantVerified => "2000",
            ReasonCode::ApplicantUnderage => "2101",
            ReasonCode::ApplicantOverage => "2102",
            ReasonCode::CustomerBlacklisted => "2103",
            ReasonCode::SpouseBlacklisted => "2104",
            ReasonCode::CustomerOverdue => "2105",
            ReasonCode::FinancingApproved => "3000",
            ReasonCode::LoanExceedsLtv => "3101",
            ReasonCode::AssetAgeAtMaturity => "3102",
            ReasonCode::ApplicantAgeAtMaturity => "3103",
            ReasonCode::ProgramNotEligible => "3104",
            ReasonCode::NoEligibleProgram => "3105",
            ReasonCode::InstallmentExceedsCapacity => "3106",
            ReasonCode::PrincipleCompleted => "4000",
            ReasonCode::Cancelled => "9000",
        }
    }

    pub const fn decision(self) -> Decision {
        match self {
            ReasonCode::AssetVerified
            | ReasonCode::ApplicantVerified
            | ReasonCode::FinancingApproved
            | ReasonCode::PrincipleCompleted => Decision::Pass,
            ReasonCode::Cancelled => Decision::Cancel,
            _ => Decision::Reject,
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ReasonCode::AssetVerified => "asset verified",
            ReasonCode::BranchInactive => "branch is not accepting applications",
            ReasonCode::AssetNotFound => "asset code not found in asset master",
            ReasonCode::AssetTooOld => "asset exceeds maximum age",
            ReasonCode::VehicleBlacklisted => "vehicle chassis or engine number is blacklisted",
            ReasonCode::VehicleActiveContract => "vehicle is pledged in an active contract",
            ReasonCode::ApplicantVerified => "applicant verified",
            ReasonCode::ApplicantUnderage => "applicant below minimum age",
            ReasonCode::ApplicantOverage => "applicant above maximum age",
            ReasonCode::CustomerBlacklisted => "applicant is blacklisted",
            ReasonCode::SpouseBlacklisted => "spouse is blacklisted",
            ReasonCode::CustomerOverdue => "applicant has overdue installments",
            ReasonCode::FinancingApproved => "financing approved",
            ReasonCode::LoanExceedsLtv => "loan amount exceeds LTV ceiling",
            ReasonCode::AssetAgeAtMaturity => "asset too old at end of tenor",
            ReasonCode::ApplicantAgeAtMaturity => "applicant too old at end of tenor",
            ReasonCode::ProgramNotEligible => "requested marketing program is not eligible",
            ReasonCode::NoEligibleProgram => "no marketing program matches the financing terms",
            ReasonCode::InstallmentExceedsCapacity => "installment exceeds repayment capacity",
            ReasonCode::PrincipleCompleted => "principle completed",
            ReasonCode::Cancelled => "cancelled",
        }
    }
}

/// Decision, code and free-text reason persisted with the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: Decision,
    pub code: ReasonCode,
    pub reason: String,
}

impl DecisionRecord {
    pub fn from_code(code: ReasonCode) -> Self {
        Self {
            decision: code.decision(),
            code,
            reason: code.description().to_string(),
        }
    }

    pub fn with_detail(code: ReasonCode, detail: impl AsRef<str>) -> Self {
        let detail = detail.as_ref();
        let reason = if detail.trim().is_empty() {
            code.description().to_string()
        } else {
            format!("{}: {}", code.description(), detail.trim())
        };
        Self {
            decision: code.decision(),
            code,
            reason,
        }
    }
}
