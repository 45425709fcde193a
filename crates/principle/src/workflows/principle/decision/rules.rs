use chrono::{Datelike, NaiveDate};

use super::{DecisionRecord, PrinciplePolicy, ReasonCode};
use crate::upstream::{MarketingProgram, VehicleCheck};

/// Upstream facts gathered for the asset stage.
#[derive(Debug, Clone)]
pub(crate) struct AssetSignals<'a> {
    pub branch_active: bool,
    pub asset_found: bool,
    pub manufacture_year: i32,
    pub vehicle: &'a VehicleCheck,
}

pub(crate) fn asset_age(manufacture_year: i32, today: NaiveDate) -> u32 {
    (today.year() - manufacture_year).max(0) as u32
}

pub(crate) fn age_on(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(birth_date).unwrap_or(0)
}

/// Whole years covered by a tenor in months, rounded up.
pub(crate) fn tenor_years(tenor: u16) -> u32 {
    (u32::from(tenor) + 11) / 12
}

pub(crate) fn assess_asset(
    signals: &AssetSignals<'_>,
    policy: &PrinciplePolicy,
    today: NaiveDate,
) -> DecisionRecord {
    if !signals.branch_active {
        return DecisionRecord::from_code(ReasonCode::BranchInactive);
    }
    if !signals.asset_found {
        return DecisionRecord::from_code(ReasonCode::AssetNotFound);
    }

    let age = asset_age(signals.manufacture_year, today);
    if age > policy.max_asset_age_years {
        return DecisionRecord::with_detail(
            ReasonCode::AssetTooOld,
            format!("{age} years, maximum {}", policy.max_asset_age_years),
        );
    }

    if signals.vehicle.blacklisted {
        return DecisionRecord::with_detail(
            ReasonCode::VehicleBlacklisted,
            signals.vehicle.note.as_deref().unwrap_or_default(),
        );
    }
    if signals.vehicle.active_contract {
        return DecisionRecord::with_detail(
            ReasonCode::VehicleActiveContract,
            signals.vehicle.note.as_deref().unwrap_or_default(),
        );
    }

    DecisionRecord::from_code(ReasonCode::AssetVerified)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ApplicantSignals {
    pub age: u32,
    pub customer_blacklisted: bool,
    pub spouse_blacklisted: bool,
    pub overdue_days: u32,
}

pub(crate) fn assess_applicant(
    signals: &ApplicantSignals,
    policy: &PrinciplePolicy,
) -> DecisionRecord {
    if signals.age < policy.min_applicant_age {
        return DecisionRecord::with_detail(
            ReasonCode::ApplicantUnderage,
            format!("age {}, minimum {}", signals.age, policy.min_applicant_age),
        );
    }
    if signals.age > policy.max_applicant_age {
        return DecisionRecord::with_detail(
            ReasonCode::ApplicantOverage,
            format!("age {}, maximum {}", signals.age, policy.max_applicant_age),
        );
    }
    if signals.customer_blacklisted {
        return DecisionRecord::from_code(ReasonCode::CustomerBlacklisted);
    }
    if signals.spouse_blacklisted {
        return DecisionRecord::from_code(ReasonCode::SpouseBlacklisted);
    }
    if signals.overdue_days > policy.max_overdue_days {
        return DecisionRecord::with_detail(
            ReasonCode::CustomerOverdue,
            format!(
                "{} days overdue, maximum {}",
                signals.overdue_days, policy.max_overdue_days
            ),
        );
    }

    DecisionRecord::from_code(ReasonCode::ApplicantVerified)
}

pub(crate) fn check_loan_ceiling(loan_amount: u64, max_loan_amount: u64) -> Option<DecisionRecord> {
    (loan_amount > max_loan_amount).then(|| {
        DecisionRecord::with_detail(
            ReasonCode::LoanExceedsLtv,
            format!("requested {loan_amount}, ceiling {max_loan_amount}"),
        )
    })
}

/// Age limits evaluated at the end of the tenor.
pub(crate) fn check_maturity(
    asset_age: u32,
    applicant_age: u32,
    tenor: u16,
    policy: &PrinciplePolicy,
) -> Option<DecisionRecord> {
    let years = tenor_years(tenor);
    if asset_age + years > policy.max_asset_age_at_maturity {
        return Some(DecisionRecord::with_detail(
            ReasonCode::AssetAgeAtMaturity,
            format!(
                "{} years at maturity, maximum {}",
                asset_age + years,
                policy.max_asset_age_at_maturity
            ),
        ));
    }
    if applicant_age + years > policy.max_age_at_maturity {
        return Some(DecisionRecord::with_detail(
            ReasonCode::ApplicantAgeAtMaturity,
            format!(
                "age {} at maturity, maximum {}",
                applicant_age + years,
                policy.max_age_at_maturity
            ),
        ));
    }
    None
}

pub(crate) fn down_payment_percent(down_payment: u64, otr_price: u64) -> f64 {
    if otr_price == 0 {
        return 0.0;
    }
    down_payment as f64 * 100.0 / otr_price as f64
}

/// Pick the marketing program for the financing terms.
///
/// A requested program only has to appear in the eligible list; otherwise the lowest priority
/// program whose tenor window and minimum DP fit wins, ties broken by program id.
pub(crate) fn select_program<'a>(
    programs: &'a [MarketingProgram],
    requested: Option<&str>,
    tenor: u16,
    dp_percent: f64,
) -> Result<&'a MarketingProgram, DecisionRecord> {
    if let Some(requested) = requested {
        return programs
            .iter()
            .find(|program| program.program_id == requested)
            .ok_or_else(|| DecisionRecord::with_detail(ReasonCode::ProgramNotEligible, requested));
    }

    programs
        .iter()
        .filter(|program| program.min_tenor <= tenor && tenor <= program.max_tenor)
        .filter(|program| program.min_down_payment_percent <= dp_percent)
        .min_by(|left, right| {
            left.priority
                .cmp(&right.priority)
                .then_with(|| left.program_id.cmp(&right.program_id))
        })
        .ok_or_else(|| {
            DecisionRecord::with_detail(
                ReasonCode::NoEligibleProgram,
                format!("tenor {tenor}, down payment {dp_percent:.1}%"),
            )
        })
}

pub(crate) fn check_installment_capacity(
    installment: u64,
    monthly_income: u64,
    policy: &PrinciplePolicy,
) -> Option<DecisionRecord> {
    let ratio = if monthly_income == 0 {
        f64::INFINITY
    } else {
        installment as f64 / monthly_income as f64
    };
    (ratio > policy.max_installment_ratio).then(|| {
        DecisionRecord::with_detail(
            ReasonCode::InstallmentExceedsCapacity,
            format!(
                "installment ratio {:.2}, maximum {:.2}",
                ratio, policy.max_installment_ratio
            ),
        )
    })
}
