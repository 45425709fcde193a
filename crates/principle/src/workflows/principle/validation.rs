use chrono::{Datelike, NaiveDate};

use super::domain::{
    normalize_name, ApplicantFacet, ApplicantSubmission, AssetFacet, AssetSubmission,
    EmergencyContactSubmission, FinancingSubmission, MaritalStatus, ProspectId,
};

const EARLIEST_MANUFACTURE_YEAR: i32 = 1980;
const MIN_TENOR: u16 = 6;
const MAX_TENOR: u16 = 60;

/// Input problems the caller can correct and resubmit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("prospect id '{0}' is malformed")]
    ProspectId(String),
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("manufacture year {year} outside {earliest}..={latest}")]
    ManufactureYear { year: i32, earliest: i32, latest: i32 },
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),
    #[error("{0} must be a 16 digit national id number")]
    IdNumber(&'static str),
    #[error("{0} is not a valid Indonesian mobile number")]
    MobilePhone(&'static str),
    #[error("{0} cannot be in the future")]
    BirthDateInFuture(&'static str),
    #[error("spouse data is required for married applicants")]
    SpouseRequired,
    #[error("spouse data is only accepted for married applicants")]
    UnexpectedSpouse,
    #[error("spouse id number must differ from the applicant's")]
    SpouseIdMatchesApplicant,
    #[error("tenor {0} must be a multiple of 6 between 6 and 60 months")]
    Tenor(u16),
    #[error("down payment {down_payment} must be below the OTR price {otr_price}")]
    DownPayment { down_payment: u64, otr_price: u64 },
    #[error("emergency contact must be someone other than the applicant")]
    EmergencyContactIsApplicant,
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

pub(crate) fn prospect_id(id: &ProspectId) -> Result<(), ValidationError> {
    if id.is_well_formed() {
        Ok(())
    } else {
        Err(ValidationError::ProspectId(id.0.clone()))
    }
}

fn id_number(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.len() == 16 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::IdNumber(field))
    }
}

/// Local `08…` form, so numbers compare equal across `+62` and local notation.
pub(crate) fn normalize_phone(phone: &str) -> String {
    match phone.strip_prefix("+62") {
        Some(rest) => format!("0{rest}"),
        None => phone.to_string(),
    }
}

/// `08…` or `+628…`, digits only after the optional `+`, 10 to 14 digits in total.
fn mobile_phone(raw: &str, field: &'static str) -> Result<(), ValidationError> {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let prefixed = if raw.starts_with('+') {
        digits.starts_with("628")
    } else {
        digits.starts_with("08")
    };
    let well_formed = prefixed
        && (10..=14).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit());
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::MobilePhone(field))
    }
}

fn birth_date(
    date: NaiveDate,
    today: NaiveDate,
    field: &'static str,
) -> Result<(), ValidationError> {
    if date > today {
        Err(ValidationError::BirthDateInFuture(field))
    } else {
        Ok(())
    }
}

pub(crate) fn asset(submission: &AssetSubmission, today: NaiveDate) -> Result<(), ValidationError> {
    prospect_id(&submission.prospect_id)?;
    require(&submission.branch_id, "branch_id")?;
    require(&submission.asset_code, "asset_code")?;
    require(&submission.chassis_number, "chassis_number")?;
    require(&submission.engine_number, "engine_number")?;
    require(&submission.bpkb_name, "bpkb_name")?;

    let latest = today.year();
    if !(EARLIEST_MANUFACTURE_YEAR..=latest).contains(&submission.manufacture_year) {
        return Err(ValidationError::ManufactureYear {
            year: submission.manufacture_year,
            earliest: EARLIEST_MANUFACTURE_YEAR,
            latest,
        });
    }
    if submission.otr_price == 0 {
        return Err(ValidationError::NotPositive("otr_price"));
    }
    Ok(())
}

pub(crate) fn applicant(
    submission: &ApplicantSubmission,
    today: NaiveDate,
) -> Result<(), ValidationError> {
    prospect_id(&submission.prospect_id)?;
    id_number(&submission.id_number, "id_number")?;
    require(&submission.legal_name, "legal_name")?;
    birth_date(submission.birth_date, today, "birth_date")?;
    require(&submission.mother_maiden_name, "mother_maiden_name")?;
    mobile_phone(&submission.mobile_phone, "mobile_phone")?;
    if submission.monthly_income == 0 {
        return Err(ValidationError::NotPositive("monthly_income"));
    }

    match (&submission.marital_status, &submission.spouse) {
        (MaritalStatus::Married, None) => Err(ValidationError::SpouseRequired),
        (MaritalStatus::Married, Some(spouse)) => {
            id_number(&spouse.id_number, "spouse.id_number")?;
            require(&spouse.legal_name, "spouse.legal_name")?;
            birth_date(spouse.birth_date, today, "spouse.birth_date")?;
            if spouse.id_number == submission.id_number {
                return Err(ValidationError::SpouseIdMatchesApplicant);
            }
            Ok(())
        }
        (_, Some(_)) => Err(ValidationError::UnexpectedSpouse),
        (_, None) => Ok(()),
    }
}

pub(crate) fn financing(
    submission: &FinancingSubmission,
    asset: &AssetFacet,
) -> Result<(), ValidationError> {
    prospect_id(&submission.prospect_id)?;
    let tenor = submission.tenor;
    if !(MIN_TENOR..=MAX_TENOR).contains(&tenor) || tenor % 6 != 0 {
        return Err(ValidationError::Tenor(tenor));
    }
    let otr_price = asset.submission.otr_price;
    if submission.down_payment >= otr_price {
        return Err(ValidationError::DownPayment {
            down_payment: submission.down_payment,
            otr_price,
        });
    }
    Ok(())
}

pub(crate) fn emergency_contact(
    submission: &EmergencyContactSubmission,
    applicant: &ApplicantFacet,
) -> Result<(), ValidationError> {
    prospect_id(&submission.prospect_id)?;
    require(&submission.name, "name")?;
    require(&submission.relationship, "relationship")?;
    mobile_phone(&submission.mobile_phone, "mobile_phone")?;

    let same_phone = normalize_phone(&submission.mobile_phone)
        == normalize_phone(&applicant.submission.mobile_phone);
    let same_name =
        normalize_name(&submission.name) == normalize_name(&applicant.submission.legal_name);
    if same_phone || same_name {
        return Err(ValidationError::EmergencyContactIsApplicant);
    }
    Ok(())
}
