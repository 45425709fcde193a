use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::decision::DecisionRecord;

/// Identifier of an in-flight principle application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProspectId(pub String);

impl ProspectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_well_formed(&self) -> bool {
        (1..=32).contains(&self.0.len())
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for ProspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Intake channel. KPM shares the backend with the principle (KMB) flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Kmb,
    Kpm,
}

impl Channel {
    pub const fn event_topic(self) -> &'static str {
        match self {
            Channel::Kmb => "principle.kmb.updated",
            Channel::Kpm => "principle.kpm.updated",
        }
    }
}

/// Ordered steps of the principle workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipleStep {
    VerifyAsset,
    VerifyApplicant,
    VerifyFinancing,
    EmergencyContact,
}

impl PrincipleStep {
    pub const ALL: [PrincipleStep; 4] = [
        PrincipleStep::VerifyAsset,
        PrincipleStep::VerifyApplicant,
        PrincipleStep::VerifyFinancing,
        PrincipleStep::EmergencyContact,
    ];

    pub const fn number(self) -> u8 {
        match self {
            PrincipleStep::VerifyAsset => 1,
            PrincipleStep::VerifyApplicant => 2,
            PrincipleStep::VerifyFinancing => 3,
            PrincipleStep::EmergencyContact => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            PrincipleStep::VerifyAsset => "verify_asset",
            PrincipleStep::VerifyApplicant => "verify_applicant",
            PrincipleStep::VerifyFinancing => "verify_financing",
            PrincipleStep::EmergencyContact => "emergency_contact",
        }
    }

    pub const fn previous(self) -> Option<PrincipleStep> {
        match self {
            PrincipleStep::VerifyAsset => None,
            PrincipleStep::VerifyApplicant => Some(PrincipleStep::VerifyAsset),
            PrincipleStep::VerifyFinancing => Some(PrincipleStep::VerifyApplicant),
            PrincipleStep::EmergencyContact => Some(PrincipleStep::VerifyFinancing),
        }
    }
}

impl fmt::Display for PrincipleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who the BPKB (ownership document) is registered to, relative to the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpkbNameStatus {
    Applicant,
    Spouse,
    ThirdParty,
}

impl BpkbNameStatus {
    pub fn resolve(bpkb_name: &str, legal_name: &str, spouse_name: Option<&str>) -> Self {
        let owner = normalize_name(bpkb_name);
        if owner == normalize_name(legal_name) {
            return BpkbNameStatus::Applicant;
        }
        match spouse_name {
            Some(spouse) if owner == normalize_name(spouse) => BpkbNameStatus::Spouse,
            _ => BpkbNameStatus::ThirdParty,
        }
    }

    pub const fn financing_code(self) -> FinancingCode {
        match self {
            BpkbNameStatus::Applicant => FinancingCode::OwnName,
            BpkbNameStatus::Spouse => FinancingCode::SpouseName,
            BpkbNameStatus::ThirdParty => FinancingCode::ThirdPartyName,
        }
    }
}

/// Financing code sent to the loan services, driven by the BPKB name match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancingCode {
    #[serde(rename = "O")]
    OwnName,
    #[serde(rename = "P")]
    SpouseName,
    #[serde(rename = "K")]
    ThirdPartyName,
}

impl FinancingCode {
    pub const fn code(self) -> &'static str {
        match self {
            FinancingCode::OwnName => "O",
            FinancingCode::SpouseName => "P",
            FinancingCode::ThirdPartyName => "K",
        }
    }
}

pub(crate) fn normalize_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '.' || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Asset facet payload posted at step one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSubmission {
    pub prospect_id: ProspectId,
    #[serde(default)]
    pub channel: Channel,
    pub branch_id: String,
    pub asset_code: String,
    pub manufacture_year: i32,
    pub license_plate: String,
    pub chassis_number: String,
    pub engine_number: String,
    pub bpkb_name: String,
    pub otr_price: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpouseData {
    pub id_number: String,
    pub legal_name: String,
    pub birth_date: NaiveDate,
    pub mother_maiden_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidenceAddress {
    pub street: String,
    pub rt: String,
    pub rw: String,
    pub kelurahan: String,
    pub kecamatan: String,
    pub city: String,
    pub zip_code: String,
}

/// Personal data posted at step two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantSubmission {
    pub prospect_id: ProspectId,
    pub id_number: String,
    pub legal_name: String,
    pub birth_place: String,
    pub birth_date: NaiveDate,
    pub mother_maiden_name: String,
    pub gender: Gender,
    pub marital_status: MaritalStatus,
    #[serde(default)]
    pub spouse: Option<SpouseData>,
    pub mobile_phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub monthly_income: u64,
    pub profession_id: String,
    pub address: ResidenceAddress,
}

/// Financing terms posted at step three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingSubmission {
    pub prospect_id: ProspectId,
    pub tenor: u16,
    pub down_payment: u64,
    #[serde(default)]
    pub admin_fee: u64,
    #[serde(default)]
    pub program_id: Option<String>,
}

/// Emergency contact posted at step four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContactSubmission {
    pub prospect_id: ProspectId,
    pub name: String,
    pub relationship: String,
    pub mobile_phone: String,
    pub address: ResidenceAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFacet {
    pub submission: AssetSubmission,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantFacet {
    pub submission: ApplicantSubmission,
    pub master_customer_id: Option<String>,
    pub existing_customer: bool,
    pub overdue_days: u32,
    pub age: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Marketing program picked during financing verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProgram {
    pub program_id: String,
    pub name: String,
    pub installment_amount: u64,
    pub total_payable: u64,
    pub effective_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingFacet {
    pub submission: FinancingSubmission,
    pub financing_code: FinancingCode,
    pub loan_amount: u64,
    pub max_loan_amount: Option<u64>,
    pub ltv_percent: Option<f64>,
    pub program: Option<SelectedProgram>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContactFacet {
    pub submission: EmergencyContactSubmission,
    pub recorded_at: DateTime<Utc>,
}

/// Step/decision tuple tracked for every prospect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleRecord {
    pub prospect_id: ProspectId,
    pub channel: Channel,
    pub branch_id: String,
    pub step: PrincipleStep,
    pub decision: DecisionRecord,
    pub bpkb_status: Option<BpkbNameStatus>,
    pub customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrincipleRecord {
    pub fn is_closed(&self) -> bool {
        self.decision.decision.is_terminal()
    }
}
