//! Contracts for the domain services the principle workflow calls.
//!
//! Each service is a trait so stages can run against the reqwest adapters in [`http`] or
//! against scripted doubles in tests.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::principle::domain::{
    ApplicantSubmission, BpkbNameStatus, Channel, EmergencyContactSubmission, FinancingCode,
    ProspectId,
};

pub use http::{
    HttpAssetMaster, HttpBranchDirectory, HttpCustomerMaster, HttpEventPublisher, HttpGateway,
    HttpLoanCalculator, HttpUpstreams,
};

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} responded with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("{service} returned an unreadable payload: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
    #[error("{service} is misconfigured: {detail}")]
    Configuration {
        service: &'static str,
        detail: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub branch_id: String,
    pub name: String,
    pub region: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMasterRecord {
    pub asset_code: String,
    pub brand: String,
    pub model: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCheckRequest {
    pub chassis_number: String,
    pub engine_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCheck {
    pub blacklisted: bool,
    pub active_contract: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerLookupRequest {
    pub id_number: String,
    pub legal_name: String,
    pub birth_date: NaiveDate,
    pub mother_maiden_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub blacklisted: bool,
    #[serde(default)]
    pub overdue_days: u32,
    #[serde(default)]
    pub existing_customer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    New,
    RepeatOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAsset {
    pub asset_code: String,
    pub manufacture_year: i32,
    pub license_plate: String,
    pub chassis_number: String,
    pub engine_number: String,
    pub bpkb_name: String,
    pub otr_price: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFinancing {
    pub tenor: u16,
    pub down_payment: u64,
    pub loan_amount: u64,
    pub installment_amount: u64,
    pub program_id: String,
}

/// Combined payload forwarded to customer master once every facet is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSyncPayload {
    pub prospect_id: ProspectId,
    pub channel: Channel,
    pub branch_id: String,
    pub master_customer_id: Option<String>,
    pub bpkb_status: BpkbNameStatus,
    pub applicant: ApplicantSubmission,
    pub asset: SyncAsset,
    pub financing: SyncFinancing,
    pub emergency_contact: EmergencyContactSubmission,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSyncResult {
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAmountQuery {
    pub branch_id: String,
    pub asset_code: String,
    pub manufacture_year: i32,
    pub otr_price: u64,
    pub tenor: u16,
    pub financing_code: FinancingCode,
    pub customer_type: CustomerType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanAmountQuote {
    pub ltv_percent: f64,
    pub max_loan_amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramQuery {
    pub branch_id: String,
    pub channel: Channel,
    pub asset_code: String,
    pub tenor: u16,
    pub financing_code: FinancingCode,
    pub customer_type: CustomerType,
    pub otr_price: u64,
    pub down_payment: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingProgram {
    pub program_id: String,
    pub name: String,
    pub priority: u32,
    pub min_tenor: u16,
    pub max_tenor: u16,
    pub min_down_payment_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentRequest {
    pub program_id: String,
    pub loan_amount: u64,
    pub admin_fee: u64,
    pub tenor: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentQuote {
    pub installment_amount: u64,
    pub total_payable: u64,
    pub effective_rate: f64,
}

#[async_trait]
pub trait BranchDirectory: Send + Sync {
    async fn branch(&self, branch_id: &str) -> Result<Option<Branch>, UpstreamError>;
}

#[async_trait]
pub trait AssetMaster: Send + Sync {
    async fn asset(
        &self,
        asset_code: &str,
        branch_id: &str,
    ) -> Result<Option<AssetMasterRecord>, UpstreamError>;

    async fn vehicle_check(
        &self,
        request: &VehicleCheckRequest,
    ) -> Result<VehicleCheck, UpstreamError>;
}

#[async_trait]
pub trait CustomerMaster: Send + Sync {
    async fn lookup(
        &self,
        request: &CustomerLookupRequest,
    ) -> Result<CustomerProfile, UpstreamError>;

    async fn sync(
        &self,
        payload: &CustomerSyncPayload,
    ) -> Result<CustomerSyncResult, UpstreamError>;
}

#[async_trait]
pub trait LoanCalculator: Send + Sync {
    async fn max_loan_amount(
        &self,
        query: &LoanAmountQuery,
    ) -> Result<LoanAmountQuote, UpstreamError>;

    async fn eligible_programs(
        &self,
        query: &ProgramQuery,
    ) -> Result<Vec<MarketingProgram>, UpstreamError>;

    async fn installment(
        &self,
        request: &InstallmentRequest,
    ) -> Result<InstallmentQuote, UpstreamError>;
}

/// Handles to every upstream service a stage may call.
#[derive(Clone)]
pub struct Upstreams {
    pub assets: Arc<dyn AssetMaster>,
    pub branches: Arc<dyn BranchDirectory>,
    pub customers: Arc<dyn CustomerMaster>,
    pub loans: Arc<dyn LoanCalculator>,
}
