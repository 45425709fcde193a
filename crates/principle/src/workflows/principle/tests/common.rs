use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::upstream::{
    AssetMaster, AssetMasterRecord, Branch, BranchDirectory, CustomerLookupRequest,
    CustomerMaster, CustomerProfile, CustomerSyncPayload, CustomerSyncResult, InstallmentQuote,
    InstallmentRequest, LoanAmountQuery, LoanAmountQuote, LoanCalculator, MarketingProgram,
    ProgramQuery, UpstreamError, Upstreams, VehicleCheck, VehicleCheckRequest,
};
use crate::workflows::principle::domain::{
    ApplicantFacet, ApplicantSubmission, AssetFacet, AssetSubmission, Channel,
    EmergencyContactFacet, EmergencyContactSubmission, FinancingFacet, FinancingSubmission,
    Gender, MaritalStatus, PrincipleRecord, ProspectId, ResidenceAddress, SpouseData,
};
use crate::workflows::principle::repository::{
    EventError, EventPublisher, PrincipleEvent, PrincipleRepository, RepositoryError,
};
use crate::workflows::principle::service::{Clock, PrincipleService};
use crate::workflows::principle::PrinciplePolicy;

pub(super) const APPLICANT_NIK: &str = "3174012304900001";
pub(super) const SPOUSE_NIK: &str = "3174016708920002";

pub(super) fn prospect(id: &str) -> ProspectId {
    ProspectId(id.to_string())
}

pub(super) struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub(super) fn new() -> Self {
        Self {
            now: Utc
                .with_ymd_and_hms(2025, 6, 15, 3, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

pub(super) fn address() -> ResidenceAddress {
    ResidenceAddress {
        street: "Jl. Melati No. 12".to_string(),
        rt: "004".to_string(),
        rw: "009".to_string(),
        kelurahan: "Kebon Jeruk".to_string(),
        kecamatan: "Kebon Jeruk".to_string(),
        city: "Jakarta Barat".to_string(),
        zip_code: "11530".to_string(),
    }
}

pub(super) fn asset_submission(id: &str) -> AssetSubmission {
    AssetSubmission {
        prospect_id: prospect(id),
        channel: Channel::Kmb,
        branch_id: "BR-0426".to_string(),
        asset_code: "HND-VARIO-160".to_string(),
        manufacture_year: 2020,
        license_plate: "B 4127 KJA".to_string(),
        chassis_number: "MH1KF4118PK012345".to_string(),
        engine_number: "KF41E1012345".to_string(),
        bpkb_name: "Budi Santoso".to_string(),
        otr_price: 28_500_000,
    }
}

pub(super) fn applicant_submission(id: &str) -> ApplicantSubmission {
    ApplicantSubmission {
        prospect_id: prospect(id),
        id_number: APPLICANT_NIK.to_string(),
        legal_name: "BUDI SANTOSO".to_string(),
        birth_place: "Bandung".to_string(),
        birth_date: NaiveDate::from_ymd_opt(1990, 3, 1).expect("valid date"),
        mother_maiden_name: "Sri Lestari".to_string(),
        gender: Gender::Male,
        marital_status: MaritalStatus::Single,
        spouse: None,
        mobile_phone: "081234567890".to_string(),
        email: Some("budi@example.co.id".to_string()),
        monthly_income: 6_500_000,
        profession_id: "KRYSW".to_string(),
        address: address(),
    }
}

pub(super) fn married_applicant_submission(id: &str) -> ApplicantSubmission {
    ApplicantSubmission {
        marital_status: MaritalStatus::Married,
        spouse: Some(SpouseData {
            id_number: SPOUSE_NIK.to_string(),
            legal_name: "Siti Rahmawati".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1992, 8, 27).expect("valid date"),
            mother_maiden_name: "Dewi Anggraini".to_string(),
        }),
        ..applicant_submission(id)
    }
}

pub(super) fn financing_submission(id: &str) -> FinancingSubmission {
    FinancingSubmission {
        prospect_id: prospect(id),
        tenor: 24,
        down_payment: 6_000_000,
        admin_fee: 750_000,
        program_id: None,
    }
}

pub(super) fn emergency_contact_submission(id: &str) -> EmergencyContactSubmission {
    EmergencyContactSubmission {
        prospect_id: prospect(id),
        name: "Rina Wulandari".to_string(),
        relationship: "sibling".to_string(),
        mobile_phone: "+6281298765432".to_string(),
        address: address(),
    }
}

pub(super) fn program(id: &str, priority: u32, tenor: (u16, u16), min_dp: f64) -> MarketingProgram {
    MarketingProgram {
        program_id: id.to_string(),
        name: format!("Program {id}"),
        priority,
        min_tenor: tenor.0,
        max_tenor: tenor.1,
        min_down_payment_percent: min_dp,
    }
}

/// Canned upstream answers; tests tweak fields before driving a stage.
#[derive(Clone)]
pub(super) struct Script {
    pub(super) branch: Option<Branch>,
    pub(super) asset: Option<AssetMasterRecord>,
    pub(super) vehicle: VehicleCheck,
    pub(super) applicant: CustomerProfile,
    pub(super) spouse: CustomerProfile,
    pub(super) quote: LoanAmountQuote,
    pub(super) programs: Vec<MarketingProgram>,
    pub(super) installment: InstallmentQuote,
    pub(super) customer_id: String,
    pub(super) outage: Option<&'static str>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            branch: Some(Branch {
                branch_id: "BR-0426".to_string(),
                name: "Jakarta Kebon Jeruk".to_string(),
                region: "JKT".to_string(),
                active: true,
            }),
            asset: Some(AssetMasterRecord {
                asset_code: "HND-VARIO-160".to_string(),
                brand: "HONDA".to_string(),
                model: "VARIO 160 CBS".to_string(),
                category: "SCOOTER".to_string(),
            }),
            vehicle: VehicleCheck::default(),
            applicant: CustomerProfile {
                customer_id: Some("CM-000981".to_string()),
                blacklisted: false,
                overdue_days: 0,
                existing_customer: true,
            },
            spouse: CustomerProfile::default(),
            quote: LoanAmountQuote {
                ltv_percent: 85.0,
                max_loan_amount: 24_000_000,
            },
            programs: vec![
                program("PRG-REGULAR", 2, (12, 48), 20.0),
                program("PRG-PROMO", 1, (12, 36), 20.0),
                program("PRG-LONG", 1, (48, 60), 10.0),
            ],
            installment: InstallmentQuote {
                installment_amount: 1_150_000,
                total_payable: 27_600_000,
                effective_rate: 0.1425,
            },
            customer_id: "CUST-7781".to_string(),
            outage: None,
        }
    }
}

/// Scripted stand-in for every upstream service, recording what it was asked.
#[derive(Default)]
pub(super) struct StubUpstream {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
    loan_queries: Mutex<Vec<LoanAmountQuery>>,
    synced: Mutex<Vec<CustomerSyncPayload>>,
}

impl StubUpstream {
    pub(super) fn update(&self, change: impl FnOnce(&mut Script)) {
        change(&mut self.script.lock().expect("script mutex poisoned"));
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn loan_queries(&self) -> Vec<LoanAmountQuery> {
        self.loan_queries
            .lock()
            .expect("loan mutex poisoned")
            .clone()
    }

    pub(super) fn synced(&self) -> Vec<CustomerSyncPayload> {
        self.synced.lock().expect("sync mutex poisoned").clone()
    }

    fn answer(&self, call: String) -> Result<Script, UpstreamError> {
        let script = self.script.lock().expect("script mutex poisoned").clone();
        self.calls.lock().expect("calls mutex poisoned").push(call);
        match script.outage {
            Some(service) => Err(UpstreamError::Status {
                service,
                status: 503,
                body: "connection refused".to_string(),
            }),
            None => Ok(script),
        }
    }

    pub(super) fn upstreams(self: &Arc<Self>) -> Upstreams {
        Upstreams {
            assets: self.clone(),
            branches: self.clone(),
            customers: self.clone(),
            loans: self.clone(),
        }
    }
}

#[async_trait]
impl BranchDirectory for StubUpstream {
    async fn branch(&self, branch_id: &str) -> Result<Option<Branch>, UpstreamError> {
        Ok(self.answer(format!("branch:{branch_id}"))?.branch)
    }
}

#[async_trait]
impl AssetMaster for StubUpstream {
    async fn asset(
        &self,
        asset_code: &str,
        _branch_id: &str,
    ) -> Result<Option<AssetMasterRecord>, UpstreamError> {
        Ok(self.answer(format!("asset:{asset_code}"))?.asset)
    }

    async fn vehicle_check(
        &self,
        request: &VehicleCheckRequest,
    ) -> Result<VehicleCheck, UpstreamError> {
        Ok(self
            .answer(format!("vehicle:{}", request.chassis_number))?
            .vehicle)
    }
}

#[async_trait]
impl CustomerMaster for StubUpstream {
    async fn lookup(
        &self,
        request: &CustomerLookupRequest,
    ) -> Result<CustomerProfile, UpstreamError> {
        let script = self.answer(format!("lookup:{}", request.id_number))?;
        if request.id_number == SPOUSE_NIK {
            Ok(script.spouse)
        } else {
            Ok(script.applicant)
        }
    }

    async fn sync(
        &self,
        payload: &CustomerSyncPayload,
    ) -> Result<CustomerSyncResult, UpstreamError> {
        let script = self.answer(format!("sync:{}", payload.prospect_id))?;
        self.synced
            .lock()
            .expect("sync mutex poisoned")
            .push(payload.clone());
        Ok(CustomerSyncResult {
            customer_id: script.customer_id,
        })
    }
}

#[async_trait]
impl LoanCalculator for StubUpstream {
    async fn max_loan_amount(
        &self,
        query: &LoanAmountQuery,
    ) -> Result<LoanAmountQuote, UpstreamError> {
        let script = self.answer("max-loan".to_string())?;
        self.loan_queries
            .lock()
            .expect("loan mutex poisoned")
            .push(query.clone());
        Ok(script.quote)
    }

    async fn eligible_programs(
        &self,
        _query: &ProgramQuery,
    ) -> Result<Vec<MarketingProgram>, UpstreamError> {
        Ok(self.answer("programs".to_string())?.programs)
    }

    async fn installment(
        &self,
        request: &InstallmentRequest,
    ) -> Result<InstallmentQuote, UpstreamError> {
        Ok(self
            .answer(format!("installment:{}", request.program_id))?
            .installment)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<HashMap<ProspectId, PrincipleRecord>>>,
    assets: Arc<Mutex<HashMap<ProspectId, AssetFacet>>>,
    applicants: Arc<Mutex<HashMap<ProspectId, ApplicantFacet>>>,
    financing: Arc<Mutex<HashMap<ProspectId, FinancingFacet>>>,
    contacts: Arc<Mutex<HashMap<ProspectId, EmergencyContactFacet>>>,
}

impl MemoryRepository {
    pub(super) fn record(&self, id: &str) -> Option<PrincipleRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(&prospect(id))
            .cloned()
    }

    pub(super) fn applicant(&self, id: &str) -> Option<ApplicantFacet> {
        self.applicants
            .lock()
            .expect("repository mutex poisoned")
            .get(&prospect(id))
            .cloned()
    }

    pub(super) fn financing(&self, id: &str) -> Option<FinancingFacet> {
        self.financing
            .lock()
            .expect("repository mutex poisoned")
            .get(&prospect(id))
            .cloned()
    }

    pub(super) fn asset(&self, id: &str) -> Option<AssetFacet> {
        self.assets
            .lock()
            .expect("repository mutex poisoned")
            .get(&prospect(id))
            .cloned()
    }
}

#[async_trait]
impl PrincipleRepository for MemoryRepository {
    async fn insert_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.prospect_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.prospect_id.clone(), record);
        Ok(())
    }

    async fn update_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&record.prospect_id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.prospect_id.clone(), record);
        Ok(())
    }

    async fn fetch_record(
        &self,
        id: &ProspectId,
    ) -> Result<Option<PrincipleRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn save_asset(&self, facet: AssetFacet) -> Result<(), RepositoryError> {
        self.assets
            .lock()
            .expect("repository mutex poisoned")
            .insert(facet.submission.prospect_id.clone(), facet);
        Ok(())
    }

    async fn fetch_asset(&self, id: &ProspectId) -> Result<Option<AssetFacet>, RepositoryError> {
        Ok(self
            .assets
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn save_applicant(&self, facet: ApplicantFacet) -> Result<(), RepositoryError> {
        self.applicants
            .lock()
            .expect("repository mutex poisoned")
            .insert(facet.submission.prospect_id.clone(), facet);
        Ok(())
    }

    async fn fetch_applicant(
        &self,
        id: &ProspectId,
    ) -> Result<Option<ApplicantFacet>, RepositoryError> {
        Ok(self
            .applicants
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn save_financing(&self, facet: FinancingFacet) -> Result<(), RepositoryError> {
        self.financing
            .lock()
            .expect("repository mutex poisoned")
            .insert(facet.submission.prospect_id.clone(), facet);
        Ok(())
    }

    async fn fetch_financing(
        &self,
        id: &ProspectId,
    ) -> Result<Option<FinancingFacet>, RepositoryError> {
        Ok(self
            .financing
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }

    async fn save_emergency_contact(
        &self,
        facet: EmergencyContactFacet,
    ) -> Result<(), RepositoryError> {
        self.contacts
            .lock()
            .expect("repository mutex poisoned")
            .insert(facet.submission.prospect_id.clone(), facet);
        Ok(())
    }

    async fn fetch_emergency_contact(
        &self,
        id: &ProspectId,
    ) -> Result<Option<EmergencyContactFacet>, RepositoryError> {
        Ok(self
            .contacts
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned())
    }
}

/// Repository whose backing store is down.
pub(super) struct UnavailableRepository;

#[async_trait]
impl PrincipleRepository for UnavailableRepository {
    async fn insert_record(&self, _record: PrincipleRecord) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn update_record(&self, _record: PrincipleRecord) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn fetch_record(
        &self,
        _id: &ProspectId,
    ) -> Result<Option<PrincipleRecord>, RepositoryError> {
        Err(unavailable())
    }

    async fn save_asset(&self, _facet: AssetFacet) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn fetch_asset(&self, _id: &ProspectId) -> Result<Option<AssetFacet>, RepositoryError> {
        Err(unavailable())
    }

    async fn save_applicant(&self, _facet: ApplicantFacet) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn fetch_applicant(
        &self,
        _id: &ProspectId,
    ) -> Result<Option<ApplicantFacet>, RepositoryError> {
        Err(unavailable())
    }

    async fn save_financing(&self, _facet: FinancingFacet) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn fetch_financing(
        &self,
        _id: &ProspectId,
    ) -> Result<Option<FinancingFacet>, RepositoryError> {
        Err(unavailable())
    }

    async fn save_emergency_contact(
        &self,
        _facet: EmergencyContactFacet,
    ) -> Result<(), RepositoryError> {
        Err(unavailable())
    }

    async fn fetch_emergency_contact(
        &self,
        _id: &ProspectId,
    ) -> Result<Option<EmergencyContactFacet>, RepositoryError> {
        Err(unavailable())
    }
}

fn unavailable() -> RepositoryError {
    RepositoryError::Unavailable("database offline".to_string())
}

#[derive(Default, Clone)]
pub(super) struct MemoryEvents {
    events: Arc<Mutex<Vec<PrincipleEvent>>>,
    failing: bool,
}

impl MemoryEvents {
    pub(super) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(super) fn events(&self) -> Vec<PrincipleEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }
}

#[async_trait]
impl EventPublisher for MemoryEvents {
    async fn publish(&self, event: PrincipleEvent) -> Result<(), EventError> {
        if self.failing {
            return Err(EventError::Transport("broker unreachable".to_string()));
        }
        self.events
            .lock()
            .expect("event mutex poisoned")
            .push(event);
        Ok(())
    }
}

pub(super) type TestService = PrincipleService<MemoryRepository, MemoryEvents>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) events: Arc<MemoryEvents>,
    pub(super) upstream: Arc<StubUpstream>,
}

pub(super) fn harness_with_events(events: MemoryEvents) -> Harness {
    let repository = Arc::new(MemoryRepository::default());
    let events = Arc::new(events);
    let upstream = Arc::new(StubUpstream::default());
    let service = Arc::new(PrincipleService::with_clock(
        repository.clone(),
        events.clone(),
        upstream.upstreams(),
        PrinciplePolicy::default(),
        Arc::new(FixedClock::new()),
    ));
    Harness {
        service,
        repository,
        events,
        upstream,
    }
}

pub(super) fn harness() -> Harness {
    harness_with_events(MemoryEvents::default())
}

impl Harness {
    /// Drive a prospect through the passing path up to and including financing.
    pub(super) async fn through_financing(&self, id: &str) {
        self.service
            .verify_asset(asset_submission(id))
            .await
            .expect("asset stage");
        self.service
            .verify_applicant(applicant_submission(id))
            .await
            .expect("applicant stage");
        self.service
            .verify_financing(financing_submission(id))
            .await
            .expect("financing stage");
    }
}

pub(super) async fn read_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("json body")
}
