use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::Decision;
use super::domain::{
    ApplicantFacet, AssetFacet, Channel, EmergencyContactFacet, FinancingFacet, PrincipleRecord,
    PrincipleStep, ProspectId,
};

/// Transactional store for the step record and the four intake facets.
#[async_trait]
pub trait PrincipleRepository: Send + Sync {
    async fn insert_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError>;
    async fn update_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError>;
    async fn fetch_record(&self, id: &ProspectId)
        -> Result<Option<PrincipleRecord>, RepositoryError>;

    async fn save_asset(&self, facet: AssetFacet) -> Result<(), RepositoryError>;
    async fn fetch_asset(&self, id: &ProspectId) -> Result<Option<AssetFacet>, RepositoryError>;

    async fn save_applicant(&self, facet: ApplicantFacet) -> Result<(), RepositoryError>;
    async fn fetch_applicant(&self, id: &ProspectId)
        -> Result<Option<ApplicantFacet>, RepositoryError>;

    async fn save_financing(&self, facet: FinancingFacet) -> Result<(), RepositoryError>;
    async fn fetch_financing(&self, id: &ProspectId)
        -> Result<Option<FinancingFacet>, RepositoryError>;

    async fn save_emergency_contact(
        &self,
        facet: EmergencyContactFacet,
    ) -> Result<(), RepositoryError>;
    async fn fetch_emergency_contact(
        &self,
        id: &ProspectId,
    ) -> Result<Option<EmergencyContactFacet>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook for state transitions.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: PrincipleEvent) -> Result<(), EventError>;
}

/// State-transition notification consumed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipleEvent {
    pub event_id: Uuid,
    pub topic: String,
    pub prospect_id: ProspectId,
    pub channel: Channel,
    pub step: PrincipleStep,
    pub decision: Decision,
    pub code: String,
    pub reason: String,
    pub occurred_at: DateTime<Utc>,
}

impl PrincipleEvent {
    pub fn for_record(record: &PrincipleRecord, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            topic: record.channel.event_topic().to_string(),
            prospect_id: record.prospect_id.clone(),
            channel: record.channel,
            step: record.step,
            decision: record.decision.decision,
            code: record.decision.code.code().to_string(),
            reason: record.decision.reason.clone(),
            occurred_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}
