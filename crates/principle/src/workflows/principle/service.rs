use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::decision::{DecisionRecord, PrinciplePolicy, ReasonCode};
use super::domain::{
    ApplicantFacet, AssetFacet, EmergencyContactFacet, FinancingFacet, PrincipleRecord,
    PrincipleStep, ProspectId, SelectedProgram,
};
use super::repository::{EventPublisher, PrincipleEvent, PrincipleRepository, RepositoryError};
use super::status::StatusView;
use super::validation::ValidationError;
use crate::upstream::{UpstreamError, Upstreams};

/// Time source for age calculations and record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Service driving a prospect through the four principle steps.
pub struct PrincipleService<R, E> {
    pub(super) repository: Arc<R>,
    events: Arc<E>,
    pub(super) upstreams: Upstreams,
    pub(super) policy: PrinciplePolicy,
    clock: Arc<dyn Clock>,
}

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    pub fn new(
        repository: Arc<R>,
        events: Arc<E>,
        upstreams: Upstreams,
        policy: PrinciplePolicy,
    ) -> Self {
        Self::with_clock(repository, events, upstreams, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        repository: Arc<R>,
        events: Arc<E>,
        upstreams: Upstreams,
        policy: PrinciplePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            events,
            upstreams,
            policy,
            clock,
        }
    }

    pub(super) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(super) fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Load the record a stage for `step` may act on.
    ///
    /// Step one with no record yields `None`; every other admissible case yields the open record
    /// sitting at `step` or the step before it.
    pub(super) async fn open_record(
        &self,
        id: &ProspectId,
        step: PrincipleStep,
    ) -> Result<Option<PrincipleRecord>, PrincipleError> {
        let record = self.repository.fetch_record(id).await?;
        let Some(record) = record else {
            return match step.previous() {
                None => Ok(None),
                Some(_) => Err(PrincipleError::NotFound(id.clone())),
            };
        };

        if record.is_closed() {
            return Err(PrincipleError::Closed {
                prospect_id: id.clone(),
                decision: record.decision.decision.label(),
            });
        }

        if record.step == step || Some(record.step) == step.previous() {
            Ok(Some(record))
        } else {
            Err(PrincipleError::StageOutOfOrder {
                prospect_id: id.clone(),
                expected: step,
                found: record.step,
            })
        }
    }

    /// Persist the record, then announce the transition.
    pub(super) async fn commit(
        &self,
        record: PrincipleRecord,
        created: bool,
    ) -> Result<PrincipleRecord, PrincipleError> {
        if created {
            self.repository.insert_record(record.clone()).await?;
        } else {
            self.repository.update_record(record.clone()).await?;
        }

        info!(
            prospect_id = %record.prospect_id,
            step = %record.step,
            decision = record.decision.decision.label(),
            code = record.decision.code.code(),
            "principle decision recorded"
        );

        let event = PrincipleEvent::for_record(&record, self.now());
        if let Err(error) = self.events.publish(event).await {
            warn!(
                prospect_id = %record.prospect_id,
                step = %record.step,
                %error,
                "failed to publish principle event"
            );
        }
        Ok(record)
    }

    pub(super) async fn required_asset(&self, id: &ProspectId) -> Result<AssetFacet, PrincipleError> {
        self.repository
            .fetch_asset(id)
            .await?
            .ok_or_else(|| PrincipleError::missing(id, "asset"))
    }

    pub(super) async fn required_applicant(
        &self,
        id: &ProspectId,
    ) -> Result<ApplicantFacet, PrincipleError> {
        self.repository
            .fetch_applicant(id)
            .await?
            .ok_or_else(|| PrincipleError::missing(id, "applicant"))
    }

    pub(super) async fn required_financing(
        &self,
        id: &ProspectId,
    ) -> Result<FinancingFacet, PrincipleError> {
        self.repository
            .fetch_financing(id)
            .await?
            .ok_or_else(|| PrincipleError::missing(id, "financing"))
    }

    pub(super) async fn required_emergency_contact(
        &self,
        id: &ProspectId,
    ) -> Result<EmergencyContactFacet, PrincipleError> {
        self.repository
            .fetch_emergency_contact(id)
            .await?
            .ok_or_else(|| PrincipleError::missing(id, "emergency contact"))
    }

    /// Cancel an open application. The caller's reason is appended to the 9000 description.
    pub async fn cancel(
        &self,
        id: &ProspectId,
        reason: &str,
    ) -> Result<StageOutcome, PrincipleError> {
        let mut record = self
            .repository
            .fetch_record(id)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;
        if record.is_closed() {
            return Err(PrincipleError::Closed {
                prospect_id: id.clone(),
                decision: record.decision.decision.label(),
            });
        }

        record.decision = if reason.trim().is_empty() {
            DecisionRecord::from_code(ReasonCode::Cancelled)
        } else {
            DecisionRecord::with_detail(ReasonCode::Cancelled, reason.trim())
        };
        record.updated_at = self.now();

        let record = self.commit(record, false).await?;
        Ok(StageOutcome::from_record(&record))
    }

    /// Full record plus every stored facet.
    pub async fn get(&self, id: &ProspectId) -> Result<PrincipleSnapshot, PrincipleError> {
        let repository = &self.repository;
        let (record, asset, applicant, financing, emergency_contact) = tokio::try_join!(
            repository.fetch_record(id),
            repository.fetch_asset(id),
            repository.fetch_applicant(id),
            repository.fetch_financing(id),
            repository.fetch_emergency_contact(id),
        )?;
        let record = record.ok_or_else(|| PrincipleError::NotFound(id.clone()))?;

        Ok(PrincipleSnapshot {
            status: record.status_view(),
            record,
            asset,
            applicant,
            financing,
            emergency_contact,
        })
    }

    pub async fn status(&self, id: &ProspectId) -> Result<StatusView, PrincipleError> {
        let record = self
            .repository
            .fetch_record(id)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;
        Ok(record.status_view())
    }
}

/// Response body returned by every stage endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageOutcome {
    #[serde(flatten)]
    pub status: StatusView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<SelectedProgram>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

impl StageOutcome {
    pub(super) fn from_record(record: &PrincipleRecord) -> Self {
        Self {
            status: record.status_view(),
            program: None,
            customer_id: record.customer_id.clone(),
        }
    }

    pub(super) fn with_program(mut self, program: Option<SelectedProgram>) -> Self {
        self.program = program;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipleSnapshot {
    pub record: PrincipleRecord,
    pub status: StatusView,
    pub asset: Option<AssetFacet>,
    pub applicant: Option<ApplicantFacet>,
    pub financing: Option<FinancingFacet>,
    pub emergency_contact: Option<EmergencyContactFacet>,
}

/// Error raised by the principle service.
#[derive(Debug, thiserror::Error)]
pub enum PrincipleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("prospect {0} not found")]
    NotFound(ProspectId),
    #[error("prospect {prospect_id} is closed with decision {decision}")]
    Closed {
        prospect_id: ProspectId,
        decision: &'static str,
    },
    #[error("prospect {prospect_id} is at {found}; {expected} cannot run from there")]
    StageOutOfOrder {
        prospect_id: ProspectId,
        expected: PrincipleStep,
        found: PrincipleStep,
    },
    #[error("prospect {prospect_id} has no {facet} data")]
    MissingFacet {
        prospect_id: ProspectId,
        facet: &'static str,
    },
}

impl PrincipleError {
    fn missing(id: &ProspectId, facet: &'static str) -> Self {
        PrincipleError::MissingFacet {
            prospect_id: id.clone(),
            facet,
        }
    }
}
