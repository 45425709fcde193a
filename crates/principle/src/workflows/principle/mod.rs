//! Principle loan-application workflow: staged intake, rule evaluation, and aggregation into
//! customer master.
//!
//! Each stage validates its facet, fans out to the upstream services it needs, derives a
//! decision from the rule table, persists the facet and record, and publishes a transition
//! event.

pub mod decision;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
mod stages;
pub mod status;
pub(crate) mod validation;

#[cfg(test)]
mod tests;

pub use decision::{Decision, DecisionRecord, PrinciplePolicy, ReasonCode};
pub use domain::{
    ApplicantFacet, ApplicantSubmission, AssetFacet, AssetSubmission, BpkbNameStatus, Channel,
    EmergencyContactFacet, EmergencyContactSubmission, FinancingCode, FinancingFacet,
    FinancingSubmission, Gender, MaritalStatus, PrincipleRecord, PrincipleStep, ProspectId,
    ResidenceAddress, SelectedProgram, SpouseData,
};
pub use memory::InMemoryPrincipleRepository;
pub use repository::{
    EventError, EventPublisher, PrincipleEvent, PrincipleRepository, RepositoryError,
};
pub use router::principle_router;
pub use service::{
    Clock, PrincipleError, PrincipleService, PrincipleSnapshot, StageOutcome, SystemClock,
};
pub use status::{derive_status, status_table, StatusDisplay, StatusView};
pub use validation::ValidationError;
