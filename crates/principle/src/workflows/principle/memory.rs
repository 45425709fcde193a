use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::domain::{
    ApplicantFacet, AssetFacet, EmergencyContactFacet, FinancingFacet, PrincipleRecord,
    ProspectId,
};
use super::repository::{PrincipleRepository, RepositoryError};

#[derive(Debug, Default)]
struct ProspectEntry {
    record: Option<PrincipleRecord>,
    asset: Option<AssetFacet>,
    applicant: Option<ApplicantFacet>,
    financing: Option<FinancingFacet>,
    emergency_contact: Option<EmergencyContactFacet>,
}

/// Process-local repository keeping every prospect's record and facets under one lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPrincipleRepository {
    entries: Arc<Mutex<HashMap<ProspectId, ProspectEntry>>>,
}

impl InMemoryPrincipleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        id: &ProspectId,
        pick: impl FnOnce(&ProspectEntry) -> Option<T>,
    ) -> Result<Option<T>, RepositoryError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))?;
        Ok(guard.get(id).and_then(pick))
    }

    fn write<T>(
        &self,
        id: ProspectId,
        apply: impl FnOnce(&mut ProspectEntry) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))?;
        apply(guard.entry(id).or_default())
    }
}

#[async_trait]
impl PrincipleRepository for InMemoryPrincipleRepository {
    async fn insert_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError> {
        self.write(record.prospect_id.clone(), |entry| {
            if entry.record.is_some() {
                return Err(RepositoryError::Conflict);
            }
            entry.record = Some(record);
            Ok(())
        })
    }

    async fn update_record(&self, record: PrincipleRecord) -> Result<(), RepositoryError> {
        self.write(record.prospect_id.clone(), |entry| match entry.record.as_mut() {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    async fn fetch_record(
        &self,
        id: &ProspectId,
    ) -> Result<Option<PrincipleRecord>, RepositoryError> {
        self.read(id, |entry| entry.record.clone())
    }

    async fn save_asset(&self, facet: AssetFacet) -> Result<(), RepositoryError> {
        self.write(facet.submission.prospect_id.clone(), |entry| {
            entry.asset = Some(facet);
            Ok(())
        })
    }

    async fn fetch_asset(&self, id: &ProspectId) -> Result<Option<AssetFacet>, RepositoryError> {
        self.read(id, |entry| entry.asset.clone())
    }

    async fn save_applicant(&self, facet: ApplicantFacet) -> Result<(), RepositoryError> {
        self.write(facet.submission.prospect_id.clone(), |entry| {
            entry.applicant = Some(facet);
            Ok(())
        })
    }

    async fn fetch_applicant(
        &self,
        id: &ProspectId,
    ) -> Result<Option<ApplicantFacet>, RepositoryError> {
        self.read(id, |entry| entry.applicant.clone())
    }

    async fn save_financing(&self, facet: FinancingFacet) -> Result<(), RepositoryError> {
        self.write(facet.submission.prospect_id.clone(), |entry| {
            entry.financing = Some(facet);
            Ok(())
        })
    }

    async fn fetch_financing(
        &self,
        id: &ProspectId,
    ) -> Result<Option<FinancingFacet>, RepositoryError> {
        self.read(id, |entry| entry.financing.clone())
    }

    async fn save_emergency_contact(
        &self,
        facet: EmergencyContactFacet,
    ) -> Result<(), RepositoryError> {
        self.write(facet.submission.prospect_id.clone(), |entry| {
            entry.emergency_contact = Some(facet);
            Ok(())
        })
    }

    async fn fetch_emergency_contact(
        &self,
        id: &ProspectId,
    ) -> Result<Option<EmergencyContactFacet>, RepositoryError> {
        self.read(id, |entry| entry.emergency_contact.clone())
    }
}
