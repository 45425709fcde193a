use tracing::info;

use crate::upstream::{CustomerSyncPayload, SyncAsset, SyncFinancing};
use crate::workflows::principle::decision::{DecisionRecord, ReasonCode};
use crate::workflows::principle::domain::{
    ApplicantFacet, AssetFacet, BpkbNameStatus, EmergencyContactFacet, FinancingFacet,
    PrincipleRecord, PrincipleStep, ProspectId,
};
use crate::workflows::principle::repository::{EventPublisher, PrincipleRepository};
use crate::workflows::principle::service::{PrincipleError, PrincipleService, StageOutcome};

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    /// Aggregate the four facets into one customer master submission.
    ///
    /// Safe to call again after an upstream failure; the record stays at step three until
    /// customer master accepts the payload.
    pub async fn sync_core_customer(
        &self,
        id: &ProspectId,
    ) -> Result<StageOutcome, PrincipleError> {
        let mut record = self
            .open_record(id, PrincipleStep::EmergencyContact)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;

        let (asset, applicant, financing, emergency_contact) = tokio::try_join!(
            self.required_asset(id),
            self.required_applicant(id),
            self.required_financing(id),
            self.required_emergency_contact(id),
        )?;

        let payload = sync_payload(&record, asset, applicant, financing, emergency_contact)?;
        let synced = self.upstreams.customers.sync(&payload).await?;
        info!(
            prospect_id = %id,
            customer_id = %synced.customer_id,
            "customer master sync accepted"
        );

        record.step = PrincipleStep::EmergencyContact;
        record.decision = DecisionRecord::from_code(ReasonCode::PrincipleCompleted);
        record.customer_id = Some(synced.customer_id);
        record.updated_at = self.now();

        let record = self.commit(record, false).await?;
        Ok(StageOutcome::from_record(&record))
    }
}

fn sync_payload(
    record: &PrincipleRecord,
    asset: AssetFacet,
    applicant: ApplicantFacet,
    financing: FinancingFacet,
    emergency_contact: EmergencyContactFacet,
) -> Result<CustomerSyncPayload, PrincipleError> {
    let program = financing
        .program
        .ok_or_else(|| PrincipleError::MissingFacet {
            prospect_id: record.prospect_id.clone(),
            facet: "marketing program",
        })?;
    let bpkb_status = record.bpkb_status.unwrap_or_else(|| {
        BpkbNameStatus::resolve(
            &asset.submission.bpkb_name,
            &applicant.submission.legal_name,
            applicant
                .submission
                .spouse
                .as_ref()
                .map(|spouse| spouse.legal_name.as_str()),
        )
    });

    let asset = asset.submission;
    Ok(CustomerSyncPayload {
        prospect_id: record.prospect_id.clone(),
        channel: record.channel,
        branch_id: record.branch_id.clone(),
        master_customer_id: applicant.master_customer_id,
        bpkb_status,
        applicant: applicant.submission,
        asset: SyncAsset {
            asset_code: asset.asset_code,
            manufacture_year: asset.manufacture_year,
            license_plate: asset.license_plate,
            chassis_number: asset.chassis_number,
            engine_number: asset.engine_number,
            bpkb_name: asset.bpkb_name,
            otr_price: asset.otr_price,
        },
        financing: SyncFinancing {
            tenor: financing.submission.tenor,
            down_payment: financing.submission.down_payment,
            loan_amount: financing.loan_amount,
            installment_amount: program.installment_amount,
            program_id: program.program_id,
        },
        emergency_contact: emergency_contact.submission,
    })
}
