use tracing::debug;

use crate::upstream::VehicleCheckRequest;
use crate::workflows::principle::decision::rules::{self, AssetSignals};
use crate::workflows::principle::domain::{
    AssetFacet, AssetSubmission, PrincipleRecord, PrincipleStep,
};
use crate::workflows::principle::repository::{EventPublisher, PrincipleRepository};
use crate::workflows::principle::service::{PrincipleError, PrincipleService, StageOutcome};
use crate::workflows::principle::validation;

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    /// Step one: check branch, asset master, and vehicle history, then open the record.
    pub async fn verify_asset(
        &self,
        submission: AssetSubmission,
    ) -> Result<StageOutcome, PrincipleError> {
        let today = self.today();
        validation::asset(&submission, today)?;
        let existing = self
            .open_record(&submission.prospect_id, PrincipleStep::VerifyAsset)
            .await?;

        let vehicle_request = VehicleCheckRequest {
            chassis_number: submission.chassis_number.clone(),
            engine_number: submission.engine_number.clone(),
        };
        let (branch, asset, vehicle) = tokio::try_join!(
            self.upstreams.branches.branch(&submission.branch_id),
            self.upstreams
                .assets
                .asset(&submission.asset_code, &submission.branch_id),
            self.upstreams.assets.vehicle_check(&vehicle_request),
        )?;
        debug!(
            prospect_id = %submission.prospect_id,
            branch_found = branch.is_some(),
            asset_found = asset.is_some(),
            "asset lookups complete"
        );

        let decision = rules::assess_asset(
            &AssetSignals {
                branch_active: branch.as_ref().is_some_and(|branch| branch.active),
                asset_found: asset.is_some(),
                manufacture_year: submission.manufacture_year,
                vehicle: &vehicle,
            },
            &self.policy,
            today,
        );

        let now = self.now();
        let (record, created) = match existing {
            Some(mut record) => {
                record.channel = submission.channel;
                record.branch_id = submission.branch_id.clone();
                record.step = PrincipleStep::VerifyAsset;
                record.decision = decision;
                record.bpkb_status = None;
                record.updated_at = now;
                (record, false)
            }
            None => (
                PrincipleRecord {
                    prospect_id: submission.prospect_id.clone(),
                    channel: submission.channel,
                    branch_id: submission.branch_id.clone(),
                    step: PrincipleStep::VerifyAsset,
                    decision,
                    bpkb_status: None,
                    customer_id: None,
                    created_at: now,
                    updated_at: now,
                },
                true,
            ),
        };

        let (brand, model, category) = match asset {
            Some(found) => (Some(found.brand), Some(found.model), Some(found.category)),
            None => (None, None, None),
        };
        self.repository
            .save_asset(AssetFacet {
                submission,
                brand,
                model,
                category,
                recorded_at: now,
            })
            .await?;

        let record = self.commit(record, created).await?;
        Ok(StageOutcome::from_record(&record))
    }
}
