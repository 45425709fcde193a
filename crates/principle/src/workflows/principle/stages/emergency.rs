use crate::workflows::principle::domain::{
    EmergencyContactFacet, EmergencyContactSubmission, PrincipleStep,
};
use crate::workflows::principle::repository::{EventPublisher, PrincipleRepository};
use crate::workflows::principle::service::{PrincipleError, PrincipleService, StageOutcome};
use crate::workflows::principle::validation;

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    /// Step four: store the emergency contact and push the application to customer master.
    pub async fn submit_emergency_contact(
        &self,
        submission: EmergencyContactSubmission,
    ) -> Result<StageOutcome, PrincipleError> {
        validation::prospect_id(&submission.prospect_id)?;
        let id = submission.prospect_id.clone();
        self.open_record(&id, PrincipleStep::EmergencyContact)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;

        let applicant = self.required_applicant(&id).await?;
        validation::emergency_contact(&submission, &applicant)?;

        self.repository
            .save_emergency_contact(EmergencyContactFacet {
                submission,
                recorded_at: self.now(),
            })
            .await?;

        self.sync_core_customer(&id).await
    }
}
