use crate::upstream::{CustomerLookupRequest, CustomerProfile};
use crate::workflows::principle::decision::rules::{self, ApplicantSignals};
use crate::workflows::principle::domain::{
    ApplicantFacet, ApplicantSubmission, BpkbNameStatus, PrincipleStep,
};
use crate::workflows::principle::repository::{EventPublisher, PrincipleRepository};
use crate::workflows::principle::service::{PrincipleError, PrincipleService, StageOutcome};
use crate::workflows::principle::validation;

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    /// Step two: screen the applicant (and spouse) against customer master.
    pub async fn verify_applicant(
        &self,
        submission: ApplicantSubmission,
    ) -> Result<StageOutcome, PrincipleError> {
        validation::applicant(&submission, self.today())?;
        let id = submission.prospect_id.clone();
        let mut record = self
            .open_record(&id, PrincipleStep::VerifyApplicant)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;

        let applicant_lookup = CustomerLookupRequest {
            id_number: submission.id_number.clone(),
            legal_name: submission.legal_name.clone(),
            birth_date: submission.birth_date,
            mother_maiden_name: submission.mother_maiden_name.clone(),
        };
        let spouse_lookup = submission
            .spouse
            .as_ref()
            .map(|spouse| CustomerLookupRequest {
                id_number: spouse.id_number.clone(),
                legal_name: spouse.legal_name.clone(),
                birth_date: spouse.birth_date,
                mother_maiden_name: spouse.mother_maiden_name.clone(),
            });

        let customers = &self.upstreams.customers;
        let (asset, applicant, spouse) = tokio::try_join!(
            self.required_asset(&id),
            async {
                customers
                    .lookup(&applicant_lookup)
                    .await
                    .map_err(PrincipleError::from)
            },
            async {
                match &spouse_lookup {
                    Some(request) => customers
                        .lookup(request)
                        .await
                        .map(Some)
                        .map_err(PrincipleError::from),
                    None => Ok::<Option<CustomerProfile>, PrincipleError>(None),
                }
            },
        )?;

        let today = self.today();
        let age = rules::age_on(submission.birth_date, today);
        let decision = rules::assess_applicant(
            &ApplicantSignals {
                age,
                customer_blacklisted: applicant.blacklisted,
                spouse_blacklisted: spouse.as_ref().is_some_and(|profile| profile.blacklisted),
                overdue_days: applicant.overdue_days,
            },
            &self.policy,
        );

        let bpkb_status = BpkbNameStatus::resolve(
            &asset.submission.bpkb_name,
            &submission.legal_name,
            submission
                .spouse
                .as_ref()
                .map(|spouse| spouse.legal_name.as_str()),
        );

        let now = self.now();
        self.repository
            .save_applicant(ApplicantFacet {
                submission,
                master_customer_id: applicant.customer_id,
                existing_customer: applicant.existing_customer,
                overdue_days: applicant.overdue_days,
                age,
                recorded_at: now,
            })
            .await?;

        record.step = PrincipleStep::VerifyApplicant;
        record.decision = decision;
        record.bpkb_status = Some(bpkb_status);
        record.updated_at = now;

        let record = self.commit(record, false).await?;
        Ok(StageOutcome::from_record(&record))
    }
}
