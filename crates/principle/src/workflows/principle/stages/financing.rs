use chrono::NaiveDate;

use crate::upstream::{
    CustomerType, InstallmentRequest, LoanAmountQuery, LoanAmountQuote, ProgramQuery,
};
use crate::workflows::principle::decision::rules;
use crate::workflows::principle::decision::{DecisionRecord, ReasonCode};
use crate::workflows::principle::domain::{
    ApplicantFacet, AssetFacet, BpkbNameStatus, Channel, FinancingFacet, FinancingSubmission,
    PrincipleStep, SelectedProgram,
};
use crate::workflows::principle::repository::{EventPublisher, PrincipleRepository};
use crate::workflows::principle::service::{PrincipleError, PrincipleService, StageOutcome};
use crate::workflows::principle::validation;

impl<R, E> PrincipleService<R, E>
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    /// Step three: quote the loan, pick a marketing program, and price the installment.
    ///
    /// The financing facet is stored on every outcome, carrying whatever was quoted before a
    /// rule rejected the terms.
    pub async fn verify_financing(
        &self,
        submission: FinancingSubmission,
    ) -> Result<StageOutcome, PrincipleError> {
        validation::prospect_id(&submission.prospect_id)?;
        let id = submission.prospect_id.clone();
        let mut record = self
            .open_record(&id, PrincipleStep::VerifyFinancing)
            .await?
            .ok_or_else(|| PrincipleError::NotFound(id.clone()))?;

        let (asset, applicant) =
            tokio::try_join!(self.required_asset(&id), self.required_applicant(&id))?;
        validation::financing(&submission, &asset)?;

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
        let customer_type = if applicant.existing_customer {
            CustomerType::RepeatOrder
        } else {
            CustomerType::New
        };

        let mut facet = FinancingFacet {
            financing_code: bpkb_status.financing_code(),
            loan_amount: asset.submission.otr_price - submission.down_payment,
            max_loan_amount: None,
            ltv_percent: None,
            program: None,
            submission,
            recorded_at: self.now(),
        };

        let decision = self
            .price_financing(
                &mut facet,
                &asset,
                &applicant,
                record.channel,
                customer_type,
                self.today(),
            )
            .await?;

        let now = self.now();
        facet.recorded_at = now;
        let program = facet.program.clone();
        self.repository.save_financing(facet).await?;

        record.step = PrincipleStep::VerifyFinancing;
        record.decision = decision;
        record.bpkb_status = Some(bpkb_status);
        record.updated_at = now;

        let record = self.commit(record, false).await?;
        Ok(StageOutcome::from_record(&record).with_program(program))
    }

    async fn price_financing(
        &self,
        facet: &mut FinancingFacet,
        asset: &AssetFacet,
        applicant: &ApplicantFacet,
        channel: Channel,
        customer_type: CustomerType,
        today: NaiveDate,
    ) -> Result<DecisionRecord, PrincipleError> {
        let loans = &self.upstreams.loans;
        let terms = &facet.submission;
        let tenor = terms.tenor;

        let LoanAmountQuote {
            ltv_percent,
            max_loan_amount,
        } = loans
            .max_loan_amount(&LoanAmountQuery {
                branch_id: asset.submission.branch_id.clone(),
                asset_code: asset.submission.asset_code.clone(),
                manufacture_year: asset.submission.manufacture_year,
                otr_price: asset.submission.otr_price,
                tenor,
                financing_code: facet.financing_code,
                customer_type,
            })
            .await?;
        facet.ltv_percent = Some(ltv_percent);
        facet.max_loan_amount = Some(max_loan_amount);

        if let Some(rejection) = rules::check_loan_ceiling(facet.loan_amount, max_loan_amount) {
            return Ok(rejection);
        }

        let asset_age = rules::asset_age(asset.submission.manufacture_year, today);
        let applicant_age = rules::age_on(applicant.submission.birth_date, today);
        if let Some(rejection) = rules::check_maturity(asset_age, applicant_age, tenor, &self.policy)
        {
            return Ok(rejection);
        }

        let programs = loans
            .eligible_programs(&ProgramQuery {
                branch_id: asset.submission.branch_id.clone(),
                channel,
                asset_code: asset.submission.asset_code.clone(),
                tenor,
                financing_code: facet.financing_code,
                customer_type,
                otr_price: asset.submission.otr_price,
                down_payment: terms.down_payment,
            })
            .await?;
        let dp_percent = rules::down_payment_percent(terms.down_payment, asset.submission.otr_price);
        let program = match rules::select_program(
            &programs,
            terms.program_id.as_deref(),
            tenor,
            dp_percent,
        ) {
            Ok(program) => program,
            Err(rejection) => return Ok(rejection),
        };

        let quote = loans
            .installment(&InstallmentRequest {
                program_id: program.program_id.clone(),
                loan_amount: facet.loan_amount,
                admin_fee: terms.admin_fee,
                tenor,
            })
            .await?;
        let installment_amount = quote.installment_amount;
        facet.program = Some(SelectedProgram {
            program_id: program.program_id.clone(),
            name: program.name.clone(),
            installment_amount,
            total_payable: quote.total_payable,
            effective_rate: quote.effective_rate,
        });

        if let Some(rejection) = rules::check_installment_capacity(
            installment_amount,
            applicant.submission.monthly_income,
            &self.policy,
        ) {
            return Ok(rejection);
        }
        Ok(DecisionRecord::from_code(ReasonCode::FinancingApproved))
    }
}
