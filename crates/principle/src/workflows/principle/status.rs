use serde::Serialize;

use super::decision::Decision;
use super::domain::{PrincipleRecord, PrincipleStep, ProspectId};

const COLOR_IN_PROGRESS: &str = "#2196F3";
const COLOR_APPROVED: &str = "#4CAF50";
const COLOR_REJECTED: &str = "#F44336";
const COLOR_CANCELLED: &str = "#9E9E9E";

/// Display label and color for a decision/step tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color: &'static str,
}

pub const fn derive_status(decision: Decision, step: PrincipleStep) -> StatusDisplay {
    let (label, color) = match (decision, step) {
        (Decision::Pass, PrincipleStep::VerifyAsset) => ("Asset Verified", COLOR_IN_PROGRESS),
        (Decision::Pass, PrincipleStep::VerifyApplicant) => {
            ("Applicant Verified", COLOR_IN_PROGRESS)
        }
        (Decision::Pass, PrincipleStep::VerifyFinancing) => {
            ("Financing Approved", COLOR_IN_PROGRESS)
        }
        (Decision::Pass, PrincipleStep::EmergencyContact) => ("Principle Approved", COLOR_APPROVED),
        (Decision::Reject, PrincipleStep::VerifyAsset) => ("Rejected: Asset", COLOR_REJECTED),
        (Decision::Reject, PrincipleStep::VerifyApplicant) => {
            ("Rejected: Applicant", COLOR_REJECTED)
        }
        (Decision::Reject, PrincipleStep::VerifyFinancing) => {
            ("Rejected: Financing", COLOR_REJECTED)
        }
        (Decision::Reject, PrincipleStep::EmergencyContact) => {
            ("Rejected: Emergency Contact", COLOR_REJECTED)
        }
        (Decision::Cancel, _) => ("Cancelled", COLOR_CANCELLED),
    };
    StatusDisplay { label, color }
}

/// Every (decision, step) pair with its display, in table order.
pub fn status_table() -> Vec<(Decision, PrincipleStep, StatusDisplay)> {
    [Decision::Pass, Decision::Reject, Decision::Cancel]
        .into_iter()
        .flat_map(|decision| {
            PrincipleStep::ALL
                .into_iter()
                .map(move |step| (decision, step, derive_status(decision, step)))
        })
        .collect()
}

/// Public status payload for a prospect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub prospect_id: ProspectId,
    pub step: PrincipleStep,
    pub step_number: u8,
    pub decision: Decision,
    pub code: &'static str,
    pub reason: String,
    pub status: &'static str,
    pub color: &'static str,
}

impl PrincipleRecord {
    pub fn status_view(&self) -> StatusView {
        let display = derive_status(self.decision.decision, self.step);
        StatusView {
            prospect_id: self.prospect_id.clone(),
            step: self.step,
            step_number: self.step.number(),
            decision: self.decision.decision,
            code: self.decision.code.code(),
            reason: self.decision.reason.clone(),
            status: display.label,
            color: display.color,
        }
    }
}
