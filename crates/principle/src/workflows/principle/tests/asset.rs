use super::common::*;
use crate::upstream::VehicleCheck;
use crate::workflows::principle::decision::{Decision, ReasonCode};
use crate::workflows::principle::domain::{AssetSubmission, Channel, PrincipleStep};
use crate::workflows::principle::service::PrincipleError;
use crate::workflows::principle::validation::ValidationError;

#[tokio::test]
async fn passing_asset_opens_record_and_publishes() {
    let h = harness();

    let outcome = h
        .service
        .verify_asset(asset_submission("P-100"))
        .await
        .expect("asset stage");

    assert_eq!(outcome.status.decision, Decision::Pass);
    assert_eq!(outcome.status.code, "1000");
    assert_eq!(outcome.status.status, "Asset Verified");
    assert_eq!(outcome.status.step_number, 1);

    let record = h.repository.record("P-100").expect("record stored");
    assert_eq!(record.step, PrincipleStep::VerifyAsset);
    let facet = h.repository.asset("P-100").expect("facet stored");
    assert_eq!(facet.brand.as_deref(), Some("HONDA"));

    let events = h.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].topic, "principle.kmb.updated");
    assert_eq!(events[0].code, "1000");

    let calls = h.upstream.calls();
    assert!(calls.contains(&"branch:BR-0426".to_string()));
    assert!(calls.contains(&"asset:HND-VARIO-160".to_string()));
    assert!(calls.contains(&"vehicle:MH1KF4118PK012345".to_string()));
}

#[tokio::test]
async fn kpm_channel_publishes_on_its_own_topic() {
    let h = harness();
    let submission = asset_submission("P-101");
    let submission = AssetSubmission {
        channel: Channel::Kpm,
        ..submission
    };

    h.service.verify_asset(submission).await.expect("asset stage");

    assert_eq!(h.events.events()[0].topic, "principle.kpm.updated");
}

#[tokio::test]
async fn inactive_or_unknown_branch_rejects() {
    let h = harness();
    h.upstream.update(|script| {
        if let Some(branch) = script.branch.as_mut() {
            branch.active = false;
        }
    });
    let outcome = h
        .service
        .verify_asset(asset_submission("P-102"))
        .await
        .expect("asset stage");
    assert_eq!(outcome.status.code, ReasonCode::BranchInactive.code());
    assert_eq!(outcome.status.status, "Rejected: Asset");

    h.upstream.update(|script| script.branch = None);
    let outcome = h
        .service
        .verify_asset(asset_submission("P-103"))
        .await
        .expect("asset stage");
    assert_eq!(outcome.status.code, "1101");
}

#[tokio::test]
async fn asset_rules_reject_in_table_order() {
    let h = harness();
    h.upstream.update(|script| script.asset = None);
    let outcome = h
        .service
        .verify_asset(asset_submission("P-104"))
        .await
        .expect("asset stage");
    assert_eq!(outcome.status.code, "1102");
    assert_eq!(h.repository.asset("P-104").and_then(|f| f.brand), None);

    let h = harness();
    let old = AssetSubmission {
        manufacture_year: 2010,
        ..asset_submission("P-105")
    };
    h.upstream.update(|script| {
        script.vehicle = VehicleCheck {
            blacklisted: true,
            active_contract: false,
            note: None,
        }
    });
    let outcome = h.service.verify_asset(old).await.expect("asset stage");
    assert_eq!(outcome.status.code, "1103");

    let outcome = h
        .service
        .verify_asset(asset_submission("P-106"))
        .await
        .expect("asset stage");
    assert_eq!(outcome.status.code, "1104");

    h.upstream.update(|script| {
        script.vehicle = VehicleCheck {
            blacklisted: false,
            active_contract: true,
            note: Some("contract 0042/2023".to_string()),
        }
    });
    let outcome = h
        .service
        .verify_asset(asset_submission("P-107"))
        .await
        .expect("asset stage");
    assert_eq!(outcome.status.code, "1105");
    assert!(outcome.status.reason.ends_with("contract 0042/2023"));
}

#[tokio::test]
async fn invalid_manufacture_year_never_reaches_upstreams() {
    let h = harness();
    let submission = AssetSubmission {
        manufacture_year: 2026,
        ..asset_submission("P-108")
    };

    let err = h
        .service
        .verify_asset(submission)
        .await
        .expect_err("future year is invalid");

    assert!(matches!(
        err,
        PrincipleError::Validation(ValidationError::ManufactureYear { year: 2026, .. })
    ));
    assert!(h.upstream.calls().is_empty());
    assert!(h.repository.record("P-108").is_none());
}

#[tokio::test]
async fn resubmitting_asset_overwrites_until_applicant_runs() {
    let h = harness();
    h.service
        .verify_asset(asset_submission("P-109"))
        .await
        .expect("first submission");
    let updated = AssetSubmission {
        license_plate: "B 9876 ZZ".to_string(),
        ..asset_submission("P-109")
    };
    h.service
        .verify_asset(updated)
        .await
        .expect("resubmission at the same step");
    assert_eq!(
        h.repository.asset("P-109").map(|f| f.submission.license_plate),
        Some("B 9876 ZZ".to_string())
    );
    assert_eq!(h.events.events().len(), 2);

    h.service
        .verify_applicant(applicant_submission("P-109"))
        .await
        .expect("applicant stage");
    let err = h
        .service
        .verify_asset(asset_submission("P-109"))
        .await
        .expect_err("asset is behind the record");
    assert!(matches!(
        err,
        PrincipleError::StageOutOfOrder {
            expected: PrincipleStep::VerifyAsset,
            found: PrincipleStep::VerifyApplicant,
            ..
        }
    ));
}

#[tokio::test]
async fn rejected_record_is_closed() {
    let h = harness();
    h.upstream.update(|script| script.asset = None);
    h.service
        .verify_asset(asset_submission("P-110"))
        .await
        .expect("asset stage");

    h.upstream.update(|script| *script = Script::default());
    let err = h
        .service
        .verify_asset(asset_submission("P-110"))
        .await
        .expect_err("closed");
    assert!(matches!(err, PrincipleError::Closed { decision: "REJECT", .. }));
}

#[tokio::test]
async fn upstream_outage_leaves_no_record() {
    let h = harness();
    h.upstream.update(|script| script.outage = Some("branch-service"));

    let err = h
        .service
        .verify_asset(asset_submission("P-111"))
        .await
        .expect_err("outage");

    assert!(matches!(err, PrincipleError::Upstream(_)));
    assert!(h.repository.record("P-111").is_none());
    assert!(h.events.events().is_empty());
}

#[tokio::test]
async fn event_failure_does_not_fail_the_stage() {
    let h = harness_with_events(MemoryEvents::failing());

    let outcome = h
        .service
        .verify_asset(asset_submission("P-112"))
        .await
        .expect("stage succeeds without the bus");

    assert_eq!(outcome.status.code, "1000");
    assert!(h.repository.record("P-112").is_some());
    assert!(h.events.events().is_empty());
}
