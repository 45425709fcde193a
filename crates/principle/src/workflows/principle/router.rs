use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicantSubmission, AssetSubmission, EmergencyContactSubmission, FinancingSubmission,
    ProspectId,
};
use super::repository::{EventPublisher, PrincipleRepository, RepositoryError};
use super::service::{PrincipleError, PrincipleService};

type SharedService<R, E> = Arc<PrincipleService<R, E>>;

/// Router builder exposing the four stage endpoints plus cancel and read access.
pub fn principle_router<R, E>(service: SharedService<R, E>) -> Router
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    Router::new()
        .route("/api/v1/principle/asset", post(asset_handler::<R, E>))
        .route("/api/v1/principle/applicant", post(applicant_handler::<R, E>))
        .route("/api/v1/principle/financing", post(financing_handler::<R, E>))
        .route(
            "/api/v1/principle/emergency-contact",
            post(emergency_contact_handler::<R, E>),
        )
        .route(
            "/api/v1/principle/:prospect_id",
            get(snapshot_handler::<R, E>),
        )
        .route(
            "/api/v1/principle/:prospect_id/status",
            get(status_handler::<R, E>),
        )
        .route(
            "/api/v1/principle/:prospect_id/core-customer",
            post(core_customer_handler::<R, E>),
        )
        .route(
            "/api/v1/principle/:prospect_id/cancel",
            post(cancel_handler::<R, E>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CancelRequest {
    #[serde(default)]
    reason: String,
}

fn respond<T: serde::Serialize>(result: Result<T, PrincipleError>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, axum::Json(body)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: PrincipleError) -> Response {
    let status = match &err {
        PrincipleError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PrincipleError::NotFound(_) | PrincipleError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        PrincipleError::Closed { .. }
        | PrincipleError::StageOutOfOrder { .. }
        | PrincipleError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PrincipleError::Upstream(_) => StatusCode::BAD_GATEWAY,
        PrincipleError::MissingFacet { .. }
        | PrincipleError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        error!(error = %err, "principle request failed");
    }

    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn asset_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    axum::Json(submission): axum::Json<AssetSubmission>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    respond(service.verify_asset(submission).await)
}

pub(crate) async fn applicant_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    axum::Json(submission): axum::Json<ApplicantSubmission>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    respond(service.verify_applicant(submission).await)
}

pub(crate) async fn financing_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    axum::Json(submission): axum::Json<FinancingSubmission>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    respond(service.verify_financing(submission).await)
}

pub(crate) async fn emergency_contact_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    axum::Json(submission): axum::Json<EmergencyContactSubmission>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    respond(service.submit_emergency_contact(submission).await)
}

pub(crate) async fn core_customer_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    Path(prospect_id): Path<String>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    let id = ProspectId(prospect_id);
    respond(service.sync_core_customer(&id).await)
}

pub(crate) async fn cancel_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    Path(prospect_id): Path<String>,
    axum::Json(request): axum::Json<CancelRequest>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    let id = ProspectId(prospect_id);
    respond(service.cancel(&id, &request.reason).await)
}

pub(crate) async fn snapshot_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    Path(prospect_id): Path<String>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    let id = ProspectId(prospect_id);
    respond(service.get(&id).await)
}

pub(crate) async fn status_handler<R, E>(
    State(service): State<SharedService<R, E>>,
    Path(prospect_id): Path<String>,
) -> Response
where
    R: PrincipleRepository + 'static,
    E: EventPublisher + 'static,
{
    let id = ProspectId(prospect_id);
    respond(service.status(&id).await)
}
