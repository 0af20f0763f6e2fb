use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationCounts, ApplicationListResponse, ApplicationResponse, ApprovalPayload,
        CompanyReviewPayload, EvaluationPayload, EvaluationResponse, SubmitApplicationPayload,
    },
    error::Result,
    routes::{identity, Caller},
    services::workflow_service::WorkflowResult,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing credentials"),
        (status = 403, description = "Not a student or not the caller's profile"),
        (status = 404, description = "Student or internship not found"),
        (status = 409, description = "Duplicate application, closed internship or no seats left")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse> {
    let application = state
        .workflow_service
        .submit(identity(&caller), payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse::from(application)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications",
    responses(
        (status = 200, description = "Applications visible to the caller", body = ApplicationListResponse),
        (status = 401, description = "Missing credentials")
    )
)]
#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApplicationListResponse>> {
    let applications = state
        .workflow_service
        .list_applications(identity(&caller))
        .await?;
    Ok(Json(ApplicationListResponse::from(applications)))
}

#[utoipa::path(
    get,
    path = "/api/applications/stats",
    responses(
        (status = 200, description = "Total and pending applications visible to the caller", body = ApplicationCounts),
        (status = 401, description = "Missing credentials")
    )
)]
#[axum::debug_handler]
pub async fn application_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApplicationCounts>> {
    let counts = state
        .workflow_service
        .application_counts(identity(&caller))
        .await?;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Application with its evaluation", body = ApplicationResponse),
        (status = 401, description = "Missing credentials"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationResponse>> {
    let aggregate = state
        .workflow_service
        .get_application(identity(&caller), id)
        .await?;
    Ok(Json(
        ApplicationResponse::from(aggregate.application).with_evaluation(aggregate.evaluation),
    ))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/review",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = CompanyReviewPayload,
    responses(
        (status = 200, description = "Application reviewed", body = ApplicationResponse),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application is not awaiting company review")
    )
)]
#[axum::debug_handler]
pub async fn company_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<CompanyReviewPayload>,
) -> WorkflowResult<Json<ApplicationResponse>> {
    payload.validate().map_err(crate::error::Error::from)?;
    let application = state
        .workflow_service
        .company_review(identity(&caller), id, payload.accept, payload.comment)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/faculty-approve",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = ApprovalPayload,
    responses(
        (status = 200, description = "Faculty decision recorded", body = ApplicationResponse),
        (status = 403, description = "Not faculty or admin"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application is not awaiting faculty approval")
    )
)]
#[axum::debug_handler]
pub async fn faculty_approve(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<ApprovalPayload>,
) -> WorkflowResult<Json<ApplicationResponse>> {
    let application = state
        .workflow_service
        .faculty_approve(identity(&caller), id, payload.approve)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/admin-approve",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = ApprovalPayload,
    responses(
        (status = 200, description = "Admin decision recorded", body = ApplicationResponse),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application is not awaiting admin approval or no seats left")
    )
)]
#[axum::debug_handler]
pub async fn admin_approve(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<ApprovalPayload>,
) -> WorkflowResult<Json<ApplicationResponse>> {
    let application = state
        .workflow_service
        .admin_approve(identity(&caller), id, payload.approve)
        .await?;
    Ok(Json(ApplicationResponse::from(application)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    request_body = EvaluationPayload,
    responses(
        (status = 200, description = "Evaluation recorded", body = EvaluationResponse),
        (status = 400, description = "Score out of range"),
        (status = 403, description = "Not the owning company or an admin"),
        (status = 404, description = "Application not found"),
        (status = 409, description = "Application has not been reviewed yet")
    )
)]
#[axum::debug_handler]
pub async fn record_evaluation(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<EvaluationPayload>,
) -> WorkflowResult<Json<EvaluationResponse>> {
    payload.validate().map_err(crate::error::Error::from)?;
    let evaluation = state
        .workflow_service
        .evaluate(identity(&caller), id, payload.score, payload.comments)
        .await?;
    Ok(Json(EvaluationResponse::from(evaluation)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/evaluation",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 200, description = "Evaluation for the application", body = EvaluationResponse),
        (status = 404, description = "Application or evaluation not found")
    )
)]
#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<EvaluationResponse>> {
    let evaluation = state
        .workflow_service
        .get_evaluation(identity(&caller), id)
        .await?;
    Ok(Json(EvaluationResponse::from(evaluation)))
}
