use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::application_dto::ApplicationListResponse,
    dto::internship_dto::{
        CreateInternshipPayload, InternshipListResponse, InternshipResponse,
        UpdateInternshipPayload,
    },
    error::Result,
    routes::{identity, Caller},
    utils::time::today,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/internships",
    responses(
        (status = 200, description = "Internships visible to the caller", body = InternshipListResponse),
        (status = 401, description = "Missing credentials")
    )
)]
#[axum::debug_handler]
pub async fn list_internships(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<InternshipListResponse>> {
    let internships = state.internship_service.list(identity(&caller)).await?;
    Ok(Json(InternshipListResponse::from_internships(
        internships,
        today(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/internships",
    request_body = CreateInternshipPayload,
    responses(
        (status = 201, description = "Internship created", body = InternshipResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not a company")
    )
)]
#[axum::debug_handler]
pub async fn create_internship(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateInternshipPayload>,
) -> Result<impl IntoResponse> {
    let internship = state
        .internship_service
        .create(identity(&caller), payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(InternshipResponse::from_internship(internship, today())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/internships/{id}",
    params(
        ("id" = i64, Path, description = "Internship ID")
    ),
    responses(
        (status = 200, description = "Internship", body = InternshipResponse),
        (status = 404, description = "Internship not found")
    )
)]
#[axum::debug_handler]
pub async fn get_internship(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<InternshipResponse>> {
    let internship = state.internship_service.get(identity(&caller), id).await?;
    Ok(Json(InternshipResponse::from_internship(internship, today())))
}

#[utoipa::path(
    patch,
    path = "/api/internships/{id}",
    params(
        ("id" = i64, Path, description = "Internship ID")
    ),
    request_body = UpdateInternshipPayload,
    responses(
        (status = 200, description = "Internship updated", body = InternshipResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Internship not found")
    )
)]
#[axum::debug_handler]
pub async fn update_internship(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateInternshipPayload>,
) -> Result<Json<InternshipResponse>> {
    let internship = state
        .internship_service
        .update(identity(&caller), id, payload)
        .await?;
    Ok(Json(InternshipResponse::from_internship(internship, today())))
}

#[utoipa::path(
    delete,
    path = "/api/internships/{id}",
    params(
        ("id" = i64, Path, description = "Internship ID")
    ),
    responses(
        (status = 204, description = "Internship deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Internship not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_internship(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state
        .internship_service
        .delete(identity(&caller), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/internships/{id}/applications",
    params(
        ("id" = i64, Path, description = "Internship ID")
    ),
    responses(
        (status = 200, description = "Applications to the internship", body = ApplicationListResponse),
        (status = 403, description = "Not the owning company"),
        (status = 404, description = "Internship not found")
    )
)]
#[axum::debug_handler]
pub async fn list_internship_applications(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationListResponse>> {
    let applications = state
        .workflow_service
        .list_for_internship(identity(&caller), id)
        .await?;
    Ok(Json(ApplicationListResponse::from(applications)))
}
