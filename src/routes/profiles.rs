use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

use crate::{
    dto::profile_dto::{
        CreateCompanyProfilePayload, CreateStudentProfilePayload, UpdateCompanyProfilePayload,
        UpdateStudentProfilePayload,
    },
    error::Result,
    models::{company::CompanyProfile, student::StudentProfile},
    routes::{identity, Caller},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/students/me",
    responses(
        (status = 200, description = "The caller's student profile", body = StudentProfile),
        (status = 403, description = "Not a student"),
        (status = 404, description = "No profile yet")
    )
)]
#[axum::debug_handler]
pub async fn get_own_student_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<StudentProfile>> {
    let profile = state
        .profile_service
        .own_student_profile(identity(&caller))
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/students/me",
    request_body = CreateStudentProfilePayload,
    responses(
        (status = 201, description = "Student profile created", body = StudentProfile),
        (status = 400, description = "Invalid payload or profile already exists"),
        (status = 403, description = "Not a student")
    )
)]
#[axum::debug_handler]
pub async fn create_student_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateStudentProfilePayload>,
) -> Result<impl IntoResponse> {
    let profile = state
        .profile_service
        .create_student_profile(identity(&caller), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    patch,
    path = "/api/students/{id}",
    params(
        ("id" = i64, Path, description = "Student profile ID")
    ),
    request_body = UpdateStudentProfilePayload,
    responses(
        (status = 200, description = "Student profile updated", body = StudentProfile),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Student not found")
    )
)]
#[axum::debug_handler]
pub async fn update_student_profile(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStudentProfilePayload>,
) -> Result<Json<StudentProfile>> {
    let profile = state
        .profile_service
        .update_student_profile(identity(&caller), id, payload)
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/companies/me",
    responses(
        (status = 200, description = "The caller's company profile", body = CompanyProfile),
        (status = 403, description = "Not a company"),
        (status = 404, description = "No profile yet")
    )
)]
#[axum::debug_handler]
pub async fn get_own_company_profile(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<CompanyProfile>> {
    let profile = state
        .profile_service
        .own_company_profile(identity(&caller))
        .await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/companies/me",
    request_body = CreateCompanyProfilePayload,
    responses(
        (status = 201, description = "Company profile created", body = CompanyProfile),
        (status = 400, description = "Invalid payload or profile already exists"),
        (status = 403, description = "Not a company")
    )
)]
#[axum::debug_handler]
pub async fn create_company_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CreateCompanyProfilePayload>,
) -> Result<impl IntoResponse> {
    let profile = state
        .profile_service
        .create_company_profile(identity(&caller), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[utoipa::path(
    patch,
    path = "/api/companies/me",
    request_body = UpdateCompanyProfilePayload,
    responses(
        (status = 200, description = "Company profile updated", body = CompanyProfile),
        (status = 403, description = "Not a company"),
        (status = 404, description = "No profile yet")
    )
)]
#[axum::debug_handler]
pub async fn update_company_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<UpdateCompanyProfilePayload>,
) -> Result<Json<CompanyProfile>> {
    let profile = state
        .profile_service
        .update_company_profile(identity(&caller), payload)
        .await?;
    Ok(Json(profile))
}
