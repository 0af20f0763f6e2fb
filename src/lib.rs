pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::database::Store;
use crate::middleware::auth::{resolve_identity, TokenVerifier};
use crate::services::{
    account_service::AccountService,
    evaluation_service::{EvaluationService, ScoreBounds},
    internship_service::InternshipService,
    notifier::Notifier,
    profile_service::ProfileService,
    workflow_service::WorkflowService,
};

#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenVerifier,
    pub notifier: Notifier,
    pub workflow_service: WorkflowService,
    pub internship_service: InternshipService,
    pub account_service: AccountService,
    pub profile_service: ProfileService,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let notifier = Notifier::new(config.notifier_capacity);
        let bounds = ScoreBounds {
            min: config.evaluation_min_score,
            max: config.evaluation_max_score,
        };
        let evaluation_service = EvaluationService::new(store.clone(), bounds);

        Self {
            tokens: TokenVerifier::new(&config.jwt_secret),
            workflow_service: WorkflowService::new(store.clone(), evaluation_service),
            internship_service: InternshipService::new(store.clone()),
            account_service: AccountService::new(store.clone(), notifier.clone()),
            profile_service: ProfileService::new(store),
            notifier,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::applications::submit_application,
        routes::applications::list_applications,
        routes::applications::application_stats,
        routes::applications::get_application,
        routes::applications::company_review,
        routes::applications::faculty_approve,
        routes::applications::admin_approve,
        routes::applications::record_evaluation,
        routes::applications::get_evaluation,
        routes::internships::list_internships,
        routes::internships::create_internship,
        routes::internships::get_internship,
        routes::internships::update_internship,
        routes::internships::delete_internship,
        routes::internships::list_internship_applications,
        routes::profiles::get_own_student_profile,
        routes::profiles::create_student_profile,
        routes::profiles::update_student_profile,
        routes::profiles::get_own_company_profile,
        routes::profiles::create_company_profile,
        routes::profiles::update_company_profile,
        routes::admin::list_accounts,
        routes::admin::list_active_accounts,
        routes::admin::set_account_active,
        routes::admin::update_account_role,
        routes::admin::delete_application,
        routes::admin::dashboard,
        routes::admin::active_users_stream,
    ),
    components(schemas(
        models::account::Role,
        models::account::Account,
        models::student::StudentProfile,
        models::company::CompanyProfile,
        models::application::ApplicationStatus,
        models::application::ReviewStatus,
        models::internship::InternshipStatus,
        dto::application_dto::SubmitApplicationPayload,
        dto::application_dto::CompanyReviewPayload,
        dto::application_dto::ApprovalPayload,
        dto::application_dto::EvaluationPayload,
        dto::application_dto::ApplicationResponse,
        dto::application_dto::ApplicationListResponse,
        dto::application_dto::ApplicationCounts,
        dto::application_dto::EvaluationResponse,
        dto::internship_dto::CreateInternshipPayload,
        dto::internship_dto::UpdateInternshipPayload,
        dto::internship_dto::InternshipResponse,
        dto::internship_dto::InternshipListResponse,
        dto::profile_dto::CreateStudentProfilePayload,
        dto::profile_dto::UpdateStudentProfilePayload,
        dto::profile_dto::CreateCompanyProfilePayload,
        dto::profile_dto::UpdateCompanyProfilePayload,
        dto::admin_dto::SetActivePayload,
        dto::admin_dto::UpdateRolePayload,
        dto::admin_dto::AccountListResponse,
        dto::admin_dto::DashboardStats,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Every route, with bearer tokens resolved into an `Identity` before handlers run.
pub fn app_router(state: AppState) -> Router {
    let applications = Router::new()
        .route(
            "/api/applications",
            get(routes::applications::list_applications)
                .post(routes::applications::submit_application),
        )
        .route(
            "/api/applications/stats",
            get(routes::applications::application_stats),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application),
        )
        .route(
            "/api/applications/:id/review",
            post(routes::applications::company_review),
        )
        .route(
            "/api/applications/:id/faculty-approve",
            post(routes::applications::faculty_approve),
        )
        .route(
            "/api/applications/:id/admin-approve",
            post(routes::applications::admin_approve),
        )
        .route(
            "/api/applications/:id/evaluation",
            get(routes::applications::get_evaluation)
                .post(routes::applications::record_evaluation),
        );

    let internships = Router::new()
        .route(
            "/api/internships",
            get(routes::internships::list_internships)
                .post(routes::internships::create_internship),
        )
        .route(
            "/api/internships/:id",
            get(routes::internships::get_internship)
                .patch(routes::internships::update_internship)
                .delete(routes::internships::delete_internship),
        )
        .route(
            "/api/internships/:id/applications",
            get(routes::internships::list_internship_applications),
        );

    let profiles = Router::new()
        .route(
            "/api/students/me",
            get(routes::profiles::get_own_student_profile)
                .post(routes::profiles::create_student_profile),
        )
        .route(
            "/api/students/:id",
            patch(routes::profiles::update_student_profile),
        )
        .route(
            "/api/companies/me",
            get(routes::profiles::get_own_company_profile)
                .post(routes::profiles::create_company_profile)
                .patch(routes::profiles::update_company_profile),
        );

    let admin = Router::new()
        .route("/api/admin/accounts", get(routes::admin::list_accounts))
        .route(
            "/api/admin/active-users",
            get(routes::admin::list_active_accounts),
        )
        .route(
            "/api/admin/accounts/:id/active",
            post(routes::admin::set_account_active),
        )
        .route(
            "/api/admin/accounts/:id/role",
            post(routes::admin::update_account_role),
        )
        .route(
            "/api/admin/applications/:id",
            axum::routing::delete(routes::admin::delete_application),
        )
        .route("/api/admin/dashboard", get(routes::admin::dashboard))
        .route(
            "/api/admin/active-users/stream",
            get(routes::admin::active_users_stream),
        );

    let authenticated = applications
        .merge(internships)
        .merge(profiles)
        .merge(admin)
        .layer(axum::middleware::from_fn_with_state(
            state.tokens.clone(),
            resolve_identity,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .merge(authenticated)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
