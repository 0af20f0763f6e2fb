use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::{Stream, StreamExt};

use crate::{
    dto::admin_dto::{AccountListResponse, DashboardStats, SetActivePayload, UpdateRolePayload},
    error::Result,
    models::account::Account,
    routes::{identity, Caller},
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/admin/accounts",
    responses(
        (status = 200, description = "All accounts", body = AccountListResponse),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_accounts(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<AccountListResponse>> {
    let accounts = state
        .account_service
        .list_accounts(identity(&caller))
        .await?;
    Ok(Json(AccountListResponse::from(accounts)))
}

#[utoipa::path(
    get,
    path = "/api/admin/active-users",
    responses(
        (status = 200, description = "Accounts currently active", body = AccountListResponse),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn list_active_accounts(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<AccountListResponse>> {
    let accounts = state
        .account_service
        .list_active_accounts(identity(&caller))
        .await?;
    Ok(Json(AccountListResponse::from(accounts)))
}

#[utoipa::path(
    post,
    path = "/api/admin/accounts/{id}/active",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    request_body = SetActivePayload,
    responses(
        (status = 200, description = "Active flag updated", body = Account),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Account not found")
    )
)]
#[axum::debug_handler]
pub async fn set_account_active(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<SetActivePayload>,
) -> Result<Json<Account>> {
    let account = state
        .account_service
        .set_active(identity(&caller), id, payload.active)
        .await?;
    Ok(Json(account))
}

#[utoipa::path(
    post,
    path = "/api/admin/accounts/{id}/role",
    params(
        ("id" = i64, Path, description = "Account ID")
    ),
    request_body = UpdateRolePayload,
    responses(
        (status = 200, description = "Role updated", body = Account),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Account not found")
    )
)]
#[axum::debug_handler]
pub async fn update_account_role(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRolePayload>,
) -> Result<Json<Account>> {
    let account = state
        .account_service
        .update_role(identity(&caller), id, payload.role)
        .await?;
    Ok(Json(account))
}

#[utoipa::path(
    delete,
    path = "/api/admin/applications/{id}",
    params(
        ("id" = i64, Path, description = "Application ID")
    ),
    responses(
        (status = 204, description = "Application deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Application not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state
        .account_service
        .delete_application(identity(&caller), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Aggregate counts", body = DashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
#[axum::debug_handler]
pub async fn dashboard(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<DashboardStats>> {
    let stats = state
        .account_service
        .dashboard_stats(identity(&caller))
        .await?;
    Ok(Json(stats))
}

/// Server-sent `active-users` events, one per active-flag change.
#[utoipa::path(
    get,
    path = "/api/admin/active-users/stream",
    responses(
        (status = 200, description = "Event stream of account activity changes"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn active_users_stream(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let subscription = state.account_service.subscribe(identity(&caller))?;

    let stream = subscription.into_stream().filter_map(|change| async move {
        match Event::default().event("active-users").json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode active-users event");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
