//! HTTP use-case API for person records.
//!
//! # Responsibility
//! - Expose the record service as JSON routes under `/api/users`.
//! - Decode wire shapes and hand them to `PersonService` unchanged.
//!
//! # Invariants
//! - Handlers hold no state besides the shared service handle.
//! - Every failure is rendered through `ApiError`.
//!
//! # See also
//! - `crate::error` for the status table.

use crate::error::ApiResult;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use roster_core::{wire_date, Person, PersonDraft, PersonPatch, PersonService, PersonStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Service type shared by all handlers.
pub type SharedService = PersonService<Arc<dyn PersonStore>>;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SharedService>,
}

impl AppState {
    pub fn new(service: SharedService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Inclusive birth-date window from the search query string.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthDateRange {
    #[serde(with = "wire_date")]
    pub from_date: NaiveDate,
    #[serde(with = "wire_date")]
    pub to_date: NaiveDate,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/users", post(create_user))
        .route("/api/users/search", get(search_users))
        .route(
            "/api/users/{email}",
            get(get_user)
                .put(replace_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Creates one record.
///
/// # HTTP contract
/// - `201` with the stored record.
/// - `400` on invalid content, underage person or taken email.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<PersonDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let Json(draft) = payload?;
    let person = state.service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<Json<Person>> {
    Ok(Json(state.service.find(&email).await?))
}

/// Replaces the record under `{email}`; a different body email moves it.
///
/// # HTTP contract
/// - `200` with the stored record.
/// - `404` when `{email}` is unknown.
/// - `400` when the new email belongs to another record.
pub async fn replace_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    payload: Result<Json<PersonDraft>, JsonRejection>,
) -> ApiResult<Json<Person>> {
    let Json(draft) = payload?;
    Ok(Json(state.service.replace(&email, draft).await?))
}

/// Applies a sparse update. Missing fields are kept; `null` clears an
/// optional field.
pub async fn update_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    payload: Result<Json<PersonPatch>, JsonRejection>,
) -> ApiResult<Json<Person>> {
    let Json(patch) = payload?;
    Ok(Json(state.service.update(&email, patch).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> ApiResult<StatusCode> {
    state.service.delete(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists records born within `[fromDate, toDate]`.
///
/// # HTTP contract
/// - Both bounds are required and use `dd-MM-yyyy`.
/// - `400` when `toDate` precedes `fromDate` or is not in the past.
pub async fn search_users(
    State(state): State<AppState>,
    query: Result<Query<BirthDateRange>, QueryRejection>,
) -> ApiResult<Json<Vec<Person>>> {
    let Query(range) = query?;
    let found = state
        .service
        .search_by_birth_date(range.from_date, range.to_date)
        .await?;
    Ok(Json(found))
}
