//! API routes and handlers for the alarm clock service

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use chrono::Local;
use common::{ErrorResponse, MessageResponse};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};
use wakeup_alarms::history;
use wakeup_alarms::{Alarm, AlarmHistory, AlarmPatch, HistoryStatus, NewAlarm, PollerStatus};

use crate::app::AppState;
use crate::error::{ClockSrvError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};

pub const DEFAULT_LIST_LIMIT: i64 = 100;
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Create all API routes with state
pub fn create_routes(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/v1/alarms", get(list_alarms).post(create_alarm))
        .route("/api/v1/alarms/", get(list_alarms).post(create_alarm))
        .route(
            "/api/v1/alarms/{id}",
            get(get_alarm).put(update_alarm).delete(delete_alarm),
        )
        .route("/api/v1/alarms/{id}/history", get(list_alarm_history))
        .route("/api/v1/history/{history_id}", put(respond_to_history))
        .route("/api/v1/poller/status", get(poller_status));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route("/api-docs/openapi.json", get(openapi_json));

    router
        .layer(axum::middleware::from_fn(common::logging::http_request_logger))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_alarms,
        create_alarm,
        get_alarm,
        update_alarm,
        delete_alarm,
        list_alarm_history,
        respond_to_history,
        poller_status
    ),
    components(schemas(
        Alarm,
        NewAlarm,
        AlarmPatch,
        AlarmHistory,
        HistoryStatus,
        RespondRequest,
        PollerStatus,
        MessageResponse,
        ErrorResponse
    )),
    tags(
        (name = "clocksrv", description = "Alarm management and trigger history")
    )
)]
pub struct ApiDoc;

// ============================================================================
// Request types
// ============================================================================

/// Pagination for the alarm list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Rows to skip (alias: `offset`)
    #[serde(alias = "offset")]
    pub skip: Option<i64>,
    /// Maximum rows, 1..=1000
    pub limit: Option<i64>,
}

impl ListQuery {
    fn offset(&self) -> Result<i64> {
        match self.skip {
            Some(skip) if skip < 0 => Err(ClockSrvError::BadRequest(
                "skip must not be negative".to_string(),
            )),
            Some(skip) => Ok(skip),
            None => Ok(0),
        }
    }

    fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

/// Response to a trigger
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondRequest {
    /// `snoozed` or `dismissed`
    pub status: HistoryStatus,
}

// ============================================================================
// Handlers
// ============================================================================

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the alarm clock API"))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.service.name,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(not(feature = "swagger-ui"))]
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// List alarms
#[utoipa::path(
    get,
    path = "/api/v1/alarms",
    params(ListQuery),
    responses(
        (status = 200, description = "Alarms ordered by id", body = [Alarm])
    ),
    tag = "clocksrv"
)]
pub async fn list_alarms(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Alarm>>> {
    let alarms = wakeup_alarms::list_alarms(&state.pool, query.offset()?, query.limit()).await?;
    Ok(Json(alarms))
}

/// Create an alarm
#[utoipa::path(
    post,
    path = "/api/v1/alarms",
    request_body = NewAlarm,
    responses(
        (status = 201, description = "Alarm created", body = Alarm),
        (status = 400, description = "Invalid alarm", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn create_alarm(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewAlarm>,
) -> Result<(StatusCode, Json<Alarm>)> {
    let alarm = wakeup_alarms::create_alarm(&state.pool, &new).await?;
    info!(
        "Created alarm {} at {} for user {}",
        alarm.id,
        alarm.time.format("%H:%M"),
        alarm.user_id
    );
    Ok((StatusCode::CREATED, Json(alarm)))
}

/// Get alarm by ID
#[utoipa::path(
    get,
    path = "/api/v1/alarms/{id}",
    params(("id" = i64, Path, description = "Alarm identifier")),
    responses(
        (status = 200, description = "Alarm details", body = Alarm),
        (status = 404, description = "Alarm not found", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn get_alarm(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Alarm>> {
    Ok(Json(wakeup_alarms::get_alarm(&state.pool, id).await?))
}

/// Update the fields present in the body
#[utoipa::path(
    put,
    path = "/api/v1/alarms/{id}",
    params(("id" = i64, Path, description = "Alarm identifier")),
    request_body = AlarmPatch,
    responses(
        (status = 200, description = "Alarm updated", body = Alarm),
        (status = 400, description = "Invalid update", body = ErrorResponse),
        (status = 404, description = "Alarm not found", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn update_alarm(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<AlarmPatch>,
) -> Result<Json<Alarm>> {
    let alarm = wakeup_alarms::update_alarm(&state.pool, id, patch).await?;
    debug!("Updated alarm {}", id);
    Ok(Json(alarm))
}

/// Delete an alarm and its history
#[utoipa::path(
    delete,
    path = "/api/v1/alarms/{id}",
    params(("id" = i64, Path, description = "Alarm identifier")),
    responses(
        (status = 200, description = "Alarm deleted", body = MessageResponse),
        (status = 404, description = "Alarm not found", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn delete_alarm(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>> {
    wakeup_alarms::delete_alarm(&state.pool, id).await?;
    info!("Deleted alarm {}", id);
    Ok(Json(MessageResponse::new("Alarm deleted")))
}

/// Trigger history of an alarm, newest first
#[utoipa::path(
    get,
    path = "/api/v1/alarms/{id}/history",
    params(("id" = i64, Path, description = "Alarm identifier")),
    responses(
        (status = 200, description = "Trigger history", body = [AlarmHistory]),
        (status = 404, description = "Alarm not found", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn list_alarm_history(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<AlarmHistory>>> {
    Ok(Json(history::list_history(&state.pool, id).await?))
}

/// Snooze or dismiss a trigger; stops that alarm's sound
#[utoipa::path(
    put,
    path = "/api/v1/history/{history_id}",
    params(("history_id" = i64, Path, description = "History entry identifier")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Response recorded", body = AlarmHistory),
        (status = 400, description = "Status is not a response", body = ErrorResponse),
        (status = 404, description = "History entry not found", body = ErrorResponse)
    ),
    tag = "clocksrv"
)]
pub async fn respond_to_history(
    State(state): State<Arc<AppState>>,
    ApiPath(history_id): ApiPath<i64>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<AlarmHistory>> {
    let entry = history::respond(
        &state.pool,
        history_id,
        request.status,
        Local::now().naive_local(),
    )
    .await?;

    if !state.platform.stop(entry.alarm_id).await {
        warn!(
            "Could not stop sound of alarm {} (history {})",
            entry.alarm_id, history_id
        );
    }
    info!(
        "Alarm {} {} (history {})",
        entry.alarm_id, entry.status, entry.id
    );
    Ok(Json(entry))
}

/// Poller statistics
#[utoipa::path(
    get,
    path = "/api/v1/poller/status",
    responses(
        (status = 200, description = "Poller status", body = PollerStatus)
    ),
    tag = "clocksrv"
)]
pub async fn poller_status(State(state): State<Arc<AppState>>) -> Json<PollerStatus> {
    Json(state.poller.status().await)
}
