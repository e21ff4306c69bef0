//! Route handlers for job administration and history.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use repocast_executor::EndpointRegistry;
use repocast_protocols::{
    EndpointConfig, HistoryPage, HistoryQuery, JobStatus, PageInfo, SortOrder,
};

use crate::error::ApiError;
use crate::state::ApiState;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

/// A job's stored setting merged with its live timer state.
#[derive(Debug, Serialize, Deserialize)]
pub struct CronView {
    pub name: String,
    pub schedule: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub running: bool,
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fire_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleBody {
    pub schedule: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub name: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort: Option<String>,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_crons(State(state): State<ApiState>) -> Result<Json<Vec<CronView>>, ApiError> {
    let settings = state.admin.settings().await?;
    let live = state.admin.states().await;

    let views = settings
        .into_iter()
        .map(|setting| {
            let current = live.iter().find(|s| s.name == setting.name);
            CronView {
                running: current.is_some_and(|s| s.running),
                next_run: current.and_then(|s| s.next_run),
                fire_count: current.map_or(0, |s| s.fire_count),
                name: setting.name,
                schedule: setting.schedule,
                is_active: setting.is_active,
                updated_at: setting.updated_at,
            }
        })
        .collect();

    Ok(Json(views))
}

pub async fn update_schedule(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<ScheduleBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;
    if body.schedule.trim().is_empty() {
        return Err(ApiError::BadRequest("Schedule must not be empty".to_string()));
    }

    state.admin.update_schedule(&name, &body.schedule).await?;
    Ok(success("Schedule updated successfully"))
}

pub async fn update_status(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Result<Json<StatusBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::BadRequest("Invalid request body".to_string()))?;

    state.admin.update_status(&name, body.is_active).await?;
    Ok(success("Status updated successfully"))
}

pub async fn history(
    State(state): State<ApiState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    // Pages past the end saturate to an empty window.
    let offset = (page - 1).saturating_mul(page_size);
    let query = history_query(&params)?.with_window(offset, page_size);
    debug!("History query: {:?}", query);

    let total = state.store.count_execution_history(&query).await?;
    let data = state.store.get_execution_history(&query).await?;

    Ok(Json(HistoryPage {
        data,
        pagination: PageInfo::new(total, page, page_size),
    }))
}

pub async fn list_endpoints(State(state): State<ApiState>) -> Json<Vec<EndpointConfig>> {
    let registry = state.executor.registry().await;
    Json(registry.all().cloned().collect())
}

/// Rebuild the endpoint table from storage and swap it into the executor.
pub async fn reload_endpoints(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let registry = EndpointRegistry::from_store(state.store.as_ref()).await?;
    let count = registry.len();
    state.executor.reload(registry).await;

    info!("Endpoint table reloaded from storage ({} endpoints)", count);
    Ok(Json(json!({
        "status": "success",
        "message": "Endpoints reloaded successfully",
        "count": count,
    })))
}

fn success(message: &str) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": message,
    }))
}

/// Build the filter part of a history query from request parameters.
pub(crate) fn history_query(params: &HistoryParams) -> Result<HistoryQuery, ApiError> {
    let mut query = HistoryQuery::new();

    if let Some(name) = params.name.as_deref().filter(|n| !n.is_empty()) {
        query = query.with_name(name);
    }
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.with_status(parse_status(status)?);
    }
    if let Some(sort) = params.sort.as_deref().filter(|s| !s.is_empty()) {
        query = query.with_sort(sort.parse::<SortOrder>().map_err(ApiError::BadRequest)?);
    }

    let start = parse_date("start_date", params.start_date.as_deref())?;
    let end = parse_date("end_date", params.end_date.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ApiError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }

    Ok(query.with_date_range(start, end))
}

/// Accepts the numeric code or the label.
fn parse_status(raw: &str) -> Result<JobStatus, ApiError> {
    let status = match raw.to_ascii_lowercase().as_str() {
        "failed" => Some(JobStatus::Failed),
        "ok" => Some(JobStatus::Ok),
        "partial" => Some(JobStatus::Partial),
        other => other.parse::<u8>().ok().and_then(JobStatus::from_code),
    };
    status.ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid status '{}', expected 0, 1, 2, failed, ok or partial",
            raw
        ))
    })
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::BadRequest(format!("Invalid {} '{}', expected YYYY-MM-DD", field, value))
            }),
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
