use super::error::ApiError;
use super::ApiState;
use crate::store::SlotSummary;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;

pub async fn get_proxies(
    State(state): State<Arc<ApiState>>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let list = state.query.get_list(&kind)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        list.content.clone(),
    )
        .into_response())
}

#[derive(Serialize)]
struct ListStatus {
    url: String,
    #[serde(flatten)]
    slot: SlotSummary,
}

pub async fn get_status(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let lists: Vec<ListStatus> = state
        .store
        .snapshot()
        .into_iter()
        .filter_map(|slot| {
            let url = state.registry.url_for(slot.kind)?;
            Some(ListStatus {
                url: url.to_string(),
                slot,
            })
        })
        .collect();

    Json(serde_json::json!({
        "phase": state.refresh.phase(),
        "cycles_completed": state.refresh.cycles_completed(),
        "interval_secs": state.refresh_interval.as_secs(),
        "login_enabled": state.auth.is_some(),
        "last_report": state.refresh.last_report(),
        "lists": lists,
    }))
}

pub async fn trigger_refresh(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    // Capacity 1: a refresh that is already queued absorbs this one.
    let status = match state.refresh_sender.try_send(()) {
        Ok(()) => "refresh_triggered",
        Err(TrySendError::Full(())) => "refresh_already_queued",
        Err(TrySendError::Closed(())) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "error": "Refresh scheduler is not running" })),
            );
        }
    };
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": status })),
    )
}
