//! # HTTP Front-End
//!
//! Routes:
//! - `GET /`: dashboard page
//! - `GET /api`: current snapshot as JSON
//!
//! ```text
//! {"data": {"leaderName": "bully-2", "replicas": [{"name": "bully-0", "leader": "bully-2", "state": "follower"}]},
//!  "error": ""}
//! ```
//!
//! `error` is `"No data available"` before the first round and whenever the last
//! round had no peers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use log::{debug, error};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use super::ui::UiPage;
use crate::state::{Snapshot, SnapshotStore};

pub const NO_DATA: &str = "No data available";

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub page: Arc<UiPage>,
}

impl AppState {
    pub fn new(store: Arc<SnapshotStore>, page: UiPage) -> Self {
        Self {
            store,
            page: Arc::new(page),
        }
    }
}

/// Response body of `GET /api`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<'a> {
    pub data: &'a Snapshot,
    pub error: &'static str,
}

impl<'a> ApiResponse<'a> {
    pub fn new(data: &'a Snapshot) -> Self {
        let error = if data.is_empty() { NO_DATA } else { "" };
        Self { data, error }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_ui))
        .route("/api", get(handle_state))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn handle_state(State(state): State<AppState>) -> Response {
    let current = state.store.read().await;
    let empty = Snapshot::default();
    let snapshot = current.as_deref().unwrap_or(&empty);

    render_json(&ApiResponse::new(snapshot))
}

fn render_json<T: Serialize>(body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(json) => {
            debug!("📤 Sending snapshot ({} bytes)", json.len());
            ([(header::CONTENT_TYPE, "application/json")], json).into_response()
        }
        Err(e) => {
            let msg = "couldn't marshal response to json";
            error!("❌ {}: {}", msg, e);
            (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
        }
    }
}

pub async fn handle_ui(State(state): State<AppState>) -> Html<String> {
    Html(state.page.html().to_string())
}
