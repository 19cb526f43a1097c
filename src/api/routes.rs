use axum::{
    routing::{get, post},
    Router,
    extract::{Json, State, rejection::JsonRejection},
    response::IntoResponse,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::TraceLayer;
use chrono::Utc;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{Result, AppError};
use crate::api::models::{ChatSummaryRequest, ChatSummaryResponse, NotionPageRecord};
use crate::api::response;
use crate::AppState;

/// Extra time the handler grants the Notion call beyond the client's own
/// timeout before giving up on it.
const HANDLER_TIMEOUT_MARGIN: Duration = Duration::from_secs(1);

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/chat-summary", post(submit_chat_summary))
        .route("/webhook", post(webhook_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::UnsupportedMediaType("expected `Content-Type: application/json`".to_string())
        }
        other => AppError::ValidationError(other.body_text()),
    }
}

async fn status_handler() -> impl IntoResponse {
    Json(json!({
        "message": "notion-relay is running",
        "status": "active"
    }))
}

/// Validates a chat summary and stores it as a new page in the configured
/// Notion database. Exactly one page is created per accepted request; nothing
/// is retried.
pub async fn submit_chat_summary(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatSummaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload.map_err(rejection_to_error)?;
    let summary = req.validate()?;

    let record = NotionPageRecord::new(&summary, &state.config.properties, Utc::now());
    tracing::debug!(title = %summary.title, "Validated chat summary");
    tracing::info!(properties = record.properties.len(), "Creating Notion page");

    let start_time = std::time::Instant::now();
    let result = tokio::time::timeout(
        state.config.notion_timeout + HANDLER_TIMEOUT_MARGIN,
        state
            .notion
            .create_database_page(&state.config.notion_database_id, record.properties),
    )
    .await;

    let page = match result {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(elapsed = ?start_time.elapsed(), "Notion call exceeded handler timeout");
            return Err(AppError::UpstreamTimeout);
        }
    };

    tracing::info!(page_id = %page.id, elapsed = ?start_time.elapsed(), "Notion page created");
    Ok(response::success(ChatSummaryResponse {
        page_id: page.id,
        url: page.url,
    }))
}

/// Answers Notion's URL verification handshake and acknowledges any other
/// event without acting on it.
async fn webhook_handler(
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = payload.map_err(rejection_to_error)?;

    if body.get("type").and_then(Value::as_str) == Some("url_verification") {
        let challenge = body.get("challenge").cloned().unwrap_or(Value::Null);
        tracing::info!(%challenge, "Received webhook verification challenge");
        return Ok(Json(json!({
            "type": "url_verification",
            "challenge": challenge
        })));
    }

    tracing::debug!(payload = %body, "Received webhook request");
    Ok(Json(json!({ "status": "success" })))
}
