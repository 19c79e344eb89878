use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::api::models::{ChatResponse, ErrorResponse, HealthResponse};
use crate::app_state::AppState;
use crate::error::GatewayError;
use crate::llm::prompt::ChatTurn;
use crate::llm::{extract, prompt, runner};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Health check, no auth so the tunnel can probe it.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "PhilogicAI".to_string(),
        timestamp: chrono::Local::now().to_rfc3339(),
        model: state.model_name.clone(),
    })
}

fn verify_auth(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t == token)
        .unwrap_or(false)
}

// The body is taken as raw bytes, not through the Json extractor: auth must
// come before any body handling, and a missing or wrong-typed message maps
// to a controlled 400 instead of a framework rejection.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    if !verify_auth(&headers, &state.config.auth_token) {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "Unauthorized - Authorization header missing or invalid",
            )),
        ));
    }

    let body: Value = serde_json::from_slice(&body).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Request body must be valid JSON")),
        )
    })?;

    let message = match body.get("message").and_then(Value::as_str) {
        Some(m) if !m.trim().is_empty() => m.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Field 'message' must be a non-empty string",
                )),
            ));
        }
    };

    let history: Vec<ChatTurn> = match body.get("history") {
        None | Some(Value::Null) => Vec::new(),
        Some(h) => serde_json::from_value(h.clone()).map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Field 'history' must be an array of {role, content} turns",
                )),
            )
        })?,
    };

    tracing::info!("New chat request: {}...", message_prefix(&message));

    if state.config.test_mode {
        tracing::info!("TEST MODE - simulated response");
        return Ok(Json(ChatResponse {
            response: format!(
                "PhilogicAI test response: I received your message '{message}'. \
                 The real AI server would answer here via llama.cpp."
            ),
            model: "Test Mode".to_string(),
            inference_time: 0.1,
            status: "success".to_string(),
        }));
    }

    let prompt_text = prompt::assemble(prompt::SYSTEM_PROMPT, &history, &message);

    let start = Instant::now();
    let raw_output = runner::run(&prompt_text, &state.config)
        .await
        .map_err(|e| into_api_error(e, &message))?;
    let elapsed = start.elapsed().as_secs_f64();

    let response = extract::extract(&raw_output);
    tracing::info!("Response generated in {:.2}s", elapsed);

    Ok(Json(ChatResponse {
        response,
        model: state.model_name.clone(),
        inference_time: (elapsed * 100.0).round() / 100.0,
        status: "success".to_string(),
    }))
}

fn message_prefix(message: &str) -> String {
    message.chars().take(50).collect()
}

fn into_api_error(err: GatewayError, message: &str) -> ApiError {
    tracing::error!("Chat request failed ({}...): {err}", message_prefix(message));
    match err {
        GatewayError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            Json(ErrorResponse::new(
                "Request timeout - Model inference took too long",
            )),
        ),
        GatewayError::ExecutableNotFound(path) | GatewayError::ModelNotFound(path) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details(
                "Model or llama.cpp executable not found",
                path.display().to_string(),
            )),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(other.to_string())),
        ),
    }
}
