use crate::enrich::Enrichment;
use crate::server::{success, ApiError, ApiResult, AppState, JsonBody};
use axum::extract::Extension;
use serde::Deserialize;
use serde_json::json;

const UNAVAILABLE_REPLY: &str = "The assistant is unavailable right now. Please try again later.";

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Target language for `translate`
    #[serde(default)]
    pub language: Option<String>,
}

/// Chat, translate, summarize or describe. Without a working gateway the
/// reply degrades to the input text (or a fixed notice for chat).
pub async fn ai_assistant_handler(
    Extension(state): Extension<AppState>,
    JsonBody(request): JsonBody<AssistantRequest>,
) -> ApiResult {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    let task = match request.kind.as_deref().unwrap_or("chat") {
        "chat" => Enrichment::Answer,
        "translate" => Enrichment::translate_to(request.language.as_deref().unwrap_or("English")),
        "summarize" => Enrichment::Summarize,
        "describe" => Enrichment::Describe,
        other => return Err(ApiError::bad_request(format!("Unknown type: {}", other))),
    };

    let reply = state.enricher.try_enrich(&request.message, &task).await;
    let degraded = reply.is_none();
    let response = reply.unwrap_or_else(|| match task {
        Enrichment::Answer => UNAVAILABLE_REPLY.to_string(),
        _ => request.message.clone(),
    });

    Ok(success(json!({
        "type": task.name(),
        "response": response,
        "degraded": degraded,
    })))
}
