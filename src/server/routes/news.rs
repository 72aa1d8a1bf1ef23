use crate::server::{success, ApiError, ApiResult, AppState, JsonBody};
use axum::extract::Extension;
use serde::Deserialize;
use serde_json::json;

fn default_action() -> String {
    "fetch_and_translate".to_string()
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `fetch_and_translate` new feed items, or `publish` them to the channel
pub async fn parse_vnexpress_handler(
    Extension(state): Extension<AppState>,
    JsonBody(request): JsonBody<NewsRequest>,
) -> ApiResult {
    match request.action.as_str() {
        "fetch_and_translate" => {
            let summary = state.news.fetch_and_translate(request.limit).await?;
            Ok(success(json!(summary)))
        }
        "publish" => {
            let summary = state.news.publish(request.limit).await?;
            Ok(success(json!(summary)))
        }
        other => Err(ApiError::bad_request(format!("Unknown action: {}", other))),
    }
}
