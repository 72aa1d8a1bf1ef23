use crate::server::{success, ApiError, ApiResult, AppState};
use crate::telegram::bot_commands;
use axum::{extract::Extension, Json};
use serde_json::{json, Value};
use teloxide::types::Update;
use tracing::{error, warn};

/// Webhook endpoint. Always acknowledges so Telegram does not redeliver.
pub async fn telegram_bot_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let Some(bot) = &state.bot else {
        warn!("Telegram update received but TELEGRAM_BOT_TOKEN is not set");
        return success(json!({}));
    };

    match serde_json::from_value::<Update>(body) {
        Ok(update) => {
            if let Err(e) = bot.handle_update(&update).await {
                error!(update = update.id, "Failed to handle update: {:#}", e);
            }
        }
        Err(e) => warn!("Ignoring malformed update: {}", e),
    }
    success(json!({}))
}

/// Register the bot's command list
pub async fn telegram_setup_handler(Extension(state): Extension<AppState>) -> ApiResult {
    let api = state
        .bot_api
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("TELEGRAM_BOT_TOKEN is not set"))?;

    let commands = bot_commands();
    let count = commands.len();
    api.set_my_commands(commands).await?;
    Ok(success(json!({ "commands": count })))
}
