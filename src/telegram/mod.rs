//! Telegram bot: webhook handling, Bot API client and message templates.

mod bot;
mod client;
pub mod format;

pub use bot::Bot;
pub use client::{BotApi, Messenger, TelegramError};

use teloxide::types::{BotCommand, ChatId, Recipient};

/// Command list registered with `setMyCommands`
pub fn bot_commands() -> Vec<BotCommand> {
    [
        ("start", "Welcome and quick guide"),
        ("search", "Search listings, e.g. /search 2 bed Dubai Marina"),
        ("latest", "Newest listings"),
        ("news", "Latest real-estate news"),
        ("district", "Neighbourhood review, e.g. /district JVC"),
        ("help", "All commands"),
    ]
    .into_iter()
    .map(|(command, description)| BotCommand::new(command, description))
    .collect()
}

/// Configured channel: numeric ids stay numeric, names get an `@`
pub fn parse_recipient(value: &str) -> Recipient {
    let value = value.trim();
    match value.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if value.starts_with('@') => Recipient::ChannelUsername(value.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{}", value)),
    }
}

/// How a recipient is stored in `channel_posts.channel_id`
pub fn recipient_label(recipient: &Recipient) -> String {
    match recipient {
        Recipient::Id(id) => id.0.to_string(),
        Recipient::ChannelUsername(name) => name.clone(),
    }
}
