use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Update, UpdateKind};
use tracing::debug;

use super::{ChatTransport, IncomingMessage};

/// Telegram rejects messages longer than 4096 characters.
const MAX_CHUNK_CHARS: usize = 4000;

/// Extra time the HTTP client allows on top of the long-poll timeout.
const REQUEST_MARGIN: Duration = Duration::from_secs(10);

/// Split text into chunks of at most `max_chars` characters, preferring to
/// break after a newline or space.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let hard_end = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let end = if hard_end < rest.len() {
            rest[..hard_end]
                .rfind('\n')
                .or_else(|| rest[..hard_end].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(hard_end)
        } else {
            hard_end
        };

        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    chunks
}

/// Long-polling Telegram transport
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// `poll_timeout` is the long-poll timeout later passed to
    /// `fetch_updates`; the HTTP client must outlive it.
    pub fn new(token: &str, poll_timeout: Duration) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(request_timeout(poll_timeout))
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }
}

/// teloxide's default client gives up after 17 s, which cuts off any
/// long poll of that length or more.
fn request_timeout(poll_timeout: Duration) -> Duration {
    poll_timeout + REQUEST_MARGIN
}

// Only plain messages carry text; edits, joins, callbacks etc. are passed on
// with `text: None` so the cursor still moves past them.
fn to_incoming(update: Update) -> IncomingMessage {
    let chat_id = update.chat().map(|chat| chat.id.0).unwrap_or_default();
    let text = match &update.kind {
        UpdateKind::Message(msg) => msg.text().map(str::to_string),
        _ => None,
    };
    IncomingMessage {
        id: i64::from(update.id.0),
        chat_id,
        text,
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn fetch_updates(&self, offset: i64, timeout_secs: u32) -> Result<Vec<IncomingMessage>> {
        let offset = i32::try_from(offset)
            .with_context(|| format!("Update offset out of range: {}", offset))?;

        let updates = self
            .bot
            .get_updates()
            .offset(offset)
            .timeout(timeout_secs)
            .await
            .context("getUpdates request failed")?;

        debug!("Fetched {} update(s) from offset {}", updates.len(), offset);
        Ok(updates.into_iter().map(to_incoming).collect())
    }

    async fn send_reply(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in split_message(text, MAX_CHUNK_CHARS) {
            self.bot
                .send_message(ChatId(chat_id), chunk)
                .await
                .with_context(|| format!("Failed to send reply to chat {}", chat_id))?;
        }
        Ok(())
    }
}
