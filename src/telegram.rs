//! Telegram front end
//!
//! Long-polls the Bot API with `getUpdates` and answers with `sendMessage`.
//! Every qualifying message is handled in its own task so a launch waiting
//! on confirmation never blocks the next chat message.

use crate::launch_engine::LaunchEngine;
use crate::reporter::{
    intro_text, launching_text, usage_text, LaunchReporter, LaunchResponse, ParseMode,
};
use crate::structured_logging::LaunchContext;
use crate::types::LaunchResult;
use crate::validator::is_launch_text;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_parameters: Option<serde_json::Value>,
    link_preview_options: serde_json::Value,
}

/// Minimal Bot API client
pub struct TelegramClient {
    http: reqwest::Client,
    // Contains the token; never logged
    base_url: Zeroizing<String>,
    poll_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &Zeroizing<String>, poll_timeout: Duration) -> Result<Self> {
        if token.trim().is_empty() {
            bail!("bot token is empty");
        }
        let http = reqwest::Client::builder()
            .timeout(poll_timeout + Duration::from_secs(10))
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            base_url: Zeroizing::new(format!(
                "{}/bot{}",
                api_base.trim_end_matches('/'),
                token.trim()
            )),
            poll_timeout,
        })
    }

    async fn call<T, B>(&self, method: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url.as_str(), method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} request failed", method))?;

        let parsed: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{} response is not valid JSON", method))?;

        if !parsed.ok {
            bail!(
                "{} rejected: {}",
                method,
                parsed.description.unwrap_or_else(|| "no description".to_string())
            );
        }
        parsed
            .result
            .with_context(|| format!("{} returned no result", method))
    }

    /// Long-poll for new messages after `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let body = json!({
            "offset": offset,
            "timeout": self.poll_timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &body).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
        parse_mode: Option<ParseMode>,
        disable_link_preview: bool,
    ) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            parse_mode: parse_mode.map(|mode| mode.as_str()),
            reply_parameters: reply_to.map(|message_id| {
                json!({ "message_id": message_id, "allow_sending_without_reply": true })
            }),
            link_preview_options: json!({ "is_disabled": disable_link_preview }),
        };
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    /// Reply to `message` quoting it, without link previews
    pub async fn reply(&self, message: &Message, text: &str, markdown: bool) -> Result<()> {
        let parse_mode = markdown.then_some(ParseMode::Markdown);
        self.send_message(message.chat.id, text, Some(message.message_id), parse_mode, true)
            .await
    }

    /// Reply with a rendered launch outcome, honoring its formatting options
    pub async fn reply_with(&self, message: &Message, response: &LaunchResponse) -> Result<()> {
        self.send_message(
            message.chat.id,
            &response.text,
            Some(message.message_id),
            Some(response.parse_mode),
            response.disable_link_preview,
        )
        .await
    }
}

/// What an incoming text asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Launch,
    Resync,
    LaunchText,
    Ignore,
}

impl ChatCommand {
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim();
        if let Some(command) = trimmed.strip_prefix('/') {
            // "/start@SomeBot arg" -> "start"
            let name = command
                .split_whitespace()
                .next()
                .unwrap_or("")
                .split('@')
                .next()
                .unwrap_or("");
            return match name {
                "start" => ChatCommand::Start,
                "launch" => ChatCommand::Launch,
                "resync" => ChatCommand::Resync,
                _ => ChatCommand::Ignore,
            };
        }
        if is_launch_text(trimmed) {
            ChatCommand::LaunchText
        } else {
            ChatCommand::Ignore
        }
    }
}

/// Chat front end driving the launch engine
#[derive(Debug)]
pub struct LaunchBot {
    client: TelegramClient,
    engine: Arc<LaunchEngine>,
    reporter: LaunchReporter,
    admin_chat_ids: Vec<i64>,
}

impl LaunchBot {
    pub fn new(
        client: TelegramClient,
        engine: Arc<LaunchEngine>,
        reporter: LaunchReporter,
        admin_chat_ids: Vec<i64>,
    ) -> Self {
        Self {
            client,
            engine,
            reporter,
            admin_chat_ids,
        }
    }

    /// Poll forever, spawning a task per message
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let mut offset: Option<i64> = None;
        let mut backoff = Duration::from_secs(1);

        info!(signer = %self.engine.signer_address(), "Telegram polling started");

        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => {
                    backoff = Duration::from_secs(1);
                    updates
                }
                Err(e) => {
                    warn!(error = %format!("{:#}", e), backoff_ms = backoff.as_millis() as u64, "getUpdates failed");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };

                let bot = self.clone();
                tokio::spawn(async move {
                    if let Err(e) = bot.handle_message(message).await {
                        error!(error = %format!("{:#}", e), "Failed to answer message");
                    }
                });
            }
        }
    }

    pub async fn handle_message(&self, message: Message) -> Result<()> {
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };

        match ChatCommand::classify(text) {
            ChatCommand::Start => self.client.reply(&message, intro_text(), true).await,
            ChatCommand::Launch => self.client.reply(&message, usage_text(), true).await,
            ChatCommand::Resync => self.handle_resync(&message).await,
            ChatCommand::LaunchText => self.handle_launch(&message, text).await,
            ChatCommand::Ignore => Ok(()),
        }
    }

    async fn handle_launch(&self, message: &Message, text: &str) -> Result<()> {
        let ctx = LaunchContext::for_chat(message.chat.id);

        let request = match self.engine.validate(text, &ctx) {
            Ok(request) => request,
            Err(err) => {
                let response = self.reporter.report(&LaunchResult::failed(err));
                return self.client.reply_with(message, &response).await;
            }
        };

        // A lost acknowledgement must not stop the launch
        if let Err(e) = self.client.reply(message, launching_text(), false).await {
            warn!(launch_id = %ctx.launch_id, error = %format!("{:#}", e), "Failed to acknowledge launch");
        }

        let result = self.engine.launch_with(request, &ctx).await;
        let response = self.reporter.report(&result);
        self.client.reply_with(message, &response).await
    }

    async fn handle_resync(&self, message: &Message) -> Result<()> {
        if !self.admin_chat_ids.contains(&message.chat.id) {
            debug!(chat_id = message.chat.id, "Ignoring /resync from non-admin chat");
            return Ok(());
        }

        let text = match self.engine.resync().await {
            Ok(report) => format!(
                "Nonce re-synced: {} -> {}",
                report.previous, report.current
            ),
            Err(e) => format!("Nonce re-sync failed: {}", e),
        };
        self.client.reply(message, &text, false).await
    }
}
