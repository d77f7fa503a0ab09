// src/platforms/telegram.rs - Telegram Bot API connection (long polling)

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::env;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{sleep, Duration};

use crate::platforms::{ChatPlatform, PlatformError};
use crate::types::{ChatKind, ChatMessage, MessageAuthor};

const API_BASE: &str = "https://api.telegram.org";
const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Envelope every Bot API response arrives in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Debug, Deserialize)]
struct TgMessage {
    message_id: i64,
    from: Option<TgUser>,
    chat: TgChat,
    date: i64,
    text: Option<String>,
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgUser {
    id: i64,
    is_bot: bool,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TgChat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
}

/// Permission set applied when muting a user.
#[derive(Debug, Serialize)]
struct TgChatPermissions {
    can_send_messages: bool,
}

/// Configuration for the Telegram connection.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
}

impl TelegramConfig {
    /// Load the Telegram configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .context("TELEGRAM_BOT_TOKEN environment variable not set")?;

        // Bot tokens look like "<bot_id>:<secret>".
        if !bot_token.contains(':') {
            return Err(anyhow::anyhow!(
                "TELEGRAM_BOT_TOKEN does not look like a bot token (missing ':')"
            ));
        }

        Ok(Self { bot_token })
    }
}

/// Telegram Bot API connection: long-polls `getUpdates` for inbound messages
/// and issues the moderation calls over HTTPS.
pub struct TelegramConnection {
    config: TelegramConfig,
    message_sender: Option<broadcast::Sender<ChatMessage>>,
    is_connected: Arc<RwLock<bool>>,
    http_client: reqwest::Client,
}

impl TelegramConnection {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            message_sender: None,
            is_connected: Arc::new(RwLock::new(false)),
            http_client: reqwest::Client::new(),
        }
    }

    fn method_url(token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, token, method)
    }

    /// POST a Bot API method and unwrap the `ok`/`description` envelope.
    async fn call(
        client: &reqwest::Client,
        token: &str,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, PlatformError> {
        let response = client
            .post(Self::method_url(token, method))
            .json(&payload)
            .send()
            .await?;

        let body: ApiResponse<serde_json::Value> = response.json().await?;
        if body.ok {
            Ok(body.result.unwrap_or(serde_json::Value::Null))
        } else {
            Err(PlatformError::Api(
                body.description
                    .unwrap_or_else(|| format!("{} failed without description", method)),
            ))
        }
    }

    /// One long-poll round. Returns the raw updates; the caller advances the
    /// offset past the highest `update_id` it has seen.
    async fn poll_updates(
        client: &reqwest::Client,
        token: &str,
        offset: i64,
    ) -> Result<Vec<Update>, PlatformError> {
        let payload = json!({
            "offset": offset,
            "timeout": LONG_POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });

        let result = Self::call(client, token, "getUpdates", payload).await?;
        let updates: Vec<Update> = serde_json::from_value(result)
            .map_err(|e| PlatformError::Api(format!("unexpected getUpdates payload: {}", e)))?;
        Ok(updates)
    }

    /// Convert a Bot API message into our standard format. Service messages
    /// without an author are dropped here.
    fn convert_message(msg: TgMessage) -> Option<ChatMessage> {
        let from = msg.from?;

        let full_name = match &from.last_name {
            Some(last) => format!("{} {}", from.first_name, last),
            None => from.first_name.clone(),
        };

        let timestamp = DateTime::<Utc>::from_timestamp(msg.date, 0).unwrap_or_else(Utc::now);

        Some(ChatMessage {
            chat_id: msg.chat.id,
            message_id: msg.message_id,
            chat_kind: ChatKind::from_api(&msg.chat.kind),
            author: MessageAuthor {
                id: from.id,
                username: from.username,
                full_name,
                is_bot: from.is_bot,
            },
            text: msg.text.or(msg.caption),
            timestamp,
        })
    }
}

#[async_trait]
impl ChatPlatform for TelegramConnection {
    async fn connect(&mut self) -> Result<(), PlatformError> {
        info!("Connecting to Telegram Bot API...");

        // Validate the token before starting the poll loop.
        let me = Self::call(
            &self.http_client,
            &self.config.bot_token,
            "getMe",
            json!({}),
        )
        .await?;
        let bot_name = me
            .get("username")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        info!("Authenticated as @{}", bot_name);

        let (tx, _) = broadcast::channel(1000);
        self.message_sender = Some(tx.clone());
        *self.is_connected.write().await = true;

        let is_connected = Arc::clone(&self.is_connected);
        let http_client = self.http_client.clone();
        let token = self.config.bot_token.clone();

        tokio::spawn(async move {
            info!("Telegram update poller started");
            let mut offset: i64 = 0;
            let mut backoff = Duration::from_secs(1);

            loop {
                if !*is_connected.read().await {
                    info!("Telegram connection marked as disconnected, stopping poller");
                    break;
                }

                match Self::poll_updates(&http_client, &token, offset).await {
                    Ok(updates) => {
                        backoff = Duration::from_secs(1);
                        debug!("Polled {} Telegram updates", updates.len());

                        for update in updates {
                            offset = offset.max(update.update_id + 1);

                            let Some(msg) = update.message else { continue };
                            if let Some(chat_message) = Self::convert_message(msg) {
                                if let Err(e) = tx.send(chat_message) {
                                    warn!("Failed to broadcast Telegram message: {}", e);
                                }
                            }
                        }
                    }
                    Err(e) => {
                        error!("Failed to poll Telegram updates: {}", e);
                        backoff = std::cmp::min(backoff * 2, Duration::from_secs(60));
                        warn!("Backing off update polling for {:?}", backoff);
                        sleep(backoff).await;
                    }
                }
            }

            warn!("Telegram update poller stopped");
        });

        info!("Telegram connection established");
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "telegram"
    }

    fn message_receiver(&self) -> Option<broadcast::Receiver<ChatMessage>> {
        self.message_sender.as_ref().map(|sender| sender.subscribe())
    }

    async fn is_connected(&self) -> bool {
        *self.is_connected.read().await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), PlatformError> {
        Self::call(
            &self.http_client,
            &self.config.bot_token,
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text }),
        )
        .await?;
        debug!("Sent message to chat {}", chat_id);
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), PlatformError> {
        Self::call(
            &self.http_client,
            &self.config.bot_token,
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        debug!("Deleted message {} in chat {}", message_id, chat_id);
        Ok(())
    }

    async fn ban_user(&self, chat_id: i64, user_id: i64) -> Result<(), PlatformError> {
        Self::call(
            &self.http_client,
            &self.config.bot_token,
            "banChatMember",
            json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await?;
        info!("Banned user {} from chat {}", user_id, chat_id);
        Ok(())
    }

    async fn restrict_user(
        &self,
        chat_id: i64,
        user_id: i64,
        until: DateTime<Utc>,
    ) -> Result<(), PlatformError> {
        let permissions = TgChatPermissions {
            can_send_messages: false,
        };
        Self::call(
            &self.http_client,
            &self.config.bot_token,
            "restrictChatMember",
            json!({
                "chat_id": chat_id,
                "user_id": user_id,
                "permissions": permissions,
                "until_date": until.timestamp(),
            }),
        )
        .await?;
        info!(
            "Restricted user {} in chat {} until {}",
            user_id, chat_id, until
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), PlatformError> {
        *self.is_connected.write().await = false;
        self.message_sender = None;
        info!("Disconnected from Telegram");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_update(raw: serde_json::Value) -> Update {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_convert_text_message() {
        let update = parse_update(serde_json::json!({
            "update_id": 10,
            "message": {
                "message_id": 55,
                "from": {
                    "id": 7,
                    "is_bot": false,
                    "first_name": "Alice",
                    "last_name": "Smith",
                    "username": "alice"
                },
                "chat": { "id": -100123, "type": "supergroup" },
                "date": 1700000000,
                "text": "hello there"
            }
        }));

        let msg = TelegramConnection::convert_message(update.message.unwrap()).unwrap();
        assert_eq!(msg.chat_id, -100123);
        assert_eq!(msg.message_id, 55);
        assert_eq!(msg.chat_kind, ChatKind::Supergroup);
        assert_eq!(msg.author.id, 7);
        assert_eq!(msg.author.username.as_deref(), Some("alice"));
        assert_eq!(msg.author.full_name, "Alice Smith");
        assert!(!msg.author.is_bot);
        assert_eq!(msg.text.as_deref(), Some("hello there"));
        assert_eq!(msg.timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn test_convert_caption_message() {
        let update = parse_update(serde_json::json!({
            "update_id": 11,
            "message": {
                "message_id": 56,
                "from": { "id": 8, "is_bot": true, "first_name": "Spammer" },
                "chat": { "id": -42, "type": "group" },
                "date": 1700000001,
                "caption": "buy now http://spam.example"
            }
        }));

        let msg = TelegramConnection::convert_message(update.message.unwrap()).unwrap();
        assert_eq!(msg.author.full_name, "Spammer");
        assert!(msg.author.is_bot);
        assert_eq!(msg.text.as_deref(), Some("buy now http://spam.example"));
    }

    #[test]
    fn test_service_message_without_author_is_dropped() {
        let update = parse_update(serde_json::json!({
            "update_id": 12,
            "message": {
                "message_id": 57,
                "chat": { "id": -42, "type": "group" },
                "date": 1700000002
            }
        }));

        assert!(TelegramConnection::convert_message(update.message.unwrap()).is_none());
    }

    #[test]
    fn test_api_error_envelope() {
        let raw = serde_json::json!({
            "ok": false,
            "description": "Bad Request: message to delete not found"
        });
        let parsed: ApiResponse<serde_json::Value> = serde_json::from_value(raw).unwrap();
        assert!(!parsed.ok);
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: message to delete not found")
        );
    }

    #[test]
    fn test_method_url() {
        assert_eq!(
            TelegramConnection::method_url("123:abc", "getUpdates"),
            "https://api.telegram.org/bot123:abc/getUpdates"
        );
    }
}
