//! Telegram transport — long-polls the Bot API for updates and delivers
//! replies.

use tokio::sync::mpsc;

/// Render mode for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Markdown,
    Html,
}

impl ParseMode {
    /// Bot API `parse_mode` value, `None` for plain text.
    fn as_api_str(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Markdown => Some("Markdown"),
            Self::Html => Some("HTML"),
        }
    }
}

/// A text message received from a chat.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub first_name: Option<String>,
    pub text: String,
}

/// A reply to deliver back to a chat.
#[derive(Debug, Clone)]
pub struct OutboundReply {
    pub chat_id: i64,
    pub text: String,
    pub parse_mode: ParseMode,
    /// Message id to reply to, `None` for a standalone message
    pub reply_to: Option<i64>,
}

/// Telegram channel backed by the Bot API.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Deliver a reply via `sendMessage`.
    pub async fn send(&self, reply: &OutboundReply) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "chat_id": reply.chat_id,
            "text": reply.text,
        });
        if let Some(mode) = reply.parse_mode.as_api_str() {
            body["parse_mode"] = mode.into();
        }
        if let Some(message_id) = reply.reply_to {
            body["reply_to_message_id"] = message_id.into();
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await?;
            anyhow::bail!("Telegram sendMessage failed: {err}");
        }

        Ok(())
    }

    /// Show a "typing…" indicator while a reply is being generated.
    pub async fn send_typing(&self, chat_id: i64) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "action": "typing",
        });

        let resp = self
            .client
            .post(self.api_url("sendChatAction"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await?;
            anyhow::bail!("Telegram sendChatAction failed: {err}");
        }

        Ok(())
    }

    /// Long-poll `getUpdates` and forward text messages to `tx`.
    ///
    /// Runs until the receiver is dropped. Poll and parse failures are
    /// logged and retried after a short pause.
    pub async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for messages...");

        loop {
            let body = serde_json::json!({
                "offset": offset,
                "timeout": 30,
                "allowed_updates": ["message"],
            });

            let resp = match self
                .client
                .post(self.api_url("getUpdates"))
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(message) = Self::parse_message(update) else {
                        continue;
                    };

                    if tx.send(message).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Extract a text message from an update; non-text updates are skipped.
    fn parse_message(update: &serde_json::Value) -> Option<InboundMessage> {
        let message = update.get("message")?;
        let chat_id = message.get("chat")?.get("id")?.as_i64()?;
        let message_id = message.get("message_id")?.as_i64()?;
        let text = message.get("text")?.as_str()?.to_string();
        let first_name = message
            .get("from")
            .and_then(|f| f.get("first_name"))
            .and_then(|n| n.as_str())
            .map(String::from);

        Some(InboundMessage {
            chat_id,
            message_id,
            first_name,
            text,
        })
    }
}
