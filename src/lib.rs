//! telebridge - Telegram front-end for a language-model backend.
//!
//! Relays chat messages to an OpenAI-compatible API and returns sanitized
//! replies, keeping a per-conversation history in process memory.
//!
//! ```text
//! Telegram → getUpdates → Event classify → Dispatcher ↔ HistoryStore
//!                                              ↓
//! User    ←  sendMessage ←  sanitize  ←  Provider reply
//! ```

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod logging;
pub mod provider;

pub use channels::{InboundMessage, OutboundReply, ParseMode, TelegramChannel};
pub use config::Config;
pub use dispatch::{Dispatcher, Event};
pub use history::{HistoryStore, Message, Role};
pub use provider::{EngineError, OpenAiProvider, Provider};

use std::sync::Arc;
use tokio::sync::mpsc;

/// Run the bot until the transport listener stops.
///
/// Events are processed one at a time to completion; no failure inside an
/// exchange terminates the loop.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let channel = Arc::new(TelegramChannel::new(config.telegram_token.clone()));
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::new(&config.engine));
    let dispatcher = Dispatcher::new(HistoryStore::new(), provider);

    let (tx, mut rx) = mpsc::channel(32);
    let listener = Arc::clone(&channel);
    tokio::spawn(async move {
        if let Err(e) = listener.listen(tx).await {
            tracing::error!("Telegram listener stopped: {e}");
        }
    });

    tracing::info!("Bot started successfully.");

    while let Some(inbound) = rx.recv().await {
        let event = Event::classify(inbound);

        if let Event::Message { chat_id, text, .. } = &event {
            if !text.trim().is_empty() {
                if let Err(e) = channel.send_typing(*chat_id).await {
                    tracing::debug!("sendChatAction failed: {e}");
                }
            }
        }

        let reply = dispatcher.handle(event).await;

        if let Err(e) = channel.send(&reply).await {
            tracing::error!("Failed to deliver reply | Chat ID: {} | Error: {e}", reply.chat_id);
        }
    }

    Ok(())
}
