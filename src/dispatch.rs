//! Event dispatch: routes inbound events to the history store and the
//! model provider, producing the reply to deliver.

use std::sync::Arc;

use crate::channels::format::sanitize_html;
use crate::channels::telegram::{InboundMessage, OutboundReply, ParseMode};
use crate::history::{ChatId, HistoryStore, Message};
use crate::provider::Provider;

/// Fixed reply when the engine fails; the exchange always completes.
pub const FALLBACK_REPLY: &str = "Something went wrong while generating a response.";

/// Fixed reply to empty or whitespace-only input.
pub const VALIDATION_REPLY: &str = "Please enter a valid message.";

/// Fixed confirmation after /clear.
pub const CLEAR_REPLY: &str = "Chat history cleared.";

/// Inbound events, classified from a transport message by command prefix.
#[derive(Debug, Clone)]
pub enum Event {
    SessionStart {
        chat_id: ChatId,
        first_name: Option<String>,
    },
    Clear {
        chat_id: ChatId,
    },
    Message {
        chat_id: ChatId,
        message_id: i64,
        text: String,
    },
}

impl Event {
    pub fn classify(msg: InboundMessage) -> Self {
        if is_command(&msg.text, "/start") {
            Self::SessionStart {
                chat_id: msg.chat_id,
                first_name: msg.first_name,
            }
        } else if is_command(&msg.text, "/clear") {
            Self::Clear {
                chat_id: msg.chat_id,
            }
        } else {
            Self::Message {
                chat_id: msg.chat_id,
                message_id: msg.message_id,
                text: msg.text,
            }
        }
    }
}

fn is_command(text: &str, command: &str) -> bool {
    let text = text.trim();
    text == command || text.starts_with(&format!("{command} "))
}

/// Routes events to the store and the provider.
pub struct Dispatcher {
    store: HistoryStore,
    provider: Arc<dyn Provider>,
}

impl Dispatcher {
    pub fn new(store: HistoryStore, provider: Arc<dyn Provider>) -> Self {
        Self { store, provider }
    }

    /// Handle one event to completion and return the reply to deliver.
    ///
    /// Never fails: engine errors are recovered with the fixed fallback and
    /// only reported through logging.
    pub async fn handle(&self, event: Event) -> OutboundReply {
        match event {
            Event::SessionStart {
                chat_id,
                first_name,
            } => {
                self.store.reset(chat_id).await;
                let name = first_name.as_deref().unwrap_or("there");
                tracing::info!("New session started | User: {name} | Chat ID: {chat_id}");

                OutboundReply {
                    chat_id,
                    text: welcome_text(name),
                    parse_mode: ParseMode::Markdown,
                    reply_to: None,
                }
            }
            Event::Clear { chat_id } => {
                self.store.reset(chat_id).await;
                tracing::info!("Chat history cleared | Chat ID: {chat_id}");

                OutboundReply {
                    chat_id,
                    text: CLEAR_REPLY.to_string(),
                    parse_mode: ParseMode::Markdown,
                    reply_to: None,
                }
            }
            Event::Message {
                chat_id,
                message_id,
                text,
            } => self.answer(chat_id, message_id, text).await,
        }
    }

    async fn answer(&self, chat_id: ChatId, message_id: i64, raw_text: String) -> OutboundReply {
        let text = raw_text.trim();

        if text.is_empty() {
            tracing::warn!("Empty message received | Chat ID: {chat_id}");
            return OutboundReply {
                chat_id,
                text: VALIDATION_REPLY.to_string(),
                parse_mode: ParseMode::Markdown,
                reply_to: Some(message_id),
            };
        }

        self.store.append(chat_id, Message::user(text)).await;
        tracing::info!("User message | Chat ID: {chat_id} | Length: {} chars", text.len());

        // Snapshot is taken after the append, so the provider sees the
        // triggering user message as the last history entry.
        let history = self.store.get(chat_id).await;

        let reply = match self.provider.get_reply(&raw_text, &history).await {
            Ok(reply) => {
                tracing::info!("AI response generated | Chat ID: {chat_id}");
                reply
            }
            Err(e) => {
                tracing::error!("AI Engine Error | Chat ID: {chat_id} | Error: {e}");
                FALLBACK_REPLY.to_string()
            }
        };

        let safe_reply = sanitize_html(&reply);
        // History records the raw reply; escaping is transport-only.
        self.store.append(chat_id, Message::assistant(reply)).await;

        OutboundReply {
            chat_id,
            text: safe_reply,
            parse_mode: ParseMode::Html,
            reply_to: Some(message_id),
        }
    }
}

fn welcome_text(first_name: &str) -> String {
    format!(
        "*Welcome, {first_name}!* 👋\n\n\
         I'm your AI assistant.\n\n\
         *Available commands:*\n\
         • `/start` — restart session\n\
         • `/clear` — clear chat history\n\n\
         Just send me a message to begin."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::EngineError;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    /// Provider returning a fixed reply and recording what it was called with.
    struct FixedProvider {
        reply: String,
        calls: Mutex<Vec<(String, Vec<Message>)>>,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for FixedProvider {
        async fn get_reply(
            &self,
            text: &str,
            history: &[Message],
        ) -> Result<String, EngineError> {
            self.calls
                .lock()
                .await
                .push((text.to_string(), history.to_vec()));
            Ok(self.reply.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn get_reply(&self, _: &str, _: &[Message]) -> Result<String, EngineError> {
            Err(EngineError {
                message: "upstream timeout".into(),
                status_code: None,
            })
        }
    }

    fn message(chat_id: i64, text: &str) -> Event {
        Event::Message {
            chat_id,
            message_id: 100,
            text: text.to_string(),
        }
    }

    #[test]
    fn classify_commands() {
        let inbound = |text: &str| InboundMessage {
            chat_id: 1,
            message_id: 2,
            first_name: Some("Alice".into()),
            text: text.to_string(),
        };

        assert!(matches!(
            Event::classify(inbound("/start")),
            Event::SessionStart { .. }
        ));
        assert!(matches!(
            Event::classify(inbound("  /start  ")),
            Event::SessionStart { .. }
        ));
        assert!(matches!(
            Event::classify(inbound("/clear")),
            Event::Clear { .. }
        ));
        assert!(matches!(
            Event::classify(inbound("/started late")),
            Event::Message { .. }
        ));
        assert!(matches!(
            Event::classify(inbound("hello")),
            Event::Message { .. }
        ));
    }

    #[tokio::test]
    async fn session_start_resets_history_and_greets() {
        let store = HistoryStore::new();
        store.append(1, Message::user("old turn")).await;
        let dispatcher = Dispatcher::new(store.clone(), FixedProvider::new("hi"));

        let reply = dispatcher
            .handle(Event::SessionStart {
                chat_id: 1,
                first_name: Some("Alice".into()),
            })
            .await;

        assert!(store.get(1).await.is_empty());
        assert!(reply.text.contains("Welcome, Alice!"));
        assert!(reply.text.contains("/start"));
        assert!(reply.text.contains("/clear"));
        assert_eq!(reply.parse_mode, ParseMode::Markdown);
        assert!(reply.reply_to.is_none());
    }

    #[tokio::test]
    async fn session_start_without_first_name_uses_default() {
        let dispatcher = Dispatcher::new(HistoryStore::new(), FixedProvider::new("hi"));
        let reply = dispatcher
            .handle(Event::SessionStart {
                chat_id: 1,
                first_name: None,
            })
            .await;
        assert!(reply.text.contains("Welcome, there!"));
    }

    #[tokio::test]
    async fn clear_resets_history_and_confirms() {
        let store = HistoryStore::new();
        store.append(7, Message::user("keep me not")).await;
        let dispatcher = Dispatcher::new(store.clone(), FixedProvider::new("hi"));

        let reply = dispatcher.handle(Event::Clear { chat_id: 7 }).await;

        assert!(store.get(7).await.is_empty());
        assert_eq!(reply.text, CLEAR_REPLY);
    }

    #[tokio::test]
    async fn whitespace_only_message_does_not_touch_history() {
        let store = HistoryStore::new();
        let provider = FixedProvider::new("hi");
        let dispatcher = Dispatcher::new(store.clone(), provider.clone());

        let reply = dispatcher.handle(message(1, "  ")).await;

        assert!(store.get(1).await.is_empty());
        assert_eq!(reply.text, VALIDATION_REPLY);
        assert_eq!(reply.reply_to, Some(100));
        assert!(provider.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn fresh_message_records_both_turns() {
        let store = HistoryStore::new();
        let dispatcher = Dispatcher::new(store.clone(), FixedProvider::new("Hi Alice!"));

        let reply = dispatcher.handle(message(1, "Hello")).await;

        let history = store.get(1).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::user("Hello"));
        assert_eq!(history[1], Message::assistant("Hi Alice!"));

        assert_eq!(reply.text, "Hi Alice!");
        assert_eq!(reply.parse_mode, ParseMode::Html);
        assert_eq!(reply.reply_to, Some(100));
    }

    #[tokio::test]
    async fn provider_sees_its_own_triggering_message() {
        let store = HistoryStore::new();
        let provider = FixedProvider::new("ok");
        let dispatcher = Dispatcher::new(store.clone(), provider.clone());

        dispatcher.handle(message(1, "  Hello  ")).await;

        let calls = provider.calls.lock().await;
        let (text, history) = &calls[0];
        // Raw untrimmed text goes to the provider; trimmed text to history.
        assert_eq!(text, "  Hello  ");
        assert_eq!(history.last().unwrap(), &Message::user("Hello"));
    }

    #[tokio::test]
    async fn engine_failure_substitutes_fallback() {
        let store = HistoryStore::new();
        let dispatcher = Dispatcher::new(store.clone(), Arc::new(FailingProvider));

        let reply = dispatcher.handle(message(1, "Hi")).await;

        let history = store.get(1).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], Message::assistant(FALLBACK_REPLY));
        // The fallback contains no markup characters, so it sanitizes to itself.
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(reply.parse_mode, ParseMode::Html);
    }

    #[tokio::test]
    async fn raw_reply_is_stored_and_escaped_reply_is_sent() {
        let store = HistoryStore::new();
        let dispatcher = Dispatcher::new(store.clone(), FixedProvider::new("<b>bold</b>"));

        let reply = dispatcher.handle(message(1, "format this")).await;

        let history = store.get(1).await;
        assert_eq!(history[1], Message::assistant("<b>bold</b>"));
        assert_eq!(reply.text, "&lt;b&gt;bold&lt;/b&gt;");
    }

    #[tokio::test]
    async fn history_accumulates_across_turns() {
        let store = HistoryStore::new();
        let provider = FixedProvider::new("reply");
        let dispatcher = Dispatcher::new(store.clone(), provider.clone());

        dispatcher.handle(message(1, "one")).await;
        dispatcher.handle(message(1, "two")).await;

        let history = store.get(1).await;
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], Message::user("one"));
        assert_eq!(history[2], Message::user("two"));

        // Second call saw the full prior exchange plus its own message.
        let calls = provider.calls.lock().await;
        assert_eq!(calls[1].1.len(), 3);
    }
}
