//! Transport adapters.

pub mod format;
pub mod telegram;

pub use format::sanitize_html;
pub use telegram::{InboundMessage, OutboundReply, ParseMode, TelegramChannel};
