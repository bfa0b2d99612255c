//! Escaping for Telegram's HTML parse mode.

/// Placeholder used when the engine returns no text, so the outbound message
/// is never blank.
pub const EMPTY_RESPONSE: &str = "Empty response.";

/// Escape a model reply so it renders as literal text under HTML parse mode.
///
/// Telegram rejects messages with unbalanced tags; escaping `&`, `<` and `>`
/// guarantees no literal markup survives.
pub fn sanitize_html(text: &str) -> String {
    if text.is_empty() {
        return EMPTY_RESPONSE.to_string();
    }
    html_escape::encode_text(text).into_owned()
}
