/*!
 Turns a [`Normalized`] tree into preview text.
*/

use json::stringify_pretty;

use crate::preview::{models::Normalized, MAX_RENDERED_LENGTH};

/// Appended when the rendered text is cut at [`MAX_RENDERED_LENGTH`] characters
pub const TRUNCATED_MARKER: &str = "\n… [preview truncated]";

/// Pretty print `value` with two space indentation, capped at [`MAX_RENDERED_LENGTH`] characters
pub fn render(value: &Normalized) -> String {
    let text = stringify_pretty(value.to_json(), 2);
    let text = if text.is_empty() {
        value.to_string()
    } else {
        text
    };
    truncate_rendered(text)
}

fn truncate_rendered(mut text: String) -> String {
    if let Some((cut, _)) = text.char_indices().nth(MAX_RENDERED_LENGTH) {
        text.truncate(cut);
        text.push_str(TRUNCATED_MARKER);
    }
    text
}
