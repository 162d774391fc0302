//! Chat title derivation.
//!
//! A new chat is named after the assistant's first reply: its first two
//! sentences, bounded to [`MAX_TITLE_LEN`] characters with an ellipsis cut on
//! a word boundary.

/// Upper bound on a stored chat title, in characters, ellipsis included.
pub const MAX_TITLE_LEN: usize = 255;

/// Title used when the reply has no usable text.
pub const FALLBACK_TITLE: &str = "New chat";

const ELLIPSIS: &str = "...";

/// Derive a chat title from completion text.
pub fn derive_title(text: &str) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    let joined = sentences.iter().take(2).copied().collect::<Vec<_>>().join(" ");
    bound_title(&joined, MAX_TITLE_LEN)
}

/// Split text into sentences. A sentence ends at `.`, `!` or `?` followed by
/// whitespace; the terminator stays with its sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(_, next)) = chars.peek() else {
            break;
        };
        if next.is_whitespace() {
            let end = idx + c.len_utf8();
            sentences.push(text[start..end].trim());
            // Skip the whitespace run so the next sentence starts on text.
            while let Some(&(i, w)) = chars.peek() {
                if !w.is_whitespace() {
                    start = i;
                    break;
                }
                chars.next();
                start = i + w.len_utf8();
            }
        }
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences.retain(|s| !s.is_empty());
    sentences
}

/// Bound `text` to `max` characters. Longer text is cut on the last word
/// boundary that leaves room for a trailing `...`; the result never exceeds
/// `max` characters.
pub fn bound_title(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }

    let budget = max.saturating_sub(ELLIPSIS.len());
    let prefix: String = text.chars().take(budget).collect();
    let cut_on_boundary = text
        .chars()
        .nth(budget)
        .is_some_and(char::is_whitespace);

    let kept = if cut_on_boundary {
        prefix.trim_end()
    } else {
        match prefix.rfind(char::is_whitespace) {
            Some(i) if i > 0 => prefix[..i].trim_end(),
            // A single word longer than the budget is cut mid-word.
            _ => prefix.as_str(),
        }
    };

    format!("{kept}{ELLIPSIS}")
}
