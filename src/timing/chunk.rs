//! Splitting oversized text for providers with a per-call limit.

const SENTENCE_ENDINGS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Sentence boundaries are preferred; a single sentence longer than the limit
/// is hard-split. Text that already fits is returned unchanged.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in split_sentences(text) {
        let sentence_len = sentence.chars().count();
        let separator = usize::from(current_len > 0);

        if current_len + separator + sentence_len <= max_chars {
            if separator == 1 {
                current.push(' ');
            }
            current.push_str(sentence);
            current_len += separator + sentence_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        let mut rest = sentence;
        while rest.chars().count() > max_chars {
            let split_at = byte_offset(rest, max_chars);
            chunks.push(rest[..split_at].to_string());
            rest = &rest[split_at..];
        }
        current.push_str(rest);
        current_len = rest.chars().count();
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Sentences with their terminator kept; the whitespace after it is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if !SENTENCE_ENDINGS.contains(&ch) {
            continue;
        }
        let end = idx + ch.len_utf8();
        if !chars.peek().is_some_and(|(_, next)| next.is_whitespace()) {
            continue;
        }

        sentences.push(&text[start..end]);
        while let Some((_, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            chars.next();
        }
        start = chars.peek().map(|(i, _)| *i).unwrap_or(text.len());
    }
    sentences.push(&text[start..]);

    sentences.retain(|s| !s.is_empty());
    sentences
}

fn byte_offset(s: &str, char_count: usize) -> usize {
    s.char_indices()
        .nth(char_count)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
