//! Sentence-aligned splitting of long text for TTS requests

const SENTENCE_TERMINATORS: [char; 4] = ['.', '?', '!', '।'];

/// Split `text` into pieces of at most `max_chars` characters
///
/// Pieces end at sentence terminators where possible. A single sentence
/// longer than `max_chars` is cut at character boundaries.
#[must_use]
pub fn split_for_tts(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if max_chars == 0 || text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for sentence in text.split_inclusive(SENTENCE_TERMINATORS) {
        let len = sentence.chars().count();

        if current_len + len > max_chars && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }

        if len > max_chars {
            let chars: Vec<char> = sentence.trim().chars().collect();
            chunks.extend(
                chars
                    .chunks(max_chars)
                    .map(|piece| piece.iter().collect::<String>().trim().to_string())
                    .filter(|piece| !piece.is_empty()),
            );
            continue;
        }

        current.push_str(sentence);
        current_len += len;
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
