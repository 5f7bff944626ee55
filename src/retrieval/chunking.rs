//! Sentence-aware chunking for corpus ingestion.

/// Splits `text` into chunks of at most `max_chars` characters.
///
/// Sentences end at `.`, `!` or `?`. Line breaks are folded into spaces.
/// Each chunk after the first starts with the last sentence of the previous
/// chunk when that still fits. A sentence longer than `max_chars` is cut on
/// character boundaries.
pub fn chunk_by_sentence(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let pieces: Vec<String> = split_sentences(text)
        .into_iter()
        .flat_map(|sentence| split_long(sentence, max_chars))
        .collect();

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for piece in pieces {
        let len = piece.chars().count();

        if !current.is_empty() && current_len + 1 + len > max_chars {
            chunks.push(current.join(" "));
            let overlap = current.pop();
            current.clear();
            current_len = 0;

            if let Some(prev) = overlap {
                let prev_len = prev.chars().count();
                if prev_len + 1 + len <= max_chars {
                    current_len = prev_len;
                    current.push(prev);
                }
            }
        }

        if !current.is_empty() {
            current_len += 1;
        }
        current_len += len;
        current.push(piece);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

fn split_sentences(text: &str) -> Vec<String> {
    let flattened = text.replace(['\r', '\n'], " ");
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in flattened.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

fn push_trimmed(out: &mut Vec<String>, sentence: &str) {
    let collapsed = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        out.push(collapsed);
    }
}

fn split_long(sentence: String, max_chars: usize) -> Vec<String> {
    if sentence.chars().count() <= max_chars {
        return vec![sentence];
    }
    let chars: Vec<char> = sentence.chars().collect();
    chars
        .chunks(max_chars)
        .map(|window| window.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}
