pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// How far back from a window's end to look for a sentence break.
const BREAK_LOOKBACK: usize = 100;

fn is_break(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Split `text` into overlapping chunks of at most `chunk_size` characters.
///
/// A chunk ends just after the last sentence break found in the final
/// [`BREAK_LOOKBACK`] characters of its window, but never in the first half
/// of the window. Consecutive chunks share `overlap` characters. Chunks are
/// trimmed and empty ones dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunk_size = chunk_size.max(1);
    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let mut end = start + chunk_size;
        if end < chars.len() {
            let floor = (start + chunk_size / 2).max(end.saturating_sub(BREAK_LOOKBACK));
            if let Some(i) = (floor + 1..=end).rev().find(|&i| is_break(chars[i])) {
                end = i + 1;
            }
        } else {
            end = chars.len();
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end >= chars.len() {
            break;
        }
        // Always make progress, even when overlap swallows the window.
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}
