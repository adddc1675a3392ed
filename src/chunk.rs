//! Fixed-window text chunker with overlap.
//!
//! Splits extracted document text into windows of at most `chunk_size`
//! characters, each sharing `chunk_overlap` characters with its predecessor.
//! Windows are produced left to right and never drop trailing content.
//! Splitting is character-based and always lands on UTF-8 boundaries.

/// Split `text` into overlapping windows.
///
/// `chunk_overlap` must be smaller than `chunk_size` (enforced at config
/// load). Empty input produces an empty vector. Deterministic: identical
/// input and configuration always yield the identical sequence.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    debug_assert!(chunk_overlap < chunk_size);

    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, with the total length appended so
    // boundaries[i]..boundaries[j] slices chars i..j safely.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;
    let step = chunk_size - chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + chunk_size).min(char_count);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        if end == char_count {
            break;
        }
        start += step;
    }

    chunks
}
