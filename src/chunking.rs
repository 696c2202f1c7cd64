/// Chunk width in characters.
pub const CHUNK_SIZE: usize = 300;
/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 20;

/// A text chunk with retrieval metadata.
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The actual text content of this chunk
    pub text: String,
    /// Source identifier of the document this chunk belongs to
    pub source: String,
    /// Position of this chunk within its document
    pub ordinal: usize,
    /// Starting char offset of this chunk in the original text
    pub start_offset: usize,
}

/// Split text into overlapping fixed-size windows using the default
/// chunk configuration.
pub fn split_into_chunks(text: &str, source: &str) -> Vec<TextChunk> {
    split_with_config(text, source, CHUNK_SIZE, CHUNK_OVERLAP)
}

/// Split text into windows of `chunk_size` chars, each sharing its first
/// `overlap` chars with the tail of the previous window. Concatenating the
/// chunks in order with each subsequent chunk's first `overlap` chars
/// dropped reconstructs the input. The final chunk may be shorter.
pub fn split_with_config(
    text: &str,
    source: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<TextChunk> {
    assert!(overlap < chunk_size, "overlap must be smaller than chunk size");

    // Char-boundary byte offsets, so windows never split a UTF-8 sequence
    let mut offsets: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    offsets.push(text.len());
    let total_chars = offsets.len() - 1;

    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total_chars {
        let end = (start + chunk_size).min(total_chars);
        chunks.push(TextChunk {
            text: text[offsets[start]..offsets[end]].to_string(),
            source: source.to_string(),
            ordinal: chunks.len(),
            start_offset: start,
        });

        if end == total_chars {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap: chunk 0 in full, then every later chunk minus its
    /// first `overlap` chars.
    fn reconstruct(chunks: &[TextChunk], overlap: usize) -> String {
        let mut text = String::new();
        for chunk in chunks {
            if chunk.ordinal == 0 {
                text.push_str(&chunk.text);
            } else {
                text.extend(chunk.text.chars().skip(overlap));
            }
        }
        text
    }

    #[test]
    fn test_reconstruction_roundtrip() {
        let text = "The scheme provides a monthly pension to eligible senior citizens. \
                    Applicants must submit proof of age and residence. \
                    Payments begin within thirty days of approval."
            .repeat(5);
        let chunks = split_with_config(&text, "scheme.txt", 100, 10);
        assert!(chunks.len() > 1);
        assert_eq!(reconstruct(&chunks, 10), text);
    }

    #[test]
    fn test_reconstruction_with_default_config() {
        let text = "word ".repeat(500);
        let chunks = split_into_chunks(&text, "scheme.txt");
        assert_eq!(reconstruct(&chunks, CHUNK_OVERLAP), text);
    }

    #[test]
    fn test_multibyte_text_keeps_char_boundaries() {
        let text = "वृद्धावस्था पेंशन योजना के लाभार्थी ".repeat(30);
        let chunks = split_with_config(&text, "scheme.txt", 50, 5);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 50);
        }
        assert_eq!(reconstruct(&chunks, 5), text);
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(split_into_chunks("", "scheme.txt").is_empty());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = split_into_chunks("short scheme note", "scheme.txt");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short scheme note");
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[0].start_offset, 0);
    }

    #[test]
    fn test_final_chunk_is_truncated_partial_window() {
        let text = "a".repeat(250);
        let chunks = split_with_config(&text, "scheme.txt", 100, 10);
        // Windows start at 0, 90, 180; the last covers chars 180..250
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].text.chars().count(), 70);
    }

    #[test]
    fn test_ordinals_and_offsets_are_sequential() {
        let text = "b".repeat(1000);
        let chunks = split_with_config(&text, "scheme.txt", 100, 20);
        for (idx, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, idx);
            assert_eq!(chunk.start_offset, idx * 80);
            assert_eq!(chunk.source, "scheme.txt");
        }
    }
}
