//! Text chunking for document processing.
//!
//! Two splitting strategies share the [`Chunker`] trait:
//!
//! - [`CharacterChunker`] splits on a single separator and packs the
//!   pieces into size-bounded chunks (ingestion pipeline).
//! - [`RecursiveCharacterChunker`] tries progressively finer separators,
//!   preferring natural boundaries before falling back to hard cuts
//!   (QA pipeline).
//!
//! Both measure length in characters, request no overlap, and preserve
//! input order. Every produced chunk is at most `chunk_size` characters.

/// A strategy for splitting text into bounded-length chunks.
pub trait Chunker: Send + Sync {
    fn chunk(&self, text: &str) -> Vec<String>;
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Cut `text` into consecutive slices of at most `size` characters.
fn hard_cut(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size)
        .map(|c| c.iter().collect())
        .collect()
}

/// Pack already-fitting pieces into chunks of at most `size` characters,
/// re-joining adjacent pieces with `sep` when they fit together.
fn merge_pieces(pieces: Vec<String>, sep: &str, size: usize) -> Vec<String> {
    let sep_len = char_len(sep);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for piece in pieces {
        let piece_len = char_len(&piece);
        if piece_len == 0 {
            continue;
        }
        if current_len == 0 {
            current = piece;
            current_len = piece_len;
        } else if current_len + sep_len + piece_len <= size {
            current.push_str(sep);
            current.push_str(&piece);
            current_len += sep_len + piece_len;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = piece;
            current_len = piece_len;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Separator-based splitter: splits on one delimiter, then packs pieces
/// into chunks no longer than `chunk_size` characters. Pieces longer
/// than the limit are hard-cut.
pub struct CharacterChunker {
    chunk_size: usize,
    separator: String,
}

impl CharacterChunker {
    pub fn new(chunk_size: usize) -> Self {
        Self::with_separator(chunk_size, "\n\n")
    }

    pub fn with_separator(chunk_size: usize, separator: impl Into<String>) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            chunk_size,
            separator: separator.into(),
        }
    }
}

impl Chunker for CharacterChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        for piece in text.split(self.separator.as_str()) {
            if char_len(piece) <= self.chunk_size {
                pieces.push(piece.to_string());
            } else {
                pieces.extend(hard_cut(piece, self.chunk_size));
            }
        }
        merge_pieces(pieces, &self.separator, self.chunk_size)
    }
}

/// Recursive splitter: tries paragraph breaks first, then line breaks,
/// then spaces, and only hard-cuts when no boundary fits.
pub struct RecursiveCharacterChunker {
    chunk_size: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterChunker {
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        Self {
            chunk_size,
            separators: vec!["\n\n".into(), "\n".into(), " ".into()],
        }
    }

    fn split(&self, text: &str, separators: &[String]) -> Vec<String> {
        if char_len(text) <= self.chunk_size {
            if text.is_empty() {
                return Vec::new();
            }
            return vec![text.to_string()];
        }

        let (sep, rest) = match separators.split_first() {
            Some((s, r)) => (s.as_str(), r),
            // No boundary left to try
            None => return hard_cut(text, self.chunk_size),
        };

        if !text.contains(sep) {
            return self.split(text, rest);
        }

        let mut pieces = Vec::new();
        for piece in text.split(sep) {
            if char_len(piece) <= self.chunk_size {
                pieces.push(piece.to_string());
            } else {
                pieces.extend(self.split(piece, rest));
            }
        }
        merge_pieces(pieces, sep, self.chunk_size)
    }
}

impl Chunker for RecursiveCharacterChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        self.split(text, &self.separators)
    }
}
