//! Transcript preprocessing: chunking, tokenization, star interleaving.
//!
//! The transcript (all segments joined by single spaces) is reduced to
//! the acoustic model's token alphabet. Which of the three tokenization
//! modes applies is decided by the vocabulary format and the romanize
//! flag; the chunking rule is decided by the language tag.

use crate::romanize::{self, PinyinTable, pinyin};
use crate::vocab::{STAR_TOKEN, VocabFormat, Vocabulary};

/// Tokenization output. `tokens_starred` and `text_starred` are
/// parallel: both alternate `<star>` entries with per-chunk entries,
/// the former holding space-joined sub-tokens, the latter the original
/// surface text.
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessed {
    pub tokens_starred: Vec<String>,
    pub text_starred: Vec<String>,
    pub full_text: String,
}

/// How a chunk is reduced to sub-tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    /// Romanize CJK scripts, then keep `[a-z']` letters (small-alphabet
    /// models with the romanize flag set)
    Romanized,
    /// Keep lowercase ASCII letters and apostrophes only
    Latin,
    /// Keep codepoints present in the vocabulary (large-alphabet models)
    Native,
}

/// Resolve the tokenization mode. Romanization is only honored for
/// small-alphabet (JSON) vocabularies; large-alphabet models carry
/// native CJK tokens and never romanize.
pub fn resolve_mode(romanize: bool, format: VocabFormat) -> TokenMode {
    match format {
        VocabFormat::Txt => TokenMode::Native,
        VocabFormat::Json if romanize => TokenMode::Romanized,
        VocabFormat::Json => TokenMode::Latin,
    }
}

/// Languages whose transcripts carry no word separator and are chunked
/// per codepoint.
fn is_char_split_language(language: &str) -> bool {
    matches!(language, "jpn" | "chi" | "cmn" | "zho" | "kor")
}

/// Split the transcript into chunks: individual codepoints for
/// unspaced-CJK languages, ASCII-whitespace-separated words otherwise.
fn split_chunks(text: &str, force_char: bool) -> Vec<String> {
    if force_char {
        text.chars().map(String::from).collect()
    } else {
        text.split(|c: char| c.is_ascii_whitespace())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}

/// Collapse ASCII whitespace runs to single spaces and trim.
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = true;
    for c in s.chars() {
        if c.is_ascii_whitespace() {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Lowercase and keep only `[a-z']`; everything else becomes a space;
/// whitespace runs collapse. Pinyin tone marks are stripped first so
/// romanized readings survive the filter.
fn normalize_letters(s: &str) -> String {
    let stripped = pinyin::strip_tones(s);
    let mapped: String = stripped
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c == '\'' || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&mapped)
}

/// Tokenize one normalized chunk into a space-joined sub-token string.
/// An empty result means the chunk has no alphabet-mappable content.
pub fn tokenize_chunk(
    chunk: &str,
    mode: TokenMode,
    vocab: &Vocabulary,
    pinyin: Option<&PinyinTable>,
) -> String {
    match mode {
        TokenMode::Romanized => {
            let romanized = romanize::romanize(chunk, pinyin);
            let stripped = romanized.trim_matches(|c: char| c.is_ascii_whitespace());
            let spaced: Vec<String> = stripped.chars().map(String::from).collect();
            normalize_letters(&collapse_whitespace(&spaced.join(" ")))
        }
        TokenMode::Latin => {
            let mut out = String::with_capacity(chunk.len() * 2);
            for c in chunk.chars() {
                if !c.is_ascii() {
                    continue;
                }
                let c = c.to_ascii_lowercase();
                if c.is_ascii_lowercase() || c == '\'' {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push(c);
                }
            }
            out
        }
        TokenMode::Native => {
            let mut out = String::new();
            for c in chunk.chars() {
                if c.is_whitespace() {
                    continue;
                }
                let piece = c.to_string();
                let kept = if vocab.contains(&piece) {
                    Some(piece)
                } else if c.is_ascii_uppercase() {
                    let lower = c.to_ascii_lowercase().to_string();
                    vocab.contains(&lower).then_some(lower)
                } else {
                    None
                };
                if let Some(kept) = kept {
                    if !out.is_empty() {
                        out.push(' ');
                    }
                    out.push_str(&kept);
                }
            }
            out
        }
    }
}

/// Preprocess the full transcript into starred token and text lists.
pub fn preprocess_text(
    full_text: &str,
    language: &str,
    romanize: bool,
    vocab: &Vocabulary,
    pinyin: Option<&PinyinTable>,
) -> Preprocessed {
    let mode = resolve_mode(romanize, vocab.format);
    let chunks = split_chunks(full_text, is_char_split_language(language));

    let mut tokens_starred = Vec::with_capacity(chunks.len() * 2);
    let mut text_starred = Vec::with_capacity(chunks.len() * 2);

    for chunk in chunks {
        let normalized = collapse_whitespace(&chunk);
        let tokens = tokenize_chunk(&normalized, mode, vocab, pinyin);

        tokens_starred.push(STAR_TOKEN.to_string());
        tokens_starred.push(tokens);
        text_starred.push(STAR_TOKEN.to_string());
        text_starred.push(chunk);
    }

    Preprocessed {
        tokens_starred,
        text_starred,
        full_text: full_text.to_string(),
    }
}

/// Whether any codepoint of `text` maps into the token alphabet.
/// Words failing this test are excluded from confidence averaging.
pub fn has_mappable_content(
    text: &str,
    mode: TokenMode,
    vocab: &Vocabulary,
    pinyin: Option<&PinyinTable>,
) -> bool {
    !tokenize_chunk(&collapse_whitespace(text), mode, vocab, pinyin).is_empty()
}

/// Flatten starred token groups into the target id sequence.
///
/// Groups are joined with spaces and re-split so each sub-token maps
/// independently; `<star>` maps to the appended star id and sub-tokens
/// missing from the vocabulary are dropped.
pub fn build_targets(tokens_starred: &[String], vocab: &Vocabulary) -> Vec<i64> {
    let joined = tokens_starred.join(" ");
    let mut targets = Vec::with_capacity(joined.len() / 2);
    for piece in joined.split(' ') {
        if piece.is_empty() {
            continue;
        }
        if piece == STAR_TOKEN {
            targets.push(vocab.star_id);
        } else if let Some(id) = vocab.id(piece) {
            targets.push(id);
        }
    }
    targets
}
