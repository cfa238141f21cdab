//! Core types shared across the alignment pipeline.

use serde::Serialize;

/// A subtitle segment as read from SRT or JSON input.
///
/// The mapper overwrites `start_s`, `end_s` and `score`; `text` is
/// preserved byte-for-byte through the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleSegment {
    pub index: usize,
    #[serde(rename = "start")]
    pub start_s: f64,
    #[serde(rename = "end")]
    pub end_s: f64,
    pub text: String,
    pub score: f32,
}

impl SubtitleSegment {
    pub fn new(index: usize, start_s: f64, end_s: f64, text: impl Into<String>) -> Self {
        Self {
            index,
            start_s,
            end_s,
            text: text.into(),
            score: 0.0,
        }
    }

    /// Segment text with newlines flattened to spaces and surrounding
    /// ASCII whitespace removed. This is the form the preprocessor and
    /// the mapper count codepoints over.
    pub fn normalized_text(&self) -> String {
        self.text.replace('\n', " ").trim_matches(ascii_space).to_string()
    }
}

fn ascii_space(c: char) -> bool {
    c.is_ascii_whitespace()
}

/// One aligned surface chunk with frame-accurate times.
///
/// `score` is the summed per-frame log-probability over the frames the
/// word occupies, not yet normalized to a probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordTimestamp {
    pub text: String,
    #[serde(rename = "start")]
    pub start_s: f64,
    #[serde(rename = "end")]
    pub end_s: f64,
    pub score: f32,
}
