//! JSON transcript reading and writing.
//!
//! Input is either `{"segments": [...]}` or a bare array; each element
//! carries `text` (required) plus optional `index`, `start`, `end`. Any
//! `score` on input is ignored. Output wraps the retimed segments with
//! a metadata object.

use eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use subalign_core::SubtitleSegment;

#[derive(Debug, Deserialize)]
struct SegmentIn {
    index: Option<usize>,
    #[serde(default)]
    start: f64,
    #[serde(default)]
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TranscriptIn {
    Wrapped { segments: Vec<SegmentIn> },
    Bare(Vec<SegmentIn>),
}

#[derive(Serialize)]
struct TranscriptOut<'a> {
    segments: &'a [SubtitleSegment],
    metadata: Metadata,
}

#[derive(Serialize)]
struct Metadata {
    count: usize,
    processing_time: f64,
}

/// Parse a JSON transcript into segments. Missing indices are assigned
/// positionally, starting at 1.
pub fn parse_transcript(content: &str) -> Result<Vec<SubtitleSegment>> {
    let parsed: TranscriptIn =
        serde_json::from_str(content).wrap_err("failed to parse JSON transcript")?;

    let raw = match parsed {
        TranscriptIn::Wrapped { segments } => segments,
        TranscriptIn::Bare(segments) => segments,
    };
    if raw.is_empty() {
        bail!("JSON transcript has no segments");
    }

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, seg)| SubtitleSegment {
            index: seg.index.unwrap_or(i + 1),
            start_s: seg.start,
            end_s: seg.end,
            text: seg.text,
            score: 0.0,
        })
        .collect())
}

pub fn read_transcript(path: impl AsRef<Path>) -> Result<Vec<SubtitleSegment>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read json transcript: {:?}", path.display()))?;
    parse_transcript(&content)
}

/// Serialize segments plus metadata, pretty-printed with a trailing
/// newline.
pub fn format_output(segments: &[SubtitleSegment], processing_time: f64) -> String {
    let out = TranscriptOut {
        segments,
        metadata: Metadata {
            count: segments.len(),
            processing_time,
        },
    };
    let mut json = serde_json::to_string_pretty(&out).expect("segments always serialize");
    json.push('\n');
    json
}

pub fn write_output(
    path: impl AsRef<Path>,
    segments: &[SubtitleSegment],
    processing_time: f64,
) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_output(segments, processing_time))
        .wrap_err_with(|| format!("failed to write json output: {:?}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_form() {
        let content = r#"{"segments": [{"index": 3, "start": 1.5, "end": 2.5, "text": "hi"}]}"#;

        let segments = parse_transcript(content).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, 3);
        assert!((segments[0].start_s - 1.5).abs() < 1e-9);
        assert_eq!(segments[0].text, "hi");
    }

    #[test]
    fn parses_bare_array_with_default_indices() {
        let content = r#"[{"text": "a"}, {"text": "b"}]"#;

        let segments = parse_transcript(content).unwrap();

        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[1].index, 2);
        assert!((segments[0].start_s).abs() < 1e-9);
    }

    #[test]
    fn input_score_is_ignored() {
        let content = r#"[{"text": "a", "score": 0.9}]"#;

        let segments = parse_transcript(content).unwrap();

        assert_eq!(segments[0].score, 0.0);
    }

    #[test]
    fn missing_text_is_an_error() {
        let content = r#"[{"start": 0.0, "end": 1.0}]"#;

        assert!(parse_transcript(content).is_err());
    }

    #[test]
    fn empty_transcript_is_an_error() {
        assert!(parse_transcript("[]").is_err());
    }

    #[test]
    fn output_carries_metadata() {
        let segments = vec![SubtitleSegment {
            index: 1,
            start_s: 0.5,
            end_s: 1.5,
            text: "hi".to_string(),
            score: 0.75,
        }];

        let out = format_output(&segments, 2.5);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["metadata"]["count"], 1);
        assert!((value["metadata"]["processing_time"].as_f64().unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(value["segments"][0]["text"], "hi");
        assert_eq!(value["segments"][0]["index"], 1);
        assert!((value["segments"][0]["start"].as_f64().unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn round_trips_through_output_format() {
        let content = r#"[{"index": 1, "start": 1.0, "end": 2.0, "text": "hi"}]"#;
        let segments = parse_transcript(content).unwrap();

        let out = format_output(&segments, 0.0);
        let reparsed = parse_transcript(&out).unwrap();

        assert_eq!(reparsed, segments);
    }
}
