//! Convert token spans into word timestamps.

use crate::error::{Error, Result};
use crate::spans::SpanSeg;
use crate::types::WordTimestamp;
use crate::vocab::STAR_TOKEN;

/// Walk `text_starred` and `spans` in lockstep and emit one timestamp
/// per surface chunk.
///
/// `<star>` positions and empty spans are dropped. A word's score is
/// the sum of per-frame path scores over the frames it occupies,
/// including its half-blank padding.
pub fn word_timestamps(
    text_starred: &[String],
    spans: &[Vec<SpanSeg>],
    stride_ms: u32,
    scores: &[f32],
) -> Result<Vec<WordTimestamp>> {
    if text_starred.len() != spans.len() {
        return Err(Error::Alignment(format!(
            "text_starred ({}) and spans ({}) length mismatch",
            text_starred.len(),
            spans.len()
        )));
    }
    if stride_ms == 0 {
        return Err(Error::Alignment("invalid stride_ms".to_string()));
    }

    let mut results = Vec::with_capacity(text_starred.len());

    for (text, span) in text_starred.iter().zip(spans) {
        if text == STAR_TOKEN {
            continue;
        }
        let (Some(first), Some(last)) = (span.first(), span.last()) else {
            continue;
        };

        let start_frame = first.start;
        let end_frame_incl = last.end;
        if start_frame < 0 || end_frame_incl < 0 {
            continue;
        }

        let end_excl = ((end_frame_incl + 1) as usize).min(scores.len());
        let score: f32 = scores[(start_frame as usize).min(end_excl)..end_excl]
            .iter()
            .sum();

        results.push(WordTimestamp {
            text: text.clone(),
            start_s: start_frame as f64 * stride_ms as f64 / 1000.0,
            end_s: end_frame_incl as f64 * stride_ms as f64 / 1000.0,
            score,
        });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(segs: &[(i64, i64, i64)]) -> Vec<SpanSeg> {
        segs.iter()
            .map(|&(label, start, end)| SpanSeg { label, start, end })
            .collect()
    }

    #[test]
    fn drops_star_positions_and_empty_spans() {
        let text = vec![
            "<star>".to_string(),
            "hi".to_string(),
            "<star>".to_string(),
        ];
        let spans = vec![
            span(&[(9, 0, 1)]),
            span(&[(0, 1, 2), (8, 2, 3), (0, 3, 4)]),
            vec![],
        ];
        let scores = vec![-0.5f32; 6];

        let words = word_timestamps(&text, &spans, 20, &scores).unwrap();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "hi");
    }

    #[test]
    fn times_come_from_span_bounds() {
        let text = vec!["word".to_string()];
        let spans = vec![span(&[(0, 3, 5), (7, 5, 9), (0, 9, 12)])];
        let scores = vec![-1.0f32; 20];

        let words = word_timestamps(&text, &spans, 20, &scores).unwrap();

        assert!((words[0].start_s - 0.06).abs() < 1e-9);
        assert!((words[0].end_s - 0.24).abs() < 1e-9);
        // frames [3, 13): 10 frames at -1.0 each
        assert!((words[0].score + 10.0).abs() < 1e-6);
    }

    #[test]
    fn word_starts_are_monotone() {
        let text = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let spans = vec![
            span(&[(1, 0, 2)]),
            span(&[(2, 2, 4)]),
            span(&[(3, 4, 8)]),
        ];
        let scores = vec![-0.1f32; 10];

        let words = word_timestamps(&text, &spans, 20, &scores).unwrap();

        for pair in words.windows(2) {
            assert!(pair[0].start_s <= pair[1].start_s);
        }
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let text = vec!["a".to_string()];
        let spans = vec![];

        assert!(matches!(
            word_timestamps(&text, &spans, 20, &[]),
            Err(Error::Alignment(_))
        ));
    }
}
