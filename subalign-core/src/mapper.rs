//! Segment mapper: redistribute word timings onto subtitle segments,
//! subdividing recursively when CTC is infeasible.
//!
//! The mapper owns the top of the per-batch pipeline: preprocess the
//! batch's text, check feasibility, align, reconstruct spans, then walk
//! the segments with a codepoint cursor over the word timestamps. When
//! `T < L + R` the batch is bisected at the midpoint of the adjacent
//! segment times and each half is retried against its emission slice;
//! a single infeasible segment keeps its input timings.

use crate::aligner::{self, repeat_count};
use crate::emissions::Emissions;
use crate::error::Result;
use crate::postprocess;
use crate::preprocess::{self, TokenMode};
use crate::romanize::PinyinTable;
use crate::spans;
use crate::types::{SubtitleSegment, WordTimestamp};
use crate::vocab::Vocabulary;
use ndarray::s;

/// Everything a batch alignment needs besides the segments themselves.
/// Emissions are computed once and re-sliced by every sub-batch.
pub struct AlignContext<'a> {
    pub emissions: &'a Emissions,
    pub vocab: &'a Vocabulary,
    pub language: &'a str,
    pub romanize: bool,
    pub pinyin: Option<&'a PinyinTable>,
}

/// Align `segments` against the emission slice `[frame_offset,
/// frame_offset + frame_count)`, overwriting their times and scores in
/// place. Word timestamps accumulate into `words_out` in emission
/// order.
///
/// Every segment is either re-timed or left with its input timing;
/// infeasibility never fails the call.
pub fn align_segments(
    ctx: &AlignContext,
    segments: &mut [SubtitleSegment],
    frame_offset: usize,
    frame_count: usize,
    words_out: &mut Vec<WordTimestamp>,
) -> Result<()> {
    if segments.is_empty() {
        return Ok(());
    }

    let full_text = segments
        .iter()
        .map(|s| s.normalized_text())
        .collect::<Vec<_>>()
        .join(" ");
    let prep = preprocess::preprocess_text(
        &full_text,
        ctx.language,
        ctx.romanize,
        ctx.vocab,
        ctx.pinyin,
    );
    let targets = preprocess::build_targets(&prep.tokens_starred, ctx.vocab);

    if targets.is_empty() {
        tracing::warn!(
            segments = segments.len(),
            "no alignable tokens; keeping input timings"
        );
        return Ok(());
    }

    let required = targets.len() + repeat_count(&targets);
    if frame_count < required {
        if segments.len() > 1 && frame_count >= 2 {
            let mid = segments.len() / 2;
            let split_time = (segments[mid - 1].end_s + segments[mid].start_s) / 2.0;
            let frames_per_sec = 1000.0 / ctx.emissions.stride_ms as f64;
            let split_frame = ((split_time * frames_per_sec) as i64 - frame_offset as i64)
                .clamp(1, frame_count as i64 - 1) as usize;

            tracing::debug!(
                segments = segments.len(),
                frames = frame_count,
                required,
                split_frame,
                "CTC infeasible; subdividing batch"
            );

            let (left, right) = segments.split_at_mut(mid);
            align_segments(ctx, left, frame_offset, split_frame, words_out)?;
            align_segments(
                ctx,
                right,
                frame_offset + split_frame,
                frame_count - split_frame,
                words_out,
            )?;
            return Ok(());
        }

        tracing::warn!(
            frames = frame_count,
            required,
            "CTC infeasible for a single segment; keeping input timings"
        );
        return Ok(());
    }

    let slice = ctx
        .emissions
        .log_probs
        .slice(s![frame_offset..frame_offset + frame_count, ..]);
    let alignment = aligner::forced_align(slice, &targets, ctx.vocab.blank_id)?;
    let runs = aligner::merge_repeats(&alignment.path);
    let spans = spans::get_spans(&prep.tokens_starred, &runs, ctx.vocab)?;
    let mut word_ts = postprocess::word_timestamps(
        &prep.text_starred,
        &spans,
        ctx.emissions.stride_ms,
        &alignment.scores,
    )?;

    let offset_s = frame_offset as f64 * ctx.emissions.stride_ms as f64 / 1000.0;
    for w in &mut word_ts {
        w.start_s += offset_s;
        w.end_s += offset_s;
    }

    map_words_to_segments(ctx, segments, &word_ts);
    words_out.extend(word_ts);
    Ok(())
}

/// Walk the segments with a monotone codepoint cursor into `word_ts`.
///
/// Each segment claims as many words as its normalized text has
/// codepoints; a whitespace-only word at the cursor compensates for the
/// inter-segment boundary star.
fn map_words_to_segments(
    ctx: &AlignContext,
    segments: &mut [SubtitleSegment],
    word_ts: &[WordTimestamp],
) {
    let mode = preprocess::resolve_mode(ctx.romanize, ctx.vocab.format);
    let ln_vocab = (ctx.vocab.size_with_star() as f64).ln();

    let mut char_idx = 0usize;
    for seg in segments.iter_mut() {
        let seg_text = seg.normalized_text();
        let num_chars = seg_text.chars().count();
        if num_chars == 0 || char_idx >= word_ts.len() {
            continue;
        }

        if char_idx > 0
            && word_ts[char_idx]
                .text
                .trim_matches(|c: char| c.is_ascii_whitespace())
                .is_empty()
        {
            char_idx += 1;
        }
        if char_idx >= word_ts.len() {
            continue;
        }

        let start_idx = char_idx;
        let end_idx = (char_idx + num_chars - 1).min(word_ts.len() - 1);
        seg.start_s = word_ts[start_idx].start_s;
        seg.end_s = word_ts[end_idx].end_s;
        seg.score = segment_score(ctx, mode, &word_ts[start_idx..=end_idx], ln_vocab);
        char_idx = end_idx + 1;
    }
}

/// Mean of the contributing words' probabilities. Words with no
/// alphabet-mappable content (pure punctuation) are excluded; a segment
/// with no contributing words scores 0.
fn segment_score(
    ctx: &AlignContext,
    mode: TokenMode,
    words: &[WordTimestamp],
    ln_vocab: f64,
) -> f32 {
    let probs: Vec<f32> = words
        .iter()
        .filter(|w| preprocess::has_mappable_content(&w.text, mode, ctx.vocab, ctx.pinyin))
        .map(|w| word_probability(w, ln_vocab))
        .collect();

    if probs.is_empty() {
        0.0
    } else {
        probs.iter().sum::<f32>() / probs.len() as f32
    }
}

/// Normalize a word's summed log-probability to [0, 1].
///
/// The average per-frame log-probability is scaled against
/// -ln(vocab_size), so chance-level evidence maps to 0 and certain
/// evidence to 1. A positive sum cannot arise from a real distribution
/// and scores 0.
fn word_probability(word: &WordTimestamp, ln_vocab: f64) -> f32 {
    if word.score > 0.0 {
        return 0.0;
    }
    let duration = word.end_s - word.start_s;
    let frames = ((duration / 0.02) as i64).max(1);
    let avg = f64::from(word.score) / frames as f64;
    (1.0 + avg / ln_vocab).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emissions::{Emissions, STRIDE_MS};
    use crate::vocab::tests_support::json_vocab;
    use ndarray::Array2;

    const PEAK: f32 = -0.05;
    const OFF: f32 = -12.0;

    /// Emissions where frame `t` peaks at `peaks[t]`.
    fn peaked_emissions(peaks: &[i64], classes: usize) -> Emissions {
        let log_probs = Array2::from_shape_fn((peaks.len(), classes), |(t, c)| {
            if peaks[t] == c as i64 { PEAK } else { OFF }
        });
        Emissions {
            log_probs,
            stride_ms: STRIDE_MS,
        }
    }

    fn flat_emissions(frames: usize, classes: usize) -> Emissions {
        Emissions {
            log_probs: Array2::from_elem((frames, classes), -1.0),
            stride_ms: STRIDE_MS,
        }
    }

    #[test]
    fn retimes_a_single_segment() {
        let vocab = json_vocab();
        let star = vocab.star_id;
        let h = vocab.id("h").unwrap();
        let i = vocab.id("i").unwrap();

        // star, blank, h, h, blank, i, blank, star
        let peaks = [star, 0, h, h, 0, i, 0, star];
        let emissions = peaked_emissions(&peaks, vocab.size_with_star());
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &vocab,
            language: "eng",
            romanize: false,
            pinyin: None,
        };

        let mut segments = vec![SubtitleSegment::new(1, 0.0, 9.0, "hi")];
        let mut words = Vec::new();

        align_segments(&ctx, &mut segments, 0, emissions.frames(), &mut words).unwrap();

        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "hi");

        // Span reaches into the half-blank padding on both sides
        assert!((segments[0].start_s - 0.02).abs() < 1e-9);
        assert!((segments[0].end_s - 0.16).abs() < 1e-9);
        assert!(segments[0].score > 0.0 && segments[0].score <= 1.0);
    }

    #[test]
    fn infeasible_batch_subdivides_and_preserves_timings() {
        let vocab = json_vocab();
        let emissions = flat_emissions(2, vocab.size_with_star());
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &vocab,
            language: "eng",
            romanize: false,
            pinyin: None,
        };

        let mut segments = vec![
            SubtitleSegment::new(1, 1.0, 2.0, "hi"),
            SubtitleSegment::new(2, 3.0, 4.0, "there"),
        ];
        let mut words = Vec::new();

        let result = align_segments(&ctx, &mut segments, 0, emissions.frames(), &mut words);

        // Subdivision bottoms out at single segments, which keep their
        // input timings; the call itself succeeds.
        assert!(result.is_ok());
        assert!(words.is_empty());
        assert!((segments[0].start_s - 1.0).abs() < 1e-9);
        assert!((segments[0].end_s - 2.0).abs() < 1e-9);
        assert!((segments[1].start_s - 3.0).abs() < 1e-9);
        assert!((segments[1].end_s - 4.0).abs() < 1e-9);
    }

    #[test]
    fn whitespace_only_text_keeps_timings() {
        let vocab = json_vocab();
        let emissions = flat_emissions(10, vocab.size_with_star());
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &vocab,
            language: "eng",
            romanize: false,
            pinyin: None,
        };

        let mut segments = vec![SubtitleSegment::new(1, 5.0, 6.0, "  \n ")];
        let mut words = Vec::new();

        align_segments(&ctx, &mut segments, 0, 10, &mut words).unwrap();

        assert!((segments[0].start_s - 5.0).abs() < 1e-9);
        assert!((segments[0].end_s - 6.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sum_word_scores_probability_one() {
        let word = WordTimestamp {
            text: "a".to_string(),
            start_s: 0.0,
            end_s: 0.1,
            score: 0.0,
        };

        assert!((word_probability(&word, 29f64.ln()) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn chance_level_word_scores_zero() {
        let ln_vocab = 29f64.ln();
        // 10 frames, each at exactly -ln(vocab_size)
        let word = WordTimestamp {
            text: "a".to_string(),
            start_s: 0.0,
            end_s: 0.2,
            score: (10.0 * -ln_vocab) as f32,
        };

        assert!(word_probability(&word, ln_vocab).abs() < 1e-6);
    }

    #[test]
    fn positive_sum_is_degenerate() {
        let word = WordTimestamp {
            text: "a".to_string(),
            start_s: 0.0,
            end_s: 0.1,
            score: 0.5,
        };

        assert_eq!(word_probability(&word, 29f64.ln()), 0.0);
    }

    #[test]
    fn punctuation_words_are_excluded_from_segment_score() {
        let vocab = json_vocab();
        let emissions = flat_emissions(4, vocab.size_with_star());
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &vocab,
            language: "eng",
            romanize: false,
            pinyin: None,
        };

        let words = vec![
            WordTimestamp {
                text: "hi".to_string(),
                start_s: 0.0,
                end_s: 0.02,
                score: 0.0,
            },
            WordTimestamp {
                text: "...".to_string(),
                start_s: 0.02,
                end_s: 0.04,
                score: -50.0,
            },
        ];

        let score = segment_score(&ctx, TokenMode::Latin, &words, 29f64.ln());

        // Only "hi" contributes; its zero-sum score maps to 1.0
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn two_segments_map_monotonically() {
        let vocab = json_vocab();
        let star = vocab.star_id;
        let a = vocab.id("a").unwrap();
        let b = vocab.id("b").unwrap();

        // "a" then "b", star-separated
        let peaks = [star, 0, a, 0, star, 0, b, 0, star];
        let emissions = peaked_emissions(&peaks, vocab.size_with_star());
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &vocab,
            language: "eng",
            romanize: false,
            pinyin: None,
        };

        let mut segments = vec![
            SubtitleSegment::new(1, 0.0, 0.0, "a"),
            SubtitleSegment::new(2, 0.0, 0.0, "b"),
        ];
        let mut words = Vec::new();

        align_segments(&ctx, &mut segments, 0, emissions.frames(), &mut words).unwrap();

        assert_eq!(words.len(), 2);
        assert!(segments[0].start_s <= segments[0].end_s);
        assert!(segments[0].start_s <= segments[1].start_s);
        assert!(segments[1].start_s <= segments[1].end_s);
    }
}
