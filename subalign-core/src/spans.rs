//! Span reconstruction: from a merged Viterbi path to per-token frame
//! intervals.
//!
//! Walks the label runs left-to-right while cursoring through the
//! starred token list, records one interval of runs per token group,
//! then pads each interval with a synthetic half-blank on both sides.

use crate::aligner::Run;
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;

/// One run inside a span. Frame indices, `end` inclusive except for the
/// synthetic pads, whose `end` is the first frame of the adjacent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanSeg {
    pub label: i64,
    pub start: i64,
    pub end: i64,
}

/// Assign each starred token group the slice of runs that spells it.
///
/// Blank runs between groups are skipped; a non-blank run that does not
/// spell the expected sub-token is a tokenization or vocabulary bug and
/// aborts with [`Error::AlignmentMismatch`]. Empty token groups receive
/// degenerate intervals at the frame where the preceding group ended.
pub fn get_spans(
    tokens_starred: &[String],
    runs: &[Run],
    vocab: &Vocabulary,
) -> Result<Vec<Vec<SpanSeg>>> {
    let blank = vocab.blank_id;

    let mut ltr_idx = 0usize;
    let mut tokens_idx = 0usize;
    let mut intervals: Vec<(usize, usize)> = Vec::with_capacity(tokens_starred.len());
    let mut start = 0usize;

    for (run_idx, run) in runs.iter().enumerate() {
        if tokens_idx == tokens_starred.len() {
            // Only the trailing blank should remain here.
            continue;
        }
        if run.label == blank {
            continue;
        }

        // split(' ') keeps empty pieces, matching the cursor convention
        // for empty groups.
        let cur_token: Vec<&str> = tokens_starred[tokens_idx].split(' ').collect();
        let ltr = cur_token[ltr_idx];

        let observed = vocab
            .token(run.label)
            .map(str::to_string)
            .unwrap_or_else(|| run.label.to_string());
        if observed != ltr {
            return Err(Error::AlignmentMismatch {
                token: tokens_starred[tokens_idx].clone(),
                letter_index: ltr_idx,
                observed,
            });
        }

        if ltr_idx == 0 {
            start = run_idx;
        }

        if ltr_idx == cur_token.len() - 1 {
            ltr_idx = 0;
            tokens_idx += 1;
            intervals.push((start, run_idx));
            while tokens_idx < tokens_starred.len() && tokens_starred[tokens_idx].is_empty() {
                intervals.push((run_idx, run_idx));
                tokens_idx += 1;
            }
        } else {
            ltr_idx += 1;
        }
    }

    let mut spans = Vec::with_capacity(intervals.len());
    let last_interval = intervals.len().saturating_sub(1);

    for (idx, &(start_idx, end_idx)) in intervals.iter().enumerate() {
        let mut span: Vec<SpanSeg> = runs[start_idx..=end_idx]
            .iter()
            .map(|r| SpanSeg {
                label: r.label,
                start: r.start,
                // Run ends stay inclusive; postprocessing relies on it.
                end: r.end,
            })
            .collect();

        if start_idx > 0 {
            let prev = &runs[start_idx - 1];
            if prev.label == blank {
                // First interval extends to the blank's start; later
                // ones claim only the half nearer to them.
                let pad_start = if idx == 0 {
                    prev.start
                } else {
                    (prev.start + prev.end) / 2
                };
                span.insert(
                    0,
                    SpanSeg {
                        label: blank,
                        start: pad_start,
                        end: span[0].start,
                    },
                );
            }
        }

        if end_idx + 1 < runs.len() {
            let next = &runs[end_idx + 1];
            if next.label == blank {
                let pad_end = if idx == last_interval {
                    next.end + 1
                } else {
                    (next.start + next.end) / 2
                };
                span.push(SpanSeg {
                    label: blank,
                    start: span[span.len() - 1].end,
                    end: pad_end,
                });
            }
        }

        spans.push(span);
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::merge_repeats;
    use crate::vocab::tests_support::json_vocab;

    fn starred(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn assigns_runs_and_pads_with_half_blanks() {
        let vocab = json_vocab();
        let star = vocab.star_id;
        let h = vocab.id("h").unwrap();
        let i = vocab.id("i").unwrap();

        // frames: blank blank star blank h h blank blank i blank blank
        let path = vec![0, 0, star, 0, h, h, 0, 0, i, 0, 0];
        let runs = merge_repeats(&path);
        let tokens = starred(&["<star>", "h i"]);

        let spans = get_spans(&tokens, &runs, &vocab).unwrap();

        assert_eq!(spans.len(), 2);

        // First interval's left pad reaches the preceding blank's start
        let star_span = &spans[0];
        assert_eq!(star_span[0], SpanSeg { label: 0, start: 0, end: 2 });
        assert_eq!(star_span[1], SpanSeg { label: star, start: 2, end: 2 });
        // Interior right pad stops at the following blank's midpoint
        assert_eq!(star_span[2], SpanSeg { label: 0, start: 2, end: 3 });

        let word_span = &spans[1];
        // Left pad claims the nearer half of the blank at frame 3
        assert_eq!(word_span[0], SpanSeg { label: 0, start: 3, end: 4 });
        assert_eq!(word_span[1], SpanSeg { label: h, start: 4, end: 5 });
        // Interior blank between letters is carried as-is
        assert_eq!(word_span[2], SpanSeg { label: 0, start: 6, end: 7 });
        assert_eq!(word_span[3], SpanSeg { label: i, start: 8, end: 8 });
        // Last interval's right pad extends one past the trailing blank
        assert_eq!(word_span[4], SpanSeg { label: 0, start: 8, end: 11 });
    }

    #[test]
    fn empty_groups_get_degenerate_intervals() {
        let vocab = json_vocab();
        let star = vocab.star_id;
        let h = vocab.id("h").unwrap();

        let path = vec![star, 0, h, star];
        let runs = merge_repeats(&path);
        let tokens = starred(&["<star>", "h", "<star>", ""]);

        let spans = get_spans(&tokens, &runs, &vocab).unwrap();

        assert_eq!(spans.len(), 4);
        // The empty group shares the run that closed the previous group
        assert_eq!(spans[3][0].start, runs[3].start);
    }

    #[test]
    fn mismatched_run_reports_context() {
        let vocab = json_vocab();
        let x = vocab.id("x").unwrap();

        let path = vec![x];
        let runs = merge_repeats(&path);
        let tokens = starred(&["h i"]);

        let result = get_spans(&tokens, &runs, &vocab);

        match result {
            Err(Error::AlignmentMismatch {
                token,
                letter_index,
                observed,
            }) => {
                assert_eq!(token, "h i");
                assert_eq!(letter_index, 0);
                assert_eq!(observed, "x");
            }
            other => panic!("expected AlignmentMismatch, got {other:?}"),
        }
    }

    #[test]
    fn spans_match_token_count() {
        let vocab = json_vocab();
        let star = vocab.star_id;
        let a = vocab.id("a").unwrap();

        let path = vec![0, star, 0, a, 0, star, 0];
        let runs = merge_repeats(&path);
        let tokens = starred(&["<star>", "a", "<star>"]);

        let spans = get_spans(&tokens, &runs, &vocab).unwrap();

        assert_eq!(spans.len(), tokens.len());
    }
}
