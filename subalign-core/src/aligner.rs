//! CTC Viterbi forced alignment.
//!
//! Computes the maximum-likelihood monotone alignment of a target token
//! sequence against frame-wise log-probabilities over a blank-interleaved
//! trellis of `2L + 1` states. A moving state band keeps only reachable
//! states live, so each frame costs O(band) instead of O(S).

use crate::error::{Error, Result};
use ndarray::ArrayView2;

/// Best path through the trellis: one label and one score per frame.
///
/// The score of frame `t` is the log-probability of the label chosen at
/// that frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub path: Vec<i64>,
    pub scores: Vec<f32>,
}

/// A maximal run of identical labels in a Viterbi path. `end` is
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub label: i64,
    pub start: i64,
    pub end: i64,
}

/// Count of adjacent identical pairs in `targets`. The CTC trellis
/// needs one separating blank frame per such pair, hence feasibility
/// requires `T >= L + R`.
pub fn repeat_count(targets: &[i64]) -> usize {
    targets.windows(2).filter(|w| w[0] == w[1]).count()
}

/// Align `targets` against `log_probs[T, C]`.
///
/// # Errors
///
/// - [`Error::EmptyTargets`] when `targets` is empty
/// - [`Error::CtcInfeasible`] when `T < L + R`; the segment mapper
///   catches this and subdivides the batch
pub fn forced_align(log_probs: ArrayView2<f32>, targets: &[i64], blank: i64) -> Result<Alignment> {
    let t_len = log_probs.nrows();
    let classes = log_probs.ncols();
    if t_len == 0 || classes == 0 {
        return Err(Error::Alignment(format!(
            "invalid log_probs shape [{t_len}, {classes}]"
        )));
    }
    let l_len = targets.len();
    if l_len == 0 {
        return Err(Error::EmptyTargets);
    }

    let repeats = repeat_count(targets);
    if t_len < l_len + repeats {
        return Err(Error::CtcInfeasible {
            frames: t_len,
            required: l_len + repeats,
        });
    }

    let s_len = 2 * l_len + 1;
    let label_at = |state: usize| -> i64 {
        if state % 2 == 0 {
            blank
        } else {
            targets[state / 2]
        }
    };

    let mut alphas = vec![f32::NEG_INFINITY; 2 * s_len];
    let mut back_ptr = vec![-1i8; t_len * s_len];

    let mut start = if t_len > l_len + repeats { 0 } else { 1 };
    let mut end = if s_len == 1 { 1 } else { 2 };
    for state in start..end {
        alphas[state] = log_probs[[0, label_at(state) as usize]];
    }

    for t in 1..t_len {
        // Band maintenance: drop states whose suffix no longer fits the
        // remaining frames, admit states once enough frames have passed.
        if t_len - t <= l_len + repeats {
            if start % 2 == 1
                && start / 2 + 1 < l_len
                && targets[start / 2] != targets[start / 2 + 1]
            {
                start += 1;
            }
            start += 1;
        }
        if t <= l_len + repeats {
            if end % 2 == 0 && end < 2 * l_len && targets[end / 2 - 1] != targets[end / 2] {
                end += 1;
            }
            end += 1;
        }

        let cur_off = (t % 2) * s_len;
        let prev_off = ((t - 1) % 2) * s_len;
        for state in 0..s_len {
            alphas[cur_off + state] = f32::NEG_INFINITY;
        }

        let mut startloop = start;
        if start == 0 {
            alphas[cur_off] = alphas[prev_off] + log_probs[[t, blank as usize]];
            back_ptr[t * s_len] = 0;
            startloop = 1;
        }

        for state in startloop..end {
            let x0 = alphas[prev_off + state];
            let x1 = alphas[prev_off + state - 1];
            // A token state may also be entered from two states back,
            // skipping the blank, unless that would merge a repeat.
            let x2 = if state % 2 != 0 && state != 1 && targets[state / 2] != targets[state / 2 - 1]
            {
                alphas[prev_off + state - 2]
            } else {
                f32::NEG_INFINITY
            };

            // Ties break toward staying (x0), then the single step (x1).
            let (best, bp) = if x2 > x1 && x2 > x0 {
                (x2, 2i8)
            } else if x1 > x0 && x1 > x2 {
                (x1, 1i8)
            } else {
                (x0, 0i8)
            };

            back_ptr[t * s_len + state] = bp;
            alphas[cur_off + state] = best + log_probs[[t, label_at(state) as usize]];
        }
    }

    let last_off = ((t_len - 1) % 2) * s_len;
    let mut state = if s_len == 1 {
        0i64
    } else if alphas[last_off + s_len - 1] > alphas[last_off + s_len - 2] {
        (s_len - 1) as i64
    } else {
        (s_len - 2) as i64
    };

    let mut path = vec![blank; t_len];
    let mut scores = vec![0.0f32; t_len];
    for t in (0..t_len).rev() {
        let label = label_at(state as usize);
        path[t] = label;
        scores[t] = log_probs[[t, label as usize]];
        state -= back_ptr[t * s_len + state as usize] as i64;
    }

    Ok(Alignment { path, scores })
}

/// Merge a label path into maximal runs of identical labels.
pub fn merge_repeats(path: &[i64]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i1 = 0;
    while i1 < path.len() {
        let mut i2 = i1;
        while i2 < path.len() && path[i2] == path[i1] {
            i2 += 1;
        }
        runs.push(Run {
            label: path[i1],
            start: i1 as i64,
            end: (i2 - 1) as i64,
        });
        i1 = i2;
    }
    runs
}
