//! Emission building: waveform to frame-wise log-probabilities.
//!
//! The waveform is cut into fixed windows with zero-padded context on
//! both sides, each window is pushed through the acoustic model, the
//! context frames are trimmed back off, and the per-frame logits are
//! log-softmaxed. A constant `<star>` column is appended last so the
//! catch-all token can match any frame without penalty.

use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};

/// Frame stride of the acoustic models: one frame per 20 ms.
pub const STRIDE_MS: u32 = 20;

const SAMPLE_RATE: usize = 16000;

/// Chunking and star-column parameters.
#[derive(Debug, Clone, Copy)]
pub struct EmissionConfig {
    /// Window length submitted to the model, in seconds
    pub window_s: usize,
    /// Zero-padded context on each side of a window, in seconds
    pub context_s: usize,
    /// How many chunks are submitted per inference round
    pub batch_size: usize,
    /// Constant log-probability of the `<star>` column (0 = probability 1)
    pub star_logp: f32,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            window_s: 30,
            context_s: 2,
            batch_size: 4,
            star_logp: 0.0,
        }
    }
}

/// The opaque frame-logits oracle.
///
/// Given a contiguous waveform slice, returns raw (pre-softmax) logits
/// of shape `[frames, classes]` with one row per 20 ms of input.
pub trait FrameOracle {
    fn frame_logits(&mut self, chunk: &[f32]) -> Result<Array2<f32>>;
}

/// Frame-wise log-probabilities over the model classes plus the
/// appended `<star>` column.
#[derive(Debug, Clone)]
pub struct Emissions {
    /// `[frames, classes]`, row-major; the last column is `<star>`
    pub log_probs: Array2<f32>,
    pub stride_ms: u32,
}

impl Emissions {
    pub fn frames(&self) -> usize {
        self.log_probs.nrows()
    }

    pub fn classes(&self) -> usize {
        self.log_probs.ncols()
    }
}

fn time_to_frame(seconds: f32) -> usize {
    let frames_per_sec = 1000.0 / STRIDE_MS as f32;
    (seconds * frames_per_sec) as usize
}

/// Numerically stable log-softmax of one logits row into `out`.
/// The exp-sum runs in f64 so long rows do not lose precision.
fn log_softmax_row(row: ArrayView1<f32>, mut out: ArrayViewMut1<f32>) {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum: f64 = row.iter().map(|&x| f64::from(x - max).exp()).sum();
    let lse = (f64::from(max) + sum.ln()) as f32;
    for (o, &x) in out.iter_mut().zip(row) {
        *o = x - lse;
    }
}

/// Run the oracle over the whole waveform and build the emission matrix.
pub fn generate_emissions(
    oracle: &mut dyn FrameOracle,
    waveform: &[f32],
    config: &EmissionConfig,
) -> Result<Emissions> {
    let batch_size = config.batch_size.max(1);
    let window = config.window_s * SAMPLE_RATE;
    let context = config.context_s * SAMPLE_RATE;

    // Short inputs skip windowing entirely: one chunk, no context, no
    // trimming.
    let (chunks, extension, used_context) = if waveform.len() < window {
        (vec![waveform.to_vec()], 0usize, 0usize)
    } else {
        let total = waveform.len();
        let extension = total.div_ceil(window) * window - total;

        let mut padded = vec![0.0f32; context];
        padded.extend_from_slice(waveform);
        padded.resize(padded.len() + context + extension, 0.0);

        let chunk_samples = window + 2 * context;
        let num_chunks = (padded.len() - chunk_samples) / window + 1;
        let chunks = (0..num_chunks)
            .map(|i| padded[i * window..i * window + chunk_samples].to_vec())
            .collect();
        (chunks, extension, context)
    };

    let mut logits_chunks: Vec<Array2<f32>> = Vec::with_capacity(chunks.len());
    let mut classes: Option<usize> = None;

    for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
        tracing::debug!(batch = batch_idx, chunks = batch.len(), "running inference");
        for chunk in batch {
            let logits = oracle.frame_logits(chunk)?;
            let c = logits.ncols();
            match classes {
                None => classes = Some(c),
                Some(prev) if prev != c => {
                    return Err(Error::Model(format!(
                        "inconsistent class dimension across chunks: {prev} vs {c}"
                    )));
                }
                Some(_) => {}
            }
            logits_chunks.push(logits);
        }
    }

    let classes = classes
        .filter(|&c| c > 0)
        .ok_or_else(|| Error::Model("no logits produced".to_string()))?;

    // Per-chunk context trim: drop the first `cf` frames and the last
    // `cf - 1` (the windows overlap by 2*cf, so this keeps exactly one
    // copy of every content frame).
    let cf = if used_context > 0 {
        time_to_frame(config.context_s as f32)
    } else {
        0
    };
    let trim_range = |frames: usize| -> (usize, usize) {
        if cf == 0 {
            (0, frames)
        } else {
            let start = cf.min(frames);
            let stop = (frames + 1).saturating_sub(cf).max(start);
            (start, stop)
        }
    };

    let total_frames: usize = logits_chunks
        .iter()
        .map(|c| {
            let (start, stop) = trim_range(c.nrows());
            stop - start
        })
        .sum();

    // Frames covering the zero-pad tail extension are dropped too.
    let ext_frames = if extension > 0 {
        time_to_frame(extension as f32 / SAMPLE_RATE as f32)
    } else {
        0
    };
    let keep_frames = if ext_frames > 0 && total_frames > ext_frames {
        total_frames - ext_frames
    } else {
        total_frames
    };

    let classes_with_star = classes + 1;
    let mut log_probs = Array2::<f32>::zeros((keep_frames, classes_with_star));

    let mut out_row = 0usize;
    'fill: for chunk_logits in &logits_chunks {
        let (start, stop) = trim_range(chunk_logits.nrows());
        for t in start..stop {
            if out_row == keep_frames {
                break 'fill;
            }
            let dest = log_probs.row_mut(out_row);
            let (head, mut star) = dest.split_at(Axis(0), classes);
            log_softmax_row(chunk_logits.row(t), head);
            star[0] = config.star_logp;
            out_row += 1;
        }
    }

    Ok(Emissions {
        log_probs,
        stride_ms: STRIDE_MS,
    })
}
