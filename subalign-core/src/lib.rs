//! subalign-core: CTC forced alignment for subtitle retiming.
//!
//! Takes 16kHz mono audio plus a transcript already split into
//! time-stamped segments, and produces the same segments with
//! frame-accurate times and per-segment confidence scores.
//!
//! # Pipeline
//!
//! - [`audio`]: WAV loading and validation
//! - [`model`]: model directory detection and the ONNX frame oracle
//! - [`emissions`]: windowed inference and log-softmax into one
//!   emission matrix with an appended `<star>` column
//! - [`preprocess`] + [`romanize`]: transcript chunking, tokenization
//!   to the model alphabet, star interleaving
//! - [`aligner`]: CTC Viterbi over the blank-interleaved trellis
//! - [`spans`] + [`postprocess`]: label runs to per-word timestamps
//! - [`mapper`]: word timings back onto subtitle segments, with
//!   recursive subdivision when CTC is infeasible
//! - [`pipeline`]: the composition root tying it all together
//!
//! # Quick start
//!
//! ```ignore
//! use subalign_core::{AlignOptions, Pipeline};
//! use subalign_core::audio::read_audio_mono;
//!
//! let audio = read_audio_mono("film.wav")?;
//! let mut pipeline = Pipeline::load("models/mms", AlignOptions::default())?;
//! let outcome = pipeline.align(&audio, &mut segments)?;
//! ```

pub mod aligner;
pub mod audio;
pub mod emissions;
pub mod error;
pub mod mapper;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod romanize;
pub mod spans;
pub mod types;
pub mod vocab;

pub use error::{Error, Result};
pub use pipeline::{AlignOptions, AlignOutcome, Pipeline};
pub use types::{SubtitleSegment, WordTimestamp};
