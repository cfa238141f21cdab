//! Error types for subalign-core.

use std::path::PathBuf;
use thiserror::Error;

/// Alignment pipeline error variants
#[derive(Debug, Error)]
pub enum Error {
    /// Audio sample rate validation failed
    #[error("invalid sample rate: expected {expected}Hz, got {got}Hz")]
    InvalidSampleRate { expected: u32, got: u32 },

    /// Audio channel validation failed
    #[error("invalid audio channels: expected mono or stereo, got {0} channels")]
    InvalidChannels(u16),

    /// Vocabulary or lookup-table file could not be loaded
    #[error("bad vocabulary file {path:?}: {message}")]
    Vocab { path: PathBuf, message: String },

    /// Model directory does not hold a recognizable model layout
    #[error("cannot detect model in {dir:?}: {message}")]
    ModelLayout { dir: PathBuf, message: String },

    /// Acoustic model produced unusable output
    #[error("model error: {0}")]
    Model(String),

    /// Forced alignment was asked to align an empty target sequence
    #[error("empty targets")]
    EmptyTargets,

    /// The CTC feasibility constraint T >= L + R is violated.
    ///
    /// Not fatal at the pipeline level: the segment mapper catches this
    /// and subdivides the batch.
    #[error("targets too long for CTC: {frames} frames < {required} required")]
    CtcInfeasible { frames: usize, required: usize },

    /// A non-blank run in the Viterbi path does not spell the expected
    /// sub-token. Indicates a vocabulary or tokenization bug.
    #[error(
        "span mismatch: observed label {observed:?} != sub-token {letter_index} of token {token:?}"
    )]
    AlignmentMismatch {
        token: String,
        letter_index: usize,
        observed: String,
    },

    /// Internal pipeline-stage contract violation
    #[error("alignment error: {0}")]
    Alignment(String),

    /// ONNX Runtime error
    #[error(transparent)]
    Ort(#[from] ort::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// WAV file error
    #[error(transparent)]
    Hound(#[from] hound::Error),

    /// JSON parse error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias for subalign-core operations
pub type Result<T> = std::result::Result<T, Error>;
