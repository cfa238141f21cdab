//! The composition root: model + vocabulary + tables + mapper.

use crate::emissions::{self, EmissionConfig};
use crate::error::{Error, Result};
use crate::mapper::{self, AlignContext};
use crate::model::{AcousticModel, ModelLayout};
use crate::preprocess::{self, Preprocessed};
use crate::romanize::PinyinTable;
use crate::types::{SubtitleSegment, WordTimestamp};
use crate::vocab::Vocabulary;
use std::path::{Path, PathBuf};

/// User-facing alignment options.
#[derive(Debug, Clone)]
pub struct AlignOptions {
    /// ISO 639-3 language tag of the transcript
    pub language: String,
    /// Romanize CJK scripts (honored only for small-alphabet models)
    pub romanize: bool,
    /// Kanji-to-pinyin table; defaults to
    /// `<model_dir>/Chinese_to_Pinyin.txt` when romanization is active
    pub pinyin_table: Option<PathBuf>,
    /// Inference window in seconds
    pub window_s: usize,
    /// Zero-padded context per window side in seconds
    pub context_s: usize,
    /// Chunks per inference round
    pub batch_size: usize,
    /// Log-probability of the `<star>` catch-all column
    pub star_logp: f32,
    /// ONNX intra-op threads; 0 = max(4, hw_threads/2)
    pub threads: usize,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            romanize: false,
            pinyin_table: None,
            window_s: 30,
            context_s: 2,
            batch_size: 4,
            star_logp: 0.0,
            threads: 0,
        }
    }
}

/// What one alignment run produced, for logging and debug dumps.
#[derive(Debug)]
pub struct AlignOutcome {
    /// All word timestamps in emission order, across every sub-batch
    pub words: Vec<WordTimestamp>,
    pub frames: usize,
    pub classes: usize,
}

/// A loaded model directory, ready to align any number of transcripts.
pub struct Pipeline {
    model: AcousticModel,
    vocab: Vocabulary,
    pinyin: Option<PinyinTable>,
    options: AlignOptions,
    romanize: bool,
}

impl Pipeline {
    /// Detect the model layout in `model_dir`, load the vocabulary and
    /// (when romanization is active) the pinyin table, and build the
    /// inference session.
    pub fn load(model_dir: impl AsRef<Path>, options: AlignOptions) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let layout = ModelLayout::detect(model_dir)?;
        tracing::info!(model = layout.describe(), "detected model layout");

        let vocab = layout.load_vocabulary()?;
        tracing::info!(
            tokens = vocab.size_with_star(),
            star_id = vocab.star_id,
            "vocabulary loaded"
        );

        let romanize = options.romanize && layout.supports_romanization();
        if options.romanize && !romanize {
            tracing::warn!(
                "romanization requested but the model carries a native alphabet; ignoring"
            );
        }

        // The pinyin table is only needed when romanizing; loaded once
        // here and immutable for the life of the process.
        let pinyin = if romanize {
            let path = options
                .pinyin_table
                .clone()
                .unwrap_or_else(|| model_dir.join("Chinese_to_Pinyin.txt"));
            tracing::info!(path = ?path.display(), "loading pinyin table");
            Some(PinyinTable::load(&path)?)
        } else {
            None
        };

        let model = AcousticModel::load(&layout.model_path, options.threads)?;

        Ok(Self {
            model,
            vocab,
            pinyin,
            options,
            romanize,
        })
    }

    /// Align `segments` against `audio`, overwriting their times and
    /// scores in place.
    ///
    /// Emissions are generated once; the mapper re-slices them for
    /// every recursive sub-batch.
    pub fn align(
        &mut self,
        audio: &[f32],
        segments: &mut [SubtitleSegment],
    ) -> Result<AlignOutcome> {
        let config = EmissionConfig {
            window_s: self.options.window_s,
            context_s: self.options.context_s,
            batch_size: self.options.batch_size,
            star_logp: self.options.star_logp,
        };
        let emissions = emissions::generate_emissions(&mut self.model, audio, &config)?;

        let expected = self.vocab.size_with_star();
        if emissions.classes() != expected {
            return Err(Error::Model(format!(
                "vocab size mismatch: emissions classes={}, vocab+star={expected} \
                 (check matching model and vocab files)",
                emissions.classes()
            )));
        }

        tracing::info!(
            frames = emissions.frames(),
            classes = emissions.classes(),
            stride_ms = emissions.stride_ms,
            "emissions ready"
        );

        let mut words = Vec::new();
        let ctx = AlignContext {
            emissions: &emissions,
            vocab: &self.vocab,
            language: &self.options.language,
            romanize: self.romanize,
            pinyin: self.pinyin.as_ref(),
        };
        mapper::align_segments(&ctx, segments, 0, emissions.frames(), &mut words)?;

        tracing::info!(words = words.len(), segments = segments.len(), "alignment done");

        Ok(AlignOutcome {
            words,
            frames: emissions.frames(),
            classes: emissions.classes(),
        })
    }

    /// Preprocess a transcript the way `align` would. Used by the debug
    /// artifact dump.
    pub fn preprocess(&self, full_text: &str) -> Preprocessed {
        preprocess::preprocess_text(
            full_text,
            &self.options.language,
            self.romanize,
            &self.vocab,
            self.pinyin.as_ref(),
        )
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Whether romanization is actually in effect for this model.
    pub fn romanizes(&self) -> bool {
        self.romanize
    }
}
