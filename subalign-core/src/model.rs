//! Model directory detection and the ONNX-backed frame oracle.

use crate::emissions::FrameOracle;
use crate::error::{Error, Result};
use crate::vocab::Vocabulary;
use ndarray::{Array2, Axis, Ix3};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use std::path::{Path, PathBuf};

/// Model family, decided by which vocabulary file the directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// `vocab.json`: Wav2Vec2-CTC with a ~31-token Latin alphabet;
    /// non-Latin scripts must be romanized
    Mms,
    /// `tokens.txt`: FastConformer-CTC with a ~9812-token alphabet and
    /// native CJK support
    Omnilingual,
}

/// Resolved paths inside a model directory.
#[derive(Debug, Clone)]
pub struct ModelLayout {
    pub kind: ModelKind,
    pub model_path: PathBuf,
    pub vocab_path: PathBuf,
}

impl ModelLayout {
    /// Detect the model family from the directory contents.
    ///
    /// `vocab.json` wins over `tokens.txt`; `model.int8.onnx` wins over
    /// `model.onnx`.
    pub fn detect(model_dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        let vocab_json = model_dir.join("vocab.json");
        let tokens_txt = model_dir.join("tokens.txt");
        let (kind, vocab_path) = if vocab_json.exists() {
            (ModelKind::Mms, vocab_json)
        } else if tokens_txt.exists() {
            (ModelKind::Omnilingual, tokens_txt)
        } else {
            return Err(Error::ModelLayout {
                dir: model_dir.to_path_buf(),
                message: "no vocab.json or tokens.txt found".to_string(),
            });
        };

        let int8 = model_dir.join("model.int8.onnx");
        let plain = model_dir.join("model.onnx");
        let model_path = if int8.exists() {
            int8
        } else if plain.exists() {
            plain
        } else {
            return Err(Error::ModelLayout {
                dir: model_dir.to_path_buf(),
                message: "no model file found (expected model.onnx or model.int8.onnx)"
                    .to_string(),
            });
        };

        Ok(Self {
            kind,
            model_path,
            vocab_path,
        })
    }

    /// Load the vocabulary in the format this layout implies.
    pub fn load_vocabulary(&self) -> Result<Vocabulary> {
        match self.kind {
            ModelKind::Mms => Vocabulary::from_json_file(&self.vocab_path),
            ModelKind::Omnilingual => Vocabulary::from_tokens_file(&self.vocab_path),
        }
    }

    /// Whether this family needs romanized input for non-Latin scripts.
    pub fn supports_romanization(&self) -> bool {
        matches!(self.kind, ModelKind::Mms)
    }

    pub fn describe(&self) -> &'static str {
        match self.kind {
            ModelKind::Mms => "MMS (Wav2Vec2-CTC, romanized alphabet)",
            ModelKind::Omnilingual => "Omnilingual (FastConformer-CTC, native CJK)",
        }
    }
}

/// One ONNX session treated as an opaque frame-logits oracle.
///
/// Input is rank-2 `[1, samples]` f32, output rank-3 `[1, frames,
/// classes]` f32 logits; both tensor names are taken from the model
/// itself.
pub struct AcousticModel {
    session: Session,
    input_name: String,
    output_name: String,
}

impl AcousticModel {
    /// Build a session for the model file.
    ///
    /// `intra_threads = 0` picks the default of `max(4, hw_threads/2)`;
    /// inter-op parallelism stays at 1 for cache locality.
    pub fn load(model_path: impl AsRef<Path>, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();
        let threads = if intra_threads == 0 {
            Self::default_intra_threads()
        } else {
            intra_threads
        };

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)?
            .with_intra_threads(threads)
            .map_err(ort::Error::<()>::from)?
            .with_inter_threads(1)
            .map_err(ort::Error::<()>::from)?
            .commit_from_file(model_path)?;

        tracing::info!(threads, model = ?model_path.display(), "acoustic model loaded");

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or_else(|| Error::Model("model has no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| Error::Model("model has no outputs".to_string()))?;

        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }

    pub fn default_intra_threads() -> usize {
        let hw = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        4.max(hw.div_ceil(2))
    }
}

impl FrameOracle for AcousticModel {
    fn frame_logits(&mut self, chunk: &[f32]) -> Result<Array2<f32>> {
        let input = Array2::from_shape_vec((1, chunk.len()), chunk.to_vec())
            .map_err(|e| Error::Model(format!("bad input shape: {e}")))?;
        let input = ort::value::Tensor::from_array(input)?;

        let mut outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input])?;

        let logits = outputs
            .remove(self.output_name.as_str())
            .ok_or_else(|| Error::Model(format!("missing output {:?}", self.output_name)))?;

        let logits = logits
            .try_extract_array::<f32>()?
            .to_owned()
            .into_dimensionality::<Ix3>()
            .map_err(|_| {
                Error::Model("unexpected logits rank (want [1, frames, classes])".to_string())
            })?;

        if logits.shape()[0] != 1 {
            return Err(Error::Model(format!(
                "unexpected logits batch dimension {}",
                logits.shape()[0]
            )));
        }

        Ok(logits.index_axis_move(Axis(0), 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dir(name: &str, files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        for f in files {
            std::fs::write(dir.join(f), "x").unwrap();
        }
        dir
    }

    #[test]
    fn vocab_json_selects_mms() {
        let dir = make_dir("subalign_model_mms", &["vocab.json", "model.onnx"]);

        let layout = ModelLayout::detect(&dir).unwrap();

        assert_eq!(layout.kind, ModelKind::Mms);
        assert!(layout.supports_romanization());
        assert!(layout.vocab_path.ends_with("vocab.json"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn tokens_txt_selects_omnilingual_and_prefers_int8() {
        let dir = make_dir(
            "subalign_model_omni",
            &["tokens.txt", "model.onnx", "model.int8.onnx"],
        );

        let layout = ModelLayout::detect(&dir).unwrap();

        assert_eq!(layout.kind, ModelKind::Omnilingual);
        assert!(!layout.supports_romanization());
        assert!(layout.model_path.ends_with("model.int8.onnx"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_vocab_is_fatal() {
        let dir = make_dir("subalign_model_novocab", &["model.onnx"]);

        assert!(matches!(
            ModelLayout::detect(&dir),
            Err(Error::ModelLayout { .. })
        ));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_model_file_is_fatal() {
        let dir = make_dir("subalign_model_noonnx", &["vocab.json"]);

        assert!(matches!(
            ModelLayout::detect(&dir),
            Err(Error::ModelLayout { .. })
        ));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn default_threads_floor_is_four() {
        assert!(AcousticModel::default_intra_threads() >= 4);
    }
}
