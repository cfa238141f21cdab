//! Intermediate artifact dumping for `--debug` runs.

use eyre::{Context, Result};
use serde_json::json;
use std::path::Path;
use subalign_core::preprocess::Preprocessed;
use subalign_core::{SubtitleSegment, WordTimestamp};

/// Everything the artifact dump needs from the finished run.
pub struct DebugReport<'a> {
    pub audio_path: &'a Path,
    pub srt_path: Option<&'a Path>,
    pub language: &'a str,
    pub romanize: bool,
    pub audio_duration: f64,
    pub original_segments: &'a [SubtitleSegment],
    pub aligned_segments: &'a [SubtitleSegment],
    pub prep: &'a Preprocessed,
    pub words: &'a [WordTimestamp],
    pub processing_time: f64,
}

/// Write the numbered artifact files into `dir`.
///
/// `alignment.log` is not written here; the logging layer streams into
/// it for the whole run.
pub fn write_artifacts(dir: &Path, report: &DebugReport) -> Result<()> {
    std::fs::create_dir_all(dir)
        .wrap_err_with(|| format!("failed to create debug dir: {:?}", dir.display()))?;

    let summary = json!({
        "audio_path": report.audio_path.display().to_string(),
        "srt_path": report.srt_path.map(|p| p.display().to_string()).unwrap_or_default(),
        "language": report.language,
        "romanize": report.romanize,
        "audio_duration": report.audio_duration,
        "num_segments": report.aligned_segments.len(),
        "num_words": report.words.len(),
        "processing_time": report.processing_time,
    });

    write_json(dir, "00_summary.json", &summary)?;
    write_json(
        dir,
        "01_original_segments.json",
        &serde_json::to_value(report.original_segments)?,
    )?;
    std::fs::write(dir.join("02_full_text.txt"), &report.prep.full_text)
        .wrap_err("failed to write 02_full_text.txt")?;
    write_json(
        dir,
        "03_tokens_starred.json",
        &serde_json::to_value(&report.prep.tokens_starred)?,
    )?;
    write_json(
        dir,
        "04_text_starred.json",
        &serde_json::to_value(&report.prep.text_starred)?,
    )?;
    write_json(
        dir,
        "05_word_timestamps.json",
        &serde_json::to_value(report.words)?,
    )?;
    write_json(
        dir,
        "06_aligned_segments.json",
        &serde_json::to_value(report.aligned_segments)?,
    )?;

    Ok(())
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    std::fs::write(dir.join(name), content).wrap_err_with(|| format!("failed to write {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_all_numbered_artifacts() {
        let dir = std::env::temp_dir().join("subalign_debug_artifacts");
        std::fs::remove_dir_all(&dir).ok();

        let prep = Preprocessed {
            tokens_starred: vec!["<star>".to_string(), "h i".to_string()],
            text_starred: vec!["<star>".to_string(), "hi".to_string()],
            full_text: "hi".to_string(),
        };
        let segments = vec![SubtitleSegment::new(1, 0.0, 1.0, "hi")];
        let words = vec![WordTimestamp {
            text: "hi".to_string(),
            start_s: 0.1,
            end_s: 0.4,
            score: -2.0,
        }];
        let report = DebugReport {
            audio_path: Path::new("a.wav"),
            srt_path: Some(Path::new("a.srt")),
            language: "eng",
            romanize: false,
            audio_duration: 1.0,
            original_segments: &segments,
            aligned_segments: &segments,
            prep: &prep,
            words: &words,
            processing_time: 0.25,
        };

        write_artifacts(&dir, &report).unwrap();

        for name in [
            "00_summary.json",
            "01_original_segments.json",
            "02_full_text.txt",
            "03_tokens_starred.json",
            "04_text_starred.json",
            "05_word_timestamps.json",
            "06_aligned_segments.json",
        ] {
            assert!(dir.join(name).exists(), "missing artifact {name}");
        }

        let summary: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("00_summary.json")).unwrap())
                .unwrap();
        assert_eq!(summary["num_words"], 1);
        assert_eq!(summary["language"], "eng");

        std::fs::remove_dir_all(&dir).ok();
    }
}
