//! Run orchestration: read transcript, align, write output.

use crate::cli::{RunConfig, TranscriptInput, TranscriptOutput};
use crate::{debug, jsonio, srt};
use eyre::{Context, Result};
use std::io::Read;
use std::time::Instant;
use subalign_core::{Pipeline, SubtitleSegment, audio};

pub fn execute(config: RunConfig) -> Result<()> {
    let started = Instant::now();

    let mut segments = read_segments(&config)?;
    tracing::info!(segments = segments.len(), "transcript loaded");

    let original_segments = config.debug_dir.as_ref().map(|_| segments.clone());

    let samples = audio::read_audio_mono(&config.audio)
        .wrap_err_with(|| format!("failed to load audio: {:?}", config.audio.display()))?;
    let audio_duration = audio::duration_secs(&samples);
    tracing::info!(
        samples = samples.len(),
        seconds = %format!("{audio_duration:.1}"),
        "audio loaded"
    );

    let mut pipeline = Pipeline::load(&config.model_dir, config.options.clone())
        .wrap_err_with(|| format!("failed to load model: {:?}", config.model_dir.display()))?;

    let outcome = pipeline.align(&samples, &mut segments)?;
    let processing_time = started.elapsed().as_secs_f64();

    write_segments(&config, &segments, processing_time)?;

    if let Some(dir) = &config.debug_dir {
        let full_text = segments
            .iter()
            .map(SubtitleSegment::normalized_text)
            .collect::<Vec<_>>()
            .join(" ");
        let prep = pipeline.preprocess(&full_text);
        let srt_path = match &config.input {
            TranscriptInput::Srt(path) => Some(path.as_path()),
            TranscriptInput::Json(_) => None,
        };
        let report = debug::DebugReport {
            audio_path: &config.audio,
            srt_path,
            language: &config.options.language,
            romanize: pipeline.romanizes(),
            audio_duration,
            original_segments: original_segments.as_deref().unwrap_or_default(),
            aligned_segments: &segments,
            prep: &prep,
            words: &outcome.words,
            processing_time,
        };
        debug::write_artifacts(dir, &report)?;
        tracing::info!(dir = ?dir.display(), "debug artifacts written");
    }

    Ok(())
}

fn read_segments(config: &RunConfig) -> Result<Vec<SubtitleSegment>> {
    match &config.input {
        TranscriptInput::Srt(path) => srt::read_srt(path),
        TranscriptInput::Json(path) => {
            if path.as_os_str() == "-" {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .wrap_err("failed to read stdin")?;
                jsonio::parse_transcript(&content)
            } else {
                jsonio::read_transcript(path)
            }
        }
    }
}

fn write_segments(
    config: &RunConfig,
    segments: &[SubtitleSegment],
    processing_time: f64,
) -> Result<()> {
    match &config.output {
        TranscriptOutput::Srt(path) => {
            srt::write_srt(path, segments)?;
            tracing::info!(path = ?path.display(), "wrote aligned srt");
        }
        TranscriptOutput::Json(path) => {
            if path.as_os_str() == "-" {
                print!("{}", jsonio::format_output(segments, processing_time));
            } else {
                jsonio::write_output(path, segments, processing_time)?;
                tracing::info!(path = ?path.display(), "wrote aligned json");
            }
        }
    }
    Ok(())
}
