//! CLI argument definitions using clap.

use clap::Parser;
use eyre::{Result, bail};
use std::path::PathBuf;
use subalign_core::AlignOptions;

#[derive(Debug, Parser)]
#[command(name = "subalign")]
#[command(about = "Retime subtitles against audio with CTC forced alignment")]
#[command(version)]
pub struct Cli {
    /// Audio file path (16kHz mono WAV)
    #[arg(short, long)]
    pub audio: PathBuf,

    /// Model directory containing model.onnx (or model.int8.onnx) plus
    /// vocab.json or tokens.txt
    #[arg(short, long)]
    pub model: PathBuf,

    /// Input SRT file (required unless --json-input is given)
    #[arg(short, long, required_unless_present = "json_input")]
    pub srt: Option<PathBuf>,

    /// Output SRT path (default: <srt>_aligned.srt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON transcript input path, '-' for stdin
    #[arg(long, visible_alias = "ji")]
    pub json_input: Option<PathBuf>,

    /// JSON output path, '-' for stdout
    #[arg(long, visible_alias = "jo")]
    pub json_output: Option<PathBuf>,

    /// ISO 639-3 language code of the transcript
    #[arg(short, long, default_value = "eng")]
    pub language: String,

    /// Enable romanization (only honored for small-alphabet models)
    #[arg(short, long)]
    pub romanize: bool,

    /// Kanji-to-pinyin table path (default: <model>/Chinese_to_Pinyin.txt)
    #[arg(long)]
    pub pinyin_table: Option<PathBuf>,

    /// Inference batch size
    #[arg(short, long, default_value_t = 4)]
    pub batch_size: usize,

    /// ONNX intra-op threads (0 = max(4, hw_threads/2))
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Log-probability of the <star> catch-all column
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub star_logp: f32,

    /// Dump intermediate artifacts
    #[arg(short, long)]
    pub debug: bool,

    /// Debug output directory (default: <base>_debug)
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,
}

/// Where the transcript comes from. A JSON path of `-` means stdin.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptInput {
    Srt(PathBuf),
    Json(PathBuf),
}

/// Where the retimed transcript goes. A JSON path of `-` means stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptOutput {
    Srt(PathBuf),
    Json(PathBuf),
}

/// Resolved run configuration with all defaults applied.
#[derive(Debug)]
pub struct RunConfig {
    pub audio: PathBuf,
    pub model_dir: PathBuf,
    pub input: TranscriptInput,
    pub output: TranscriptOutput,
    pub options: AlignOptions,
    pub debug_dir: Option<PathBuf>,
}

impl TryFrom<Cli> for RunConfig {
    type Error = eyre::Error;

    fn try_from(cli: Cli) -> Result<Self> {
        let input = match (&cli.json_input, &cli.srt) {
            (Some(json), _) => TranscriptInput::Json(json.clone()),
            (None, Some(srt)) => TranscriptInput::Srt(srt.clone()),
            (None, None) => bail!("either --srt or --json-input is required"),
        };

        let output = if let Some(json) = &cli.json_output {
            TranscriptOutput::Json(json.clone())
        } else if let Some(path) = &cli.output {
            TranscriptOutput::Srt(path.clone())
        } else {
            match &input {
                TranscriptInput::Srt(srt) => {
                    TranscriptOutput::Srt(with_stem_suffix(srt, "_aligned.srt"))
                }
                // JSON in with no output target goes to stdout
                TranscriptInput::Json(_) => TranscriptOutput::Json(PathBuf::from("-")),
            }
        };

        let debug_dir = if cli.debug {
            Some(cli.debug_dir.unwrap_or_else(|| match &input {
                TranscriptInput::Srt(srt) => with_stem_suffix(srt, "_debug"),
                TranscriptInput::Json(_) => with_stem_suffix(&cli.audio, "_debug"),
            }))
        } else {
            None
        };

        let options = AlignOptions {
            language: cli.language,
            romanize: cli.romanize,
            pinyin_table: cli.pinyin_table,
            batch_size: cli.batch_size.max(1),
            threads: cli.threads,
            star_logp: cli.star_logp,
            ..AlignOptions::default()
        };

        Ok(Self {
            audio: cli.audio,
            model_dir: cli.model,
            input,
            output,
            options,
            debug_dir,
        })
    }
}

/// `dir/name.ext` -> `dir/name<suffix>` (the suffix carries its own
/// extension if one is wanted).
fn with_stem_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{stem}{suffix}"))
}
