//! SRT subtitle reading and writing.
//!
//! Reads standard `idx / HH:MM:SS,mmm --> HH:MM:SS,mmm / text` blocks
//! (UTF-8, optional BOM). `{score: N.NNN}` lines left by a previous
//! pass are skipped on read and re-emitted after each block's text on
//! write. Timestamps are truncated, not rounded, to milliseconds.

use eyre::{Context, Result};
use srtlib::{Subtitle, Timestamp};
use std::path::Path;
use subalign_core::SubtitleSegment;

/// Parse SRT content into segments.
pub fn parse_srt(content: &str) -> Vec<SubtitleSegment> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut segments = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || !line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let index: usize = line.parse().unwrap_or(0);

        let Some(time_line) = lines.next() else { break };
        let time_line = time_line.trim_end_matches('\r');
        let Some((a, b)) = time_line.split_once("-->") else {
            continue;
        };
        let start = parse_time(a.trim());
        let end = parse_time(b.trim());

        let mut text = String::new();
        for text_line in lines.by_ref() {
            let text_line = text_line.trim_end_matches('\r');
            if text_line.is_empty() {
                break;
            }
            if is_score_line(text_line) {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(text_line);
        }

        segments.push(SubtitleSegment::new(index, start, end, text));
    }

    segments
}

pub fn read_srt(path: impl AsRef<Path>) -> Result<Vec<SubtitleSegment>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read srt: {:?}", path.display()))?;
    Ok(parse_srt(&content))
}

/// Format segments as SRT blocks, each followed by its score line.
pub fn format_srt(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        let index = if seg.index != 0 { seg.index } else { i + 1 };
        let subtitle = Subtitle::new(
            index,
            to_timestamp(seg.start_s),
            to_timestamp(seg.end_s),
            seg.text.clone(),
        );
        out.push_str(&subtitle.to_string());
        out.push_str(&format!("\n{{score: {:.3}}}\n\n", seg.score));
    }
    out
}

pub fn write_srt(path: impl AsRef<Path>, segments: &[SubtitleSegment]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, format_srt(segments))
        .wrap_err_with(|| format!("failed to write srt: {:?}", path.display()))
}

/// Parse `HH:MM:SS,mmm`; malformed input reads as 0.0 rather than
/// failing the whole file.
fn parse_time(s: &str) -> f64 {
    let s: String = s.split_ascii_whitespace().collect();
    let Some((clock, ms)) = s.split_once(',') else {
        return 0.0;
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let [hh, mm, ss] = parts[..] else {
        return 0.0;
    };
    let (Ok(hh), Ok(mm), Ok(ss), Ok(ms)) = (
        hh.parse::<u32>(),
        mm.parse::<u32>(),
        ss.parse::<u32>(),
        ms.parse::<u32>(),
    ) else {
        return 0.0;
    };
    f64::from(hh) * 3600.0 + f64::from(mm) * 60.0 + f64::from(ss) + f64::from(ms) / 1000.0
}

/// Truncate seconds to an SRT timestamp.
fn to_timestamp(sec: f64) -> Timestamp {
    let sec = sec.max(0.0);
    let hours = (sec / 3600.0) as u8;
    let rem = sec - f64::from(hours) * 3600.0;
    let minutes = (rem / 60.0) as u8;
    let rem = rem - f64::from(minutes) * 60.0;
    let seconds = rem as u8;
    let millis = ((rem - f64::from(seconds)) * 1000.0) as u16;
    Timestamp::new(hours, minutes, seconds, millis)
}

/// `{score: N.NNN}` lines carry a previous pass's confidence.
fn is_score_line(line: &str) -> bool {
    line.strip_prefix("{score:")
        .and_then(|rest| rest.strip_suffix('}'))
        .is_some_and(|value| value.trim().parse::<f64>().is_ok())
}
