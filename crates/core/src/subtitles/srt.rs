//! SubRip reading and writing.

use std::fmt::Write;
use std::time::Duration;

use super::error::SubtitleError;
use super::types::Cue;

/// Renders cues as SRT, numbering from 1.
pub fn write_srt(cues: &[Cue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        let _ = writeln!(out, "{}", i + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_timestamp(cue.start),
            format_timestamp(cue.end)
        );
        let _ = writeln!(out, "{}", cue.text.trim_end());
        out.push('\n');
    }
    out
}

/// Parses SRT text. Blocks without a timing line are ignored; a timing line
/// with a malformed timestamp is an error.
pub fn parse_srt(input: &str) -> Result<Vec<Cue>, SubtitleError> {
    let normalized = input.replace("\r\n", "\n");
    let mut cues = Vec::new();

    for block in normalized.split("\n\n") {
        let mut lines = block.lines().skip_while(|l| l.trim().is_empty());
        let mut timing = None;
        for line in lines.by_ref() {
            if line.contains("-->") {
                timing = Some(line);
                break;
            }
        }
        let Some(timing) = timing else {
            continue;
        };

        let (start, end) = timing
            .split_once("-->")
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timing.to_string()))?;
        // Position hints may follow the end time.
        let end = end.split_whitespace().next().unwrap_or_default();
        let start = parse_timestamp(start.trim())?;
        let end = parse_timestamp(end)?;

        let text = lines.collect::<Vec<_>>().join("\n");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        cues.push(Cue::new(start, end, text));
    }

    Ok(cues)
}

/// `HH:MM:SS,mmm`
pub fn format_timestamp(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = duration.subsec_millis();
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Accepts `HH:MM:SS,mmm` and the `.` separator some tools write.
pub fn parse_timestamp(value: &str) -> Result<Duration, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp(value.to_string());

    let (clock, millis) = value
        .split_once([',', '.'])
        .ok_or_else(invalid)?;
    let mut parts = clock.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid());
    };

    let h: u64 = h.trim().parse().map_err(|_| invalid())?;
    let m: u64 = m.parse().map_err(|_| invalid())?;
    let s: u64 = s.parse().map_err(|_| invalid())?;
    let ms: u64 = millis.trim().parse().map_err(|_| invalid())?;
    if m >= 60 || s >= 60 || ms >= 1000 {
        return Err(invalid());
    }

    Ok(Duration::from_millis(((h * 60 + m) * 60 + s) * 1000 + ms))
}
