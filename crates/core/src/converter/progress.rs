//! Parsing of ffmpeg progress output.
//!
//! ffmpeg run with `-progress pipe:1` writes blocks of `key=value` lines, each
//! block terminated by `progress=continue` or `progress=end`. Older builds and
//! `-stats` output print a single line carrying `time=`, `size=` and `speed=`
//! together. Both shapes are accepted. Missing fields stay unset and lines
//! that cannot be parsed are ignored.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A point-in-time view of a running encode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub job_id: String,
    /// 0.0 to 100.0, based on the input duration.
    pub percent: f32,
    /// Media time encoded so far.
    pub position_secs: f64,
    /// Wall-clock time since the process started.
    pub elapsed_secs: f64,
    pub size_bytes: Option<u64>,
    /// Encode speed relative to realtime.
    pub speed: Option<f32>,
}

/// One parsed progress record, before job context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub percent: f32,
    pub position_secs: f64,
    pub size_bytes: Option<u64>,
    pub speed: Option<f32>,
    /// The process reported `progress=end`.
    pub finished: bool,
}

impl ProgressRecord {
    pub fn into_snapshot(self, job_id: &str, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            job_id: job_id.to_string(),
            percent: self.percent,
            position_secs: self.position_secs,
            elapsed_secs: elapsed.as_secs_f64(),
            size_bytes: self.size_bytes,
            speed: self.speed,
        }
    }
}

/// Incremental parser, one per process invocation.
pub struct ProgressParser {
    duration_secs: f64,
    position_secs: f64,
    size_bytes: Option<u64>,
    speed: Option<f32>,
    pair_regex: Option<Regex>,
}

impl ProgressParser {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            position_secs: 0.0,
            size_bytes: None,
            speed: None,
            pair_regex: Regex::new(r"([a-z_]+)=\s*(\S+)").ok(),
        }
    }

    /// Feeds one output line. Returns a record when the line completes one.
    pub fn feed(&mut self, line: &str) -> Option<ProgressRecord> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if line.matches('=').count() > 1 {
            return self.feed_stats_line(line);
        }

        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        match key.trim() {
            // Both are microseconds despite the name.
            "out_time_us" | "out_time_ms" => {
                if let Some(us) = value.parse::<i64>().ok().filter(|us| *us >= 0) {
                    self.position_secs = us as f64 / 1_000_000.0;
                }
            }
            "out_time" => {
                if let Some(secs) = parse_clock(value) {
                    self.position_secs = secs;
                }
            }
            "total_size" => {
                if let Ok(bytes) = value.parse::<u64>() {
                    self.size_bytes = Some(bytes);
                }
            }
            "speed" => {
                if let Some(speed) = parse_speed(value) {
                    self.speed = Some(speed);
                }
            }
            "progress" => return Some(self.record(value == "end")),
            _ => {}
        }
        None
    }

    fn feed_stats_line(&mut self, line: &str) -> Option<ProgressRecord> {
        let re = self.pair_regex.as_ref()?;
        let mut saw_time = false;
        for caps in re.captures_iter(line) {
            let (Some(key), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            match key.as_str() {
                "time" => {
                    if let Some(secs) = parse_clock(value.as_str()) {
                        self.position_secs = secs;
                        saw_time = true;
                    }
                }
                "size" | "Lsize" => {
                    if let Some(bytes) = parse_size(value.as_str()) {
                        self.size_bytes = Some(bytes);
                    }
                }
                "speed" => {
                    if let Some(speed) = parse_speed(value.as_str()) {
                        self.speed = Some(speed);
                    }
                }
                _ => {}
            }
        }
        saw_time.then(|| self.record(false))
    }

    fn record(&self, finished: bool) -> ProgressRecord {
        let percent = if finished {
            100.0
        } else if self.duration_secs > 0.0 {
            (self.position_secs / self.duration_secs * 100.0).clamp(0.0, 100.0) as f32
        } else {
            0.0
        };

        ProgressRecord {
            percent,
            position_secs: self.position_secs,
            size_bytes: self.size_bytes,
            speed: self.speed,
            finished,
        }
    }
}

/// Parses `HH:MM:SS(.frac)` or plain seconds.
pub fn parse_clock(value: &str) -> Option<f64> {
    if value.starts_with('-') {
        return None;
    }
    let parts: Vec<&str> = value.split(':').collect();
    match parts.as_slice() {
        [h, m, s] => {
            let h = h.parse::<f64>().ok()?;
            let m = m.parse::<f64>().ok()?;
            let s = s.parse::<f64>().ok()?;
            Some(h * 3600.0 + m * 60.0 + s)
        }
        [secs] => secs.parse::<f64>().ok(),
        _ => None,
    }
}

/// Parses `1.25x`. `N/A` yields `None`.
fn parse_speed(value: &str) -> Option<f32> {
    value.trim().trim_end_matches('x').parse::<f32>().ok()
}

/// Parses stats sizes such as `1024kB` or `2048KiB`. Values that do not fit
/// in a `u64` are treated as malformed.
fn parse_size(value: &str) -> Option<u64> {
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number = number.parse::<u64>().ok()?;
    let multiplier = match unit {
        "" | "B" => 1,
        "kB" | "KiB" => 1024,
        "MB" | "MiB" => 1024 * 1024,
        "GB" | "GiB" => 1024 * 1024 * 1024,
        _ => return None,
    };
    number.checked_mul(multiplier)
}
