//! Operator-facing output: live progress, dry-run plans and the batch summary.

use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

use oneshot_core::{BatchSummary, JobFailure, PreparedJob, ProgressSnapshot};

/// Prints progress lines until every sender is gone. A line is printed
/// whenever a job crosses another whole percent.
pub async fn show_progress(mut rx: mpsc::Receiver<ProgressSnapshot>) {
    let mut last: HashMap<String, u32> = HashMap::new();
    let mut stderr = std::io::stderr();

    while let Some(snapshot) = rx.recv().await {
        let percent = snapshot.percent.floor() as u32;
        if last.get(&snapshot.job_id) == Some(&percent) {
            continue;
        }
        last.insert(snapshot.job_id.clone(), percent);

        let speed = snapshot
            .speed
            .map(|s| format!(" {:.2}x", s))
            .unwrap_or_default();
        let size = snapshot
            .size_bytes
            .map(|b| format!(" {:.1} MB", b as f64 / (1024.0 * 1024.0)))
            .unwrap_or_default();
        let _ = write!(stderr, "\r{:>5.1}%{}{}   ", snapshot.percent, speed, size);
        if percent >= 100 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

pub fn print_summary(summary: &BatchSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!();
    println!("Succeeded: {}", summary.succeeded_count());
    for job in summary.succeeded() {
        let output = job
            .output_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let encoder = job
            .encoder
            .map(|e| e.to_string())
            .unwrap_or_else(|| "copy".to_string());
        println!("  {} -> {} [{}]", job.input.display(), output, encoder);
    }

    println!("Failed: {}", summary.failed_count());
    for job in summary.failed() {
        if let Some(ref failure) = job.failure {
            println!("  {}: {}", job.input.display(), failure);
        }
    }

    let skipped: Vec<_> = summary.skipped_subtitles().collect();
    if !skipped.is_empty() {
        println!("Skipped subtitle tracks: {}", skipped.len());
        for (input, track) in skipped {
            println!(
                "  {}: stream {} ({}) {:?}",
                input.display(),
                track.stream_index,
                track.language,
                track.reason
            );
        }
    }

    if !summary.not_started.is_empty() {
        println!("Not started: {}", summary.not_started.len());
        for input in &summary.not_started {
            println!("  {}", input.display());
        }
    }
    Ok(())
}

pub fn print_dry_run(planned: &[(PathBuf, Result<PreparedJob, JobFailure>)], json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = planned
            .iter()
            .map(|(input, result)| match result {
                Ok(prepared) => serde_json::json!({ "input": input, "plan": prepared }),
                Err(failure) => serde_json::json!({ "input": input, "failure": failure }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for (input, result) in planned {
        println!("{}", input.display());
        match result {
            Ok(prepared) => {
                let job = &prepared.job;
                println!("  mode:     {}", job.mode);
                if let Some(title) = job.metadata.display_title() {
                    println!("  title:    {}", title);
                }
                if let Some(bps) = job.video_bitrate_bps {
                    println!("  bitrate:  {} kb/s", bps / 1000);
                }
                if let Some(encoder) = job.encoder_kind() {
                    println!("  encoder:  {}", encoder);
                }
                println!("  output:   {}", job.output_path.display());
                println!("  command:  {}", shell_join(&prepared.command_line));
                for event in prepared.diagnostics.events() {
                    println!("  note:     {}", event.message);
                }
            }
            Err(failure) => println!("  error:    {}", failure),
        }
    }
    Ok(())
}

/// Joins argv for display, quoting arguments that need it.
fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if !arg.is_empty()
                && arg
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+".contains(c))
            {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', r"'\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_join_quotes_spaces() {
        let argv = vec![
            "ffmpeg".to_string(),
            "-i".to_string(),
            "/in/Movie (2020).mkv".to_string(),
            "-metadata".to_string(),
            "title=It's".to_string(),
        ];
        assert_eq!(
            shell_join(&argv),
            r"ffmpeg -i '/in/Movie (2020).mkv' -metadata 'title=It'\''s'"
        );
    }

    #[test]
    fn test_shell_join_empty_argument() {
        assert_eq!(shell_join(&["".to_string()]), "''");
    }
}
