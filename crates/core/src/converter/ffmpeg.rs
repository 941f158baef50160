//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use super::config::ConverterConfig;
use super::encoder::EncoderKind;
use super::error::TranscoderError;
use super::progress::{ProgressParser, ProgressSnapshot};
use super::traits::Transcoder;
use super::types::{
    Disposition, MediaFile, StreamDescriptor, StreamKind, TranscodeJob, TranscodeMode,
    TranscodeOutcome,
};
use crate::cancel::CancelSignal;
use crate::streams::is_hevc;

/// Lines of ffmpeg's stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// How long ffmpeg gets to finalize the output after being asked to quit.
const CANCEL_GRACE: Duration = Duration::from_secs(30);

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: ConverterConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for one encode attempt.
    pub fn build_args(&self, job: &TranscodeJob) -> Result<Vec<String>, TranscoderError> {
        let selection = &job.selection;
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            self.config.ffmpeg_log_level.clone(),
            "-nostats".into(),
            "-progress".into(),
            "pipe:1".into(),
            "-y".into(),
            "-i".into(),
            job.media.path.to_string_lossy().to_string(),
        ];

        // Converted subtitles come in as extra inputs 1..n
        for generated in &job.generated_subtitles {
            args.extend(["-i".into(), generated.path.to_string_lossy().to_string()]);
        }

        // Stream mapping
        args.extend(["-map".into(), format!("0:{}", selection.video.index)]);
        if let Some(ref audio) = selection.audio {
            args.extend(["-map".into(), format!("0:{}", audio.index)]);
        }
        let text_tracks: Vec<_> = selection.text_tracks().collect();
        for track in &text_tracks {
            args.extend(["-map".into(), format!("0:{}", track.stream.index)]);
        }
        for (i, _) in job.generated_subtitles.iter().enumerate() {
            args.extend(["-map".into(), format!("{}:s:0", i + 1)]);
        }

        // Video
        match job.mode {
            TranscodeMode::Transcode => {
                let encoder = job
                    .encoder_kind()
                    .ok_or_else(|| TranscoderError::invalid_job("transcode job has no encoder"))?;
                let bitrate = job.video_bitrate_bps.ok_or_else(|| {
                    TranscoderError::invalid_job("transcode job has no planned bitrate")
                })?;
                args.extend([
                    "-c:v:0".into(),
                    encoder.ffmpeg_name().into(),
                    "-b:v:0".into(),
                    format!("{}k", bitrate / 1000),
                ]);
                args.extend(encoder.codec_args(&self.config.cpu_preset));
                args.extend(["-tag:v:0".into(), "hvc1".into()]);
            }
            TranscodeMode::Rewrap => {
                args.extend(["-c:v:0".into(), "copy".into()]);
                if is_hevc(&selection.video.codec_name) {
                    args.extend(["-tag:v:0".into(), "hvc1".into()]);
                }
            }
        }

        // Audio
        if selection.audio.is_some() {
            match job.mode {
                TranscodeMode::Transcode => args.extend([
                    "-c:a".into(),
                    "aac".into(),
                    "-b:a".into(),
                    format!("{}k", job.audio_bitrate_kbps),
                ]),
                TranscodeMode::Rewrap => args.extend(["-c:a".into(), "copy".into()]),
            }
        }

        // Subtitles, passthrough text first, then converted
        let languages: Vec<&str> = text_tracks
            .iter()
            .map(|t| t.language.as_str())
            .chain(job.generated_subtitles.iter().map(|g| g.language.as_str()))
            .collect();
        if languages.is_empty() {
            args.push("-sn".into());
        } else {
            args.extend(["-c:s".into(), "mov_text".into()]);
            for (i, language) in languages.iter().enumerate() {
                args.extend([format!("-metadata:s:s:{}", i), format!("language={}", language)]);
            }
        }

        // Metadata
        args.extend(job.metadata.to_ffmpeg_args());

        // Extra args
        args.extend(self.config.extra_ffmpeg_args.iter().cloned());

        // Output
        args.extend([
            "-f".into(),
            "mp4".into(),
            "-movflags".into(),
            "+faststart".into(),
            job.output_path.to_string_lossy().to_string(),
        ]);

        Ok(args)
    }

    /// Arguments for encoding a few black frames with `encoder`.
    fn trial_args(&self, encoder: EncoderKind) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "color=c=black:s=256x256:r=25:d=0.2",
            "-frames:v",
            "5",
            "-c:v",
            encoder.ffmpeg_name(),
        ]
        .into_iter()
        .map(String::from)
        .collect();
        args.extend(encoder.codec_args(&self.config.cpu_preset));
        args.extend(["-f", "null", "-"].into_iter().map(String::from));
        args
    }

    /// Arguments for copying one subtitle stream out of the input.
    fn extract_args(input: &Path, stream: &StreamDescriptor, dest: &Path) -> Vec<String> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.to_string_lossy().to_string(),
            "-map".into(),
            format!("0:{}", stream.index),
            "-c:s".into(),
            "copy".into(),
            dest.to_string_lossy().to_string(),
        ]
    }

    /// Parses ffprobe JSON output into a MediaFile.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaFile, TranscoderError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: Option<ProbeFormat>,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            index: u32,
            codec_type: Option<String>,
            codec_name: Option<String>,
            #[serde(default)]
            tags: ProbeTags,
            #[serde(default)]
            disposition: ProbeDisposition,
        }

        #[derive(Deserialize, Default)]
        struct ProbeTags {
            language: Option<String>,
            title: Option<String>,
        }

        #[derive(Deserialize, Default)]
        struct ProbeDisposition {
            #[serde(default)]
            default: u8,
            #[serde(default)]
            forced: u8,
            #[serde(default)]
            attached_pic: u8,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| TranscoderError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .and_then(|f| f.duration)
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(0.0);

        let streams = probe
            .streams
            .into_iter()
            .map(|s| StreamDescriptor {
                index: s.index,
                kind: StreamKind::from_codec_type(s.codec_type.as_deref().unwrap_or_default()),
                codec_name: s.codec_name.unwrap_or_else(|| "unknown".to_string()),
                language: s.tags.language.filter(|l| !l.is_empty()),
                title: s.tags.title,
                disposition: Disposition {
                    default: s.disposition.default != 0,
                    forced: s.disposition.forced != 0,
                    attached_pic: s.disposition.attached_pic != 0,
                },
            })
            .collect();

        Ok(MediaFile {
            path: path.to_path_buf(),
            duration_secs,
            streams,
        })
    }

    fn ffmpeg_spawn_error(&self, e: std::io::Error) -> TranscoderError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscoderError::FfmpegNotFound {
                path: self.config.ffmpeg_path.clone(),
            }
        } else {
            TranscoderError::Io(e)
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaFile, TranscoderError> {
        if !path.exists() {
            return Err(TranscoderError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscoderError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscoderError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscoderError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn trial_encode(&self, encoder: EncoderKind) -> Result<(), TranscoderError> {
        debug!(encoder = %encoder, "Trial encode");
        let output = Command::new(&self.config.ffmpeg_path)
            .args(self.trial_args(encoder))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(TranscoderError::process_failed(
                Some(encoder),
                output.status.code(),
                (!stderr.is_empty()).then_some(stderr),
            ))
        }
    }

    async fn extract_subtitle(
        &self,
        input: &Path,
        stream: &StreamDescriptor,
        dest: &Path,
    ) -> Result<(), TranscoderError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .args(Self::extract_args(input, stream, dest))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        if !output.status.success() {
            return Err(TranscoderError::ExtractionFailed {
                index: stream.index,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !dest.exists() {
            return Err(TranscoderError::ExtractionFailed {
                index: stream.index,
                reason: format!("{} was not written", dest.display()),
            });
        }
        Ok(())
    }

    async fn run(
        &self,
        job: &TranscodeJob,
        progress_tx: Option<mpsc::Sender<ProgressSnapshot>>,
        cancel: &CancelSignal,
    ) -> Result<TranscodeOutcome, TranscoderError> {
        let args = self.build_args(job)?;

        // Ensure output directory exists
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|_| {
                TranscoderError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                }
            })?;
        }

        let start = Instant::now();
        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.ffmpeg_spawn_error(e))?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(TranscoderError::Io(std::io::Error::other(
                "ffmpeg output pipes not captured",
            )));
        };
        let mut stdin = child.stdin.take();

        // Progress is read on its own task so a stalled pipe never delays
        // noticing process exit.
        let job_id = job.job_id.clone();
        let duration_secs = job.media.duration_secs;
        let progress_task = tokio::spawn(async move {
            let mut parser = ProgressParser::new(duration_secs);
            let mut lines = BufReader::new(stdout).lines();
            let mut last = None;
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(record) = parser.feed(&line) {
                    let snapshot = record.into_snapshot(&job_id, start.elapsed());
                    if let Some(ref tx) = progress_tx {
                        // Non-blocking send
                        let _ = tx.try_send(snapshot.clone());
                    }
                    last = Some(snapshot);
                }
            }
            last
        });

        let stderr_task = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Vec::from(tail).join("\n")
        });

        let exited = tokio::select! {
            status = child.wait() => Some(status?),
            _ = cancel.cancelled() => None,
        };
        let Some(status) = exited else {
            info!(job_id = %job.job_id, "Asking ffmpeg to stop");
            let asked = match stdin.as_mut() {
                Some(pipe) => pipe.write_all(b"q\n").await.is_ok(),
                None => false,
            };
            if !asked {
                let _ = child.start_kill();
            }
            if timeout(CANCEL_GRACE, child.wait()).await.is_err() {
                warn!(job_id = %job.job_id, "ffmpeg did not stop in time, killing it");
                let _ = child.kill().await;
            }
            return Err(TranscoderError::Cancelled);
        };
        drop(stdin);

        let last_progress = progress_task.await.ok().flatten();
        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(TranscoderError::process_failed(
                job.encoder_kind(),
                status.code(),
                (!stderr_tail.is_empty()).then_some(stderr_tail),
            ));
        }

        // Verify output exists and get size
        let output_meta = tokio::fs::metadata(&job.output_path).await.map_err(|_| {
            TranscoderError::OutputMissing {
                path: job.output_path.clone(),
            }
        })?;

        Ok(TranscodeOutcome {
            job_id: job.job_id.clone(),
            output_path: job.output_path.clone(),
            output_size_bytes: output_meta.len(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            encoder: job.encoder_kind(),
            last_progress,
        })
    }

    fn command_line(&self, job: &TranscodeJob) -> Result<Vec<String>, TranscoderError> {
        let mut argv = vec![self.config.ffmpeg_path.to_string_lossy().to_string()];
        argv.extend(self.build_args(job)?);
        Ok(argv)
    }

    async fn validate(&self) -> Result<(), TranscoderError> {
        // Check ffmpeg exists
        if let Err(e) = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
        {
            return Err(self.ffmpeg_spawn_error(e));
        }

        // Check ffprobe exists
        let ffprobe_result = Command::new(&self.config.ffprobe_path)
            .arg("-version")
            .output()
            .await;

        if let Err(e) = ffprobe_result {
            if e.kind() == std::io::ErrorKind::NotFound {
                return Err(TranscoderError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                });
            }
            return Err(TranscoderError::Io(e));
        }

        // Ensure temp dir exists
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{Availability, EncoderCandidate};
    use crate::subtitles::GeneratedSubtitle;
    use crate::testing::fixtures;
    use std::path::PathBuf;

    fn position(args: &[String], flag: &str) -> usize {
        args.iter()
            .position(|a| a == flag)
            .unwrap_or_else(|| panic!("{flag} missing from {args:?}"))
    }

    fn value_after(args: &[String], flag: &str) -> String {
        args[position(args, flag) + 1].clone()
    }

    #[test]
    fn test_build_transcode_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let job = fixtures::transcode_job("/in/Movie (2020).mkv", "/out/Movie (2020).mp4");

        let args = transcoder.build_args(&job).unwrap();

        assert_eq!(value_after(&args, "-c:v:0"), "libx265");
        assert_eq!(value_after(&args, "-b:v:0"), "1889k");
        assert_eq!(value_after(&args, "-preset"), "medium");
        assert_eq!(value_after(&args, "-tag:v:0"), "hvc1");
        assert_eq!(value_after(&args, "-c:a"), "aac");
        assert_eq!(value_after(&args, "-b:a"), "192k");
        assert_eq!(value_after(&args, "-progress"), "pipe:1");
        assert_eq!(value_after(&args, "-c:s"), "mov_text");
        assert_eq!(value_after(&args, "-metadata:s:s:0"), "language=eng");
        assert!(args.contains(&"title=Movie".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/out/Movie (2020).mp4"));

        // video, audio and the text subtitle; the bitmap track is not carried
        let maps: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, vec!["0:0", "0:1", "0:2"]);
    }

    #[test]
    fn test_build_args_with_converted_subtitles() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let mut job = fixtures::transcode_job("/in/movie.mkv", "/out/movie.mp4");
        job.generated_subtitles.push(GeneratedSubtitle {
            source_index: 3,
            path: PathBuf::from("/tmp/job/track_3.fra.srt"),
            language: "fra".to_string(),
            cue_count: 12,
        });

        let args = transcoder.build_args(&job).unwrap();

        let inputs: Vec<&String> = args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && args[i - 1] == "-i")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(inputs, vec!["/in/movie.mkv", "/tmp/job/track_3.fra.srt"]);
        assert!(args.contains(&"1:s:0".to_string()));
        assert_eq!(value_after(&args, "-metadata:s:s:1"), "language=fra");
    }

    #[test]
    fn test_build_rewrap_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let job = fixtures::rewrap_job("/in/show.mkv", "/out/show.mp4");

        let args = transcoder.build_args(&job).unwrap();

        assert_eq!(value_after(&args, "-c:v:0"), "copy");
        assert_eq!(value_after(&args, "-c:a"), "copy");
        assert!(!args.contains(&"-b:v:0".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        // h264 source, so no hvc1 tag
        assert!(!args.contains(&"-tag:v:0".to_string()));
    }

    #[test]
    fn test_no_subtitles_disables_subtitle_output() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let mut job = fixtures::transcode_job("/in/movie.mkv", "/out/movie.mp4");
        job.selection.subtitles.clear();

        let args = transcoder.build_args(&job).unwrap();
        assert!(args.contains(&"-sn".to_string()));
        assert!(!args.contains(&"-c:s".to_string()));
    }

    #[test]
    fn test_hardware_encoder_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let mut job = fixtures::transcode_job("/in/movie.mkv", "/out/movie.mp4");
        job.encoder = Some(EncoderCandidate {
            kind: EncoderKind::HevcNvenc,
            rank: 0,
            availability: Availability::Available,
        });

        let args = transcoder.build_args(&job).unwrap();
        assert_eq!(value_after(&args, "-c:v:0"), "hevc_nvenc");
        assert_eq!(value_after(&args, "-preset"), "p4");
        assert_eq!(value_after(&args, "-rc"), "vbr");
    }

    #[test]
    fn test_transcode_without_encoder_is_invalid() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let mut job = fixtures::transcode_job("/in/movie.mkv", "/out/movie.mp4");
        job.encoder = None;
        assert!(matches!(
            transcoder.build_args(&job),
            Err(TranscoderError::InvalidJob { .. })
        ));
    }

    #[test]
    fn test_trial_args() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let args = transcoder.trial_args(EncoderKind::HevcQsv);
        assert_eq!(value_after(&args, "-c:v"), "hevc_qsv");
        assert_eq!(value_after(&args, "-f"), "lavfi");
        assert_eq!(&args[args.len() - 3..], ["-f", "null", "-"]);
    }

    #[test]
    fn test_extract_args() {
        let stream = StreamDescriptor::new(4, StreamKind::Subtitle, "hdmv_pgs_subtitle");
        let args = FfmpegTranscoder::extract_args(
            Path::new("/in/movie.mkv"),
            &stream,
            Path::new("/tmp/track_4.sup"),
        );
        assert_eq!(value_after(&args, "-map"), "0:4");
        assert_eq!(value_after(&args, "-c:s"), "copy");
        assert_eq!(args.last().map(String::as_str), Some("/tmp/track_4.sup"));
    }

    #[test]
    fn test_command_line_starts_with_binary() {
        let transcoder = FfmpegTranscoder::new(ConverterConfig::with_paths(
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg"),
            PathBuf::from("/opt/ffmpeg/bin/ffprobe"),
        ));
        let job = fixtures::transcode_job("/in/movie.mkv", "/out/movie.mp4");
        let argv = transcoder.command_line(&job).unwrap();
        assert_eq!(argv[0], "/opt/ffmpeg/bin/ffmpeg");
    }

    #[test]
    fn test_parse_probe_output() {
        let json = r#"{
            "format": {
                "filename": "test.mkv",
                "format_name": "matroska,webm",
                "duration": "2640.512000"
            },
            "streams": [
                {
                    "index": 0,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "disposition": {"default": 1, "forced": 0, "attached_pic": 0}
                },
                {
                    "index": 1,
                    "codec_type": "audio",
                    "codec_name": "eac3",
                    "tags": {"language": "eng", "title": "Surround 5.1"},
                    "disposition": {"default": 1, "forced": 0}
                },
                {
                    "index": 2,
                    "codec_type": "subtitle",
                    "codec_name": "hdmv_pgs_subtitle",
                    "tags": {"language": "ger"},
                    "disposition": {"default": 0, "forced": 1}
                },
                {
                    "index": 3,
                    "codec_type": "attachment",
                    "tags": {"filename": "font.ttf"}
                }
            ]
        }"#;

        let media = FfmpegTranscoder::parse_probe_output(Path::new("test.mkv"), json).unwrap();
        assert!((media.duration_secs - 2640.512).abs() < 0.001);
        assert_eq!(media.streams.len(), 4);

        let audio = &media.streams[1];
        assert_eq!(audio.kind, StreamKind::Audio);
        assert_eq!(audio.language.as_deref(), Some("eng"));
        assert_eq!(audio.title.as_deref(), Some("Surround 5.1"));
        assert!(audio.disposition.default);

        let sub = &media.streams[2];
        assert_eq!(sub.codec_name, "hdmv_pgs_subtitle");
        assert!(sub.disposition.forced);

        let attachment = &media.streams[3];
        assert_eq!(attachment.kind, StreamKind::Other);
        assert_eq!(attachment.codec_name, "unknown");
    }

    #[test]
    fn test_parse_probe_output_missing_duration() {
        let json = r#"{"format": {}, "streams": []}"#;
        let media = FfmpegTranscoder::parse_probe_output(Path::new("x.mkv"), json).unwrap();
        assert_eq!(media.duration_secs, 0.0);
        assert!(FfmpegTranscoder::parse_probe_output(Path::new("x.mkv"), "not json").is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_input() {
        let transcoder = FfmpegTranscoder::with_defaults();
        let result = transcoder.probe(Path::new("/definitely/not/here.mkv")).await;
        assert!(matches!(result, Err(TranscoderError::InputNotFound { .. })));
    }

    #[cfg(unix)]
    mod fake_ffmpeg {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        /// Writes an executable shell script standing in for ffmpeg.
        fn script(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("ffmpeg");
            std::fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn transcoder(ffmpeg: PathBuf) -> FfmpegTranscoder {
            FfmpegTranscoder::new(ConverterConfig::with_paths(ffmpeg, PathBuf::from("ffprobe")))
        }

        #[tokio::test]
        async fn test_run_reports_progress_and_output() {
            let dir = TempDir::new().unwrap();
            let ffmpeg = script(
                &dir,
                "echo out_time_us=30000000\necho total_size=1024\necho speed=2.5x\necho progress=continue\n\
                 echo out_time_us=60000000\necho progress=end\nprintf data > \"$last\"",
            );
            let output = dir.path().join("out").join("movie.mp4");
            let mut job = fixtures::transcode_job("/in/movie.mkv", output.to_str().unwrap());
            job.media.duration_secs = 60.0;

            let (tx, mut rx) = mpsc::channel(16);
            let outcome = transcoder(ffmpeg)
                .run(&job, Some(tx), &CancelSignal::new())
                .await
                .unwrap();

            assert_eq!(outcome.output_size_bytes, 4);
            assert_eq!(outcome.encoder, Some(EncoderKind::Libx265));
            let last = outcome.last_progress.unwrap();
            assert_eq!(last.percent, 100.0);

            let first = rx.recv().await.unwrap();
            assert_eq!(first.percent, 50.0);
            assert_eq!(first.size_bytes, Some(1024));
            assert_eq!(first.speed, Some(2.5));
        }

        #[tokio::test]
        async fn test_run_nonzero_exit_is_process_failure() {
            let dir = TempDir::new().unwrap();
            let ffmpeg = script(&dir, "echo 'Cannot load nvcuda.dll' >&2\nexit 1");
            let output = dir.path().join("movie.mp4");
            let job = fixtures::transcode_job("/in/movie.mkv", output.to_str().unwrap());

            let err = transcoder(ffmpeg)
                .run(&job, None, &CancelSignal::new())
                .await
                .unwrap_err();

            match err {
                TranscoderError::ProcessFailed {
                    encoder,
                    code,
                    stderr,
                } => {
                    assert_eq!(encoder, Some(EncoderKind::Libx265));
                    assert_eq!(code, Some(1));
                    assert!(stderr.unwrap().contains("nvcuda"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_run_clean_exit_without_output() {
            let dir = TempDir::new().unwrap();
            let ffmpeg = script(&dir, "exit 0");
            let output = dir.path().join("movie.mp4");
            let job = fixtures::transcode_job("/in/movie.mkv", output.to_str().unwrap());

            let err = transcoder(ffmpeg)
                .run(&job, None, &CancelSignal::new())
                .await
                .unwrap_err();
            assert!(matches!(err, TranscoderError::OutputMissing { .. }));
            assert!(err.is_process_failure());
        }

        #[tokio::test]
        async fn test_cancel_asks_ffmpeg_to_quit() {
            let dir = TempDir::new().unwrap();
            // finishes the file once it reads the quit command
            let ffmpeg = script(&dir, "read cmd\nprintf partial > \"$last\"\nexit 255");
            let output = dir.path().join("movie.mp4");
            let job = fixtures::transcode_job("/in/movie.mkv", output.to_str().unwrap());

            let cancel = CancelSignal::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                trigger.cancel();
            });

            let err = transcoder(ffmpeg).run(&job, None, &cancel).await.unwrap_err();
            assert!(matches!(err, TranscoderError::Cancelled));
            assert_eq!(std::fs::read_to_string(&output).unwrap(), "partial");
        }

        #[tokio::test]
        async fn test_missing_binary() {
            let job = fixtures::transcode_job("/in/movie.mkv", "/tmp/oneshot-never.mp4");
            let err = transcoder(PathBuf::from("/no/such/ffmpeg"))
                .run(&job, None, &CancelSignal::new())
                .await
                .unwrap_err();
            assert!(matches!(err, TranscoderError::FfmpegNotFound { .. }));
        }

        #[tokio::test]
        async fn test_trial_encode() {
            let dir = TempDir::new().unwrap();
            let ok = transcoder(script(&dir, "exit 0"));
            assert!(ok.trial_encode(EncoderKind::HevcNvenc).await.is_ok());

            let dir = TempDir::new().unwrap();
            let failing = transcoder(script(&dir, "exit 1"));
            assert!(failing
                .trial_encode(EncoderKind::HevcNvenc)
                .await
                .unwrap_err()
                .is_process_failure());
        }
    }
}
