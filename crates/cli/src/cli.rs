use clap::Parser;
use std::path::PathBuf;

use oneshot_core::{Category, Config, ModePreference};

#[derive(Parser, Debug)]
#[command(name = "oneshot")]
#[command(author, version, about = "Batch convert videos into tagged MP4 files")]
pub struct Cli {
    /// Video files or directories to convert
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for converted files (default: next to each input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Target output size in MB per hour of video
    #[arg(short = 's', long, value_name = "MB")]
    pub target_size: Option<f64>,

    /// Copy audio and video without re-encoding
    #[arg(long, conflicts_with_all = ["transcode", "auto"])]
    pub rewrap: bool,

    /// Always re-encode the video
    #[arg(long, conflicts_with = "auto")]
    pub transcode: bool,

    /// Rewrap when the codecs allow it, otherwise re-encode
    #[arg(long)]
    pub auto: bool,

    /// Leave bitmap subtitles out instead of converting them to text
    #[arg(long)]
    pub no_bitmap_subs: bool,

    /// Only use the CPU encoder
    #[arg(long)]
    pub no_hardware: bool,

    /// Filename template, e.g. "<Series Name> - S<season:2 digits>E<episode:2 digits>"
    #[arg(long, value_name = "TEMPLATE")]
    pub pattern: Option<String>,

    /// Treat every input as this media type (movie, tv_show)
    #[arg(long)]
    pub media_type: Option<Category>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Show what would be done without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Write Prometheus metrics to this file when done
    #[arg(long, value_name = "PATH")]
    pub metrics_file: Option<PathBuf>,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn mode(&self) -> Option<ModePreference> {
        if self.rewrap {
            Some(ModePreference::Rewrap)
        } else if self.transcode {
            Some(ModePreference::Transcode)
        } else if self.auto {
            Some(ModePreference::Auto)
        } else {
            None
        }
    }

    /// Overrides the loaded config with the flags that were given.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(mode) = self.mode() {
            config.transcode.mode = mode;
        }
        if let Some(size) = self.target_size {
            config.transcode.target_size_mb_per_hour = size;
        }
        if let Some(ref dir) = self.output_dir {
            config.transcode.output_dir = Some(dir.clone());
        }
        if self.overwrite {
            config.transcode.overwrite = true;
        }
        if self.no_bitmap_subs {
            config.subtitles.convert_bitmap = false;
        }
        if self.no_hardware {
            config.encoders.allow_hardware = false;
        }
        if let Some(ref pattern) = self.pattern {
            config.metadata.filename_pattern = Some(pattern.clone());
        }
        if let Some(media_type) = self.media_type {
            config.metadata.media_type = Some(media_type);
        }
    }
}
