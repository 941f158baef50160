//! Whether a selection can be rewrapped into MP4 without re-encoding.

use super::types::StreamSelection;

const COPYABLE_VIDEO: &[&str] = &["h264", "avc1", "hevc", "h265", "hvc1", "hev1"];
const COPYABLE_AUDIO: &[&str] = &["aac", "ac3", "eac3", "ec-3", "alac", "mp3"];

/// True when the video and audio codecs play on Apple devices as-is.
pub fn is_rewrap_compatible(selection: &StreamSelection) -> bool {
    let video_ok = COPYABLE_VIDEO.contains(&selection.video.codec_name.to_ascii_lowercase().as_str());
    let audio_ok = selection
        .audio
        .as_ref()
        .map(|a| COPYABLE_AUDIO.contains(&a.codec_name.to_ascii_lowercase().as_str()))
        .unwrap_or(true);
    video_ok && audio_ok
}

/// True when the copied video should carry the `hvc1` tag.
pub fn is_hevc(codec_name: &str) -> bool {
    matches!(
        codec_name.to_ascii_lowercase().as_str(),
        "hevc" | "h265" | "hvc1" | "hev1"
    )
}
