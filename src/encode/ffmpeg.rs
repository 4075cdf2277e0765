use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use super::pcm;

/// Output extensions that make the encoder keep the source video.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "webm", "avi", "m4v"];

/// Audio-only containers; these never carry a copied video stream.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "opus", "m4a", "aac", "wma"];

/// Samples written to ffmpeg per `write_all` call.
const WRITE_CHUNK: usize = 64 * 1024;

#[derive(Clone, Debug, Default)]
pub struct EncodeSettings {
    /// ffmpeg audio encoder; picked from the output extension when `None`
    pub audio_codec: Option<String>,
    pub audio_bitrate: String,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_video_path(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

pub fn is_audio_path(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Whether the source video is copied into `output`.
///
/// Video extensions always keep it. `requested` forces it for unknown
/// extensions and is ignored, with a warning, for audio-only containers.
pub fn keep_video(requested: bool, output: &Path) -> bool {
    if is_video_path(output) {
        return true;
    }
    if requested && is_audio_path(output) {
        log::warn!(
            "--keep-video ignored: {} is an audio-only container",
            output.display()
        );
        return false;
    }
    requested
}

fn default_codec_for(path: &Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => Some("libmp3lame"),
        _ => None,
    }
}

/// Build the ffmpeg argument list for mono s16le PCM arriving on stdin.
fn build_args(
    output_path: &Path,
    sample_rate: u32,
    settings: &EncodeSettings,
    video_source: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-hide_banner".into(),
        "-loglevel".into(), "error".into(),
        "-f".into(), "s16le".into(),
        "-ar".into(), sample_rate.to_string().into(),
        "-ac".into(), "1".into(),
        "-i".into(), "pipe:0".into(),
    ];

    if let Some(source) = video_source {
        args.push("-i".into());
        args.push(source.as_os_str().to_owned());
        args.extend(
            [
                "-map", "1:v?",
                "-map", "1:s?",
                "-map", "0:a",
                "-c:v", "copy",
                "-c:s", "copy",
            ]
            .map(OsString::from),
        );
    }

    let codec = settings
        .audio_codec
        .as_deref()
        .or_else(|| default_codec_for(output_path));
    if let Some(codec) = codec {
        args.extend(["-c:a", codec].map(OsString::from));
    }
    args.push("-b:a".into());
    args.push(settings.audio_bitrate.clone().into());
    args.push(output_path.as_os_str().to_owned());
    args
}

/// Pipes processed audio into an ffmpeg child process.
pub struct AudioEncoder {
    child: Child,
}

impl AudioEncoder {
    /// Start ffmpeg. With `video_source`, its video and subtitle streams are
    /// copied next to the new audio track.
    pub fn new(
        output_path: &Path,
        sample_rate: u32,
        settings: &EncodeSettings,
        video_source: Option<&Path>,
    ) -> Result<Self> {
        let args = build_args(output_path, sample_rate, settings, video_source);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn ffmpeg. Is ffmpeg installed?")?;

        log::info!(
            "FFmpeg encoder started: {}Hz mono -> {}{}",
            sample_rate,
            output_path.display(),
            if video_source.is_some() { " (keeping video)" } else { "" }
        );

        Ok(Self { child })
    }

    /// Peak-normalize `samples` to 16-bit and write them to ffmpeg.
    pub fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        let stdin = self.child.stdin.as_mut().context("FFmpeg stdin not available")?;
        let pcm = pcm::to_pcm16(samples);
        for chunk in pcm.chunks(WRITE_CHUNK) {
            stdin
                .write_all(&pcm::to_le_bytes(chunk))
                .context("Failed to write audio to ffmpeg")?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        // Close stdin to signal EOF
        drop(self.child.stdin.take());

        let output = self.child.wait_with_output().context("Failed to wait for ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("FFmpeg exited with error:\n{}", stderr);
        }

        log::info!("FFmpeg encoding complete");
        Ok(())
    }
}
