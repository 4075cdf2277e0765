use clap::Parser;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_AUDIO_BITRATE;
use crate::dynamics::params::{
    DEFAULT_BASS_WEIGHT, DEFAULT_LOW_CUTOFF_FREQ, DEFAULT_MID_RANGE_FREQ, DEFAULT_TAP_VALUE,
    DEFAULT_TIME_FADE, DEFAULT_TIME_TICK,
};
use crate::dynamics::DynamicsParams;

#[derive(Parser, Debug)]
#[command(
    name = "serene",
    about = "Tames loud, bass-heavy sounds (explosions, gunfire, aggressive beats) in an audio track while leaving dialogue untouched"
)]
pub struct Cli {
    /// Input audio or video file
    pub input: Option<PathBuf>,

    /// Output file [default: <input>_serene.mp3]. Video extensions keep the source video.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Duration of the loudness evaluation ticks (seconds)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIME_TICK)]
    pub time_tick: f64,

    /// Duration of the constant-volume fade intervals (seconds)
    #[arg(short = 'f', long, default_value_t = DEFAULT_TIME_FADE)]
    pub time_fade: f64,

    /// Weight of the low band relative to the full signal for loudness detection
    #[arg(short = 'w', long, default_value_t = DEFAULT_BASS_WEIGHT)]
    pub bass_weight: f64,

    /// Sub-bass cutoff used for loudness detection (Hz)
    #[arg(short = 'l', long, default_value_t = DEFAULT_LOW_CUTOFF_FREQ)]
    pub low_cutoff_freq: f64,

    /// Sounds below this frequency are cut from the output (Hz)
    #[arg(short = 'm', long, default_value_t = DEFAULT_MID_RANGE_FREQ)]
    pub mid_range_freq: f64,

    /// Knee of the gain function: tap_value * tanh(level / tap_value)
    #[arg(short = 'T', long, default_value_t = DEFAULT_TAP_VALUE)]
    pub tap_value: f64,

    /// Index of the audio track to process
    #[arg(long, default_value_t = 0)]
    pub track: usize,

    /// FFmpeg audio encoder (picked from the output extension by default)
    #[arg(long)]
    pub audio_codec: Option<String>,

    /// Audio bitrate passed to FFmpeg
    #[arg(long, default_value = DEFAULT_AUDIO_BITRATE)]
    pub audio_bitrate: String,

    /// Copy the input's video and subtitle streams into the output. Implied by
    /// video extensions, ignored for audio-only ones.
    #[arg(long)]
    pub keep_video: bool,

    /// Write the per-interval levels and gains as JSON
    #[arg(long)]
    pub dump_curve: Option<PathBuf>,

    /// Config file (defaults to ./serene.toml or ~/.config/serene/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// List the audio tracks of the input and exit
    #[arg(long)]
    pub inspect: bool,
}

impl Cli {
    pub fn dynamics(&self) -> DynamicsParams {
        DynamicsParams {
            time_tick: self.time_tick,
            time_fade: self.time_fade,
            bass_weight: self.bass_weight,
            low_cutoff_freq: self.low_cutoff_freq,
            mid_range_freq: self.mid_range_freq,
            tap_value: self.tap_value,
        }
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        self.output.clone().unwrap_or_else(|| default_output(input))
    }
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audiotrack".into());
    input.with_file_name(format!("{}_serene.mp3", stem))
}
