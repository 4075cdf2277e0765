mod audio;
mod cli;
mod config;
mod dynamics;
mod encode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;

use cli::Cli;
use dynamics::params::{
    DEFAULT_BASS_WEIGHT, DEFAULT_LOW_CUTOFF_FREQ, DEFAULT_MID_RANGE_FREQ, DEFAULT_TAP_VALUE,
    DEFAULT_TIME_FADE, DEFAULT_TIME_TICK,
};
use dynamics::{CurveReport, DynamicsError, ErrorKind, Pipeline, Stage};
use encode::ffmpeg::{AudioEncoder, EncodeSettings};

const TOTAL_STEPS: u64 = 7;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    if let Some(path) = config::find_config(cli.config.as_deref()) {
        if let Some(cfg) = config::load_config(&path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            let d = cfg.dynamics;
            if cli.time_tick == DEFAULT_TIME_TICK { cli.time_tick = d.time_tick; }
            if cli.time_fade == DEFAULT_TIME_FADE { cli.time_fade = d.time_fade; }
            if cli.bass_weight == DEFAULT_BASS_WEIGHT { cli.bass_weight = d.bass_weight; }
            if cli.low_cutoff_freq == DEFAULT_LOW_CUTOFF_FREQ { cli.low_cutoff_freq = d.low_cutoff_freq; }
            if cli.mid_range_freq == DEFAULT_MID_RANGE_FREQ { cli.mid_range_freq = d.mid_range_freq; }
            if cli.tap_value == DEFAULT_TAP_VALUE { cli.tap_value = d.tap_value; }
            if cli.audio_codec.is_none() {
                cli.audio_codec = cfg.output.audio_codec;
            }
            if cli.audio_bitrate == config::DEFAULT_AUDIO_BITRATE {
                cli.audio_bitrate = cfg.output.audio_bitrate;
            }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    let input = cli.input.clone().context("Input audio or video file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    if cli.inspect {
        return print_tracks(&input);
    }

    let output = cli.output_path(&input);
    if output == input {
        anyhow::bail!("Output would overwrite the input: {}", output.display());
    }
    let keep_video = encode::ffmpeg::keep_video(cli.keep_video, &output);
    let params = cli.dynamics();

    log::info!("serene - loud sound tamer");
    log::info!("Input: {} (audio track {})", input.display(), cli.track);
    log::info!("Output: {}", output.display());
    log::info!(
        "Time tick: {}s, time fade: {}s, bass weight: {}",
        params.time_tick,
        params.time_fade,
        params.bass_weight
    );
    log::info!(
        "Low cutoff: {} Hz, mid range: {} Hz, tap value: {}",
        params.low_cutoff_freq,
        params.mid_range_freq,
        params.tap_value
    );

    let pb = ProgressBar::new(TOTAL_STEPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    // 1. Load audio
    pb.set_message("Loading audio");
    let started = Instant::now();
    let waveform = audio::decode::decode_audio(&input, cli.track)?;
    log::info!(
        "[1/{}] Audio loaded in {:.2}s: {} samples @ {}Hz ({:.3}s, peak {:.3})",
        TOTAL_STEPS,
        started.elapsed().as_secs_f32(),
        waveform.samples.len(),
        waveform.sample_rate,
        waveform.duration(),
        waveform.peak_amplitude()
    );
    pb.inc(1);

    // 2. Calculate parameters
    pb.set_message("Calculating parameters");
    let pipeline = Pipeline::new(&params, waveform.sample_rate).map_err(explain)?;
    let timing = pipeline.timing();
    log::info!(
        "[2/{}] Tick: {} samples, fade: {} ticks ({} samples)",
        TOTAL_STEPS,
        timing.tick_size,
        timing.ticks_in_fade,
        timing.fade_size
    );
    pb.inc(1);

    // 3-6. Filter, analyze, compute gains, fade
    let mut stage_start = Instant::now();
    let mut current: Option<Stage> = None;
    let mut step = 2;
    let (processed, report) = pipeline.run(&waveform, |stage| {
        if let Some(done) = current.replace(stage) {
            log_stage_done(done, step, stage_start);
            pb.inc(1);
        }
        step += 1;
        stage_start = Instant::now();
        pb.set_message(stage.label());
    })
    .map_err(explain)?;
    if let Some(done) = current {
        log_stage_done(done, step, stage_start);
        pb.inc(1);
    }
    drop(waveform);

    log::info!(
        "{} fade intervals, strongest attenuation {:.1} dB",
        report.intervals.len(),
        20.0 * report.min_gain().log10()
    );

    if let Some(ref path) = cli.dump_curve {
        write_report(path, &report)?;
        log::info!("Gain curve written to {}", path.display());
    }

    // 7. Save output
    pb.set_message("Saving output");
    let started = Instant::now();
    let settings = EncodeSettings {
        audio_codec: cli.audio_codec.clone(),
        audio_bitrate: cli.audio_bitrate.clone(),
    };
    let video_source = keep_video.then_some(input.as_path());
    let mut encoder = AudioEncoder::new(&output, processed.sample_rate, &settings, video_source)?;
    encoder.write_samples(&processed.samples)?;
    encoder.finish()?;
    log::info!(
        "[7/{}] Output saved in {:.2}s",
        TOTAL_STEPS,
        started.elapsed().as_secs_f32()
    );
    pb.inc(1);

    pb.finish_with_message("Processing complete");

    log::info!("Done! Output: {}", output.display());
    Ok(())
}

fn explain(err: DynamicsError) -> anyhow::Error {
    let what = match err.kind() {
        ErrorKind::Configuration => "Invalid dynamics settings",
        ErrorKind::DegenerateInput => "Input cannot be processed",
    };
    anyhow::Error::new(err).context(what)
}

fn log_stage_done(stage: Stage, step: u64, started: Instant) {
    log::info!(
        "[{}/{}] {} done in {:.2}s",
        step,
        TOTAL_STEPS,
        stage.label(),
        started.elapsed().as_secs_f32()
    );
}

fn write_report(path: &Path, report: &CurveReport) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), report)
        .with_context(|| format!("Failed to write gain curve to {}", path.display()))?;
    Ok(())
}

fn print_tracks(input: &Path) -> Result<()> {
    let tracks = audio::decode::inspect_tracks(input)?;
    if tracks.is_empty() {
        println!("No audio tracks found in '{}'.", input.display());
        return Ok(());
    }

    let na = || "N/A".to_string();
    for t in &tracks {
        println!("\n--- Audio Track {} ---", t.index);
        println!("  Track id: {}", t.id);
        println!("  Codec: {}", t.codec);
        println!(
            "  Sample rate: {}",
            t.sample_rate.map_or_else(na, |sr| format!("{} Hz", sr))
        );
        println!("  Channels: {}", t.channels.map_or_else(na, |c| c.to_string()));
        println!("  Frames: {}", t.frames.map_or_else(na, |f| f.to_string()));
        println!(
            "  Duration: {}",
            t.duration.map_or_else(na, |d| format!("{:.3}s", d))
        );
        if let Some(ref lang) = t.language {
            println!("  Language: {}", lang);
        }
    }
    Ok(())
}
