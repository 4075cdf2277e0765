//! Loudness-driven gain shaping.
//!
//! The pipeline runs in four stages, each consuming the output of the last:
//! band splitting ([`filters`]), tick energy and per-interval peaks
//! ([`loudness`]), the compression curve ([`gain`]) and the fade envelope
//! ([`fade`]).

pub mod error;
pub mod fade;
pub mod filters;
pub mod gain;
pub mod loudness;
pub mod params;

use serde::Serialize;

use crate::audio::waveform::Waveform;

pub use error::{DynamicsError, ErrorKind, Result};
pub use params::{DynamicsParams, Timing};

/// Per-interval summary of one run.
#[derive(Clone, Debug, Serialize)]
pub struct CurveReport {
    pub sample_rate: u32,
    pub timing: Timing,
    pub intervals: Vec<IntervalReport>,
}

#[derive(Clone, Debug, Serialize)]
pub struct IntervalReport {
    /// Start of the interval in seconds
    pub start: f64,
    /// Loudest tick energy inside the interval
    pub level: f64,
    pub gain: f64,
}

impl CurveReport {
    fn new(sample_rate: u32, timing: Timing, levels: &[f64], gains: &[f64]) -> Self {
        let seconds_per_fade = timing.fade_size as f64 / sample_rate as f64;
        let intervals = levels
            .iter()
            .zip(gains)
            .enumerate()
            .map(|(i, (&level, &gain))| IntervalReport {
                start: i as f64 * seconds_per_fade,
                level,
                gain,
            })
            .collect();
        Self {
            sample_rate,
            timing,
            intervals,
        }
    }

    /// Strongest attenuation applied anywhere, as a linear gain.
    pub fn min_gain(&self) -> f64 {
        self.intervals.iter().map(|i| i.gain).fold(1.0, f64::min)
    }
}

/// Stage a [`Pipeline`] is about to run, reported through its observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Split,
    Loudness,
    Gains,
    Fade,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Split => "Applying filters",
            Stage::Loudness => "Analyzing loudness",
            Stage::Gains => "Calculating gain levels",
            Stage::Fade => "Adjusting volume",
        }
    }
}

/// Validated parameters bound to one sample rate.
pub struct Pipeline<'a> {
    params: &'a DynamicsParams,
    timing: Timing,
    sample_rate: u32,
}

impl<'a> Pipeline<'a> {
    pub fn new(params: &'a DynamicsParams, sample_rate: u32) -> Result<Self> {
        let timing = params.resolve(sample_rate)?;
        log::debug!(
            "Timing: tick={} samples, {} ticks per fade, fade={} samples",
            timing.tick_size,
            timing.ticks_in_fade,
            timing.fade_size
        );
        Ok(Self {
            params,
            timing,
            sample_rate,
        })
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Run every stage over `waveform`, calling `on_stage` before each one.
    pub fn run(
        &self,
        waveform: &Waveform,
        mut on_stage: impl FnMut(Stage),
    ) -> Result<(Waveform, CurveReport)> {
        if waveform.sample_rate != self.sample_rate {
            return Err(DynamicsError::InvalidSampleRate(waveform.sample_rate));
        }
        check_samples(&waveform.samples)?;
        let timing = self.timing;

        on_stage(Stage::Split);
        let (detection, output) = filters::split(
            &waveform.samples,
            self.sample_rate,
            self.params.low_cutoff_freq,
            self.params.mid_range_freq,
            self.params.bass_weight,
        )?;

        on_stage(Stage::Loudness);
        let series = loudness::energy(&detection.samples, timing.tick_size);
        drop(detection);
        let levels = loudness::peak(&series, timing.ticks_in_fade);
        log::debug!("{} ticks, {} fade intervals", series.len(), levels.len());

        on_stage(Stage::Gains);
        let gains = gain::gain_curve(&levels, self.params.tap_value);

        on_stage(Stage::Fade);
        let output = fade::apply(output, &gains, timing.fade_size);

        let report = CurveReport::new(self.sample_rate, timing, &levels, &gains);
        Ok((output.into_waveform(), report))
    }
}

/// Run the whole pipeline over `waveform` with `params`.
#[allow(dead_code)]
pub fn process(waveform: &Waveform, params: &DynamicsParams) -> Result<(Waveform, CurveReport)> {
    Pipeline::new(params, waveform.sample_rate)?.run(waveform, |_| {})
}

fn check_samples(samples: &[f32]) -> Result<()> {
    if samples.is_empty() {
        return Err(DynamicsError::EmptyWaveform);
    }
    match samples.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(DynamicsError::NonFiniteSample { index }),
        None => Ok(()),
    }
}
