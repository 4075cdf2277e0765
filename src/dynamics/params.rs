use serde::{Deserialize, Serialize};

use super::error::{DynamicsError, Result};
use super::filters;

pub const DEFAULT_TIME_TICK: f64 = 0.01;
pub const DEFAULT_TIME_FADE: f64 = 1.0;
pub const DEFAULT_BASS_WEIGHT: f64 = 4.0;
pub const DEFAULT_LOW_CUTOFF_FREQ: f64 = 70.0;
pub const DEFAULT_MID_RANGE_FREQ: f64 = 100.0;
pub const DEFAULT_TAP_VALUE: f64 = 32.0;

/// Knobs of the dynamics pipeline, in seconds, Hz and plain ratios.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsParams {
    /// Length of one loudness tick (seconds)
    pub time_tick: f64,
    /// Length of one constant-gain fade interval (seconds)
    pub time_fade: f64,
    /// Weight of the low-passed signal added to the detection band
    pub bass_weight: f64,
    /// Low-pass cutoff of the detection emphasis (Hz)
    pub low_cutoff_freq: f64,
    /// High-pass cutoff applied to the output band (Hz)
    pub mid_range_freq: f64,
    /// Knee of the `tanh` compression curve
    pub tap_value: f64,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            time_tick: DEFAULT_TIME_TICK,
            time_fade: DEFAULT_TIME_FADE,
            bass_weight: DEFAULT_BASS_WEIGHT,
            low_cutoff_freq: DEFAULT_LOW_CUTOFF_FREQ,
            mid_range_freq: DEFAULT_MID_RANGE_FREQ,
            tap_value: DEFAULT_TAP_VALUE,
        }
    }
}

/// Integer sizes derived from [`DynamicsParams`] for one sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Timing {
    /// Samples per tick
    pub tick_size: usize,
    /// Ticks per fade interval
    pub ticks_in_fade: usize,
    /// Samples per fade interval
    pub fade_size: usize,
}

impl DynamicsParams {
    /// Check every knob against `sample_rate` and derive the tick/fade sizes.
    pub fn resolve(&self, sample_rate: u32) -> Result<Timing> {
        if sample_rate == 0 {
            return Err(DynamicsError::InvalidSampleRate(sample_rate));
        }
        positive("time_tick", self.time_tick)?;
        positive("time_fade", self.time_fade)?;
        positive("tap_value", self.tap_value)?;
        if !self.bass_weight.is_finite() || self.bass_weight < 0.0 {
            return Err(DynamicsError::Negative {
                name: "bass_weight",
                value: self.bass_weight,
            });
        }
        if self.time_fade < self.time_tick {
            return Err(DynamicsError::FadeShorterThanTick {
                time_fade: self.time_fade,
                time_tick: self.time_tick,
            });
        }

        filters::check_cutoff("low_cutoff_freq", self.low_cutoff_freq, sample_rate)?;
        filters::check_cutoff("mid_range_freq", self.mid_range_freq, sample_rate)?;
        if self.mid_range_freq <= self.low_cutoff_freq {
            return Err(DynamicsError::CutoffOrder {
                low: self.low_cutoff_freq,
                mid: self.mid_range_freq,
            });
        }

        let tick_size = (self.time_tick * sample_rate as f64).round();
        if tick_size < 1.0 {
            return Err(DynamicsError::TickTooShort {
                time_tick: self.time_tick,
                sample_rate,
            });
        }
        let tick_size = tick_size as usize;
        let ticks_in_fade = ((self.time_fade / self.time_tick).round() as usize).max(1);

        Ok(Timing {
            tick_size,
            ticks_in_fade,
            fade_size: tick_size * ticks_in_fade,
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DynamicsError::NonPositive { name, value })
    }
}
