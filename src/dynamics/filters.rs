//! Zero-phase band splitting.
//!
//! Both bands come from second-order Butterworth sections run forward and then
//! backward over the whole waveform, so the detection band and the output band
//! stay sample-aligned with the source.

use std::f64::consts::{PI, SQRT_2};

use crate::audio::waveform::{Band, BandKind};

use super::error::{DynamicsError, Result};

/// Odd-reflection padding per side: three times the tap count of one section.
const EDGE_PAD: usize = 3 * 3;

/// Second-order IIR section, normalized so that `a0 == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Biquad {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Biquad {
    /// Butterworth low-pass via the bilinear transform.
    pub fn lowpass(cutoff: f64, sample_rate: u32) -> Self {
        let k = (PI * cutoff / sample_rate as f64).tan();
        let norm = 1.0 / (1.0 + SQRT_2 * k + k * k);
        let b0 = k * k * norm;
        Self {
            b0,
            b1: 2.0 * b0,
            b2: b0,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - SQRT_2 * k + k * k) * norm,
        }
    }

    /// Butterworth high-pass via the bilinear transform.
    pub fn highpass(cutoff: f64, sample_rate: u32) -> Self {
        let k = (PI * cutoff / sample_rate as f64).tan();
        let norm = 1.0 / (1.0 + SQRT_2 * k + k * k);
        Self {
            b0: norm,
            b1: -2.0 * norm,
            b2: norm,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - SQRT_2 * k + k * k) * norm,
        }
    }

    /// Gain at DC.
    pub fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Transposed direct-form state for a unit step that has been running forever.
    fn steady_state(&self) -> [f64; 2] {
        let g = self.dc_gain();
        let z2 = self.b2 - self.a2 * g;
        let z1 = self.b1 - self.a1 * g + z2;
        [z1, z2]
    }

    /// Filter `buf` in place, starting from the steady state of its first sample.
    ///
    /// Samples are stored as `f32`; the recursion itself runs in `f64`.
    fn process(&self, buf: &mut [f32]) {
        let Some(&first) = buf.first() else {
            return;
        };
        let [mut z1, mut z2] = self.steady_state().map(|z| z * first as f64);
        for sample in buf.iter_mut() {
            let x = *sample as f64;
            let y = self.b0 * x + z1;
            z1 = self.b1 * x - self.a1 * y + z2;
            z2 = self.b2 * x - self.a2 * y;
            *sample = y as f32;
        }
    }

    /// Forward-backward filtering with odd-reflection edge padding.
    pub fn filtfilt(&self, input: &[f32]) -> Vec<f32> {
        let n = input.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = EDGE_PAD.min(n - 1);
        let first = input[0];
        let last = input[n - 1];

        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|k| 2.0 * first - input[k]));
        ext.extend_from_slice(input);
        ext.extend((1..=pad).map(|k| 2.0 * last - input[n - 1 - k]));

        self.process(&mut ext);
        ext.reverse();
        self.process(&mut ext);
        ext.reverse();

        ext.drain(..pad);
        ext.truncate(n);
        ext
    }
}

/// Reject cutoffs outside the open interval `(0, Nyquist)`.
pub fn check_cutoff(name: &'static str, freq: f64, sample_rate: u32) -> Result<()> {
    let nyquist = sample_rate as f64 / 2.0;
    if freq.is_finite() && freq > 0.0 && freq < nyquist {
        Ok(())
    } else {
        Err(DynamicsError::CutoffOutOfRange {
            name,
            freq,
            nyquist,
        })
    }
}

/// Split a waveform into its detection band and its output band.
///
/// `detection = bass_weight * lowpass(x, low_cutoff) + x`
/// `output = highpass(x, mid_cutoff)`
pub fn split(
    samples: &[f32],
    sample_rate: u32,
    low_cutoff: f64,
    mid_cutoff: f64,
    bass_weight: f64,
) -> Result<(Band, Band)> {
    check_cutoff("low_cutoff_freq", low_cutoff, sample_rate)?;
    check_cutoff("mid_range_freq", mid_cutoff, sample_rate)?;

    let low = Biquad::lowpass(low_cutoff, sample_rate);
    let high = Biquad::highpass(mid_cutoff, sample_rate);

    let (detection, output) = rayon::join(
        || {
            let mut detection = low.filtfilt(samples);
            for (d, &x) in detection.iter_mut().zip(samples) {
                *d = (bass_weight * *d as f64 + x as f64) as f32;
            }
            detection
        },
        || high.filtfilt(samples),
    );

    log::debug!(
        "Band split: low-pass {:.1} Hz (weight {:.2}), high-pass {:.1} Hz",
        low_cutoff,
        bass_weight,
        mid_cutoff
    );

    Ok((
        Band::new(BandKind::Detection, detection, sample_rate),
        Band::new(BandKind::Output, output, sample_rate),
    ))
}
