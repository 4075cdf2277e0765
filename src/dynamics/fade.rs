//! Per-sample gain envelope built from the per-interval gain curve.
//!
//! Each fade interval ramps geometrically from its left edge to its right
//! edge. An edge is the quieter of the two intervals sharing it, so a loud
//! interval is already fully attenuated at its first sample.

use rayon::prelude::*;

use crate::audio::waveform::{Band, BandKind};

/// `(left, right)` edge gains of every interval. The outer edges of the first
/// and last interval are not clamped.
fn edges(gains: &[f64]) -> Vec<(f64, f64)> {
    (0..gains.len())
        .map(|i| {
            let left = match i.checked_sub(1) {
                Some(prev) => gains[i].min(gains[prev]),
                None => gains[i],
            };
            let right = match gains.get(i + 1) {
                Some(&next) => gains[i].min(next),
                None => gains[i],
            };
            (left, right)
        })
        .collect()
}

/// `len` values spaced evenly in log space, starting at `left` and ending at
/// `right` exactly.
fn ramp(left: f64, right: f64, len: usize) -> impl Iterator<Item = f64> {
    let flat = left == right || len < 2;
    let log_left = left.ln();
    let step = if flat {
        0.0
    } else {
        (right.ln() - log_left) / (len - 1) as f64
    };
    (0..len).map(move |k| {
        if flat || k == 0 {
            left
        } else if k == len - 1 {
            right
        } else {
            (log_left + step * k as f64).exp()
        }
    })
}

/// Scale `buf` interval by interval with the envelope of `gains`.
///
/// Intervals beyond the end of the gain curve are left untouched.
fn shape<T: Send>(
    buf: &mut [T],
    gains: &[f64],
    fade_size: usize,
    scale: impl Fn(&mut T, f64) + Sync,
) {
    debug_assert!(fade_size > 0, "fade_size must be at least one sample");
    let edges = edges(gains);
    buf.par_chunks_mut(fade_size)
        .zip(edges.par_iter())
        .for_each(|(chunk, &(left, right))| {
            let len = chunk.len();
            for (value, g) in chunk.iter_mut().zip(ramp(left, right, len)) {
                scale(value, g);
            }
        });
}

/// Expand a gain curve into a per-sample envelope of `length` samples.
#[allow(dead_code)]
pub fn expand(gains: &[f64], fade_size: usize, length: usize) -> Vec<f64> {
    let mut envelope = vec![1.0; length];
    shape(&mut envelope, gains, fade_size, |e, g| *e = g);
    envelope
}

/// Multiply the output band by the envelope of `gains`, interval by interval.
pub fn apply(mut band: Band, gains: &[f64], fade_size: usize) -> Band {
    debug_assert_eq!(band.kind, BandKind::Output);
    debug_assert!(
        gains.len() >= band.samples.len().div_ceil(fade_size.max(1)),
        "gain curve shorter than the band"
    );
    shape(&mut band.samples, gains, fade_size, |sample, g| {
        *sample = (*sample as f64 * g) as f32;
    });
    band
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ramp_hits_both_ends() {
        let values: Vec<f64> = ramp(1.0, 0.01, 5).collect();
        assert_eq!(values.len(), 5);
        assert_eq!(values[0], 1.0);
        assert_eq!(values[4], 0.01);
        assert!((values[2] - 0.1).abs() < 1e-12);
        // geometric: constant ratio between neighbours
        assert!((values[1] / values[0] - values[3] / values[2]).abs() < 1e-12);
    }

    #[test]
    fn one_sample_ramp_holds_the_left_edge() {
        assert_eq!(ramp(0.5, 0.25, 1).collect::<Vec<_>>(), vec![0.5]);
        assert_eq!(ramp(0.5, 0.25, 0).count(), 0);
    }

    #[test]
    fn outer_edges_are_unclamped() {
        assert_eq!(edges(&[0.5]), vec![(0.5, 0.5)]);
        assert_eq!(
            edges(&[1.0, 0.25, 0.5]),
            vec![(1.0, 0.25), (0.25, 0.25), (0.25, 0.5)]
        );
    }

    #[test]
    fn constant_curve_gives_flat_envelope() {
        let envelope = expand(&[0.7; 4], 10, 35);
        assert_eq!(envelope.len(), 35);
        assert!(envelope.iter().all(|&g| g == 0.7));
    }

    #[test]
    fn last_interval_is_clipped_to_length() {
        let envelope = expand(&[1.0, 0.5], 10, 13);
        assert_eq!(envelope.len(), 13);
        assert_eq!(envelope[10], 0.5);
        assert_eq!(envelope[12], 0.5);
    }

    #[test]
    fn loud_interval_is_attenuated_from_its_first_sample() {
        let envelope = expand(&[1.0, 0.1, 1.0], 100, 300);
        assert_eq!(envelope[0], 1.0);
        assert_eq!(envelope[99], 0.1);
        assert!(envelope[100..200].iter().all(|&g| g == 0.1));
        assert_eq!(envelope[200], 0.1);
        assert_eq!(envelope[299], 1.0);
    }

    #[test]
    fn apply_matches_expand() {
        let gains = [1.0, 0.3, 0.6, 0.05];
        let samples: Vec<f32> = (0..37).map(|i| (i as f32 * 0.37).sin()).collect();
        let envelope = expand(&gains, 10, samples.len());
        let band = apply(
            Band::new(BandKind::Output, samples.clone(), 8000),
            &gains,
            10,
        );
        assert_eq!(band.samples.len(), samples.len());
        for ((out, x), g) in band.samples.iter().zip(&samples).zip(&envelope) {
            assert_eq!(*out, (*x as f64 * g) as f32);
        }
    }

    #[test]
    fn short_band_only_uses_leading_intervals() {
        let gains = [0.5, 0.25, 0.125];
        let envelope = expand(&gains, 8, 5);
        assert_eq!(envelope.len(), 5);
        let band = apply(Band::new(BandKind::Output, vec![1.0; 5], 8000), &gains, 8);
        for (out, g) in band.samples.iter().zip(&envelope) {
            assert_eq!(*out, *g as f32);
        }
        assert_eq!(envelope[0], 0.5);
        // the clipped interval still ends on its right edge
        assert_eq!(envelope[4], 0.25);
    }

    #[test]
    fn unity_curve_leaves_band_untouched() {
        let samples: Vec<f32> = (0..50).map(|i| i as f32 / 7.0 - 3.0).collect();
        let band = apply(Band::new(BandKind::Output, samples.clone(), 8000), &[1.0; 5], 10);
        assert_eq!(band.samples, samples);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn boundaries_take_the_quieter_neighbour(
            gains in prop::collection::vec(1e-6f64..1.0, 2..12),
            fade_size in 2usize..64,
        ) {
            let length = gains.len() * fade_size;
            let envelope = expand(&gains, fade_size, length);
            prop_assert_eq!(envelope.len(), length);
            for i in 0..gains.len() - 1 {
                let boundary = gains[i].min(gains[i + 1]);
                let end_of_i = (i + 1) * fade_size - 1;
                prop_assert_eq!(envelope[end_of_i], boundary);
                prop_assert_eq!(envelope[end_of_i + 1], boundary);
            }
            for (i, &g) in gains.iter().enumerate() {
                let interval = &envelope[i * fade_size..(i + 1) * fade_size];
                prop_assert!(interval.iter().all(|&e| e <= g * (1.0 + 1e-12) && e > 0.0));
            }
        }
    }
}
