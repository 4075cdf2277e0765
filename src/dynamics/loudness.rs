//! Windowed energy of the detection band and its per-interval peaks.

use rayon::prelude::*;

/// Scale applied to every tick's sum of squares. The default tap value is
/// tuned against it.
const ENERGY_SCALE: f64 = 10.0;

fn sum_of_squares(samples: &[f32]) -> f64 {
    samples.iter().map(|&s| (s as f64) * (s as f64)).sum()
}

/// `10 * sum(x^2)` over consecutive ticks of `tick_size` samples.
///
/// The last tick is implicitly zero-padded, so the result always has
/// `ceil(len / tick_size)` entries.
pub fn tick_energy(samples: &[f32], tick_size: usize) -> Vec<f64> {
    debug_assert!(tick_size > 0, "tick_size must be at least one sample");
    samples
        .par_chunks(tick_size)
        .map(|tick| ENERGY_SCALE * sum_of_squares(tick))
        .collect()
}

/// Same as [`tick_energy`] over `samples` rotated left by `shift`, without
/// materializing the rotated copy.
fn rotated_tick_energy(samples: &[f32], tick_size: usize, shift: usize) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let shift = shift % n;
    // rotated[i] = samples[(i + shift) % n]; rotated[..wrap] is samples[shift..]
    let wrap = n - shift;
    let ticks = n.div_ceil(tick_size);

    (0..ticks)
        .into_par_iter()
        .map(|t| {
            let start = t * tick_size;
            let end = (start + tick_size).min(n);
            let sum = if end <= wrap {
                sum_of_squares(&samples[start + shift..end + shift])
            } else if start >= wrap {
                sum_of_squares(&samples[start - wrap..end - wrap])
            } else {
                sum_of_squares(&samples[start + shift..]) + sum_of_squares(&samples[..end - wrap])
            };
            ENERGY_SCALE * sum
        })
        .collect()
}

/// Loudness series of a band: the tick energies plus the tick energies of the
/// band shifted back by half a tick, so events straddling a tick boundary are
/// not split in two. Odd tick sizes shift by the larger half.
pub fn energy(band: &[f32], tick_size: usize) -> Vec<f64> {
    let (aligned, shifted) = rayon::join(
        || tick_energy(band, tick_size),
        || rotated_tick_energy(band, tick_size, tick_size.div_ceil(2)),
    );
    aligned
        .into_iter()
        .zip(shifted)
        .map(|(a, b)| a + b)
        .collect()
}

/// Loudest tick of every group of `ticks_in_fade` ticks.
pub fn peak(series: &[f64], ticks_in_fade: usize) -> Vec<f64> {
    debug_assert!(ticks_in_fade > 0, "ticks_in_fade must be at least one tick");
    series
        .chunks(ticks_in_fade)
        .map(|group| group.iter().copied().fold(0.0, f64::max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn single_click() -> Vec<f32> {
        let mut samples = vec![0.0f32; 100];
        samples[9] = 1.0;
        samples
    }

    #[test]
    fn tick_energy_of_single_click() {
        let levels = tick_energy(&single_click(), 10);
        assert_eq!(levels.len(), 10);
        assert_eq!(levels[0], 10.0);
        assert!(levels[1..].iter().all(|&l| l == 0.0));
    }

    #[test]
    fn shifted_phase_lands_in_the_same_tick() {
        // the click at index 9 moves to index 4 after a half-tick rotation
        let levels = energy(&single_click(), 10);
        assert_eq!(levels[0], 20.0);
        assert!(levels[1..].iter().all(|&l| l == 0.0));
    }

    #[test]
    fn shifted_phase_wraps_around() {
        let mut samples = vec![0.0f32; 25];
        samples[2] = 1.0;
        // rotated left by 5: index 2 lands at 22, in the last (padded) tick
        let levels = energy(&samples, 10);
        assert_eq!(levels, vec![10.0, 0.0, 10.0]);
    }

    #[test]
    fn odd_tick_shifts_by_the_larger_half() {
        // tick_size 3 shifts by 2: the click at index 1 wraps to index 5
        let levels = energy(&[0.0, 1.0, 0.0, 0.0, 0.0, 0.0], 3);
        assert_eq!(levels, vec![10.0, 10.0]);

        // 441 samples per tick (10 ms at 44.1 kHz) shifts by 221
        let mut samples = vec![0.0f32; 882];
        samples[221] = 1.0;
        assert_eq!(energy(&samples, 441), vec![20.0, 0.0]);
        samples[221] = 0.0;
        samples[220] = 1.0;
        assert_eq!(energy(&samples, 441), vec![10.0, 10.0]);
    }

    #[test]
    fn rotation_matches_explicit_copy() {
        let samples: Vec<f32> = (0..97).map(|i| ((i * 37) % 11) as f32 - 5.0).collect();
        for shift in [0, 3, 50, 96, 200] {
            let mut rotated = samples.clone();
            rotated.rotate_left(shift % samples.len());
            assert_eq!(
                rotated_tick_energy(&samples, 8, shift),
                tick_energy(&rotated, 8),
                "shift {shift}"
            );
        }
    }

    #[test]
    fn padding_gives_ceil_length() {
        let samples = vec![0.1f32; 1003];
        assert_eq!(tick_energy(&samples, 10).len(), 101);
        assert_eq!(energy(&samples, 10).len(), 101);
        assert_eq!(energy(&[], 10).len(), 0);
    }

    #[test]
    fn peak_keeps_the_loudest_tick() {
        let series = [0.0, 0.0, 7.5, 0.0, 1.0, 2.0, 3.0];
        assert_eq!(peak(&series, 4), vec![7.5, 3.0]);
        assert_eq!(peak(&series, 1), series.to_vec());
        assert_eq!(peak(&series, 100), vec![7.5]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn doubling_amplitude_quadruples_energy(
            samples in prop::collection::vec(-1.0f32..1.0, 1..400),
            tick_size in 1usize..40,
        ) {
            let doubled: Vec<f32> = samples.iter().map(|s| s * 2.0).collect();
            let base = energy(&samples, tick_size);
            let loud = energy(&doubled, tick_size);
            prop_assert_eq!(base.len(), loud.len());
            for (b, l) in base.iter().zip(&loud) {
                prop_assert!((l - 4.0 * b).abs() <= 1e-12 * l.abs().max(1.0));
            }
        }

        #[test]
        fn single_nonzero_tick_sets_the_group_peak(
            ticks_in_fade in 1usize..50,
            pos_seed in 0usize..1000,
            value in 0.0f64..1e6,
        ) {
            let pos = pos_seed % ticks_in_fade;
            let mut series = vec![0.0; ticks_in_fade];
            series[pos] = value;
            prop_assert_eq!(peak(&series, ticks_in_fade), vec![value]);
        }
    }
}
