/// Smallest gain ever applied. Keeps the envelope strictly positive so its
/// logarithm stays finite during interpolation.
pub const MIN_GAIN: f64 = f64::MIN_POSITIVE;

/// Soft-knee compression: `tap * tanh(level / tap) / level`.
///
/// Close to 1 for levels well below `tap_value`, approaching `tap_value / level`
/// above it. A zero level has no attenuation to apply and maps to exactly 1.
pub fn gain(level: f64, tap_value: f64) -> f64 {
    if level == 0.0 {
        return 1.0;
    }
    let g = tap_value * (level / tap_value).tanh() / level;
    if g.is_nan() {
        // NaN level
        MIN_GAIN
    } else {
        g.clamp(MIN_GAIN, 1.0)
    }
}

/// Gain of every fade interval.
pub fn gain_curve(levels: &[f64], tap_value: f64) -> Vec<f64> {
    levels.iter().map(|&level| gain(level, tap_value)).collect()
}
