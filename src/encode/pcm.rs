/// Scale floats so the loudest sample maps to ±32767, truncating toward zero.
/// Silence stays silence.
pub fn to_pcm16(samples: &[f32]) -> Vec<i16> {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    if peak == 0.0 || !peak.is_finite() {
        return vec![0; samples.len()];
    }
    let scale = i16::MAX as f32 / peak;
    samples.iter().map(|&s| (s * scale) as i16).collect()
}

pub fn to_le_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_maps_to_full_scale() {
        let pcm = to_pcm16(&[0.0, 0.25, -0.5, 0.5]);
        assert_eq!(pcm, vec![0, 16383, -32767, 32767]);
    }

    #[test]
    fn silence_stays_zero() {
        assert_eq!(to_pcm16(&[0.0; 4]), vec![0; 4]);
        assert!(to_pcm16(&[]).is_empty());
    }

    #[test]
    fn bytes_are_little_endian() {
        assert_eq!(to_le_bytes(&[1, -2]), vec![0x01, 0x00, 0xfe, 0xff]);
    }
}
