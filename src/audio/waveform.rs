/// Mono audio held entirely in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn peak_amplitude(&self) -> f32 {
        self.samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandKind {
    /// Bass-emphasized signal used only to measure loudness
    Detection,
    /// High-passed signal that receives the gain envelope
    Output,
}

/// A filtered copy of a waveform, same length and sample rate as its source.
#[derive(Clone, Debug, PartialEq)]
pub struct Band {
    pub kind: BandKind,
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Band {
    pub fn new(kind: BandKind, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            kind,
            samples,
            sample_rate,
        }
    }

    pub fn into_waveform(self) -> Waveform {
        Waveform::new(self.samples, self.sample_rate)
    }
}
