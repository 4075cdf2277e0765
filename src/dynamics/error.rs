use thiserror::Error;

pub type Result<T> = std::result::Result<T, DynamicsError>;

/// Broad class of a [`DynamicsError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A knob is out of range for the given sample rate.
    Configuration,
    /// The waveform cannot be analyzed at all.
    DegenerateInput,
}

/// Errors raised by the dynamics pipeline. All of them abort the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DynamicsError {
    #[error("{name} must be a finite number greater than zero (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be a finite number >= 0 (got {value})")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} of {freq} Hz must lie strictly between 0 and the Nyquist frequency ({nyquist} Hz)")]
    CutoffOutOfRange {
        name: &'static str,
        freq: f64,
        nyquist: f64,
    },

    #[error("mid_range_freq ({mid} Hz) must be above low_cutoff_freq ({low} Hz)")]
    CutoffOrder { low: f64, mid: f64 },

    #[error("time_fade ({time_fade}s) must not be shorter than time_tick ({time_tick}s)")]
    FadeShorterThanTick { time_fade: f64, time_tick: f64 },

    #[error("Waveform is empty")]
    EmptyWaveform,

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Sample {index} is not a finite number")]
    NonFiniteSample { index: usize },

    #[error("time_tick of {time_tick}s is shorter than one sample at {sample_rate} Hz")]
    TickTooShort { time_tick: f64, sample_rate: u32 },
}

impl DynamicsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NonPositive { .. }
            | Self::Negative { .. }
            | Self::CutoffOutOfRange { .. }
            | Self::CutoffOrder { .. }
            | Self::FadeShorterThanTick { .. } => ErrorKind::Configuration,
            Self::EmptyWaveform
            | Self::InvalidSampleRate(_)
            | Self::NonFiniteSample { .. }
            | Self::TickTooShort { .. } => ErrorKind::DegenerateInput,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let cutoff = DynamicsError::CutoffOutOfRange {
            name: "low_cutoff_freq",
            freq: 30000.0,
            nyquist: 22050.0,
        };
        assert_eq!(cutoff.kind(), ErrorKind::Configuration);
        assert_eq!(DynamicsError::EmptyWaveform.kind(), ErrorKind::DegenerateInput);
        assert_eq!(
            DynamicsError::TickTooShort { time_tick: 1e-6, sample_rate: 8000 }.kind(),
            ErrorKind::DegenerateInput
        );
    }

    #[test]
    fn messages_name_the_knob() {
        let err = DynamicsError::NonPositive { name: "tap_value", value: 0.0 };
        assert!(err.to_string().contains("tap_value"));
    }
}
