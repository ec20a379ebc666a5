//! Tone synthesis for alert chimes.
//!
//! Everything here is a pure function of its arguments: the same request always
//! renders the same buffer, which is what lets the chime be tested without an
//! audio device.

use std::{f64::consts::TAU, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sample rate used for every chime the app plays.
pub const SAMPLE_RATE: u32 = 44_100;

/// Largest magnitude a rendered sample reaches, half of the `i16` range so
/// chimes never play at full scale.
pub const PEAK: i16 = i16::MAX / 2;

/// Longest buffer [`generate`] will allocate, about 25 minutes at [`SAMPLE_RATE`].
pub const MAX_SAMPLES: usize = 1 << 26;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("invalid tone parameter: {0}")]
    InvalidParameter(String),
}

/// Shape of one cycle of a tone.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Self; 4] = [Self::Sine, Self::Square, Self::Sawtooth, Self::Triangle];

    /// value in `[-1, 1]` of the wave at `phase`, the position within a cycle in `[0, 1)`
    #[must_use]
    pub fn at(self, phase: f64) -> f64 {
        match self {
            Self::Sine => (TAU * phase).sin(),
            Self::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::Sawtooth => 2.0f64.mul_add(phase, -1.0),
            Self::Triangle => 4.0f64.mul_add((phase - 0.5).abs(), -1.0),
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sine => "sine",
            Self::Square => "square",
            Self::Sawtooth => "sawtooth",
            Self::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn positive(name: &str, value: f64) -> Result<f64, SynthError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SynthError::InvalidParameter(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

/// Renders a mono tone that sweeps linearly from `min_hz` to `max_hz` over
/// `duration_secs`.
///
/// The phase is the running integral of the instantaneous frequency, so the
/// sweep has no discontinuities. Equal frequencies give a steady tone. The
/// buffer holds `round(duration_secs * sample_rate)` samples.
///
/// # Errors
/// [`SynthError::InvalidParameter`] if the duration or either frequency is not
/// a positive number, if `sample_rate` is zero, if `max_hz < min_hz`, or if
/// the buffer would hold more than [`MAX_SAMPLES`] samples.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn generate(
    waveform: Waveform,
    min_hz: f64,
    max_hz: f64,
    duration_secs: f64,
    sample_rate: u32,
) -> Result<Vec<i16>, SynthError> {
    let duration_secs = positive("duration", duration_secs)?;
    let min_hz = positive("minimum frequency", min_hz)?;
    let max_hz = positive("maximum frequency", max_hz)?;
    if sample_rate == 0 {
        return Err(SynthError::InvalidParameter(
            "sample rate must be positive".to_string(),
        ));
    }
    if max_hz < min_hz {
        return Err(SynthError::InvalidParameter(format!(
            "maximum frequency {max_hz} is below minimum frequency {min_hz}"
        )));
    }

    let rate = f64::from(sample_rate);
    let len = (duration_secs * rate).round();
    if len > MAX_SAMPLES as f64 {
        return Err(SynthError::InvalidParameter(format!(
            "a {duration_secs} s tone at {sample_rate} Hz needs more than {MAX_SAMPLES} samples"
        )));
    }
    let len = len as usize;
    // frequency gained per second of sweep
    let slope = (max_hz - min_hz) / duration_secs;
    let peak = f64::from(PEAK);

    Ok((0..len)
        .map(|n| {
            let n = n as f64;
            // cycles completed by sample n: integral of (min + slope * t) with t = n / rate
            let cycles = (n * min_hz + 0.5 * slope * n * n / rate) / rate;
            (waveform.at(cycles.fract()) * peak).round() as i16
        })
        .collect())
}
