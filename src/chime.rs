//! Picking the tone for the next chime.

use log::debug;
use rand::{seq::SliceRandom, Rng};
use thiserror::Error;

use crate::{
    audio::PlaybackError,
    config::{AlarmConfig, SoundConfig},
    synth::{self, SynthError, Waveform},
};

/// Length of the tone played by "Test sound".
pub const TEST_DURATION_SECS: f64 = 1.0;

#[derive(Debug, Error)]
pub enum ChimeError {
    #[error(transparent)]
    Synth(#[from] SynthError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// Concrete arguments for [`synth::generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneRequest {
    pub waveform: Waveform,
    pub min_hz: f64,
    pub max_hz: f64,
    pub duration_secs: f64,
}

impl ToneRequest {
    /// the chime for a due alert
    #[must_use]
    pub fn for_alert<R: Rng>(sound: &SoundConfig, alarm: &AlarmConfig, rng: &mut R) -> Self {
        Self::pick(sound, alarm.duration_secs, rng)
    }

    /// a short chime previewing `sound`
    #[must_use]
    pub fn for_test<R: Rng>(sound: &SoundConfig, rng: &mut R) -> Self {
        Self::pick(sound, TEST_DURATION_SECS, rng)
    }

    fn pick<R: Rng>(sound: &SoundConfig, duration_secs: f64, rng: &mut R) -> Self {
        let request = if sound.variety {
            // an unvalidated empty pool plays sine, as a repaired config would
            let waveform = sound.waveforms.choose(rng).copied().unwrap_or_default();
            // an inverted or non-numeric range is left for the synthesizer to reject
            let hz = if sound.frequency_min < sound.frequency_max {
                rng.gen_range(sound.frequency_min..=sound.frequency_max)
            } else {
                sound.frequency_min
            };
            Self {
                waveform,
                min_hz: hz,
                max_hz: hz,
                duration_secs,
            }
        } else {
            Self {
                waveform: sound.waveform,
                min_hz: sound.frequency_min,
                max_hz: sound.frequency_max,
                duration_secs,
            }
        };
        debug!("chime: {request:?}");
        request
    }

    /// # Errors
    /// [`SynthError::InvalidParameter`] when the request can't be synthesized
    pub fn render(&self, sample_rate: u32) -> Result<Vec<i16>, SynthError> {
        synth::generate(
            self.waveform,
            self.min_hz,
            self.max_hz,
            self.duration_secs,
            sample_rate,
        )
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn sweep_follows_config() {
        let sound = SoundConfig {
            waveform: Waveform::Triangle,
            frequency_min: 300.0,
            frequency_max: 600.0,
            ..SoundConfig::default()
        };
        let alarm = AlarmConfig {
            duration_secs: 2.0,
            ..AlarmConfig::default()
        };
        let request = ToneRequest::for_alert(&sound, &alarm, &mut StdRng::seed_from_u64(7));
        assert_eq!(
            request,
            ToneRequest {
                waveform: Waveform::Triangle,
                min_hz: 300.0,
                max_hz: 600.0,
                duration_secs: 2.0,
            }
        );
        assert_eq!(request.render(8000).unwrap().len(), 16_000);
    }

    #[test]
    fn variety_picks_steady_tone_in_range() {
        let sound = SoundConfig {
            variety: true,
            ..SoundConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = Vec::new();
        for _ in 0..200 {
            let request = ToneRequest::for_alert(&sound, &AlarmConfig::default(), &mut rng);
            assert!((request.min_hz - request.max_hz).abs() < f64::EPSILON);
            assert!((400.0..=800.0).contains(&request.min_hz), "{request:?}");
            if !seen.contains(&request.waveform) {
                seen.push(request.waveform);
            }
        }
        assert_eq!(seen.len(), Waveform::ALL.len());
    }

    #[test]
    fn variety_only_picks_chosen_waveforms() {
        let sound = SoundConfig {
            variety: true,
            waveforms: vec![Waveform::Square, Waveform::Triangle],
            ..SoundConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(9);
        let picked: Vec<Waveform> = (0..200)
            .map(|_| ToneRequest::for_alert(&sound, &AlarmConfig::default(), &mut rng).waveform)
            .collect();
        assert!(picked.contains(&Waveform::Square));
        assert!(picked.contains(&Waveform::Triangle));
        assert!(
            picked
                .iter()
                .all(|w| matches!(w, Waveform::Square | Waveform::Triangle)),
            "{picked:?}"
        );
    }

    #[test]
    fn variety_without_waveforms_plays_sine() {
        let sound = SoundConfig {
            variety: true,
            waveform: Waveform::Sawtooth,
            waveforms: Vec::new(),
            ..SoundConfig::default()
        };
        let request = ToneRequest::for_test(&sound, &mut StdRng::seed_from_u64(5));
        assert_eq!(request.waveform, Waveform::Sine);
    }

    #[test]
    fn variety_with_single_frequency() {
        let sound = SoundConfig {
            variety: true,
            frequency_min: 500.0,
            frequency_max: 500.0,
            ..SoundConfig::default()
        };
        let request = ToneRequest::for_test(&sound, &mut StdRng::seed_from_u64(1));
        assert!((request.min_hz - 500.0).abs() < f64::EPSILON);
        assert!((request.duration_secs - TEST_DURATION_SECS).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_range_fails_to_render() {
        let sound = SoundConfig {
            frequency_min: 900.0,
            frequency_max: 300.0,
            ..SoundConfig::default()
        };
        let request = ToneRequest::for_test(&sound, &mut StdRng::seed_from_u64(1));
        assert!(matches!(
            request.render(8000),
            Err(SynthError::InvalidParameter(_))
        ));
    }
}
