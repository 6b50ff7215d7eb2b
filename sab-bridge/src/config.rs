//! Runtime bridge configuration
//!
//! [`BridgeConfig`] lives for the whole bridge process. It is created once at
//! startup and replaced only through [`BridgeConfig::merged`], which validates
//! a partial update against a copy. Callers swap the result in whole, so a
//! rejected update leaves the stored value untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest accepted frequency bound in Hz
pub const MIN_FREQUENCY: f64 = 1.0;
/// Highest accepted frequency bound in Hz
pub const MAX_FREQUENCY: f64 = 100_000.0;
/// Largest synthesized impulse response, 2^20 samples
pub const MAX_IMPULSE_POINTS: usize = 1 << 20;

/// Rejected configuration update
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Frequency bounds out of order or non-positive
    #[error("invalid frequency range: low ({low} Hz) must be > 0 and below high ({high} Hz)")]
    InvalidFrequencyRange { low: f64, high: f64 },

    /// A field that must be strictly positive was not
    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    /// A bounded field fell outside its accepted range
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// Averaging mode of the capture front end (informational)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Averaging {
    Exponential,
    Linear,
    None,
}

/// Fractional-octave smoothing bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Smoothing {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "1/48 octave")]
    FortyEighthOctave,
    #[serde(rename = "1/24 octave")]
    TwentyFourthOctave,
    #[serde(rename = "1/12 octave")]
    TwelfthOctave,
    #[serde(rename = "1/6 octave")]
    SixthOctave,
    #[serde(rename = "1/3 octave")]
    ThirdOctave,
    #[serde(rename = "1 octave")]
    Octave,
}

/// Process-lifetime bridge configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,
    /// FFT size (informational; no transform is computed here)
    pub fft_size: u32,
    pub averaging: Averaging,
    /// Averaging time constant in seconds
    pub averaging_time: f64,
    /// Lowest frequency bin in Hz
    pub low_freq: f64,
    /// Upper bound for frequency bins in Hz
    pub high_freq: f64,
    pub smoothing: Smoothing,
    /// Number of samples in a synthesized impulse response
    pub impulse_points: usize,
    /// Length of the synthesized impulse window in seconds
    pub impulse_duration: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            fft_size: 4096,
            averaging: Averaging::Exponential,
            averaging_time: 1.0,
            low_freq: 20.0,
            high_freq: 20_000.0,
            smoothing: Smoothing::ThirdOctave,
            impulse_points: 1000,
            impulse_duration: 1.0,
        }
    }
}

/// Partial update: only supplied fields change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BridgeConfigUpdate {
    pub sample_rate: Option<u32>,
    pub fft_size: Option<u32>,
    pub averaging: Option<Averaging>,
    pub averaging_time: Option<f64>,
    pub low_freq: Option<f64>,
    pub high_freq: Option<f64>,
    /// `[low, high]` pair as sent by older front ends; explicit
    /// `lowFreq`/`highFreq` take precedence
    pub frequency_range: Option<[f64; 2]>,
    pub smoothing: Option<Smoothing>,
    pub impulse_points: Option<usize>,
    pub impulse_duration: Option<f64>,
}

impl BridgeConfig {
    /// Check every invariant the generator and analyses rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.low_freq > 0.0 && self.low_freq < self.high_freq && self.high_freq.is_finite()) {
            return Err(ConfigError::InvalidFrequencyRange {
                low: self.low_freq,
                high: self.high_freq,
            });
        }
        if !(MIN_FREQUENCY..=MAX_FREQUENCY).contains(&self.low_freq) {
            return Err(ConfigError::OutOfRange {
                field: "lowFreq",
                min: MIN_FREQUENCY,
                max: MAX_FREQUENCY,
                value: self.low_freq,
            });
        }
        if self.high_freq > MAX_FREQUENCY {
            return Err(ConfigError::OutOfRange {
                field: "highFreq",
                min: MIN_FREQUENCY,
                max: MAX_FREQUENCY,
                value: self.high_freq,
            });
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::NonPositive { field: "sampleRate" });
        }
        if self.fft_size == 0 {
            return Err(ConfigError::NonPositive { field: "fftSize" });
        }
        if !(self.averaging_time > 0.0) {
            return Err(ConfigError::NonPositive { field: "averagingTime" });
        }
        if self.impulse_points == 0 {
            return Err(ConfigError::NonPositive { field: "impulsePoints" });
        }
        if self.impulse_points > MAX_IMPULSE_POINTS {
            return Err(ConfigError::OutOfRange {
                field: "impulsePoints",
                min: 1.0,
                max: MAX_IMPULSE_POINTS as f64,
                value: self.impulse_points as f64,
            });
        }
        if !(self.impulse_duration > 0.0) {
            return Err(ConfigError::NonPositive { field: "impulseDuration" });
        }
        Ok(())
    }

    /// Apply `update` to a copy of `self` and validate the result
    pub fn merged(&self, update: &BridgeConfigUpdate) -> Result<BridgeConfig, ConfigError> {
        let mut next = self.clone();

        if let Some(v) = update.sample_rate {
            next.sample_rate = v;
        }
        if let Some(v) = update.fft_size {
            next.fft_size = v;
        }
        if let Some(v) = update.averaging {
            next.averaging = v;
        }
        if let Some(v) = update.averaging_time {
            next.averaging_time = v;
        }
        if let Some([low, high]) = update.frequency_range {
            next.low_freq = low;
            next.high_freq = high;
        }
        if let Some(v) = update.low_freq {
            next.low_freq = v;
        }
        if let Some(v) = update.high_freq {
            next.high_freq = v;
        }
        if let Some(v) = update.smoothing {
            next.smoothing = v;
        }
        if let Some(v) = update.impulse_points {
            next.impulse_points = v;
        }
        if let Some(v) = update.impulse_duration {
            next.impulse_duration = v;
        }

        next.validate()?;
        Ok(next)
    }

    /// Sample spacing of a synthesized impulse response in seconds
    pub fn impulse_step(&self) -> f64 {
        self.impulse_duration / self.impulse_points as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = BridgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.impulse_step(), 0.001);
    }

    #[test]
    fn test_merge_changes_only_supplied_fields() {
        let config = BridgeConfig::default();
        let update = BridgeConfigUpdate {
            fft_size: Some(8192),
            ..Default::default()
        };

        let merged = config.merged(&update).unwrap();
        assert_eq!(merged.fft_size, 8192);
        assert_eq!(merged.sample_rate, config.sample_rate);
        assert_eq!(merged.low_freq, config.low_freq);
        assert_eq!(merged.smoothing, config.smoothing);
    }

    #[test]
    fn test_merge_rejects_inverted_range() {
        let config = BridgeConfig::default();
        let update = BridgeConfigUpdate {
            low_freq: Some(5000.0),
            high_freq: Some(100.0),
            ..Default::default()
        };

        let err = config.merged(&update).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidFrequencyRange {
                low: 5000.0,
                high: 100.0
            }
        );
    }

    #[test]
    fn test_merge_rejects_equal_bounds() {
        let update = BridgeConfigUpdate {
            low_freq: Some(1000.0),
            high_freq: Some(1000.0),
            ..Default::default()
        };
        assert!(BridgeConfig::default().merged(&update).is_err());
    }

    #[test]
    fn test_merge_rejects_zero_impulse_points() {
        let update = BridgeConfigUpdate {
            impulse_points: Some(0),
            ..Default::default()
        };
        assert_eq!(
            BridgeConfig::default().merged(&update).unwrap_err(),
            ConfigError::NonPositive {
                field: "impulsePoints"
            }
        );
    }

    #[test]
    fn test_merge_rejects_subnormal_low_bound() {
        let update = BridgeConfigUpdate {
            low_freq: Some(5e-324),
            ..Default::default()
        };
        let err = BridgeConfig::default().merged(&update).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "lowFreq", .. }));
    }

    #[test]
    fn test_merge_rejects_low_bound_below_one_hz() {
        let update = BridgeConfigUpdate {
            frequency_range: Some([0.5, 20_000.0]),
            ..Default::default()
        };
        assert!(BridgeConfig::default().merged(&update).is_err());
    }

    #[test]
    fn test_merge_rejects_high_bound_above_maximum() {
        let update = BridgeConfigUpdate {
            high_freq: Some(1e12),
            ..Default::default()
        };
        let err = BridgeConfig::default().merged(&update).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "highFreq", .. }));
    }

    #[test]
    fn test_merge_rejects_oversized_impulse() {
        let update = BridgeConfigUpdate {
            impulse_points: Some(usize::MAX),
            ..Default::default()
        };
        let err = BridgeConfig::default().merged(&update).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "impulsePoints",
                ..
            }
        ));
    }

    #[test]
    fn test_merge_accepts_limits() {
        let update = BridgeConfigUpdate {
            frequency_range: Some([MIN_FREQUENCY, MAX_FREQUENCY]),
            impulse_points: Some(MAX_IMPULSE_POINTS),
            ..Default::default()
        };
        assert!(BridgeConfig::default().merged(&update).is_ok());
    }

    #[test]
    fn test_explicit_bounds_override_frequency_range() {
        let update = BridgeConfigUpdate {
            frequency_range: Some([50.0, 5000.0]),
            high_freq: Some(8000.0),
            ..Default::default()
        };
        let merged = BridgeConfig::default().merged(&update).unwrap();
        assert_eq!(merged.low_freq, 50.0);
        assert_eq!(merged.high_freq, 8000.0);
    }

    #[test]
    fn test_update_deserializes_camel_case() {
        let update: BridgeConfigUpdate =
            serde_json::from_str(r#"{"lowFreq": 20, "highFreq": 20000, "smoothing": "1/6 octave"}"#)
                .unwrap();
        assert_eq!(update.low_freq, Some(20.0));
        assert_eq!(update.high_freq, Some(20000.0));
        assert_eq!(update.smoothing, Some(Smoothing::SixthOctave));
        assert!(update.sample_rate.is_none());
    }

    #[test]
    fn test_update_rejects_unknown_field() {
        let result = serde_json::from_str::<BridgeConfigUpdate>(r#"{"lowFrequency": 20}"#);
        assert!(result.is_err());
    }
}
