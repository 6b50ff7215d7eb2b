//! Parametric measurement generator
//!
//! Synthesizes the four measurement kinds from closed-form models of a
//! loudspeaker in a room: a baseline driver curve with low-frequency room
//! gain and high-frequency rolloff, narrow modal peaks, a delay-plus-ripple
//! phase model, a coherence model, and an exponential impulse decay with a
//! decaying oscillatory reflection.
//!
//! Measurement noise comes from an injected [`StdRng`]. Seed it for
//! reproducible output, or turn jitter off entirely for golden values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::BridgeConfig;
use crate::dsp;
use crate::measurement::{
    ImpulsePoint, MeasurementData, MeasurementKind, PhasePoint, SpectrumPoint, TransferPoint,
};

/// Modal frequencies of the simulated room in Hz
pub const ROOM_MODES: [f64; 5] = [60.0, 120.0, 180.0, 240.0, 300.0];

/// Peak excess energy of a room mode in dB
const MODE_GAIN_DB: f64 = 3.0;
/// Exponential width of a room mode in Hz
const MODE_WIDTH_HZ: f64 = 5.0;
/// Modes contribute nothing beyond this distance
const MODE_REACH_HZ: f64 = 10.0;

/// Low-frequency room gain below [`ROOM_GAIN_CUTOFF_HZ`]
const ROOM_GAIN_DB: f64 = 6.0;
const ROOM_GAIN_CUTOFF_HZ: f64 = 200.0;
/// High-frequency rolloff corner
const ROLLOFF_CORNER_HZ: f64 = 8000.0;

/// Fixed gain of the simulated transfer path
const TRANSFER_GAIN_DB: f64 = 10.0;

const BASE_COHERENCE: f64 = 0.9;
const HIGH_FREQ_COHERENCE_LOSS: f64 = 0.1;
const COHERENCE_LOSS_ABOVE_HZ: f64 = 10_000.0;

/// Peak-to-peak jitter spans
const LEVEL_JITTER_DB: f64 = 2.0;
const PHASE_JITTER_DEG: f64 = 10.0;
const COHERENCE_JITTER: f64 = 0.1;
const IMPULSE_JITTER: f64 = 0.1;

/// Baseline driver response in dB, without noise
pub fn base_response(frequency: f64) -> f64 {
    let base = -3.0 * (frequency / 1000.0).log10();
    let room_gain = if frequency < ROOM_GAIN_CUTOFF_HZ {
        ROOM_GAIN_DB
    } else {
        0.0
    };
    let rolloff = if frequency > ROLLOFF_CORNER_HZ {
        -12.0 * (frequency / ROLLOFF_CORNER_HZ).log10()
    } else {
        0.0
    };
    base + room_gain + rolloff
}

/// Summed excess energy of all room modes near `frequency`, in dB
pub fn room_modes(frequency: f64) -> f64 {
    ROOM_MODES
        .iter()
        .map(|mode| (frequency - mode).abs())
        .filter(|distance| *distance < MODE_REACH_HZ)
        .map(|distance| MODE_GAIN_DB * (-distance / MODE_WIDTH_HZ).exp())
        .sum()
}

/// Linear delay term plus room ripple, in degrees, without noise
pub fn phase_response(frequency: f64) -> f64 {
    -0.001 * frequency + 30.0 * (0.01 * frequency).sin()
}

/// Coherence before noise and clamping
pub fn coherence_baseline(frequency: f64) -> f64 {
    if frequency > COHERENCE_LOSS_ABOVE_HZ {
        BASE_COHERENCE - HIGH_FREQ_COHERENCE_LOSS
    } else {
        BASE_COHERENCE
    }
}

/// Main-arrival decay plus a decaying oscillatory reflection, without noise
pub fn impulse_response(time: f64) -> f64 {
    (-2.0 * time).exp() + 0.3 * (100.0 * time).sin() * (-5.0 * time).exp()
}

/// Parametric measurement generator
pub struct Generator {
    rng: StdRng,
    jitter: bool,
}

impl Generator {
    /// Generator with jitter drawn from `rng`
    pub fn new(rng: StdRng, jitter: bool) -> Self {
        Self { rng, jitter }
    }

    /// Seeded generator, entropy-seeded when `seed` is `None`
    pub fn from_seed(seed: Option<u64>, jitter: bool) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(rng, jitter)
    }

    /// Noise-free generator
    pub fn deterministic() -> Self {
        Self::new(StdRng::seed_from_u64(0), false)
    }

    /// Symmetric noise in `[-span/2, span/2)`
    fn noise(&mut self, span: f64) -> f64 {
        if self.jitter {
            (self.rng.gen::<f64>() - 0.5) * span
        } else {
            0.0
        }
    }

    fn level(&mut self, frequency: f64) -> f64 {
        base_response(frequency) + self.noise(LEVEL_JITTER_DB) + room_modes(frequency)
    }

    fn phase(&mut self, frequency: f64) -> f64 {
        phase_response(frequency) + self.noise(PHASE_JITTER_DEG)
    }

    fn coherence(&mut self, frequency: f64) -> f64 {
        (coherence_baseline(frequency) + self.noise(COHERENCE_JITTER)).clamp(0.0, 1.0)
    }

    /// Synthesize one measurement of `kind`
    pub fn generate(&mut self, kind: MeasurementKind, config: &BridgeConfig) -> MeasurementData {
        match kind {
            MeasurementKind::Spectrum => MeasurementData::Spectrum(self.spectrum(config)),
            MeasurementKind::TransferFunction => {
                MeasurementData::TransferFunction(self.transfer_function(config))
            }
            MeasurementKind::Phase => MeasurementData::Phase(self.phase_data(config)),
            MeasurementKind::ImpulseResponse => {
                MeasurementData::ImpulseResponse(self.impulse(config))
            }
        }
    }

    pub fn spectrum(&mut self, config: &BridgeConfig) -> Vec<SpectrumPoint> {
        dsp::frequency_axis(config.low_freq, config.high_freq)
            .into_iter()
            .map(|frequency| SpectrumPoint {
                frequency,
                level: self.level(frequency),
                phase: self.phase(frequency),
                coherence: self.coherence(frequency),
            })
            .collect()
    }

    /// Base + room-mode response shifted by the fixed transfer gain
    pub fn transfer_function(&mut self, config: &BridgeConfig) -> Vec<TransferPoint> {
        dsp::frequency_axis(config.low_freq, config.high_freq)
            .into_iter()
            .map(|frequency| TransferPoint {
                frequency,
                magnitude: self.level(frequency) + TRANSFER_GAIN_DB,
                phase: self.phase(frequency),
                coherence: self.coherence(frequency),
            })
            .collect()
    }

    /// Raw phase with unwrapped phase and group delay over the same sweep
    pub fn phase_data(&mut self, config: &BridgeConfig) -> Vec<PhasePoint> {
        let frequencies = dsp::frequency_axis(config.low_freq, config.high_freq);
        let raw: Vec<f64> = frequencies.iter().map(|&f| self.phase(f)).collect();
        phase_points(&frequencies, &raw)
    }

    /// Uniformly sampled impulse response starting at t = 0
    pub fn impulse(&mut self, config: &BridgeConfig) -> Vec<ImpulsePoint> {
        let step = config.impulse_step();
        (0..config.impulse_points)
            .map(|i| {
                let time = i as f64 * step;
                ImpulsePoint {
                    time,
                    amplitude: impulse_response(time) + self.noise(IMPULSE_JITTER),
                }
            })
            .collect()
    }
}

/// Assemble phase points from a frequency axis and raw phase in degrees
pub fn phase_points(frequencies: &[f64], raw: &[f64]) -> Vec<PhasePoint> {
    let unwrapped = dsp::unwrap_phase(raw);
    let delays = dsp::group_delay(frequencies, &unwrapped);
    frequencies
        .iter()
        .zip(raw)
        .zip(unwrapped.iter().zip(delays))
        .map(|((&frequency, &phase), (&unwrapped_phase, group_delay))| PhasePoint {
            frequency,
            phase,
            unwrapped_phase,
            group_delay,
        })
        .collect()
}
