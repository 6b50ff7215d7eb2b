//! Axis construction and phase/decay helpers shared by the generator,
//! the file converters and the analysis engine.

use crate::measurement::ImpulsePoint;

/// Ratio between consecutive bins: 2^(1/12), one-twelfth-octave spacing
pub const TWELFTH_OCTAVE_RATIO: f64 = 1.059_463_094_359_295_3;

/// Fraction of peak amplitude that ends the decay window
pub const DECAY_THRESHOLD: f64 = 0.1;

/// Log-spaced frequency axis
///
/// Starts at `low` and multiplies by [`TWELFTH_OCTAVE_RATIO`] until the next
/// bin would exceed `high`. Returns an empty axis when `low` is not a
/// positive normal float or exceeds `high`.
pub fn frequency_axis(low: f64, high: f64) -> Vec<f64> {
    let mut frequencies = Vec::new();
    // Subnormal bins do not grow when multiplied by the ratio
    if !(low.is_normal() && low > 0.0) || !high.is_finite() {
        return frequencies;
    }

    let mut freq = low;
    while freq <= high {
        frequencies.push(freq);
        freq *= TWELFTH_OCTAVE_RATIO;
    }
    frequencies
}

/// Sequential phase unwrapping in degrees
///
/// Each sample is shifted by whole turns until it lies within ±180° of the
/// previous unwrapped value, so consecutive differences of the output always
/// fall in [-180°, 180°]. The first sample is kept as is.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut unwrapped: Vec<f64> = Vec::with_capacity(phase.len());

    for &raw in phase {
        let Some(&previous) = unwrapped.last() else {
            unwrapped.push(raw);
            continue;
        };
        let turns = ((raw - previous) / 360.0).round();
        let mut value = raw - turns * 360.0;
        // Rounding leaves exactly ±180° possible; floating error can push past it
        while value - previous > 180.0 {
            value -= 360.0;
        }
        while value - previous < -180.0 {
            value += 360.0;
        }
        unwrapped.push(value);
    }

    unwrapped
}

/// Central-difference group delay in seconds
///
/// `-(φ[i+1] - φ[i-1]) / (360 · (f[i+1] - f[i-1]))` with phase in degrees.
/// The output has the same length as the input; the first and last entries
/// (and every entry of inputs shorter than three points) are `None`.
pub fn group_delay(frequencies: &[f64], phase: &[f64]) -> Vec<Option<f64>> {
    let n = frequencies.len().min(phase.len());
    (0..n)
        .map(|i| {
            if i == 0 || i + 1 >= n {
                return None;
            }
            let freq_diff = frequencies[i + 1] - frequencies[i - 1];
            if freq_diff == 0.0 {
                return None;
            }
            Some(-(phase[i + 1] - phase[i - 1]) / (360.0 * freq_diff))
        })
        .collect()
}

/// Length of the impulse window in seconds
///
/// Last sample time plus one sample step, i.e. 1.0 s for 1000 samples at
/// 1 ms. A single sample spans zero seconds.
pub fn impulse_window(points: &[ImpulsePoint]) -> f64 {
    match points {
        [] => 0.0,
        [only] => only.time,
        [first, second, ..] => {
            let step = second.time - first.time;
            points[points.len() - 1].time + step
        }
    }
}

/// Peak absolute amplitude
pub fn peak_magnitude(points: &[ImpulsePoint]) -> f64 {
    points
        .iter()
        .map(|p| p.amplitude.abs())
        .fold(0.0, f64::max)
}

/// Time of the first sample whose magnitude drops below 10% of peak
///
/// Falls back to the full window length when the response never decays
/// that far.
pub fn decay_time(points: &[ImpulsePoint]) -> f64 {
    let threshold = peak_magnitude(points) * DECAY_THRESHOLD;
    points
        .iter()
        .find(|p| p.amplitude.abs() < threshold)
        .map(|p| p.time)
        .unwrap_or_else(|| impulse_window(points))
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Minimum and maximum, `None` for an empty slice
pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_constant_matches_twelfth_root_of_two() {
        assert!((TWELFTH_OCTAVE_RATIO - 2f64.powf(1.0 / 12.0)).abs() < 1e-15);
    }

    #[test]
    fn test_frequency_axis_spacing() {
        let axis = frequency_axis(20.0, 20_000.0);
        assert_eq!(axis[0], 20.0);
        assert!(*axis.last().unwrap() <= 20_000.0);
        // 20 * r^k <= 20000 holds for k = 0..=119
        assert_eq!(axis.len(), 120);
        for pair in axis.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!((pair[1] / pair[0] - TWELFTH_OCTAVE_RATIO).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frequency_axis_degenerate_bounds() {
        assert!(frequency_axis(0.0, 100.0).is_empty());
        assert!(frequency_axis(200.0, 100.0).is_empty());
        assert_eq!(frequency_axis(100.0, 100.0), vec![100.0]);
    }

    #[test]
    fn test_frequency_axis_subnormal_low_is_empty() {
        assert_eq!(5e-324 * TWELFTH_OCTAVE_RATIO, 5e-324);
        assert!(frequency_axis(5e-324, 20_000.0).is_empty());
    }

    #[test]
    fn test_unwrap_removes_full_turn_jumps() {
        let unwrapped = unwrap_phase(&[170.0, -175.0, -160.0]);
        assert_eq!(unwrapped[0], 170.0);
        assert!((unwrapped[1] - 185.0).abs() < 1e-9);
        assert!((unwrapped[2] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_unwrap_handles_multi_turn_jumps() {
        let unwrapped = unwrap_phase(&[0.0, 1090.0, -700.0]);
        for pair in unwrapped.windows(2) {
            let diff = pair[1] - pair[0];
            assert!((-180.0..=180.0).contains(&diff), "diff {} out of range", diff);
        }
        assert!((unwrapped[1] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_unwrap_differences_stay_within_half_turn() {
        // Pseudo-random sequence with large swings
        let raw: Vec<f64> = (0..500)
            .map(|i| ((i * 7919) % 2000) as f64 - 1000.0)
            .collect();
        let unwrapped = unwrap_phase(&raw);
        assert_eq!(unwrapped.len(), raw.len());
        for pair in unwrapped.windows(2) {
            let diff = pair[1] - pair[0];
            assert!((-180.0..=180.0).contains(&diff));
        }
    }

    #[test]
    fn test_unwrap_empty() {
        assert!(unwrap_phase(&[]).is_empty());
    }

    #[test]
    fn test_group_delay_of_linear_phase() {
        // 1 ms of pure delay: phase = -360 * f * 0.001 degrees
        let freqs = [100.0, 200.0, 300.0, 400.0];
        let phase: Vec<f64> = freqs.iter().map(|f| -360.0 * f * 0.001).collect();
        let delay = group_delay(&freqs, &phase);

        assert_eq!(delay.len(), 4);
        assert!(delay[0].is_none());
        assert!(delay[3].is_none());
        assert!((delay[1].unwrap() - 0.001).abs() < 1e-12);
        assert!((delay[2].unwrap() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_group_delay_short_input() {
        assert_eq!(group_delay(&[100.0, 200.0], &[0.0, 10.0]), vec![None, None]);
    }

    fn impulse(amplitudes: &[f64]) -> Vec<ImpulsePoint> {
        amplitudes
            .iter()
            .enumerate()
            .map(|(i, &amplitude)| ImpulsePoint {
                time: i as f64 * 0.01,
                amplitude,
            })
            .collect()
    }

    #[test]
    fn test_decay_time_first_sample_below_threshold() {
        let points = impulse(&[1.0, 0.5, 0.2, 0.05, 0.5]);
        assert!((decay_time(&points) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_decay_time_uses_absolute_values() {
        let points = impulse(&[0.2, -1.0, -0.5, 0.09]);
        assert!((decay_time(&points) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn test_decay_time_defaults_to_window() {
        let points = impulse(&[1.0, 0.9, 0.8, 0.7]);
        assert!((decay_time(&points) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_mean_and_min_max() {
        assert_eq!(mean([1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(std::iter::empty()), None);
        assert_eq!(min_max([3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(min_max(std::iter::empty()), None);
    }
}
