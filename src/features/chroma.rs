//! Pitch-class energy: tuning estimation, chroma filterbank and chromagram.

use ndarray::{Array2, Axis};

use super::stft::fft_frequencies;

const PITCH_FMIN: f64 = 150.0;
const PITCH_FMAX: f64 = 4_000.0;
const PITCH_THRESHOLD: f64 = 0.1;
const TUNING_RESOLUTION: f64 = 0.01;
const CENTER_OCTAVE: f64 = 5.0;
const OCTAVE_WIDTH: f64 = 2.0;

/// Octaves above A0 (27.5 Hz) for a tuning offset given in fractional bins.
fn hz_to_octs(hz: f64, tuning: f64, bins_per_octave: usize) -> f64 {
    let a440 = 440.0 * 2f64.powf(tuning / bins_per_octave as f64);
    (hz / (a440 / 16.0)).log2()
}

/// Parabolic-peak pitch tracking over a power spectrogram `[bin][frame]`.
///
/// Returns `(pitches, magnitudes)` with the same shape as the input; cells
/// that are not spectral peaks hold zero in both.
pub fn piptrack(power: &Array2<f64>, sample_rate: u32, n_fft: usize) -> (Array2<f64>, Array2<f64>) {
    let (n_bins, n_frames) = power.dim();
    let fmax = PITCH_FMAX.min(sample_rate as f64 / 2.0);
    let freqs = fft_frequencies(sample_rate, n_fft);
    let mut pitches = Array2::zeros((n_bins, n_frames));
    let mut mags = Array2::zeros((n_bins, n_frames));
    if n_bins < 3 {
        return (pitches, mags);
    }

    for frame in 0..n_frames {
        let column = power.column(frame);
        let reference = PITCH_THRESHOLD * column.iter().fold(f64::NEG_INFINITY, |a, &v| a.max(v));
        let gated: Vec<f64> = column
            .iter()
            .map(|&v| if v > reference { v } else { 0.0 })
            .collect();

        for bin in 1..n_bins {
            if !(PITCH_FMIN <= freqs[bin] && freqs[bin] < fmax) {
                continue;
            }
            let next = if bin + 1 < n_bins { gated[bin + 1] } else { gated[bin] };
            if !(gated[bin] > gated[bin - 1] && gated[bin] >= next) {
                continue;
            }

            let (shift, slope) = if bin + 1 < n_bins {
                let curvature = column[bin + 1] + column[bin - 1] - 2.0 * column[bin];
                let slope = (column[bin + 1] - column[bin - 1]) / 2.0;
                let shift = if slope.abs() < curvature.abs() {
                    -slope / curvature
                } else {
                    0.0
                };
                (shift, slope)
            } else {
                (0.0, column[bin] - column[bin - 1])
            };

            pitches[[bin, frame]] = (bin as f64 + shift) * sample_rate as f64 / n_fft as f64;
            mags[[bin, frame]] = column[bin] + 0.5 * slope * shift;
        }
    }

    (pitches, mags)
}

/// Most common deviation (in fractional bins) of `frequencies` from equal
/// temperament at A440.
pub fn pitch_tuning(frequencies: &[f64], bins_per_octave: usize) -> f64 {
    let residuals: Vec<f64> = frequencies
        .iter()
        .filter(|&&f| f > 0.0)
        .map(|&f| {
            let residual = (bins_per_octave as f64 * hz_to_octs(f, 0.0, bins_per_octave)).rem_euclid(1.0);
            if residual >= 0.5 {
                residual - 1.0
            } else {
                residual
            }
        })
        .collect();
    if residuals.is_empty() {
        return 0.0;
    }

    let n_bins = (1.0 / TUNING_RESOLUTION).ceil() as usize;
    let edge = |i: usize| -0.5 + i as f64 * (1.0 / n_bins as f64);
    let mut counts = vec![0usize; n_bins];
    for &r in &residuals {
        let mut index = (((r - edge(0)) * n_bins as f64) as usize).min(n_bins - 1);
        if r < edge(index) && index > 0 {
            index -= 1;
        } else if index + 1 < n_bins && r >= edge(index + 1) {
            index += 1;
        }
        counts[index] += 1;
    }

    let best = counts
        .iter()
        .enumerate()
        .fold(0, |best, (i, &count)| if count > counts[best] { i } else { best });
    edge(best)
}

/// Tuning offset of a power spectrogram, from its strongest spectral peaks.
pub fn estimate_tuning(power: &Array2<f64>, sample_rate: u32, n_fft: usize, bins_per_octave: usize) -> f64 {
    let (pitches, mags) = piptrack(power, sample_rate, n_fft);
    let mut voiced: Vec<f64> = pitches
        .iter()
        .zip(mags.iter())
        .filter(|&(&p, _)| p > 0.0)
        .map(|(_, &m)| m)
        .collect();
    let threshold = median(&mut voiced).unwrap_or(0.0);

    let selected: Vec<f64> = pitches
        .iter()
        .zip(mags.iter())
        .filter(|&(&p, &m)| p > 0.0 && m >= threshold)
        .map(|(&p, _)| p)
        .collect();
    pitch_tuning(&selected, bins_per_octave)
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Chroma filterbank shaped `[pitch class][fft bin]`, row 0 = C.
pub fn chroma_filterbank(sample_rate: u32, n_fft: usize, n_chroma: usize, tuning: f64) -> Array2<f64> {
    let n_bins = n_fft / 2 + 1;
    let chroma = n_chroma as f64;

    // Octave position of every bin; the DC bin sits 1.5 octaves below bin 1.
    let mut frqbins = Vec::with_capacity(n_bins + 1);
    frqbins.push(0.0);
    for k in 1..=n_bins {
        let hz = k as f64 * sample_rate as f64 / n_fft as f64;
        frqbins.push(chroma * hz_to_octs(hz, tuning, n_chroma));
    }
    frqbins[0] = frqbins[1] - 1.5 * chroma;

    let half = (chroma / 2.0).round();
    let mut weights = Array2::zeros((n_chroma, n_bins));
    for k in 0..n_bins {
        let width = if k + 1 < n_fft {
            (frqbins[k + 1] - frqbins[k]).max(1.0)
        } else {
            1.0
        };
        for c in 0..n_chroma {
            let distance = (frqbins[k] - c as f64 + half + 10.0 * chroma).rem_euclid(chroma) - half;
            weights[[c, k]] = (-0.5 * (2.0 * distance / width).powi(2)).exp();
        }

        let norm = weights.column(k).iter().map(|w| w * w).sum::<f64>().sqrt();
        let octave_weight = (-0.5 * ((frqbins[k] / chroma - CENTER_OCTAVE) / OCTAVE_WIDTH).powi(2)).exp();
        let scale = if norm >= f64::MIN_POSITIVE { octave_weight / norm } else { octave_weight };
        weights.column_mut(k).mapv_inplace(|w| w * scale);
    }

    // Bin 0 of the raw bank is A; rotate so C comes first.
    let shift = 3 * (n_chroma / 12);
    Array2::from_shape_fn((n_chroma, n_bins), |(c, k)| weights[[(c + shift) % n_chroma, k]])
}

/// Per-frame chroma shaped `[pitch class][frame]`, each frame scaled so its
/// strongest class is 1 (silent frames stay zero).
pub fn chromagram(power: &Array2<f64>, sample_rate: u32, n_fft: usize, n_chroma: usize) -> Array2<f64> {
    let tuning = estimate_tuning(power, sample_rate, n_fft, n_chroma);
    let filterbank = chroma_filterbank(sample_rate, n_fft, n_chroma, tuning);
    let mut chroma = filterbank.dot(power);

    for mut frame in chroma.axis_iter_mut(Axis(1)) {
        let peak = frame.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs()));
        if peak >= f64::MIN_POSITIVE {
            frame.mapv_inplace(|v| v / peak);
        }
    }

    chroma
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stft::Stft;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn tone_power(freq: f64, sample_rate: u32) -> Array2<f64> {
        let signal: Vec<f64> = (0..sample_rate as usize)
            .map(|n| 0.5 * (2.0 * PI * freq * n as f64 / sample_rate as f64).sin())
            .collect();
        Stft::new(2048, 512).magnitude(&signal).mapv(|m| m * m)
    }

    #[test]
    fn tuning_of_in_tune_frequencies_is_zero() {
        let frequencies = [440.0, 880.0, 261.625_565_3, 220.0];
        assert_abs_diff_eq!(pitch_tuning(&frequencies, 12), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn tuning_detects_quarter_tone_sharp() {
        let sharp = 440.0 * 2f64.powf(0.25 / 12.0);
        let tuning = pitch_tuning(&[sharp, sharp * 2.0], 12);
        assert_abs_diff_eq!(tuning, 0.25, epsilon = 0.011);
    }

    #[test]
    fn tuning_without_pitches_is_zero() {
        assert_eq!(pitch_tuning(&[], 12), 0.0);
        assert_eq!(pitch_tuning(&[0.0, -3.0], 12), 0.0);
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn piptrack_finds_the_tone() {
        let power = tone_power(440.0, 22_050);
        let (pitches, _) = piptrack(&power, 22_050, 2048);
        let frame = pitches.column(20);
        let strongest = frame.iter().cloned().filter(|&p| p > 0.0).collect::<Vec<_>>();
        assert!(!strongest.is_empty());
        assert!(strongest.iter().any(|&p| (p - 440.0).abs() < 10.0));
    }

    #[test]
    fn a440_lands_in_pitch_class_a() {
        let power = tone_power(440.0, 22_050);
        let chroma = chromagram(&power, 22_050, 2048, 12);
        assert_eq!(chroma.nrows(), 12);
        let means = chroma.mean_axis(Axis(1)).unwrap();
        let loudest = means
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > means[best] { i } else { best });
        assert_eq!(loudest, 9, "A is the tenth pitch class counting from C");
    }

    #[test]
    fn silent_frames_stay_zero() {
        let power = Array2::zeros((1025, 5));
        let chroma = chromagram(&power, 22_050, 2048, 12);
        assert!(chroma.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn filterbank_rows_start_at_c() {
        let filterbank = chroma_filterbank(22_050, 2048, 12, 0.0);
        // 261.6 Hz (middle C) is closest to bin 24 at 22.05 kHz / 2048.
        let column = filterbank.column(24);
        let loudest = column
            .iter()
            .enumerate()
            .fold(0, |best, (i, &v)| if v > column[best] { i } else { best });
        assert_eq!(loudest, 0);
    }
}
