// Time-domain frame descriptors.
//
// Both use centred framing with the same geometry as the STFT: frame `t` is
// `[t * hop - frame_length / 2, t * hop + frame_length / 2)`. RMS pads with
// zeros, zero-crossing rate replicates the edge samples.

use ndarray::Array1;

fn frame_count(signal_len: usize, hop_length: usize) -> usize {
    1 + signal_len / hop_length
}

/// Root-mean-square amplitude per frame.
pub fn rms(signal: &[f64], frame_length: usize, hop_length: usize) -> Array1<f64> {
    let offset = frame_length / 2;
    (0..frame_count(signal.len(), hop_length))
        .map(|frame| {
            let start = (frame * hop_length) as isize - offset as isize;
            let lo = start.max(0) as usize;
            let hi = ((start + frame_length as isize).max(0) as usize).min(signal.len());
            let energy: f64 = if lo < hi {
                signal[lo..hi].iter().map(|x| x * x).sum()
            } else {
                0.0
            };
            (energy / frame_length as f64).sqrt()
        })
        .collect()
}

/// Fraction of adjacent sample pairs per frame whose sign differs.
///
/// Samples with magnitude at or below `threshold` count as zero, and zero
/// counts as positive.
pub fn zero_crossing_rate(
    signal: &[f64],
    frame_length: usize,
    hop_length: usize,
    threshold: f64,
) -> Array1<f64> {
    let n_frames = frame_count(signal.len(), hop_length);
    if signal.is_empty() {
        return Array1::zeros(n_frames);
    }

    let negative: Vec<bool> = signal
        .iter()
        .map(|&x| x.abs() > threshold && x.is_sign_negative())
        .collect();
    let last = signal.len() - 1;
    let offset = frame_length / 2;
    let sign_at = |position: isize| -> bool {
        let index = position.clamp(0, last as isize) as usize;
        negative[index]
    };

    (0..n_frames)
        .map(|frame| {
            let start = (frame * hop_length) as isize - offset as isize;
            let crossings = (1..frame_length as isize)
                .filter(|&i| sign_at(start + i) != sign_at(start + i - 1))
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rms_of_constant_signal_away_from_edges() {
        let signal = vec![0.5; 4096];
        let values = rms(&signal, 1024, 256);
        assert_eq!(values.len(), 17);
        assert_abs_diff_eq!(values[8], 0.5, epsilon = 1e-12);
        // The first frame is half padding.
        assert_abs_diff_eq!(values[0], (0.125_f64).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn alternating_signal_crosses_every_sample() {
        let signal: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let zcr = zero_crossing_rate(&signal, 16, 8, 1e-10);
        assert_abs_diff_eq!(zcr[4], 15.0 / 16.0, epsilon = 1e-12);
    }

    #[test]
    fn silence_and_tiny_values_never_cross() {
        let silence = vec![0.0; 1000];
        assert!(zero_crossing_rate(&silence, 256, 64, 1e-10)
            .iter()
            .all(|&v| v == 0.0));

        let dither: Vec<f64> = (0..1000).map(|i| if i % 2 == 0 { 1e-12 } else { -1e-12 }).collect();
        assert!(zero_crossing_rate(&dither, 256, 64, 1e-10)
            .iter()
            .all(|&v| v == 0.0));
        assert!(rms(&silence, 256, 64).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_signal_yields_one_zero_frame() {
        assert_eq!(rms(&[], 2048, 512).to_vec(), vec![0.0]);
        assert_eq!(zero_crossing_rate(&[], 2048, 512, 1e-10).to_vec(), vec![0.0]);
    }
}
