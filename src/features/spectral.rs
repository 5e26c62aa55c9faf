// Spectral shape descriptors over a magnitude spectrogram `[bin][frame]`.
//
// All three treat a frame as a distribution over bin frequencies weighted by
// magnitude. A frame with no energy yields 0 for every descriptor.

use ndarray::{Array1, Array2, ArrayView1, Axis};

/// Per-frame magnitude-weighted mean frequency in Hz.
pub fn centroid(magnitude: &Array2<f64>, frequencies: &[f64]) -> Array1<f64> {
    magnitude
        .axis_iter(Axis(1))
        .map(|frame| frame_centroid(frame, frequencies))
        .collect()
}

/// Per-frame spread around the centroid: `sqrt(Σ p_k (f_k - centroid)²)`.
pub fn bandwidth(magnitude: &Array2<f64>, frequencies: &[f64]) -> Array1<f64> {
    magnitude
        .axis_iter(Axis(1))
        .map(|frame| {
            let total: f64 = frame.sum();
            if total < f64::MIN_POSITIVE {
                return 0.0;
            }
            let center = frame_centroid(frame, frequencies);
            frame
                .iter()
                .zip(frequencies)
                .map(|(&mag, &freq)| (mag / total) * (freq - center).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}

/// Per-frame lowest bin frequency below which `percent` of the magnitude lies.
pub fn rolloff(magnitude: &Array2<f64>, frequencies: &[f64], percent: f64) -> Array1<f64> {
    magnitude
        .axis_iter(Axis(1))
        .map(|frame| {
            let threshold = percent * frame.sum();
            let mut cumulative = 0.0;
            for (&mag, &freq) in frame.iter().zip(frequencies) {
                cumulative += mag;
                if cumulative >= threshold {
                    return freq;
                }
            }
            frequencies.last().copied().unwrap_or(0.0)
        })
        .collect()
}

fn frame_centroid(frame: ArrayView1<f64>, frequencies: &[f64]) -> f64 {
    let total: f64 = frame.sum();
    if total < f64::MIN_POSITIVE {
        return 0.0;
    }
    frame
        .iter()
        .zip(frequencies)
        .map(|(&mag, &freq)| freq * mag)
        .sum::<f64>()
        / total
}
