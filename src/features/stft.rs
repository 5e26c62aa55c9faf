use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Centred short-time Fourier transform with a periodic Hann window.
///
/// Frame `t` covers `[t * hop - n_fft / 2, t * hop + n_fft / 2)` of the input;
/// samples outside the signal read as zero. A signal of `len` samples yields
/// `1 + len / hop` frames.
pub struct Stft {
    n_fft: usize,
    hop_length: usize,
    window: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for Stft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stft")
            .field("n_fft", &self.n_fft)
            .field("hop_length", &self.hop_length)
            .finish()
    }
}

impl Stft {
    pub fn new(n_fft: usize, hop_length: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n_fft);
        Self {
            n_fft,
            hop_length,
            window: periodic_hann(n_fft),
            fft,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub fn frame_count(&self, signal_len: usize) -> usize {
        1 + signal_len / self.hop_length
    }

    /// Magnitude spectrogram shaped `[bin][frame]`.
    pub fn magnitude(&self, signal: &[f64]) -> Array2<f64> {
        let n_frames = self.frame_count(signal.len());
        let n_bins = self.n_bins();
        let offset = self.n_fft / 2;
        let mut spectrogram = Array2::zeros((n_bins, n_frames));
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let mut scratch = vec![Complex::new(0.0, 0.0); self.fft.get_inplace_scratch_len()];

        for frame in 0..n_frames {
            let start = (frame * self.hop_length) as isize - offset as isize;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let position = start + i as isize;
                let sample = if position >= 0 && (position as usize) < signal.len() {
                    signal[position as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft.process_with_scratch(&mut buffer, &mut scratch);
            for (bin, value) in buffer[..n_bins].iter().enumerate() {
                spectrogram[[bin, frame]] = value.norm();
            }
        }

        spectrogram
    }
}

/// Centre frequency in Hz of every one-sided FFT bin.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f64> {
    (0..=n_fft / 2)
        .map(|bin| bin as f64 * sample_rate as f64 / n_fft as f64)
        .collect()
}

fn periodic_hann(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / size as f64).cos())
        .collect()
}
