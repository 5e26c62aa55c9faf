use std::f64::consts::PI;

use ndarray::Array2;

use super::stft::fft_frequencies;

const MEL_F_SP: f64 = 200.0 / 3.0;
const MIN_LOG_HZ: f64 = 1_000.0;
const MIN_LOG_MEL: f64 = MIN_LOG_HZ / MEL_F_SP;
const AMIN: f64 = 1e-10;

fn log_step() -> f64 {
    6.4_f64.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f64) -> f64 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / MEL_F_SP
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        MEL_F_SP * mel
    }
}

/// `count` frequencies evenly spaced on the mel scale between `fmin` and `fmax`.
pub fn mel_frequencies(count: usize, fmin: f64, fmax: f64) -> Vec<f64> {
    let low = hz_to_mel(fmin);
    let high = hz_to_mel(fmax);
    if count == 1 {
        return vec![mel_to_hz(low)];
    }
    (0..count)
        .map(|i| mel_to_hz(low + (high - low) * i as f64 / (count - 1) as f64))
        .collect()
}

/// Triangular, area-normalised mel filterbank shaped `[band][fft bin]`.
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    weights: Array2<f64>,
}

impl MelFilterbank {
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize, fmin: f64, fmax: f64) -> Self {
        let fft_freqs = fft_frequencies(sample_rate, n_fft);
        let mel_f = mel_frequencies(n_mels + 2, fmin, fmax);
        let mut weights = Array2::zeros((n_mels, fft_freqs.len()));

        for band in 0..n_mels {
            let lower_width = mel_f[band + 1] - mel_f[band];
            let upper_width = mel_f[band + 2] - mel_f[band + 1];
            let enorm = 2.0 / (mel_f[band + 2] - mel_f[band]);
            for (bin, &freq) in fft_freqs.iter().enumerate() {
                let lower = (freq - mel_f[band]) / lower_width;
                let upper = (mel_f[band + 2] - freq) / upper_width;
                weights[[band, bin]] = lower.min(upper).max(0.0) * enorm;
            }
        }

        Self { weights }
    }

    /// Full-band filterbank, 0 Hz to Nyquist.
    pub fn full_band(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        Self::new(sample_rate, n_fft, n_mels, 0.0, sample_rate as f64 / 2.0)
    }

    pub fn n_mels(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Project a power spectrogram `[bin][frame]` onto the mel bands.
    pub fn apply(&self, power: &Array2<f64>) -> Array2<f64> {
        self.weights.dot(power)
    }
}

/// Reference level for [`power_to_db`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DbReference {
    Fixed(f64),
    /// Relative to the loudest cell of the input.
    Max,
}

/// `10 * log10(S / ref)` with a `1e-10` floor, optionally clipped to `top_db`
/// below the loudest cell.
pub fn power_to_db(power: &Array2<f64>, reference: DbReference, top_db: Option<f64>) -> Array2<f64> {
    let reference = match reference {
        DbReference::Fixed(value) => value.abs(),
        DbReference::Max => power.iter().fold(0.0_f64, |acc, &v| acc.max(v.abs())),
    };
    let offset = 10.0 * AMIN.max(reference).log10();
    let mut log_spec = power.mapv(|v| 10.0 * AMIN.max(v).log10() - offset);

    if let Some(top_db) = top_db {
        let peak = log_spec.iter().fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        let floor = peak - top_db;
        log_spec.mapv_inplace(|v| v.max(floor));
    }

    log_spec
}

/// Orthonormal DCT-II over the mel axis, truncated to the leading coefficients.
#[derive(Debug, Clone)]
pub struct Cepstrum {
    basis: Array2<f64>,
}

impl Cepstrum {
    pub fn new(n_mfcc: usize, n_mels: usize) -> Self {
        let n = n_mels as f64;
        let basis = Array2::from_shape_fn((n_mfcc, n_mels), |(k, m)| {
            let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
            scale * (PI * k as f64 * (2.0 * m as f64 + 1.0) / (2.0 * n)).cos()
        });
        Self { basis }
    }

    /// Log-mel `[band][frame]` to cepstral coefficients `[coefficient][frame]`.
    pub fn transform(&self, log_mel: &Array2<f64>) -> Array2<f64> {
        self.basis.dot(log_mel)
    }
}

/// Power spectrogram → mel → dB → DCT, the cepstral chain shared by both paths.
#[derive(Debug, Clone)]
pub struct MfccTransform {
    filterbank: MelFilterbank,
    cepstrum: Cepstrum,
    top_db: f64,
}

impl MfccTransform {
    pub fn new(filterbank: MelFilterbank, n_mfcc: usize, top_db: f64) -> Self {
        let cepstrum = Cepstrum::new(n_mfcc, filterbank.n_mels());
        Self {
            filterbank,
            cepstrum,
            top_db,
        }
    }

    pub fn compute(&self, power: &Array2<f64>) -> Array2<f64> {
        let mel = self.filterbank.apply(power);
        let log_mel = power_to_db(&mel, DbReference::Fixed(1.0), Some(self.top_db));
        self.cepstrum.transform(&log_mel)
    }
}
