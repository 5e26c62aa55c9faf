//! Whole-clip cepstral analysis for display and comparison.

use std::io::BufWriter;
use std::path::Path;

use ndarray::Array2;
use serde::Serialize;
use tracing::{debug, warn};

use crate::audio::resample::resample_waveform;
use crate::config::{ClipConfig, HOP_LENGTH, LOG_MEL_TOP_DB, N_FFT, N_MELS};
use crate::error::{FeatureError, Result};
use crate::features::mel::{power_to_db, DbReference, MelFilterbank, MfccTransform};
use crate::features::statistics::{normalize_rows, summarize_rows, RowSummary};
use crate::features::stft::Stft;
use crate::types::Waveform;

/// First-order high-pass `y[n] = x[n] - coef * x[n - 1]`.
///
/// The sample preceding `x[0]` is extrapolated as `2 * x[0] - x[1]`, so a
/// linear ramp stays flat from the very first output.
pub fn preemphasis(samples: &[f64], coef: f64) -> Vec<f64> {
    let Some(&first) = samples.first() else {
        return Vec::new();
    };
    let before_first = match samples.get(1) {
        Some(&second) => 2.0 * first - second,
        None => first,
    };
    std::iter::once(first - coef * before_first)
        .chain(samples.windows(2).map(|pair| pair[1] - coef * pair[0]))
        .collect()
}

/// Cepstral coefficients of the whole clip, each row standardised across
/// frames.
///
/// Rows with zero variance come back centred (all zeros) instead of scaled;
/// see [`analyze_clip`] for their indices.
pub fn compute_mfcc(waveform: &Waveform, config: &ClipConfig) -> Result<Array2<f64>> {
    let (mut mfcc, _) = raw_mfcc(waveform, config)?;
    normalize_rows(&mut mfcc);
    Ok(mfcc)
}

/// Everything the clip view needs, serialisable as one JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct ClipAnalysis {
    /// Analysed sample rate of `mfcc` (the clip rate, not the native one)
    pub sample_rate: u32,
    pub frames: usize,
    /// Standardised coefficients, `[coefficient][frame]`
    pub mfcc: Array2<f64>,
    /// Rows left centred but unscaled because their variance was zero
    pub unscaled_rows: Vec<usize>,
    /// Per-coefficient statistics before standardisation
    pub summary: Vec<RowSummary>,
    /// Mel power in dB relative to its maximum, at the native sample rate
    pub mel_db: Array2<f64>,
}

impl ClipAnalysis {
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

pub fn analyze_clip(waveform: &Waveform, config: &ClipConfig) -> Result<ClipAnalysis> {
    let (raw, sample_rate) = raw_mfcc(waveform, config)?;
    let summary = summarize_rows(&raw);
    let mut mfcc = raw;
    let unscaled_rows = normalize_rows(&mut mfcc);
    if !unscaled_rows.is_empty() {
        warn!(
            rows = ?unscaled_rows,
            "coefficient rows have zero variance and were left unscaled"
        );
    }
    let mel_db = mel_spectrogram_db(waveform)?;

    Ok(ClipAnalysis {
        sample_rate,
        frames: mfcc.ncols(),
        mfcc,
        unscaled_rows,
        summary,
        mel_db,
    })
}

/// 128-band mel spectrogram in dB at the waveform's own rate, floored 80 dB
/// below its loudest cell.
pub fn mel_spectrogram_db(waveform: &Waveform) -> Result<Array2<f64>> {
    check_clip(waveform)?;
    let stft = Stft::new(N_FFT, HOP_LENGTH);
    let power = stft.magnitude(&waveform.samples_f64()).mapv(|m| m * m);
    let mel = MelFilterbank::full_band(waveform.sample_rate, N_FFT, N_MELS).apply(&power);
    Ok(power_to_db(&mel, DbReference::Max, Some(LOG_MEL_TOP_DB)))
}

fn raw_mfcc(waveform: &Waveform, config: &ClipConfig) -> Result<(Array2<f64>, u32)> {
    config.validate()?;
    check_clip(waveform)?;

    let clip = resample_waveform(waveform, config.sample_rate)?;
    let emphasized = preemphasis(&clip.samples_f64(), config.preemphasis);

    let stft = Stft::new(N_FFT, HOP_LENGTH);
    let power = stft.magnitude(&emphasized).mapv(|m| m * m);
    let filterbank = MelFilterbank::full_band(clip.sample_rate, N_FFT, N_MELS);
    let mfcc = MfccTransform::new(filterbank, config.n_mfcc, LOG_MEL_TOP_DB).compute(&power);
    debug!(
        coefficients = mfcc.nrows(),
        frames = mfcc.ncols(),
        sample_rate = clip.sample_rate,
        "computed clip cepstrum"
    );
    Ok((mfcc, clip.sample_rate))
}

fn check_clip(waveform: &Waveform) -> Result<()> {
    if waveform.is_empty() {
        return Err(FeatureError::DegenerateInput("clip is empty".to_string()));
    }
    if waveform.sample_rate == 0 {
        return Err(FeatureError::DegenerateInput(
            "clip has a zero sample rate".to_string(),
        ));
    }
    Ok(())
}
