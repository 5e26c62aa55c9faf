use tracing::debug;

use crate::config::{DEFAULT_TRIM_TOP_DB, HOP_LENGTH, N_FFT};
use crate::features::temporal;
use crate::types::Waveform;

const AMIN: f64 = 1e-10;

/// Removes leading and trailing low-energy regions.
///
/// Frame energy is the mean square over centred frames, compared in dB
/// against the loudest frame. Frames within `top_db` of the peak are
/// non-silent; the result runs from the first non-silent frame to the end
/// of the last one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceTrimmer {
    pub top_db: f64,
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for SilenceTrimmer {
    fn default() -> Self {
        Self {
            top_db: DEFAULT_TRIM_TOP_DB,
            frame_length: N_FFT,
            hop_length: HOP_LENGTH,
        }
    }
}

impl SilenceTrimmer {
    pub fn new(top_db: f64) -> Self {
        Self {
            top_db,
            ..Self::default()
        }
    }

    /// Sample range `[start, end)` of the non-silent region.
    pub fn non_silent_range(&self, samples: &[f64]) -> (usize, usize) {
        if samples.is_empty() {
            return (0, 0);
        }
        let energy = temporal::rms(samples, self.frame_length, self.hop_length).mapv(|r| r * r);
        let peak = energy.iter().fold(0.0_f64, |acc, &e| acc.max(e));
        let reference_db = 10.0 * AMIN.max(peak).log10();

        let loud: Vec<usize> = energy
            .iter()
            .enumerate()
            .filter(|&(_, &e)| 10.0 * AMIN.max(e).log10() - reference_db > -self.top_db)
            .map(|(frame, _)| frame)
            .collect();

        match (loud.first(), loud.last()) {
            (Some(&first), Some(&last)) => {
                let start = first * self.hop_length;
                let end = ((last + 1) * self.hop_length).min(samples.len());
                (start.min(end), end)
            }
            _ => (0, 0),
        }
    }

    pub fn trim(&self, waveform: &Waveform) -> Waveform {
        let (start, end) = self.non_silent_range(&waveform.samples_f64());
        if start == 0 && end == waveform.len() {
            return waveform.clone();
        }
        debug!(
            start,
            end,
            original = waveform.len(),
            "trimmed leading/trailing silence"
        );
        Waveform::new(waveform.samples[start..end].to_vec(), waveform.sample_rate)
    }
}
