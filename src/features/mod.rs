pub mod chroma;
pub mod mel;
pub mod spectral;
pub mod statistics;
pub mod stft;
pub mod temporal;
mod vector;

pub use vector::{FeatureVector, FEATURE_COLUMNS};

use ndarray::Array2;
use tracing::trace;

use crate::config::{AnalysisParams, N_CHROMA, SEGMENT_MFCC};
use crate::error::{FeatureError, Result};
use crate::types::Segment;
use mel::{MelFilterbank, MfccTransform};
use statistics::{frame_means, series_mean};
use stft::{fft_frequencies, Stft};

/// Computes the 38-column feature vector of one-second segments at a fixed
/// sample rate.
///
/// Holds the FFT plan, window, mel filterbank and DCT basis so they are
/// built once per file rather than once per segment. Immutable after
/// construction, so one extractor can serve every rayon worker.
#[derive(Debug)]
pub struct SegmentFeatureExtractor {
    sample_rate: u32,
    params: AnalysisParams,
    stft: Stft,
    frequencies: Vec<f64>,
    mfcc: MfccTransform,
}

impl SegmentFeatureExtractor {
    pub fn new(sample_rate: u32, params: &AnalysisParams) -> Result<Self> {
        if sample_rate == 0 {
            return Err(FeatureError::DegenerateInput(
                "sample rate must be positive".to_string(),
            ));
        }
        params.validate()?;
        let filterbank = MelFilterbank::full_band(sample_rate, params.n_fft, params.n_mels);
        Ok(Self {
            sample_rate,
            params: *params,
            stft: Stft::new(params.n_fft, params.hop_length),
            frequencies: fft_frequencies(sample_rate, params.n_fft),
            mfcc: MfccTransform::new(filterbank, SEGMENT_MFCC, params.top_db),
        })
    }

    pub fn extract(&self, segment: &Segment<'_>) -> Result<FeatureVector> {
        if segment.sample_rate != self.sample_rate {
            return Err(FeatureError::DegenerateInput(format!(
                "segment {} is at {} Hz but the extractor was built for {} Hz",
                segment.index, segment.sample_rate, self.sample_rate
            )));
        }

        let signal = segment.samples_f64();
        let magnitude = self.stft.magnitude(&signal);
        let power = magnitude.mapv(|m| m * m);
        trace!(
            segment = segment.index,
            frames = magnitude.ncols(),
            "computed segment spectrogram"
        );

        let chroma = chroma::chromagram(&power, self.sample_rate, self.params.n_fft, N_CHROMA);
        let rms = temporal::rms(&signal, self.params.n_fft, self.params.hop_length);
        let zcr = temporal::zero_crossing_rate(
            &signal,
            self.params.n_fft,
            self.params.hop_length,
            self.params.zero_crossing_threshold,
        );
        let centroid = spectral::centroid(&magnitude, &self.frequencies);
        let bandwidth = spectral::bandwidth(&magnitude, &self.frequencies);
        let rolloff = spectral::rolloff(&magnitude, &self.frequencies, self.params.rolloff_percent);
        let mfcc = self.mfcc.compute(&power);

        let vector = FeatureVector {
            time: segment.index,
            chromagram: fixed_means(&chroma),
            rms: series_mean(&rms),
            spectral_centroid: series_mean(&centroid),
            spectral_bandwidth: series_mean(&bandwidth),
            spectral_rolloff: series_mean(&rolloff),
            zero_crossing_rate: series_mean(&zcr),
            mfcc: fixed_means(&mfcc),
        };

        if !vector.is_finite() {
            return Err(FeatureError::DegenerateInput(format!(
                "segment {} produced non-finite features",
                segment.index
            )));
        }
        Ok(vector)
    }
}

fn fixed_means<const N: usize>(matrix: &Array2<f64>) -> [f64; N] {
    let means = frame_means(matrix);
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(means.iter()) {
        *slot = *value;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::PI;

    const SAMPLE_RATE: u32 = 22_050;

    fn sine(freq: f32) -> Vec<f32> {
        (0..SAMPLE_RATE as usize)
            .map(|n| 0.5 * (2.0 * PI * freq * n as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    fn extractor() -> SegmentFeatureExtractor {
        SegmentFeatureExtractor::new(SAMPLE_RATE, &AnalysisParams::default()).unwrap()
    }

    #[test]
    fn rejects_zero_sample_rate() {
        assert!(SegmentFeatureExtractor::new(0, &AnalysisParams::default()).is_err());
    }

    #[test]
    fn rejects_zero_hop() {
        let params = AnalysisParams {
            hop_length: 0,
            ..AnalysisParams::default()
        };
        assert!(matches!(
            SegmentFeatureExtractor::new(SAMPLE_RATE, &params),
            Err(FeatureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn sine_segment_has_expected_shape() {
        let samples = sine(440.0);
        let segment = Segment {
            index: 2,
            samples: &samples,
            sample_rate: SAMPLE_RATE,
        };
        let features = extractor().extract(&segment).unwrap();

        assert_eq!(features.time, 2);
        assert!(features.is_finite());
        // Framing padding pulls the mean slightly below 0.5 / sqrt(2).
        assert!(features.rms > 0.3 && features.rms < 0.36, "rms {}", features.rms);
        assert!(
            (features.spectral_centroid - 440.0).abs() < 60.0,
            "centroid {}",
            features.spectral_centroid
        );
        let zcr_expected = 2.0 * 440.0 / SAMPLE_RATE as f64;
        assert_abs_diff_eq!(features.zero_crossing_rate, zcr_expected, epsilon = 0.01);
        assert!(features.chromagram.iter().all(|&c| (0.0..=1.0).contains(&c)));
        assert!(features.chromagram[9] > 0.9);
    }

    #[test]
    fn silent_segment_is_well_defined() {
        let samples = vec![0.0_f32; SAMPLE_RATE as usize];
        let segment = Segment {
            index: 0,
            samples: &samples,
            sample_rate: SAMPLE_RATE,
        };
        let features = extractor().extract(&segment).unwrap();
        assert_eq!(features.rms, 0.0);
        assert_eq!(features.zero_crossing_rate, 0.0);
        assert_eq!(features.spectral_centroid, 0.0);
        assert_eq!(features.spectral_rolloff, 0.0);
        assert!(features.chromagram.iter().all(|&c| c == 0.0));
        assert!(features.mfcc.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn mismatched_rate_is_rejected() {
        let samples = vec![0.0_f32; 16_000];
        let segment = Segment {
            index: 0,
            samples: &samples,
            sample_rate: 16_000,
        };
        assert!(extractor().extract(&segment).is_err());
    }

    #[test]
    fn extraction_is_deterministic() {
        let samples = sine(1_000.0);
        let segment = Segment {
            index: 0,
            samples: &samples,
            sample_rate: SAMPLE_RATE,
        };
        let extractor = extractor();
        assert_eq!(
            extractor.extract(&segment).unwrap(),
            extractor.extract(&segment).unwrap()
        );
    }
}
