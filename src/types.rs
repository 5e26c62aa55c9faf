//! Core types for the featalyzer extraction pipeline

/// Decoded audio (mono, f32 samples)
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 22050)
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds; zero when the sample rate is unknown.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples widened to f64 for spectral analysis.
    pub(crate) fn samples_f64(&self) -> Vec<f64> {
        widen(&self.samples)
    }
}

/// One-second window of a waveform
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    /// Zero-based position, equal to the start time in whole seconds
    pub index: usize,
    /// Exactly `sample_rate` samples
    pub samples: &'a [f32],
    pub sample_rate: u32,
}

impl Segment<'_> {
    pub(crate) fn samples_f64(&self) -> Vec<f64> {
        widen(self.samples)
    }
}

fn widen(samples: &[f32]) -> Vec<f64> {
    samples.iter().map(|&s| s as f64).collect()
}
