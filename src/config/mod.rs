//! Explicit configuration for every pipeline entry point.
//!
//! Spectral-transform conventions live in [`AnalysisParams`] and are not
//! exposed to configuration files: features are only comparable across files
//! when every file is analysed with the same framing. Run-level knobs (trim
//! threshold, clip parameters, batch behaviour) come from an optional TOML
//! file and are overridden by CLI flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Analysis window in samples (also the RMS / zero-crossing frame length).
pub const N_FFT: usize = 2048;
/// Hop between consecutive analysis frames.
pub const HOP_LENGTH: usize = 512;
pub const N_MELS: usize = 128;
pub const SEGMENT_MFCC: usize = 20;
pub const N_CHROMA: usize = 12;
pub const ROLLOFF_PERCENT: f64 = 0.85;
/// Dynamic range kept by log-mel compression.
pub const LOG_MEL_TOP_DB: f64 = 80.0;
pub const ZERO_CROSSING_THRESHOLD: f64 = 1e-10;

pub const DEFAULT_TRIM_TOP_DB: f64 = 60.0;
pub const DEFAULT_CLIP_SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_CLIP_MFCC: usize = 15;
pub const DEFAULT_PREEMPHASIS: f64 = 0.97;

/// Fixed framing and filterbank parameters shared by both extraction paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub rolloff_percent: f64,
    pub top_db: f64,
    pub zero_crossing_threshold: f64,
}

impl AnalysisParams {
    /// Reject framing that would divide by zero or leave the 38-column
    /// schema underfilled.
    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 {
            return Err(FeatureError::InvalidConfig(
                "hop length must be positive".to_string(),
            ));
        }
        if self.n_fft < 2 {
            return Err(FeatureError::InvalidConfig(format!(
                "analysis window must be at least 2 samples, got {}",
                self.n_fft
            )));
        }
        if self.n_mels < SEGMENT_MFCC {
            return Err(FeatureError::InvalidConfig(format!(
                "at least {} mel bands are needed for {} coefficients, got {}",
                SEGMENT_MFCC, SEGMENT_MFCC, self.n_mels
            )));
        }
        if self.rolloff_percent.is_nan()
            || self.rolloff_percent <= 0.0
            || self.rolloff_percent > 1.0
        {
            return Err(FeatureError::InvalidConfig(format!(
                "roll-off fraction must be in (0, 1], got {}",
                self.rolloff_percent
            )));
        }
        if self.top_db.is_nan() || self.top_db <= 0.0 {
            return Err(FeatureError::InvalidConfig(format!(
                "log-mel dynamic range must be positive, got {}",
                self.top_db
            )));
        }
        if self.zero_crossing_threshold.is_nan() || self.zero_crossing_threshold < 0.0 {
            return Err(FeatureError::InvalidConfig(format!(
                "zero-crossing floor must be non-negative, got {}",
                self.zero_crossing_threshold
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            n_fft: N_FFT,
            hop_length: HOP_LENGTH,
            n_mels: N_MELS,
            rolloff_percent: ROLLOFF_PERCENT,
            top_db: LOG_MEL_TOP_DB,
            zero_crossing_threshold: ZERO_CROSSING_THRESHOLD,
        }
    }
}

/// Settings for the segmented (batch) extraction of one waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub analysis: AnalysisParams,
    /// Frames quieter than this many dB below the loudest frame are trimmed.
    pub trim_top_db: f64,
    /// Distribute segments across the rayon pool.
    pub parallel_segments: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisParams::default(),
            trim_top_db: DEFAULT_TRIM_TOP_DB,
            parallel_segments: true,
        }
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        if self.trim_top_db.is_nan() || self.trim_top_db <= 0.0 {
            return Err(FeatureError::InvalidConfig(format!(
                "trim threshold must be positive, got {}",
                self.trim_top_db
            )));
        }
        Ok(())
    }
}

/// Settings for the single-clip cepstral path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClipConfig {
    /// Clips are resampled to this rate before analysis.
    pub sample_rate: u32,
    pub n_mfcc: usize,
    pub preemphasis: f64,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_CLIP_SAMPLE_RATE,
            n_mfcc: DEFAULT_CLIP_MFCC,
            preemphasis: DEFAULT_PREEMPHASIS,
        }
    }
}

impl ClipConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(FeatureError::InvalidConfig(
                "clip sample rate must be positive".to_string(),
            ));
        }
        if self.n_mfcc == 0 || self.n_mfcc > N_MELS {
            return Err(FeatureError::InvalidConfig(format!(
                "n_mfcc must be between 1 and {}, got {}",
                N_MELS, self.n_mfcc
            )));
        }
        if !(0.0..1.0).contains(&self.preemphasis) {
            return Err(FeatureError::InvalidConfig(format!(
                "pre-emphasis coefficient must be in [0, 1), got {}",
                self.preemphasis
            )));
        }
        Ok(())
    }
}

/// Settings for a recursive batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub root: PathBuf,
    /// Lower-case extensions (without dot) treated as recordings.
    pub extensions: Vec<String>,
    /// Worker threads; `None` lets rayon pick.
    pub jobs: Option<usize>,
    pub skip_existing: bool,
    pub extraction: ExtractionConfig,
}

impl BatchConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["flac".to_string()],
            jobs: None,
            skip_existing: false,
            extraction: ExtractionConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(FeatureError::InvalidConfig(
                "at least one recording extension is required".to_string(),
            ));
        }
        if self.jobs == Some(0) {
            return Err(FeatureError::InvalidConfig(
                "jobs must be greater than zero".to_string(),
            ));
        }
        self.extraction.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrimSettings {
    pub top_db: f64,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            top_db: DEFAULT_TRIM_TOP_DB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchSettings {
    pub extensions: Vec<String>,
    pub jobs: Option<usize>,
    pub parallel_segments: bool,
    pub skip_existing: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            extensions: vec!["flac".to_string()],
            jobs: None,
            parallel_segments: true,
            skip_existing: false,
        }
    }
}

/// File-level configuration, every table optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub trim: TrimSettings,
    pub clip: ClipConfig,
    pub batch: BatchSettings,
}

impl Settings {
    /// Load settings from `path`, or defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|err| {
                    FeatureError::InvalidConfig(format!(
                        "failed to read config {}: {}",
                        path.display(),
                        err
                    ))
                })?;
                Self::from_toml_str(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|err| FeatureError::InvalidConfig(format!("failed to parse config: {}", err)))
    }

    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            analysis: AnalysisParams::default(),
            trim_top_db: self.trim.top_db,
            parallel_segments: self.batch.parallel_segments,
        }
    }

    pub fn batch_config(&self, root: impl Into<PathBuf>) -> BatchConfig {
        BatchConfig {
            root: root.into(),
            extensions: self
                .batch
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            jobs: self.batch.jobs,
            skip_existing: self.batch.skip_existing,
            extraction: self.extraction_config(),
        }
    }
}

/// `".FLAC"` and `"flac"` both become `"flac"`.
pub fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_ascii_lowercase()
}

pub(crate) fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path.canonicalize().map_err(|err| {
        FeatureError::InvalidConfig(format!(
            "failed to resolve directory {}: {}",
            path.display(),
            err
        ))
    })?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(FeatureError::InvalidConfig(format!(
            "{} is not a directory",
            canonical.display()
        )))
    }
}
