//! Audio feature extraction: per-second descriptor tables for recording
//! corpora and normalised cepstral matrices for single clips.

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod table;
pub mod types;

pub use audio::decoder::decode_audio;
pub use config::{AnalysisParams, BatchConfig, ClipConfig, ExtractionConfig, Settings};
pub use error::{FeatureError, Result};
pub use features::{FeatureVector, SegmentFeatureExtractor, FEATURE_COLUMNS};
pub use pipeline::batch::{process_tree, BatchReport};
pub use pipeline::clip::{analyze_clip, compute_mfcc, ClipAnalysis};
pub use pipeline::extract_feature_table;
pub use table::{FeatureTable, TableAssembler};
pub use types::{Segment, Waveform};
