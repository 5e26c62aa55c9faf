//! End-to-end extraction: waveform in, feature table or cepstral matrix out.

pub mod batch;
pub mod clip;

use rayon::prelude::*;
use tracing::debug;

use crate::audio::segmenter;
use crate::audio::trim::SilenceTrimmer;
use crate::config::ExtractionConfig;
use crate::error::{FeatureError, Result};
use crate::features::SegmentFeatureExtractor;
use crate::table::{FeatureTable, TableAssembler};
use crate::types::{Segment, Waveform};

/// Trim, segment and describe a waveform, one table row per whole second.
///
/// Recordings shorter than one second (after trimming) give a header-only
/// table. With `parallel_segments` the segments are spread over the current
/// rayon pool; the resulting table is identical either way.
pub fn extract_feature_table(waveform: &Waveform, config: &ExtractionConfig) -> Result<FeatureTable> {
    if waveform.sample_rate == 0 {
        return Err(FeatureError::DegenerateInput(
            "waveform has a zero sample rate".to_string(),
        ));
    }
    config.validate()?;

    let trimmed = SilenceTrimmer::new(config.trim_top_db).trim(waveform);
    let extractor = SegmentFeatureExtractor::new(trimmed.sample_rate, &config.analysis)?;
    let segments: Vec<Segment<'_>> = segmenter::segment(&trimmed).collect();
    debug!(
        segments = segments.len(),
        duration_secs = trimmed.duration_secs(),
        parallel = config.parallel_segments,
        "extracting segment features"
    );

    let results: Vec<_> = if config.parallel_segments {
        segments
            .par_iter()
            .map(|segment| (segment.index, extractor.extract(segment)))
            .collect()
    } else {
        segments
            .iter()
            .map(|segment| (segment.index, extractor.extract(segment)))
            .collect()
    };

    TableAssembler::assemble(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sample_rate_is_degenerate() {
        let waveform = Waveform::new(vec![0.1; 100], 0);
        assert!(matches!(
            extract_feature_table(&waveform, &ExtractionConfig::default()),
            Err(FeatureError::DegenerateInput(_))
        ));
    }

    #[test]
    fn zero_hop_is_rejected_before_framing() {
        let waveform = Waveform::new(vec![0.2; 44_100], 22_050);
        let mut config = ExtractionConfig::default();
        config.analysis.hop_length = 0;
        assert!(matches!(
            extract_feature_table(&waveform, &config),
            Err(FeatureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn short_recording_gives_header_only_table() {
        let waveform = Waveform::new(vec![0.2; 11_000], 22_050);
        let table = extract_feature_table(&waveform, &ExtractionConfig::default()).unwrap();
        assert!(table.is_empty());
        assert!(!table.is_partial());
        assert_eq!(table.columns().len(), 38);
    }

    #[test]
    fn invalid_trim_threshold_is_rejected() {
        let waveform = Waveform::new(vec![0.2; 22_050], 22_050);
        let config = ExtractionConfig {
            trim_top_db: -1.0,
            ..ExtractionConfig::default()
        };
        assert!(matches!(
            extract_feature_table(&waveform, &config),
            Err(FeatureError::InvalidConfig(_))
        ));
    }
}
