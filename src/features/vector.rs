use serde::Serialize;

use crate::config::{N_CHROMA, SEGMENT_MFCC};

/// Column order of every feature table.
pub const FEATURE_COLUMNS: [&str; 38] = [
    "Time",
    "Chromagram_1",
    "Chromagram_2",
    "Chromagram_3",
    "Chromagram_4",
    "Chromagram_5",
    "Chromagram_6",
    "Chromagram_7",
    "Chromagram_8",
    "Chromagram_9",
    "Chromagram_10",
    "Chromagram_11",
    "Chromagram_12",
    "RMS",
    "Spectral_Centroid",
    "Spectral_Bandwidth",
    "Spectral_Rolloff",
    "Zero_Crossing_Rate",
    "MFCC_1",
    "MFCC_2",
    "MFCC_3",
    "MFCC_4",
    "MFCC_5",
    "MFCC_6",
    "MFCC_7",
    "MFCC_8",
    "MFCC_9",
    "MFCC_10",
    "MFCC_11",
    "MFCC_12",
    "MFCC_13",
    "MFCC_14",
    "MFCC_15",
    "MFCC_16",
    "MFCC_17",
    "MFCC_18",
    "MFCC_19",
    "MFCC_20",
];

/// Frame-averaged descriptors of one one-second segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Segment index, i.e. start time in whole seconds
    pub time: usize,
    /// Pitch-class energy, C first
    pub chromagram: [f64; N_CHROMA],
    pub rms: f64,
    pub spectral_centroid: f64,
    pub spectral_bandwidth: f64,
    pub spectral_rolloff: f64,
    pub zero_crossing_rate: f64,
    pub mfcc: [f64; SEGMENT_MFCC],
}

impl FeatureVector {
    /// `(column name, value)` pairs in emission order.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries = Vec::with_capacity(FEATURE_COLUMNS.len());
        entries.push(("Time".to_string(), self.time as f64));
        for (i, &value) in self.chromagram.iter().enumerate() {
            entries.push((format!("Chromagram_{}", i + 1), value));
        }
        entries.push(("RMS".to_string(), self.rms));
        entries.push(("Spectral_Centroid".to_string(), self.spectral_centroid));
        entries.push(("Spectral_Bandwidth".to_string(), self.spectral_bandwidth));
        entries.push(("Spectral_Rolloff".to_string(), self.spectral_rolloff));
        entries.push(("Zero_Crossing_Rate".to_string(), self.zero_crossing_rate));
        for (i, &value) in self.mfcc.iter().enumerate() {
            entries.push((format!("MFCC_{}", i + 1), value));
        }
        entries
    }

    pub fn is_finite(&self) -> bool {
        self.entries().iter().all(|(_, value)| value.is_finite())
    }
}
