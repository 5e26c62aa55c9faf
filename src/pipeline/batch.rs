//! Recursive batch extraction: one CSV table beside every recording.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::audio::decoder::decode_audio;
use crate::config::{canonicalize_dir, normalize_extension, BatchConfig, ExtractionConfig};
use crate::error::{FeatureError, Result};
use crate::pipeline::extract_feature_table;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedFile {
    pub source: PathBuf,
    pub table_path: PathBuf,
    pub rows: usize,
    /// Some segments failed and are missing from the table
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run, each list in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
    /// Recordings whose table already existed
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.processed.len() + self.failed.len() + self.skipped.len()
    }
}

/// Every file under `root` whose extension matches one of `extensions`,
/// case-insensitively, sorted. Symbolic links are not followed.
pub fn discover_recordings(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let wanted: Vec<String> = extensions.iter().map(|ext| normalize_extension(ext)).collect();
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| wanted.contains(&ext.to_ascii_lowercase()))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

/// `dir/name.flac` becomes `dir/name.csv`.
pub fn table_path_for(source: &Path) -> PathBuf {
    source.with_extension("csv")
}

enum Outcome {
    Processed(ProcessedFile),
    Failed(FailedFile),
    Skipped(PathBuf),
}

/// Extract and write a feature table for every recording under the root.
///
/// Per-file failures are logged and reported; only a fatal error (a broken
/// column schema) aborts the run.
pub fn process_tree(config: &BatchConfig) -> Result<BatchReport> {
    config.validate()?;
    let root = canonicalize_dir(&config.root)?;
    let recordings = discover_recordings(&root, &config.extensions);
    info!(
        root = %root.display(),
        recordings = recordings.len(),
        "starting batch extraction"
    );

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = config.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder
        .build()
        .map_err(|err| FeatureError::InvalidConfig(format!("failed to build worker pool: {}", err)))?;

    let outcomes: Vec<Result<Outcome>> = pool.install(|| {
        recordings
            .par_iter()
            .map(|path| process_file(path, config))
            .collect()
    });

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome? {
            Outcome::Processed(file) => report.processed.push(file),
            Outcome::Failed(file) => report.failed.push(file),
            Outcome::Skipped(path) => report.skipped.push(path),
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "batch extraction finished"
    );
    Ok(report)
}

fn process_file(path: &Path, config: &BatchConfig) -> Result<Outcome> {
    let table_path = table_path_for(path);
    if config.skip_existing && table_path.exists() {
        debug!(path = %path.display(), "table exists, skipping");
        return Ok(Outcome::Skipped(path.to_path_buf()));
    }

    match extract_file(path, &table_path, &config.extraction) {
        Ok(file) => Ok(Outcome::Processed(file)),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            warn!(path = %path.display(), "failed to process recording: {}", err);
            Ok(Outcome::Failed(FailedFile {
                path: path.to_path_buf(),
                error: err.to_string(),
            }))
        }
    }
}

fn extract_file(path: &Path, table_path: &Path, config: &ExtractionConfig) -> Result<ProcessedFile> {
    let waveform = decode_audio(path)?;
    let table = extract_feature_table(&waveform, config)?;
    table.write_csv(table_path)?;
    if table.is_partial() {
        warn!(
            path = %path.display(),
            skipped = ?table.skipped(),
            "wrote partial table"
        );
    } else {
        debug!(path = %table_path.display(), rows = table.len(), "wrote table");
    }
    Ok(ProcessedFile {
        source: path.to_path_buf(),
        table_path: table_path.to_path_buf(),
        rows: table.len(),
        partial: table.is_partial(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn discovery_is_recursive_sorted_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b/two.FLAC"));
        touch(&dir.path().join("a/one.flac"));
        touch(&dir.path().join("a/notes.txt"));
        touch(&dir.path().join("three.wav"));

        let found = discover_recordings(dir.path(), &["flac".to_string()]);
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a/one.flac"), PathBuf::from("b/two.FLAC")]
        );

        let both = discover_recordings(dir.path(), &[".WAV".to_string(), "flac".to_string()]);
        assert_eq!(both.len(), 3);
    }

    #[test]
    fn table_sits_beside_its_source() {
        assert_eq!(
            table_path_for(Path::new("corpus/spk1/utt.flac")),
            PathBuf::from("corpus/spk1/utt.csv")
        );
    }

    #[test]
    fn missing_root_is_invalid() {
        let config = BatchConfig::new("definitely/not/here");
        assert!(matches!(
            process_tree(&config),
            Err(FeatureError::InvalidConfig(_))
        ));
    }

    #[test]
    fn undecodable_file_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.flac"), b"not audio").unwrap();

        let report = process_tree(&BatchConfig::new(dir.path())).unwrap();
        assert!(report.processed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.contains("decode"));
        assert!(!dir.path().join("broken.csv").exists());
    }
}
