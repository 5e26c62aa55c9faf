use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::{normalize_extension, BatchConfig, ClipConfig, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "featalyzer",
    version,
    about = "Per-second audio feature tables and clip cepstra"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a feature table beside every recording under a directory.
    Batch(BatchArgs),
    /// Compute normalised cepstral coefficients for one clip.
    Clip(ClipArgs),
}

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory scanned recursively for recordings.
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,
    /// Recording extension to match; repeat for several.
    #[arg(long = "ext", value_name = "EXT")]
    pub extensions: Vec<String>,
    /// Worker threads (defaults to available parallelism).
    #[arg(long)]
    pub jobs: Option<usize>,
    /// Extract the segments of each file one after another.
    #[arg(long)]
    pub sequential_segments: bool,
    /// Leave recordings whose table already exists untouched.
    #[arg(long)]
    pub skip_existing: bool,
    /// Optional TOML settings file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl BatchArgs {
    /// Settings file values, overridden by any flag given on the command line.
    pub fn batch_config(&self) -> Result<BatchConfig> {
        let settings = Settings::load(self.config.as_deref()).context("Failed to load settings")?;
        let mut config = settings.batch_config(&self.root);
        if !self.extensions.is_empty() {
            config.extensions = self
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect();
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
        if self.sequential_segments {
            config.extraction.parallel_segments = false;
        }
        if self.skip_existing {
            config.skip_existing = true;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClipArgs {
    /// Audio clip to analyse.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
    /// Number of cepstral coefficients per frame.
    #[arg(long)]
    pub n_mfcc: Option<usize>,
    /// Analysis sample rate; the clip is resampled to it.
    #[arg(long)]
    pub sample_rate: Option<u32>,
    /// Write the full analysis as JSON.
    #[arg(long, value_name = "OUT")]
    pub json: Option<PathBuf>,
    /// Write the clip as mono 16-bit WAV at the analysis rate.
    #[arg(long = "export-wav", value_name = "OUT")]
    pub export_wav: Option<PathBuf>,
    /// Optional TOML settings file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ClipArgs {
    pub fn clip_config(&self) -> Result<ClipConfig> {
        ensure!(
            self.input.is_file(),
            "Input file does not exist: {:?}",
            self.input
        );
        let settings = Settings::load(self.config.as_deref()).context("Failed to load settings")?;
        let mut config = settings.clip;
        if let Some(n_mfcc) = self.n_mfcc {
            config.n_mfcc = n_mfcc;
        }
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::ffi::OsString;

    #[test]
    fn batch_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "featalyzer",
            "batch",
            "corpus",
            "--ext",
            ".WAV",
            "--ext",
            "flac",
            "--jobs",
            "3",
            "--sequential-segments",
            "--skip-existing",
        ])
        .unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        let config = args.batch_config().unwrap();
        assert_eq!(config.extensions, vec!["wav", "flac"]);
        assert_eq!(config.jobs, Some(3));
        assert!(!config.extraction.parallel_segments);
        assert!(config.skip_existing);
    }

    #[test]
    fn batch_defaults_to_flac() {
        let cli = Cli::try_parse_from(["featalyzer", "batch", "corpus"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        let config = args.batch_config().unwrap();
        assert_eq!(config.extensions, vec!["flac"]);
        assert_eq!(config.jobs, None);
        assert!(config.extraction.parallel_segments);
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let cli = Cli::try_parse_from(["featalyzer", "batch", "corpus", "--jobs", "0"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch command");
        };
        assert!(args.batch_config().is_err());
    }

    #[test]
    fn clip_settings_come_from_file_then_flags() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("clip.wav");
        std::fs::write(&input, b"").unwrap();
        let settings = dir.path().join("featalyzer.toml");
        std::fs::write(&settings, "[clip]\nn_mfcc = 13\nsample_rate = 16000\n").unwrap();

        let argv: Vec<OsString> = vec![
            "featalyzer".into(),
            "clip".into(),
            input.into_os_string(),
            "--config".into(),
            settings.into_os_string(),
            "--sample-rate".into(),
            "8000".into(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Clip(args) = cli.command else {
            panic!("expected clip command");
        };
        let config = args.clip_config().unwrap();
        assert_eq!(config.n_mfcc, 13);
        assert_eq!(config.sample_rate, 8_000);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["featalyzer", "clip", "a.wav", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
