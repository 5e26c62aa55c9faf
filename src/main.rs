use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use featalyzer::audio::decoder::decode_audio;
use featalyzer::audio::encoder::write_wav;
use featalyzer::audio::resample::resample_waveform;
use featalyzer::cli::{BatchArgs, Cli, ClipArgs, Command};
use featalyzer::pipeline::batch::process_tree;
use featalyzer::pipeline::clip::analyze_clip;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Batch(args) => run_batch(&args),
        Command::Clip(args) => run_clip(&args),
    }
}

fn run_batch(args: &BatchArgs) -> Result<()> {
    let config = args
        .batch_config()
        .context("Failed to validate command-line arguments")?;
    let report = process_tree(&config)
        .with_context(|| format!("Batch extraction aborted under {:?}", config.root))?;

    println!(
        "Processed {} recording(s), {} failed, {} skipped",
        report.processed.len(),
        report.failed.len(),
        report.skipped.len()
    );
    for file in report.processed.iter().filter(|file| file.partial) {
        println!("  partial table: {:?}", file.table_path);
    }
    for file in &report.failed {
        eprintln!("  failed: {:?}: {}", file.path, file.error);
    }

    if report.total() > 0 && report.processed.is_empty() && report.skipped.is_empty() {
        bail!("No recording could be processed");
    }
    Ok(())
}

fn run_clip(args: &ClipArgs) -> Result<()> {
    let config = args
        .clip_config()
        .context("Failed to validate command-line arguments")?;
    let waveform = decode_audio(&args.input).context("Failed to decode input audio")?;
    let analysis = analyze_clip(&waveform, &config).context("Failed to analyse clip")?;

    // Every output is written before anything is reported.
    if let Some(path) = &args.json {
        analysis
            .write_json(path)
            .with_context(|| format!("Failed to write analysis to {:?}", path))?;
    }
    if let Some(path) = &args.export_wav {
        let clip = resample_waveform(&waveform, config.sample_rate)
            .context("Failed to resample clip for export")?;
        write_wav(&clip, path).with_context(|| format!("Failed to write WAV to {:?}", path))?;
    }

    println!(
        "{} coefficient(s) x {} frame(s) at {} Hz",
        analysis.mfcc.nrows(),
        analysis.frames,
        analysis.sample_rate
    );
    if !analysis.unscaled_rows.is_empty() {
        println!("Rows left unscaled (zero variance): {:?}", analysis.unscaled_rows);
    }
    for row in &analysis.summary {
        println!(
            "  MFCC_{:<3} mean {:>9.3}  std {:>8.3}  min {:>9.3}  max {:>9.3}",
            row.index + 1,
            row.mean,
            row.std_dev,
            row.min,
            row.max
        );
    }
    if let Some(path) = &args.json {
        println!("Wrote analysis to {:?}", path);
    }
    if let Some(path) = &args.export_wav {
        println!("Wrote clip to {:?}", path);
    }

    Ok(())
}
