mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use support::{write_sine_wav, SAMPLE_RATE};

fn featalyzer() -> Command {
    Command::cargo_bin("featalyzer").expect("binary builds")
}

#[test]
fn batch_subcommand_writes_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sine_wav(&dir.path().join("one.wav"), 440.0, 2.5);
    write_sine_wav(&dir.path().join("sub/two.wav"), 330.0, 1.1);

    featalyzer()
        .arg("batch")
        .arg(dir.path())
        .args(["--ext", "wav", "--jobs", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 2 recording(s), 0 failed, 0 skipped"));

    assert!(dir.path().join("one.csv").exists());
    assert!(dir.path().join("sub/two.csv").exists());
}

#[test]
fn batch_reports_failures_but_keeps_going() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sine_wav(&dir.path().join("ok.wav"), 440.0, 1.5);
    std::fs::write(dir.path().join("broken.wav"), b"garbage").expect("write junk");

    featalyzer()
        .arg("batch")
        .arg(dir.path())
        .args(["--ext", "wav", "--sequential-segments"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 failed"))
        .stderr(predicate::str::contains("broken.wav"));
}

#[test]
fn batch_rejects_missing_root() {
    featalyzer()
        .args(["batch", "no/such/corpus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no/such/corpus"));
}

#[test]
fn clip_subcommand_writes_json_and_wav() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("clip.wav");
    let json = dir.path().join("clip.json");
    let wav = dir.path().join("clip_22k.wav");
    write_sine_wav(&input, 440.0, 1.0);

    featalyzer()
        .arg("clip")
        .arg(&input)
        .args(["--n-mfcc", "13", "--json"])
        .arg(&json)
        .arg("--export-wav")
        .arg(&wav)
        .assert()
        .success()
        .stdout(predicate::str::contains("13 coefficient(s) x 44 frame(s)"));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).expect("json written"))
            .expect("valid json");
    assert_eq!(value["summary"].as_array().expect("summary").len(), 13);

    let reader = hound::WavReader::open(&wav).expect("wav written");
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
}

#[test]
fn clip_prints_nothing_when_an_output_cannot_be_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("clip.wav");
    write_sine_wav(&input, 440.0, 1.0);

    featalyzer()
        .arg("clip")
        .arg(&input)
        .arg("--json")
        .arg(dir.path().join("missing/dir/clip.json"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Failed to write analysis"));

    featalyzer()
        .arg("clip")
        .arg(&input)
        .arg("--export-wav")
        .arg(dir.path().join("missing/dir/clip.wav"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn clip_rejects_zero_coefficients() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("clip.wav");
    write_sine_wav(&input, 440.0, 0.5);

    featalyzer()
        .arg("clip")
        .arg(&input)
        .args(["--n-mfcc", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("n_mfcc"));
}

#[test]
fn clip_rejects_missing_input() {
    featalyzer()
        .args(["clip", "missing.wav"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
