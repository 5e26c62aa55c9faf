#![allow(dead_code)]

use std::path::Path;

pub const SAMPLE_RATE: u32 = 22_050;

/// Mono 16-bit WAV of a sine tone.
pub fn write_sine_wav(path: &Path, freq: f32, seconds: f32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    let len = (SAMPLE_RATE as f32 * seconds) as usize;
    for n in 0..len {
        let t = n as f32 / SAMPLE_RATE as f32;
        let sample = 0.5 * (2.0 * std::f32::consts::PI * freq * t).sin();
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .expect("write sample");
    }
    writer.finalize().expect("finalize wav");
}
