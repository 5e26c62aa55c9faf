use std::path::Path;

use crate::error::Result;
use crate::types::Waveform;

/// Write a waveform as mono 16-bit PCM WAV.
pub fn write_wav<P: AsRef<Path>>(waveform: &Waveform, path: P) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path.as_ref(), spec)?;
    for &sample in &waveform.samples {
        // Clamp to [-1.0, 1.0] and scale to i16 range
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * 32767.0) as i16)?;
    }
    writer.finalize()?;

    Ok(())
}
