use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};
use tracing::debug;

use crate::error::{FeatureError, Result};
use crate::types::Waveform;

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 1;

/// Band-limited resampling of mono `samples` from `source_rate` to
/// `target_rate`.
///
/// Content above the target Nyquist frequency is filtered out instead of
/// folding back into the audible band. The output holds
/// `ceil(len * target_rate / source_rate)` samples.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == 0 || target_rate == 0 {
        return Err(FeatureError::DegenerateInput(format!(
            "cannot resample from {} Hz to {} Hz",
            source_rate, target_rate
        )));
    }
    if samples.is_empty() || source_rate == target_rate {
        return Ok(samples.to_vec());
    }

    let mut resampler = Fft::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_SIZE,
        SUB_CHUNKS,
        1,
        FixedSync::Input,
    )
    .map_err(|err| resample_error("failed to construct resampler", err))?;

    let input_len = samples.len();
    let mut out = vec![0.0_f32; resampler.process_all_needed_output_len(input_len)];
    let out_len = out.len();

    let input = InterleavedSlice::new(samples, 1, input_len)
        .map_err(|err| resample_error("bad input buffer", err))?;
    let mut output = InterleavedSlice::new_mut(&mut out, 1, out_len)
        .map_err(|err| resample_error("bad output buffer", err))?;
    let (_, written) = resampler
        .process_all_into_buffer(&input, &mut output, input_len, None)
        .map_err(|err| resample_error("resampling failed", err))?;

    // Pin the length so frame counts do not depend on resampler padding.
    let expected = (input_len as u64 * target_rate as u64).div_ceil(source_rate as u64) as usize;
    out.truncate(written.min(expected));
    out.resize(expected, 0.0);
    Ok(out)
}

fn resample_error(context: &str, err: impl std::fmt::Display) -> FeatureError {
    FeatureError::DegenerateInput(format!("{}: {}", context, err))
}

/// Bring a waveform to `target_rate`; a waveform already there is cloned.
pub fn resample_waveform(waveform: &Waveform, target_rate: u32) -> Result<Waveform> {
    if waveform.sample_rate == target_rate {
        return Ok(waveform.clone());
    }
    debug!(
        from = waveform.sample_rate,
        to = target_rate,
        "resampling waveform"
    );
    let samples = resample(&waveform.samples, waveform.sample_rate, target_rate)?;
    Ok(Waveform::new(samples, target_rate))
}
