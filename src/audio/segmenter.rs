use crate::types::{Segment, Waveform};

/// Number of whole seconds in `waveform`; the trailing partial second is not counted.
pub fn segment_count(waveform: &Waveform) -> usize {
    if waveform.sample_rate == 0 {
        return 0;
    }
    waveform.samples.len() / waveform.sample_rate as usize
}

/// Pure function splitting a waveform into consecutive one-second segments.
///
/// Each segment holds exactly `sample_rate` samples; the remainder shorter
/// than one second is dropped, never zero-padded.
pub fn segment(waveform: &Waveform) -> impl ExactSizeIterator<Item = Segment<'_>> + '_ {
    let window = waveform.sample_rate as usize;
    let samples: &[f32] = if window == 0 { &[] } else { &waveform.samples };
    samples
        .chunks_exact(window.max(1))
        .enumerate()
        .map(move |(index, samples)| Segment {
            index,
            samples,
            sample_rate: waveform.sample_rate,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_partial_second() {
        let waveform = Waveform::new((0..3_500).map(|i| i as f32).collect(), 1_000);
        let segments: Vec<_> = segment(&waveform).collect();

        assert_eq!(segments.len(), 3);
        assert_eq!(segment_count(&waveform), 3);
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i);
            assert_eq!(seg.samples.len(), 1_000);
            assert_eq!(seg.samples[0], (i * 1_000) as f32);
        }
    }

    #[test]
    fn concatenation_is_a_prefix() {
        let waveform = Waveform::new((0..2_750).map(|i| (i as f32).sin()).collect(), 500);
        let joined: Vec<f32> = segment(&waveform)
            .flat_map(|seg| seg.samples.iter().copied())
            .collect();
        assert_eq!(joined.len(), 2_500);
        assert_eq!(&joined[..], &waveform.samples[..2_500]);
    }

    #[test]
    fn shorter_than_one_second_yields_nothing() {
        let waveform = Waveform::new(vec![0.1; 999], 1_000);
        assert_eq!(segment(&waveform).len(), 0);
    }

    #[test]
    fn zero_sample_rate_yields_nothing() {
        let waveform = Waveform::new(vec![0.1; 10], 0);
        assert_eq!(segment(&waveform).count(), 0);
        assert_eq!(segment_count(&waveform), 0);
    }

    #[test]
    fn exact_multiple_keeps_everything() {
        let waveform = Waveform::new(vec![0.0; 4_000], 2_000);
        assert_eq!(segment(&waveform).len(), 2);
    }
}
