//! PCM helpers: downmixing and tone generation.

use vesper_types::{AudioClip, PLATFORM_SAMPLE_RATE};

/// Downmixes interleaved stereo s16le to mono by per-sample averaging.
///
/// The average is computed in i32 and clamped back, so opposing full-scale
/// samples can never wrap. A trailing unpaired sample is dropped.
pub fn downmix_stereo(interleaved: &[i16]) -> Vec<i16> {
    interleaved
        .chunks_exact(2)
        .map(|pair| {
            let mixed = (pair[0] as i32 + pair[1] as i32) / 2;
            mixed.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect()
}

/// Generates a square-wave test tone at the platform rate.
///
/// Used by the test-tone intent; queued like any synthesized reply.
pub fn test_tone(freq_hz: u32, duration_ms: u64) -> AudioClip {
    const AMPLITUDE: i16 = 6000;

    let rate = PLATFORM_SAMPLE_RATE;
    let total = (rate as u64 * duration_ms / 1000) as usize;
    let half_period = (rate / freq_hz.max(1) / 2).max(1) as usize;

    let mut samples = Vec::with_capacity(total);
    for i in 0..total {
        let high = (i / half_period) % 2 == 0;
        samples.push(if high { AMPLITUDE } else { -AMPLITUDE });
    }
    AudioClip::new(samples, rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_downmixes_to_silence_at_half_length() {
        let stereo = vec![0i16; 960];
        let mono = downmix_stereo(&stereo);
        assert_eq!(mono.len(), 480);
        assert!(mono.iter().all(|&s| s == 0));
    }

    #[test]
    fn averages_channel_pairs() {
        let mono = downmix_stereo(&[100, 200, -100, 100, 7, 7]);
        assert_eq!(mono, vec![150, 0, 7]);
    }

    #[test]
    fn extremes_never_wrap() {
        let mono = downmix_stereo(&[i16::MAX, i16::MAX, i16::MIN, i16::MIN, i16::MAX, i16::MIN]);
        assert_eq!(mono.len(), 3);
        for s in mono {
            assert!((i16::MIN..=i16::MAX).contains(&s));
        }
    }

    #[test]
    fn trailing_unpaired_sample_is_dropped() {
        assert_eq!(downmix_stereo(&[10, 20, 30]), vec![15]);
    }

    #[test]
    fn tone_has_requested_duration_and_alternates() {
        let tone = test_tone(440, 250);
        assert_eq!(tone.sample_rate, PLATFORM_SAMPLE_RATE);
        assert_eq!(tone.duration_ms(), 250);
        assert!(tone.samples.iter().any(|&s| s > 0));
        assert!(tone.samples.iter().any(|&s| s < 0));
    }
}
