use crate::audio::instruments::DrumVoice;
use crate::audio::shapers::soft_clip;

/// Default headroom multiplier applied after the master curve.
pub const DEFAULT_HEADROOM: f32 = 1.15;

const MASTER_CURVE_EXPONENT: f32 = 1.35;

/// Equal-power pan gains for `pan` in [-1, 1].
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    ((0.5 * (1.0 - pan)).sqrt(), (0.5 * (1.0 + pan)).sqrt())
}

/// Stereo summing stage for all lanes.
///
/// Holds only the master gain; call [`VoiceBus::set_master`] whenever the master control
/// changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceBus {
    headroom: f32,
    master_gain: f32,
}

impl VoiceBus {
    pub fn new(headroom: f32) -> Self {
        let mut bus = Self {
            headroom: headroom.max(0.0),
            master_gain: 0.0,
        };
        bus.set_master(0.8);
        bus
    }

    /// `master` is the normalized master control.
    pub fn set_master(&mut self, master: f32) {
        self.master_gain = master.clamp(0.0, 1.0).powf(MASTER_CURVE_EXPONENT) * self.headroom;
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Render one sample from every voice and mix to stereo.
    ///
    /// `pans` is indexed like `voices`. Every voice is processed whether active or not.
    pub fn mix(&self, voices: &mut [DrumVoice], pans: &[f32]) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;
        let mut active_voices = 0usize;

        for (voice, &pan) in voices.iter_mut().zip(pans) {
            if voice.is_active() {
                active_voices += 1;
            }
            let sample = voice.process();
            let (gain_l, gain_r) = pan_gains(pan);
            left += sample * gain_l;
            right += sample * gain_r;
        }

        self.finish(left, right, active_voices)
    }

    /// Voice-count normalization, master gain and soft clip.
    #[inline]
    pub fn finish(&self, left: f32, right: f32, active_voices: usize) -> (f32, f32) {
        let norm = 1.0 / (active_voices.max(1) as f32).sqrt();
        (
            soft_clip(left * norm * self.master_gain),
            soft_clip(right * norm * self.master_gain),
        )
    }
}

impl Default for VoiceBus {
    fn default() -> Self {
        Self::new(DEFAULT_HEADROOM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::instruments::LaneFrame;

    #[test]
    fn test_pan_gains_equal_power() {
        for i in -10..=10 {
            let pan = i as f32 / 10.0;
            let (l, r) = pan_gains(pan);
            assert!((l * l + r * r - 1.0).abs() < 1e-5, "pan {} not equal power", pan);
        }
        let (l, r) = pan_gains(-1.0);
        assert!((l - 1.0).abs() < 1e-6 && r.abs() < 1e-6);
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 1e-6);
    }

    #[test]
    fn test_master_curve() {
        let mut bus = VoiceBus::new(1.15);
        bus.set_master(1.0);
        assert!((bus.master_gain() - 1.15).abs() < 1e-6);
        bus.set_master(0.5);
        assert!((bus.master_gain() - 0.5f32.powf(1.35) * 1.15).abs() < 1e-6);
        bus.set_master(0.0);
        assert_eq!(bus.master_gain(), 0.0);
        bus.set_master(3.0);
        assert!((bus.master_gain() - 1.15).abs() < 1e-6);
    }

    #[test]
    fn test_voice_count_normalization() {
        let mut bus = VoiceBus::new(1.0);
        bus.set_master(1.0);
        let (single, _) = bus.finish(0.2, 0.2, 1);
        let (quad, _) = bus.finish(0.8, 0.8, 4);
        assert!((single - quad).abs() < 1e-6, "4 voices at 0.2 each should sum like one");
        let (none, _) = bus.finish(0.2, 0.2, 0);
        assert_eq!(none, single, "zero active voices normalizes like one");
    }

    #[test]
    fn test_mix_silent_bank() {
        let bus = VoiceBus::default();
        let mut voices: Vec<DrumVoice> = (0..3).map(|_| DrumVoice::new(44100.0)).collect();
        assert_eq!(bus.mix(&mut voices, &[0.0, -1.0, 1.0]), (0.0, 0.0));
    }

    #[test]
    fn test_mix_hard_panned_voice() {
        let bus = VoiceBus::default();
        let mut voices = vec![DrumVoice::new(44100.0)];
        let mut frame = LaneFrame::default();
        frame.pan = -1.0;
        voices[0].trigger(&frame);

        let mut left_energy = 0.0;
        for _ in 0..2000 {
            let (l, r) = bus.mix(&mut voices, &[frame.pan]);
            assert!(r.abs() < 1e-6, "hard left voice leaked right: {}", r);
            assert!(l.is_finite());
            left_energy += l.abs();
        }
        assert!(left_energy > 0.0);
    }
}
