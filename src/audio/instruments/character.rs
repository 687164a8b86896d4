use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Sound family of a lane. Differences between families are pure tuning data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LaneCharacter {
    #[default]
    Kick,
    Snare,
    Hat,
    PercA,
    PercB,
    RimShot,
    Clap,
}

impl LaneCharacter {
    pub const ALL: [LaneCharacter; 7] = [
        LaneCharacter::Kick,
        LaneCharacter::Snare,
        LaneCharacter::Hat,
        LaneCharacter::PercA,
        LaneCharacter::PercB,
        LaneCharacter::RimShot,
        LaneCharacter::Clap,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn tuning(self) -> &'static CharacterTuning {
        &CHARACTER_TUNING[self.index()]
    }
}

/// Static per-character voicing constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterTuning {
    /// Upward sweep of the pitch envelope at full amount, in semitones.
    pub pitch_span_semitones: f32,
    /// Frequency of the sine burst in the click path.
    pub transient_base_hz: f32,
    /// Gain of the noise path before the path mix. Tuned by ear.
    pub noise_blend_gain: f32,
    /// Gain of the oscillator path before the path mix.
    pub body_gain: f32,
    /// Scales both the modulator ratio and the PM depth.
    pub fm_scale: f32,
    /// Share of the click made of sine burst, the rest is raw noise.
    pub click_sine_ratio: f32,
}

// Kick, Snare, Hat, PercA, PercB, RimShot, Clap
static CHARACTER_TUNING: Lazy<[CharacterTuning; 7]> = Lazy::new(|| {
    let row = |pitch_span_semitones,
               transient_base_hz,
               noise_blend_gain,
               body_gain,
               fm_scale,
               click_sine_ratio| CharacterTuning {
        pitch_span_semitones,
        transient_base_hz,
        noise_blend_gain,
        body_gain,
        fm_scale,
        click_sine_ratio,
    };

    [
        row(66.0, 1700.0, 0.45, 1.05, 1.00, 0.72),
        row(20.0, 2500.0, 1.00, 0.70, 0.85, 0.72),
        row(8.0, 7000.0, 1.20, 0.30, 0.40, 0.72),
        row(22.0, 3100.0, 0.72, 0.88, 0.78, 0.72),
        row(28.0, 4200.0, 0.85, 0.92, 0.85, 0.72),
        row(14.0, 5200.0, 0.80, 0.78, 0.70, 0.80),
        row(10.0, 1900.0, 1.35, 0.40, 0.50, 0.35),
    ]
});
