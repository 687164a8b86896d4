use super::LaneCharacter;

/// Oscillator (body) path of a lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscFrame {
    pub frequency_hz: f32,
    pub fm_amount: f32,
    pub fold_amount: f32,
    pub filter_cutoff_hz: f32,
    pub filter_resonance: f32,
    pub filter_env_amount: f32,
    pub level: f32,
}

impl Default for OscFrame {
    fn default() -> Self {
        Self {
            frequency_hz: 120.0,
            fm_amount: 0.2,
            fold_amount: 0.3,
            filter_cutoff_hz: 6000.0,
            filter_resonance: 0.1,
            filter_env_amount: 0.5,
            level: 1.0,
        }
    }
}

/// Noise path of a lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseFrame {
    pub level: f32,
    pub amount: f32,
    /// -1 (dark) .. +1 (bright)
    pub tone: f32,
    pub decay_seconds: f32,
    pub filter_cutoff_hz: f32,
    pub filter_resonance: f32,
    pub filter_env_amount: f32,
}

impl Default for NoiseFrame {
    fn default() -> Self {
        Self {
            level: 0.3,
            amount: 0.15,
            tone: 0.0,
            decay_seconds: 0.12,
            filter_cutoff_hz: 8000.0,
            filter_resonance: 0.1,
            filter_env_amount: 0.5,
        }
    }
}

/// Transient (click) path of a lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransientFrame {
    pub level: f32,
    pub amount: f32,
    pub decay_seconds: f32,
    pub mix: f32,
    pub filter_cutoff_hz: f32,
    pub filter_resonance: f32,
    pub filter_env_amount: f32,
}

impl Default for TransientFrame {
    fn default() -> Self {
        Self {
            level: 0.5,
            amount: 0.2,
            decay_seconds: 0.006,
            mix: 0.6,
            filter_cutoff_hz: 9000.0,
            filter_resonance: 0.05,
            filter_env_amount: 0.8,
        }
    }
}

/// Snapshot of everything a voice needs to render one hit.
///
/// Frames are derived from the parameter store at control rate and handed to a voice whole;
/// the voice copies and clamps it on trigger and never writes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneFrame {
    pub character: LaneCharacter,
    pub osc: OscFrame,
    pub noise: NoiseFrame,
    pub transient: TransientFrame,
    pub decay_seconds: f32,
    pub pitch_env_amount: f32,
    pub pitch_env_decay_seconds: f32,
    pub snap: f32,
    pub drive: f32,
    pub level: f32,
    /// -1 (left) .. +1 (right)
    pub pan: f32,
}

impl Default for LaneFrame {
    fn default() -> Self {
        Self {
            character: LaneCharacter::Kick,
            osc: OscFrame::default(),
            noise: NoiseFrame::default(),
            transient: TransientFrame::default(),
            decay_seconds: 0.25,
            pitch_env_amount: 0.25,
            pitch_env_decay_seconds: 0.06,
            snap: 0.2,
            drive: 0.1,
            level: 0.7,
            pan: 0.0,
        }
    }
}

fn clamp_finite(value: f32, min: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

fn unit(value: f32) -> f32 {
    clamp_finite(value, 0.0, 1.0)
}

impl LaneFrame {
    pub const MIN_DECAY_SECONDS: f32 = 0.01;
    pub const MAX_DECAY_SECONDS: f32 = 2.5;

    /// Copy with every field forced into its legal range. NaN collapses to the lower bound.
    ///
    /// Filter cutoffs are only made finite and non-negative here; the sample-rate dependent
    /// ceiling is applied when the voice builds its filter coefficients.
    pub fn clamped(&self) -> Self {
        Self {
            character: self.character,
            osc: OscFrame {
                frequency_hz: clamp_finite(self.osc.frequency_hz, 20.0, 15_000.0),
                fm_amount: unit(self.osc.fm_amount),
                fold_amount: unit(self.osc.fold_amount),
                filter_cutoff_hz: clamp_finite(self.osc.filter_cutoff_hz, 0.0, 24_000.0),
                filter_resonance: unit(self.osc.filter_resonance),
                filter_env_amount: clamp_finite(self.osc.filter_env_amount, 0.0, 2.5),
                level: clamp_finite(self.osc.level, 0.0, 2.0),
            },
            noise: NoiseFrame {
                level: clamp_finite(self.noise.level, 0.0, 2.5),
                amount: clamp_finite(self.noise.amount, 0.0, 2.5),
                tone: clamp_finite(self.noise.tone, -1.0, 1.0),
                decay_seconds: clamp_finite(self.noise.decay_seconds, 0.004, 1.8),
                filter_cutoff_hz: clamp_finite(self.noise.filter_cutoff_hz, 0.0, 24_000.0),
                filter_resonance: unit(self.noise.filter_resonance),
                filter_env_amount: clamp_finite(self.noise.filter_env_amount, 0.0, 1.5),
            },
            transient: TransientFrame {
                level: clamp_finite(self.transient.level, 0.0, 2.5),
                amount: unit(self.transient.amount),
                decay_seconds: clamp_finite(self.transient.decay_seconds, 0.0015, 0.5),
                mix: clamp_finite(self.transient.mix, 0.0, 1.4),
                filter_cutoff_hz: clamp_finite(self.transient.filter_cutoff_hz, 0.0, 24_000.0),
                filter_resonance: unit(self.transient.filter_resonance),
                filter_env_amount: clamp_finite(self.transient.filter_env_amount, 0.0, 2.5),
            },
            decay_seconds: clamp_finite(
                self.decay_seconds,
                Self::MIN_DECAY_SECONDS,
                Self::MAX_DECAY_SECONDS,
            ),
            pitch_env_amount: unit(self.pitch_env_amount),
            pitch_env_decay_seconds: clamp_finite(self.pitch_env_decay_seconds, 0.004, 0.8),
            snap: unit(self.snap),
            drive: unit(self.drive),
            level: unit(self.level),
            pan: clamp_finite(self.pan, -1.0, 1.0),
        }
    }
}
