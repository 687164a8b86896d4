/// Level below which a decaying envelope counts as silent.
pub const SILENCE_THRESHOLD: f32 = 1.0e-4;

/// Per-sample multiplier that makes a level fall by `1/e` every `tau_seconds`.
pub fn decay_coefficient(tau_seconds: f32, sample_rate: f32) -> f32 {
    let samples = (tau_seconds.max(1.0e-5) as f64) * (sample_rate.max(1.0) as f64);
    (-1.0 / samples).exp() as f32
}

/// One-shot exponential decay: jumps to 1.0 on trigger and multiplies itself down every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayEnvelope {
    level: f32,
    coefficient: f32,
}

impl Default for DecayEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl DecayEnvelope {
    pub fn new() -> Self {
        Self {
            level: 0.0,
            coefficient: 0.0,
        }
    }

    /// Restart at full level with a new time constant.
    pub fn trigger(&mut self, tau_seconds: f32, sample_rate: f32) {
        self.coefficient = decay_coefficient(tau_seconds, sample_rate);
        self.level = 1.0;
    }

    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    #[inline]
    pub fn advance(&mut self) {
        self.level *= self.coefficient;
    }

    #[inline]
    pub fn is_silent(&self) -> bool {
        self.level < SILENCE_THRESHOLD
    }

    /// Force the level to exactly zero, keeping the coefficient.
    pub fn silence(&mut self) {
        self.level = 0.0;
    }

    pub fn reset(&mut self) {
        self.level = 0.0;
        self.coefficient = 0.0;
    }
}
