use crate::audio::{AudioGenerator, TWO_PI};
use once_cell::sync::Lazy;

const SINE_TABLE_SIZE: usize = 4096;

// One guard point so interpolation never wraps the index.
static SINE_TABLE: Lazy<Vec<f32>> = Lazy::new(|| {
    (0..=SINE_TABLE_SIZE)
        .map(|i| (i as f32 * TWO_PI / SINE_TABLE_SIZE as f32).sin())
        .collect()
});

/// Wrap a phase expressed in cycles into [0, 1).
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let wrapped = phase - phase.floor();
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Interpolated table sine of a phase in cycles (any real value).
#[inline]
pub fn sine(phase: f32) -> f32 {
    let position = wrap_phase(phase) * SINE_TABLE_SIZE as f32;
    let index = (position as usize).min(SINE_TABLE_SIZE - 1);
    let frac = position - index as f32;
    let a = SINE_TABLE[index];
    let b = SINE_TABLE[index + 1];
    a + (b - a) * frac
}

/// Bare phase accumulator counting in cycles.
///
/// The increment is supplied per sample so the caller can sweep pitch without storing a
/// frequency.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Phasor {
    phase: f32,
}

impl Phasor {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    /// Advance by `frequency / sample_rate` and return the new phase.
    #[inline]
    pub fn advance(&mut self, increment: f32) -> f32 {
        self.phase = wrap_phase(self.phase + increment);
        self.phase
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// 32-bit xorshift white noise in [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XorShiftNoise {
    state: u32,
}

impl XorShiftNoise {
    pub const DEFAULT_SEED: u32 = 0x9E37_79B9;

    pub fn new(seed: u32) -> Self {
        // Zero is a fixed point of xorshift.
        Self {
            state: if seed == 0 { Self::DEFAULT_SEED } else { seed },
        }
    }

    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        let unit = (self.state & 0x00FF_FFFF) as f32 / 0x00FF_FFFF as f32;
        unit * 2.0 - 1.0
    }
}

impl Default for XorShiftNoise {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl AudioGenerator for XorShiftNoise {
    fn next_sample(&mut self) -> f32 {
        self.next_bipolar()
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Noise doesn't depend on sample rate
    }
}
