use crate::audio::PI;

/// Lowest cutoff any filter in the voice is tuned to.
pub const MIN_CUTOFF_HZ: f32 = 20.0;

/// Cutoffs are kept below this fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.47;

/// Resonance is always kept strictly below self-oscillation.
pub const MAX_RESONANCE: f32 = 0.98;

// Tan approximation function
fn tan_a(x: f32) -> f32 {
    let x2 = x * x;
    x * (0.999999492001 + x2 * -0.096524608111)
        / (1.0 + x2 * (-0.429867256894 + x2 * 0.009981877999))
}

/// Clamp a cutoff into the stable range for `sample_rate`.
pub fn clamp_cutoff(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let ceiling = (sample_rate * MAX_CUTOFF_RATIO).max(MIN_CUTOFF_HZ);
    if cutoff_hz.is_finite() {
        cutoff_hz.clamp(MIN_CUTOFF_HZ, ceiling)
    } else {
        MIN_CUTOFF_HZ
    }
}

/// The two integrator memories of a state-variable filter.
///
/// The state lives outside the coefficients so that a voice can own several independent
/// instances and tests can drive any one of them with known vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SvfState {
    pub low: f32,
    pub band: f32,
}

impl SvfState {
    pub fn reset(&mut self) {
        self.low = 0.0;
        self.band = 0.0;
    }
}

/// Simultaneous outputs of one SVF tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvfOutput {
    pub low: f32,
    pub band: f32,
    pub high: f32,
}

// Trapezoidal SVF matching Emilie Gillet's stmlib version
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvfCoefficients {
    g: f32,
    r: f32,
    h: f32,
    rpg: f32,
}

impl SvfCoefficients {
    /// `resonance` in [0, 1): 0 is critically damped-ish, values near 1 ring.
    pub fn new(cutoff_hz: f32, resonance: f32, sample_rate: f32) -> Self {
        let cutoff = clamp_cutoff(cutoff_hz, sample_rate);
        let resonance = if resonance.is_finite() {
            resonance.clamp(0.0, MAX_RESONANCE)
        } else {
            0.0
        };
        let g = tan_a(cutoff * PI / sample_rate);
        let r = 2.0 * (1.0 - resonance);
        Self::from_parts(g, r)
    }

    /// Coefficients for an already clamped cutoff and damping term.
    ///
    /// Used per sample by the voice, which clamps everything once at trigger time.
    pub fn from_normalized(cutoff_over_rate: f32, damping: f32) -> Self {
        Self::from_parts(tan_a(cutoff_over_rate * PI), damping)
    }

    fn from_parts(g: f32, r: f32) -> Self {
        Self {
            g,
            r,
            h: 1.0 / (1.0 + r * g + g * g),
            rpg: r + g,
        }
    }

    pub fn damping(&self) -> f32 {
        self.r
    }

    /// Run one sample through the filter described by these coefficients.
    #[inline]
    pub fn tick(&self, state: &mut SvfState, input: f32) -> SvfOutput {
        let high = (input - self.rpg * state.band - state.low) * self.h;
        let band = self.g * high + state.band;
        state.band = self.g * high + band;
        let low = self.g * band + state.low;
        state.low = self.g * band + low;
        SvfOutput { low, band, high }
    }

    #[inline]
    pub fn lowpass(&self, state: &mut SvfState, input: f32) -> f32 {
        self.tick(state, input).low
    }

    #[inline]
    pub fn highpass(&self, state: &mut SvfState, input: f32) -> f32 {
        self.tick(state, input).high
    }
}

/// Damping term for a normalized resonance, clamped below self-oscillation.
pub fn damping_for_resonance(resonance: f32) -> f32 {
    let resonance = if resonance.is_finite() {
        resonance.clamp(0.0, MAX_RESONANCE)
    } else {
        0.0
    };
    2.0 * (1.0 - resonance)
}

/// An envelope-swept cutoff, pre-clamped so `floor + span * env` never leaves the stable range
/// for any `env` in [0, 1].
///
/// Both terms are stored as a fraction of the sample rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModulatedCutoff {
    floor: f32,
    span: f32,
}

impl ModulatedCutoff {
    pub fn new(base_hz: f32, env_amount: f32, sample_rate: f32) -> Self {
        let floor_hz = clamp_cutoff(base_hz, sample_rate);
        let ceiling_hz = clamp_cutoff(f32::MAX, sample_rate);
        let env_amount = if env_amount.is_finite() {
            env_amount.max(0.0)
        } else {
            0.0
        };
        let span_hz = (floor_hz * env_amount).min(ceiling_hz - floor_hz);
        Self {
            floor: floor_hz / sample_rate,
            span: span_hz / sample_rate,
        }
    }

    #[inline]
    pub fn at(&self, env: f32) -> f32 {
        self.floor + self.span * env
    }

    pub fn floor_hz(&self, sample_rate: f32) -> f32 {
        self.floor * sample_rate
    }

    pub fn peak_hz(&self, sample_rate: f32) -> f32 {
        (self.floor + self.span) * sample_rate
    }
}

/// One-pole smoother `y += a * (x - y)`, with the derived high-pass `x - y`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnePole {
    state: f32,
}

impl OnePole {
    /// Coefficient for `cutoff_hz`, already in [0, 1].
    pub fn coefficient(cutoff_hz: f32, sample_rate: f32) -> f32 {
        (1.0 - (-(2.0 * PI * cutoff_hz.max(0.0)) / sample_rate).exp()).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn lowpass(&mut self, input: f32, coefficient: f32) -> f32 {
        self.state += coefficient * (input - self.state);
        self.state
    }

    #[inline]
    pub fn highpass(&mut self, input: f32, coefficient: f32) -> f32 {
        input - self.lowpass(input, coefficient)
    }

    pub fn value(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44100.0;

    #[test]
    fn test_svf_impulse_response_known_values() {
        // g = tan(pi/4) = 1, r = 2 -> h = 1/4
        let coeffs = SvfCoefficients::from_normalized(0.25, 2.0);
        let mut state = SvfState::default();

        let first = coeffs.tick(&mut state, 1.0);
        assert!((first.high - 0.25).abs() < 1e-4, "high = {}", first.high);
        assert!((first.band - 0.25).abs() < 1e-4, "band = {}", first.band);
        assert!((first.low - 0.25).abs() < 1e-4, "low = {}", first.low);
        assert!((state.band - 0.5).abs() < 1e-4);
        assert!((state.low - 0.5).abs() < 1e-4);

        let second = coeffs.tick(&mut state, 0.0);
        // high = (0 - 3 * 0.5 - 0.5) / 4 = -0.5
        assert!((second.high + 0.5).abs() < 1e-4, "high = {}", second.high);
        assert!((second.band - 0.0).abs() < 1e-4, "band = {}", second.band);
        assert!((second.low - 0.5).abs() < 1e-4, "low = {}", second.low);
    }

    #[test]
    fn test_svf_lowpass_converges_to_dc() {
        let coeffs = SvfCoefficients::new(1000.0, 0.3, SR);
        let mut state = SvfState::default();
        let mut out = 0.0;
        for _ in 0..20_000 {
            out = coeffs.lowpass(&mut state, 0.5);
        }
        assert!((out - 0.5).abs() < 1e-3, "DC should pass the lowpass, got {}", out);
    }

    #[test]
    fn test_svf_highpass_blocks_dc() {
        let coeffs = SvfCoefficients::new(200.0, 0.0, SR);
        let mut state = SvfState::default();
        let mut out = 1.0;
        for _ in 0..20_000 {
            out = coeffs.highpass(&mut state, 1.0);
        }
        assert!(out.abs() < 1e-3, "DC should be removed by the highpass, got {}", out);
    }

    #[test]
    fn test_svf_instances_are_independent() {
        let coeffs = SvfCoefficients::new(2500.0, 0.5, SR);
        let mut driven = SvfState::default();
        let mut idle = SvfState::default();

        for i in 0..256 {
            coeffs.lowpass(&mut driven, if i % 2 == 0 { 1.0 } else { -1.0 });
        }
        assert_ne!(driven, SvfState::default());
        assert_eq!(idle, SvfState::default());

        coeffs.lowpass(&mut idle, 0.0);
        assert_eq!(idle, SvfState::default(), "zero in, zero state");
    }

    #[test]
    fn test_svf_stable_at_extremes() {
        let coeffs = SvfCoefficients::new(1.0e9, 5.0, SR);
        let mut state = SvfState::default();
        let mut noise = 0x1234_5678u32;
        for _ in 0..(SR as usize * 2) {
            noise ^= noise << 13;
            noise ^= noise >> 17;
            noise ^= noise << 5;
            let x = (noise as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let y = coeffs.lowpass(&mut state, x);
            assert!(y.is_finite() && y.abs() < 100.0, "filter blew up: {}", y);
        }
    }

    #[test]
    fn test_clamp_cutoff_range() {
        assert_eq!(clamp_cutoff(5.0, SR), MIN_CUTOFF_HZ);
        assert_eq!(clamp_cutoff(30_000.0, SR), SR * MAX_CUTOFF_RATIO);
        assert_eq!(clamp_cutoff(f32::NAN, SR), MIN_CUTOFF_HZ);
        assert_eq!(clamp_cutoff(1000.0, SR), 1000.0);
    }

    #[test]
    fn test_modulated_cutoff_stays_in_range() {
        let cutoff = ModulatedCutoff::new(12_000.0, 2.5, SR);
        assert!((cutoff.floor_hz(SR) - 12_000.0).abs() < 0.5);
        assert!(cutoff.peak_hz(SR) <= SR * MAX_CUTOFF_RATIO + 0.5);
        assert!(cutoff.at(1.0) <= MAX_CUTOFF_RATIO + 1e-6);
        assert!(cutoff.at(0.0) >= MIN_CUTOFF_HZ / SR - 1e-9);

        let flat = ModulatedCutoff::new(800.0, 0.0, SR);
        assert_eq!(flat.at(0.0), flat.at(1.0));
    }

    #[test]
    fn test_one_pole_split() {
        let coefficient = OnePole::coefficient(500.0, SR);
        assert!(coefficient > 0.0 && coefficient < 1.0);

        let mut low = OnePole::default();
        let mut high = OnePole::default();
        let mut lp = 0.0;
        let mut hp = 1.0;
        for _ in 0..10_000 {
            lp = low.lowpass(1.0, coefficient);
            hp = high.highpass(1.0, coefficient);
        }
        assert!((lp - 1.0).abs() < 1e-4);
        assert!(hp.abs() < 1e-4);
    }
}
