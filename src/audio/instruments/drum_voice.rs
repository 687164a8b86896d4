use super::{CharacterTuning, LaneCharacter, LaneFrame};
use crate::audio::envelopes::DecayEnvelope;
use crate::audio::filters::{
    damping_for_resonance, ModulatedCutoff, OnePole, SvfCoefficients, SvfState,
};
use crate::audio::oscillators::{sine, Phasor, XorShiftNoise};
use crate::audio::shapers::{drive_saturate, wavefold};
use crate::audio::{AudioGenerator, TWO_PI};

// Path gains are normalized by sqrt(sum of squares); this only guards the all-zero mix.
const MIN_PATH_POWER: f32 = 1.0e-12;

/// Values derived once per trigger and read every sample.
#[derive(Debug, Clone, Copy)]
struct TriggerState {
    frame: LaneFrame,
    tuning: CharacterTuning,

    carrier_increment: f32,
    modulator_ratio: f32,
    transient_increment: f32,
    pitch_sweep_semitones: f32,

    noise_low_coefficient: f32,
    noise_high_coefficient: f32,
    noise_tone_blend: f32,
    snap_exponent: f32,

    body_cutoff: ModulatedCutoff,
    body_damping: f32,
    noise_cutoff: ModulatedCutoff,
    noise_damping: f32,
    noise_highpass: SvfCoefficients,
    transient_cutoff: ModulatedCutoff,
    transient_damping: f32,

    body_gain: f32,
    noise_gain: f32,
    transient_gain: f32,
}

impl TriggerState {
    fn derive(frame: &LaneFrame, sample_rate: f32) -> Self {
        let frame = frame.clamped();
        let tuning = *frame.character.tuning();

        let tone01 = (frame.noise.tone + 1.0) * 0.5;
        let low_split_hz = 240.0 + tone01 * 9200.0;
        let high_split_hz = 120.0 + tone01 * 5200.0;

        let body_gain = frame.osc.level * tuning.body_gain;
        let noise_gain = frame.noise.level;
        let transient_gain = frame.transient.level;
        let power = (body_gain * body_gain + noise_gain * noise_gain
            + transient_gain * transient_gain)
            .max(MIN_PATH_POWER);
        let norm = 1.0 / power.sqrt();

        Self {
            carrier_increment: frame.osc.frequency_hz / sample_rate,
            modulator_ratio: 1.25 + frame.osc.fm_amount * 5.2 * tuning.fm_scale,
            transient_increment: tuning.transient_base_hz
                * (0.85 + frame.transient.amount * 0.8)
                / sample_rate,
            pitch_sweep_semitones: frame.pitch_env_amount * tuning.pitch_span_semitones,

            noise_low_coefficient: OnePole::coefficient(low_split_hz, sample_rate),
            noise_high_coefficient: OnePole::coefficient(high_split_hz, sample_rate),
            noise_tone_blend: tone01,
            snap_exponent: (0.85 - frame.snap * 0.55).clamp(0.25, 1.0),

            body_cutoff: ModulatedCutoff::new(
                frame.osc.filter_cutoff_hz,
                frame.osc.filter_env_amount,
                sample_rate,
            ),
            body_damping: damping_for_resonance(frame.osc.filter_resonance),
            noise_cutoff: ModulatedCutoff::new(
                frame.noise.filter_cutoff_hz,
                frame.noise.filter_env_amount,
                sample_rate,
            ),
            noise_damping: damping_for_resonance(frame.noise.filter_resonance),
            noise_highpass: SvfCoefficients::new(30.0 + tone01 * 400.0, 0.0, sample_rate),
            transient_cutoff: ModulatedCutoff::new(
                frame.transient.filter_cutoff_hz,
                frame.transient.filter_env_amount,
                sample_rate,
            ),
            transient_damping: damping_for_resonance(frame.transient.filter_resonance),

            body_gain: body_gain * norm,
            noise_gain: noise_gain * norm,
            transient_gain: transient_gain * norm,

            frame,
            tuning,
        }
    }
}

/// One lane's percussive synthesizer.
///
/// Three generator paths (phase-modulated body, filtered noise, click) decay under five
/// independent exponential envelopes and are summed through a drive stage. Everything is
/// fixed-size; triggering overwrites the envelopes and phases but leaves the filter memories
/// running, so back-to-back hits don't click.
pub struct DrumVoice {
    sample_rate: f32,
    params: TriggerState,

    carrier: Phasor,
    modulator: Phasor,
    transient_osc: Phasor,

    amp_env: DecayEnvelope,
    timbre_env: DecayEnvelope,
    pitch_env: DecayEnvelope,
    noise_env: DecayEnvelope,
    transient_env: DecayEnvelope,

    body_filter: SvfState,
    transient_filter: SvfState,
    noise_lowpass: SvfState,
    noise_highpass: SvfState,
    noise_low_split: OnePole,
    noise_high_split: OnePole,

    noise: XorShiftNoise,
    active: bool,
}

impl DrumVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, XorShiftNoise::DEFAULT_SEED)
    }

    /// Voices in the same machine use different seeds so simultaneous hits don't correlate.
    pub fn with_seed(sample_rate: f32, seed: u32) -> Self {
        let sample_rate = sample_rate.max(1000.0);
        Self {
            sample_rate,
            params: TriggerState::derive(&LaneFrame::default(), sample_rate),
            carrier: Phasor::new(),
            modulator: Phasor::new(),
            transient_osc: Phasor::new(),
            amp_env: DecayEnvelope::new(),
            timbre_env: DecayEnvelope::new(),
            pitch_env: DecayEnvelope::new(),
            noise_env: DecayEnvelope::new(),
            transient_env: DecayEnvelope::new(),
            body_filter: SvfState::default(),
            transient_filter: SvfState::default(),
            noise_lowpass: SvfState::default(),
            noise_highpass: SvfState::default(),
            noise_low_split: OnePole::default(),
            noise_high_split: OnePole::default(),
            noise: XorShiftNoise::new(seed),
            active: false,
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Start a new hit. Always overwrites whatever is sounding.
    pub fn trigger(&mut self, frame: &LaneFrame) {
        self.params = TriggerState::derive(frame, self.sample_rate);
        let frame = &self.params.frame;
        let sample_rate = self.sample_rate;

        self.amp_env.trigger(frame.decay_seconds, sample_rate);
        self.timbre_env
            .trigger((frame.decay_seconds * 0.33).max(0.01), sample_rate);
        self.pitch_env
            .trigger(frame.pitch_env_decay_seconds, sample_rate);
        self.noise_env.trigger(frame.noise.decay_seconds, sample_rate);
        self.transient_env
            .trigger(frame.transient.decay_seconds, sample_rate);
        self.active = true;
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The clamped frame of the current (or last) hit.
    pub fn frame(&self) -> &LaneFrame {
        &self.params.frame
    }

    pub fn character(&self) -> LaneCharacter {
        self.params.frame.character
    }

    /// Render one sample. Returns exactly 0.0 while inactive.
    pub fn process(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }

        let p = &self.params;
        let frame = &p.frame;
        let timbre = self.timbre_env.level();

        // Oscillator path: two-operator PM, fold, swept lowpass
        let pitch_ratio = (p.pitch_sweep_semitones * self.pitch_env.level() / 12.0).exp2();
        let base_increment = p.carrier_increment * pitch_ratio;
        let modulator_phase = self.modulator.advance(base_increment * p.modulator_ratio);
        let carrier_phase = self
            .carrier
            .advance(base_increment * (1.0 + timbre * 0.07));

        let fm_depth = frame.osc.fm_amount * (6.4 * timbre * p.tuning.fm_scale + 0.3);
        let modulation = sine(modulator_phase) * fm_depth / TWO_PI;
        let body = sine(carrier_phase + modulation);
        let body = wavefold(body, frame.osc.fold_amount * (1.0 + 0.9 * timbre));
        let body_coeffs =
            SvfCoefficients::from_normalized(p.body_cutoff.at(timbre), p.body_damping);
        let body = body_coeffs.lowpass(&mut self.body_filter, body);

        // Noise path: tone split, snap contour, resonant lowpass + rumble highpass
        let raw_noise = self.noise.next_bipolar();
        let low_noise = self
            .noise_low_split
            .lowpass(raw_noise, p.noise_low_coefficient);
        let high_noise = self
            .noise_high_split
            .highpass(raw_noise, p.noise_high_coefficient);
        let shaped_noise =
            (1.0 - p.noise_tone_blend) * low_noise + p.noise_tone_blend * high_noise;

        let noise_level = self.noise_env.level();
        let snappy = noise_level.max(0.0).powf(p.snap_exponent);
        let contour = (1.0 - frame.snap) * noise_level + frame.snap * snappy;
        let noise = shaped_noise * frame.noise.amount * contour * p.tuning.noise_blend_gain;
        let noise_coeffs =
            SvfCoefficients::from_normalized(p.noise_cutoff.at(noise_level), p.noise_damping);
        let noise = noise_coeffs.lowpass(&mut self.noise_lowpass, noise);
        let noise = p.noise_highpass.highpass(&mut self.noise_highpass, noise);

        // Transient path: sine burst + raw noise through its own swept lowpass
        let transient_level = self.transient_env.level();
        let burst = sine(self.transient_osc.advance(p.transient_increment));
        let click = (burst * p.tuning.click_sine_ratio
            + raw_noise * (1.0 - p.tuning.click_sine_ratio))
            * frame.transient.mix;
        let transient_coeffs = SvfCoefficients::from_normalized(
            p.transient_cutoff.at(transient_level),
            p.transient_damping,
        );
        let click = transient_coeffs.lowpass(&mut self.transient_filter, click);
        let transient = click * transient_level * frame.transient.amount;

        // Power-normalized sum, drive, amplitude gate
        let mixed = body * p.body_gain + noise * p.noise_gain + transient * p.transient_gain;
        let gate = self.amp_env.level() * (0.40 + 0.60 * timbre);
        let sample = drive_saturate(mixed, frame.drive) * gate * frame.level;

        self.amp_env.advance();
        self.timbre_env.advance();
        self.pitch_env.advance();
        self.noise_env.advance();
        self.transient_env.advance();

        if self.amp_env.is_silent() && self.noise_env.is_silent() && self.transient_env.is_silent()
        {
            self.active = false;
            self.amp_env.silence();
            self.timbre_env.silence();
            self.pitch_env.silence();
            self.noise_env.silence();
            self.transient_env.silence();
        }

        sample
    }

    /// Zero every phase, envelope and filter memory and go silent.
    pub fn reset(&mut self) {
        self.carrier.reset();
        self.modulator.reset();
        self.transient_osc.reset();
        self.amp_env.reset();
        self.timbre_env.reset();
        self.pitch_env.reset();
        self.noise_env.reset();
        self.transient_env.reset();
        self.body_filter.reset();
        self.transient_filter.reset();
        self.noise_lowpass.reset();
        self.noise_highpass.reset();
        self.noise_low_split.reset();
        self.noise_high_split.reset();
        self.active = false;
    }

    /// Changing the rate drops the current hit; coefficients are rebuilt on the next trigger.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1000.0);
        self.reset();
    }
}

impl AudioGenerator for DrumVoice {
    fn next_sample(&mut self) -> f32 {
        self.process()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        DrumVoice::set_sample_rate(self, sample_rate);
    }
}
