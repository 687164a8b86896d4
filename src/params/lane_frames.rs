use super::{
    GlobalParam, LaneExtraParam, LaneFilterParam, LaneMacroParam, LaneParam, ParameterStore,
};
use crate::audio::instruments::{LaneCharacter, LaneFrame, NoiseFrame, OscFrame, TransientFrame};
use crate::LANE_COUNT;

/// Kick, Snare, Hat, PercA, PercA (low bass), PercB, PercB (higher), RimShot, Clap
pub const LANE_CHARACTERS: [LaneCharacter; LANE_COUNT] = [
    LaneCharacter::Kick,
    LaneCharacter::Snare,
    LaneCharacter::Hat,
    LaneCharacter::PercA,
    LaneCharacter::PercA,
    LaneCharacter::PercB,
    LaneCharacter::PercB,
    LaneCharacter::RimShot,
    LaneCharacter::Clap,
];

/// Per-lane voicing of the shared control curves.
#[derive(Debug, Clone, Copy)]
struct LaneScales {
    base_frequency_hz: f32,
    pitch_semitone_range: f32,
    pitch_env: f32,
    transient_attack: f32,
    transient_decay: f32,
    transient_level: f32,
    noise_level: f32,
    noise_resonance: f32,
    noise_env: f32,
    snap: f32,
    osc_cutoff: f32,
    osc_resonance: f32,
    osc_env: f32,
    osc_balance: f32,
}

const fn scales(values: [f32; 14]) -> LaneScales {
    LaneScales {
        base_frequency_hz: values[0],
        pitch_semitone_range: values[1],
        pitch_env: values[2],
        transient_attack: values[3],
        transient_decay: values[4],
        transient_level: values[5],
        noise_level: values[6],
        noise_resonance: values[7],
        noise_env: values[8],
        snap: values[9],
        osc_cutoff: values[10],
        osc_resonance: values[11],
        osc_env: values[12],
        osc_balance: values[13],
    }
}

#[rustfmt::skip]
const LANE_SCALES: [LaneScales; LANE_COUNT] = [
    //       freq    range pitch tatk  tdec  tlvl  nlvl  nres  nenv  snap  ocut  ores  oenv  obal
    scales([  52.0, 60.0, 1.00, 1.00, 1.00, 1.00, 1.05, 0.90, 0.88, 0.24, 0.62, 1.08, 1.24, 1.00]),
    scales([ 185.0, 52.0, 0.60, 0.92, 1.16, 1.10, 2.05, 1.04, 1.02, 1.00, 0.88, 1.00, 1.02, 0.92]),
    scales([3800.0, 48.0, 0.28, 0.74, 0.68, 0.88, 1.65, 1.12, 1.18, 0.86, 1.70, 0.82, 0.58, 0.76]),
    scales([  45.0, 60.0, 0.85, 0.90, 1.05, 1.00, 1.35, 0.98, 0.98, 0.55, 1.08, 0.96, 0.92, 0.94]),
    scales([  65.0, 58.0, 0.82, 0.88, 1.02, 0.98, 1.38, 1.00, 1.00, 0.52, 1.06, 0.98, 0.90, 0.92]),
    scales([ 520.0, 62.0, 0.72, 0.92, 0.94, 1.02, 1.42, 1.02, 1.05, 0.62, 1.12, 1.00, 0.88, 0.90]),
    scales([ 820.0, 64.0, 0.68, 0.90, 0.90, 1.00, 1.45, 1.04, 1.08, 0.60, 1.10, 1.02, 0.86, 0.88]),
    scales([ 950.0, 56.0, 0.58, 0.95, 0.85, 1.08, 1.55, 1.08, 1.12, 0.75, 1.15, 1.05, 0.82, 0.86]),
    scales([ 650.0, 54.0, 0.48, 0.88, 0.78, 1.12, 1.75, 1.12, 1.18, 0.68, 1.18, 1.08, 0.78, 0.82]),
];

struct GlobalOscFilter {
    cutoff_hz: f32,
    resonance: f32,
    env: f32,
}

impl GlobalOscFilter {
    fn from_store(store: &ParameterStore) -> Self {
        let cutoff = store.global(GlobalParam::OscFilterCutoff);
        let resonance = store.global(GlobalParam::OscFilterResonance);
        let env = store.global(GlobalParam::OscFilterEnv);
        Self {
            cutoff_hz: 90.0 + cutoff.powf(1.8) * 15_000.0,
            resonance: 0.04 + resonance * 0.88,
            env: 0.10 + env * 2.1,
        }
    }
}

/// Recompute every lane's frame from the current parameter values.
pub fn derive_lane_frames(store: &ParameterStore) -> [LaneFrame; LANE_COUNT] {
    let global = GlobalOscFilter::from_store(store);
    std::array::from_fn(|lane| lane_frame(store, &global, lane))
}

/// Frame for a single lane. Lanes past the last one get a default frame.
pub fn derive_lane_frame(store: &ParameterStore, lane: usize) -> LaneFrame {
    if lane >= LANE_COUNT {
        return LaneFrame::default();
    }
    lane_frame(store, &GlobalOscFilter::from_store(store), lane)
}

fn lane_frame(store: &ParameterStore, global: &GlobalOscFilter, lane: usize) -> LaneFrame {
    let s = &LANE_SCALES[lane];
    let base = |p| store.lane(lane, p);
    let extra = |p| store.extra(lane, p);
    let macro_value = |p| store.macro_value(lane, p);
    let filter = |p| store.filter(lane, p);

    let semitones = (base(LaneParam::Tune) * 2.0 - 1.0) * s.pitch_semitone_range;
    let frequency_hz = (s.base_frequency_hz * (semitones / 12.0).exp2()).clamp(8.0, 20_000.0);

    let decay = base(LaneParam::Decay);
    let level = base(LaneParam::Level);
    let fold = base(LaneParam::Fold);
    let noise = base(LaneParam::Noise);

    // Lane filter controls trim the global oscillator filter around its own defaults
    let osc_cutoff_trim = 0.35 + filter(LaneFilterParam::OscCutoff);
    let osc_env_trim = 0.5 + filter(LaneFilterParam::OscEnv);
    let osc_res_trim = filter(LaneFilterParam::OscResonance);
    let osc = OscFrame {
        frequency_hz,
        fm_amount: base(LaneParam::Fm),
        fold_amount: fold,
        filter_cutoff_hz: (global.cutoff_hz * s.osc_cutoff * osc_cutoff_trim).clamp(80.0, 18_000.0),
        filter_resonance: ((global.resonance + fold * 0.12 + osc_res_trim * 0.5) * s.osc_resonance)
            .clamp(0.0, 0.98),
        filter_env_amount: (global.env * s.osc_env * osc_env_trim).clamp(0.0, 2.5),
        level: ((0.40 + level.powf(0.80) * 1.25) * s.osc_balance).clamp(0.0, 2.0),
    };

    let noise_tone = extra(LaneExtraParam::NoiseTone);
    let noise_decay = extra(LaneExtraParam::NoiseDecay);
    let noise = NoiseFrame {
        level: (noise.powf(0.58) * s.noise_level).clamp(0.0, 2.5),
        amount: (noise.powf(0.82) * 1.35).clamp(0.0, 2.5),
        tone: noise_tone * 2.0 - 1.0,
        decay_seconds: 0.008 + noise_decay * noise_decay * 1.3,
        filter_cutoff_hz: 220.0 + noise_tone.powf(1.40) * 16_000.0,
        filter_resonance: ((0.05 + macro_value(LaneMacroParam::NoiseResonance) * 0.90)
            * s.noise_resonance)
            .clamp(0.0, 0.98),
        filter_env_amount: ((0.18 + macro_value(LaneMacroParam::NoiseEnvAmount) * 1.25)
            * s.noise_env)
            .clamp(0.0, 1.5),
    };

    let transient_decay = macro_value(LaneMacroParam::TransientDecay);
    let transient_mix = macro_value(LaneMacroParam::TransientMix);
    let transient = TransientFrame {
        level: ((0.18 + transient_mix.powf(0.74) * 1.65) * s.transient_level).clamp(0.0, 2.5),
        amount: (extra(LaneExtraParam::TransientAttack).powf(0.72) * s.transient_attack)
            .clamp(0.0, 1.0),
        decay_seconds: ((0.003 + transient_decay * transient_decay * 0.46) * s.transient_decay)
            .clamp(0.0015, 0.5),
        mix: (0.18 + transient_mix * 1.05).clamp(0.0, 1.4),
        filter_cutoff_hz: 400.0 + filter(LaneFilterParam::TransientCutoff).powf(1.6) * 17_000.0,
        filter_resonance: filter(LaneFilterParam::TransientResonance) * 0.9,
        filter_env_amount: filter(LaneFilterParam::TransientEnv) * 2.0,
    };

    let pitch_decay = extra(LaneExtraParam::PitchEnvDecay);
    LaneFrame {
        character: LANE_CHARACTERS[lane],
        osc,
        noise,
        transient,
        decay_seconds: 0.02 + decay * decay * 1.95,
        pitch_env_amount: (extra(LaneExtraParam::PitchEnvAmount) * s.pitch_env).clamp(0.0, 1.0),
        pitch_env_decay_seconds: 0.006 + pitch_decay * pitch_decay * 0.55,
        snap: (extra(LaneExtraParam::Snap) * s.snap).clamp(0.0, 1.0),
        drive: base(LaneParam::Drive),
        level: level.powf(1.05),
        pan: base(LaneParam::Pan) * 2.0 - 1.0,
    }
}
