mod lane_frames;
mod midi;

pub use lane_frames::{derive_lane_frame, derive_lane_frames, LANE_CHARACTERS};
pub use midi::{frame_for_note, lane_for_midi_note, octave_offset};

use crate::presets;
use crate::LANE_COUNT;
use once_cell::sync::Lazy;

pub type ParamId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalParam {
    Master,
    InternalTempo,
    Swing,
    Run,
    FollowTransport,
    PresetSelect,
    Randomize,
    OscFilterCutoff,
    OscFilterResonance,
    OscFilterEnv,
}

impl GlobalParam {
    pub const ALL: [GlobalParam; 10] = [
        GlobalParam::Master,
        GlobalParam::InternalTempo,
        GlobalParam::Swing,
        GlobalParam::Run,
        GlobalParam::FollowTransport,
        GlobalParam::PresetSelect,
        GlobalParam::Randomize,
        GlobalParam::OscFilterCutoff,
        GlobalParam::OscFilterResonance,
        GlobalParam::OscFilterEnv,
    ];

    pub fn id(self) -> ParamId {
        self as ParamId
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneParam {
    Tune,
    Decay,
    Fold,
    Fm,
    Noise,
    Drive,
    Level,
    Pan,
}

impl LaneParam {
    pub const ALL: [LaneParam; 8] = [
        LaneParam::Tune,
        LaneParam::Decay,
        LaneParam::Fold,
        LaneParam::Fm,
        LaneParam::Noise,
        LaneParam::Drive,
        LaneParam::Level,
        LaneParam::Pan,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneExtraParam {
    PitchEnvAmount,
    PitchEnvDecay,
    TransientAttack,
    NoiseTone,
    NoiseDecay,
    Snap,
}

impl LaneExtraParam {
    pub const ALL: [LaneExtraParam; 6] = [
        LaneExtraParam::PitchEnvAmount,
        LaneExtraParam::PitchEnvDecay,
        LaneExtraParam::TransientAttack,
        LaneExtraParam::NoiseTone,
        LaneExtraParam::NoiseDecay,
        LaneExtraParam::Snap,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneMacroParam {
    TransientDecay,
    TransientMix,
    NoiseResonance,
    NoiseEnvAmount,
}

impl LaneMacroParam {
    pub const ALL: [LaneMacroParam; 4] = [
        LaneMacroParam::TransientDecay,
        LaneMacroParam::TransientMix,
        LaneMacroParam::NoiseResonance,
        LaneMacroParam::NoiseEnvAmount,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneFilterParam {
    OscCutoff,
    OscResonance,
    OscEnv,
    TransientCutoff,
    TransientResonance,
    TransientEnv,
}

impl LaneFilterParam {
    pub const ALL: [LaneFilterParam; 6] = [
        LaneFilterParam::OscCutoff,
        LaneFilterParam::OscResonance,
        LaneFilterParam::OscEnv,
        LaneFilterParam::TransientCutoff,
        LaneFilterParam::TransientResonance,
        LaneFilterParam::TransientEnv,
    ];
}

pub const LANE_PARAM_BASE: ParamId = 100;
pub const LANE_EXTRA_PARAM_BASE: ParamId = 200;
pub const LANE_MACRO_PARAM_BASE: ParamId = 300;
pub const LANE_FILTER_PARAM_BASE: ParamId = 400;

pub const LANE_PARAM_COUNT: usize = LaneParam::ALL.len();
pub const LANE_EXTRA_PARAM_COUNT: usize = LaneExtraParam::ALL.len();
pub const LANE_MACRO_PARAM_COUNT: usize = LaneMacroParam::ALL.len();
pub const LANE_FILTER_PARAM_COUNT: usize = LaneFilterParam::ALL.len();

/// One past the highest valid ID.
pub const PARAMETER_STATE_SIZE: usize =
    LANE_FILTER_PARAM_BASE as usize + LANE_COUNT * LANE_FILTER_PARAM_COUNT;

pub fn lane_param_id(lane: usize, param: LaneParam) -> ParamId {
    LANE_PARAM_BASE + (lane * LANE_PARAM_COUNT + param as usize) as ParamId
}

pub fn lane_extra_param_id(lane: usize, param: LaneExtraParam) -> ParamId {
    LANE_EXTRA_PARAM_BASE + (lane * LANE_EXTRA_PARAM_COUNT + param as usize) as ParamId
}

pub fn lane_macro_param_id(lane: usize, param: LaneMacroParam) -> ParamId {
    LANE_MACRO_PARAM_BASE + (lane * LANE_MACRO_PARAM_COUNT + param as usize) as ParamId
}

pub fn lane_filter_param_id(lane: usize, param: LaneFilterParam) -> ParamId {
    LANE_FILTER_PARAM_BASE + (lane * LANE_FILTER_PARAM_COUNT + param as usize) as ParamId
}

/// Every valid ID in canonical order: globals, then each lane group lane by lane.
pub static ALL_PARAMETER_IDS: Lazy<Vec<ParamId>> = Lazy::new(|| {
    let mut ids: Vec<ParamId> = GlobalParam::ALL.iter().map(|p| p.id()).collect();
    for lane in 0..LANE_COUNT {
        ids.extend(LaneParam::ALL.iter().map(|&p| lane_param_id(lane, p)));
    }
    for lane in 0..LANE_COUNT {
        ids.extend(LaneExtraParam::ALL.iter().map(|&p| lane_extra_param_id(lane, p)));
    }
    for lane in 0..LANE_COUNT {
        ids.extend(LaneMacroParam::ALL.iter().map(|&p| lane_macro_param_id(lane, p)));
    }
    for lane in 0..LANE_COUNT {
        ids.extend(LaneFilterParam::ALL.iter().map(|&p| lane_filter_param_id(lane, p)));
    }
    ids
});

pub fn is_valid_param_id(id: ParamId) -> bool {
    let id = id as usize;
    let in_group = |base: ParamId, per_lane: usize| {
        let base = base as usize;
        id >= base && id < base + LANE_COUNT * per_lane
    };
    id < GlobalParam::ALL.len()
        || in_group(LANE_PARAM_BASE, LANE_PARAM_COUNT)
        || in_group(LANE_EXTRA_PARAM_BASE, LANE_EXTRA_PARAM_COUNT)
        || in_group(LANE_MACRO_PARAM_BASE, LANE_MACRO_PARAM_COUNT)
        || in_group(LANE_FILTER_PARAM_BASE, LANE_FILTER_PARAM_COUNT)
}

/// Normalized values for every parameter, indexed by ID.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterStore {
    values: Vec<f32>,
}

impl ParameterStore {
    pub const DEFAULT_MASTER: f32 = 0.80;
    pub const DEFAULT_INTERNAL_TEMPO: f32 = 0.50;
    pub const DEFAULT_SWING: f32 = 0.12;
    pub const DEFAULT_OSC_FILTER: [f32; 3] = [0.20, 0.34, 0.46];

    /// Global defaults plus the per-lane default tables.
    pub fn new() -> Self {
        let mut store = Self {
            values: vec![0.0; PARAMETER_STATE_SIZE],
        };
        store.set_global(GlobalParam::Master, Self::DEFAULT_MASTER);
        store.set_global(GlobalParam::InternalTempo, Self::DEFAULT_INTERNAL_TEMPO);
        store.set_global(GlobalParam::Swing, Self::DEFAULT_SWING);
        store.apply_osc_filter_defaults();
        for lane in 0..LANE_COUNT {
            presets::apply_lane_base_defaults(&mut store, lane);
            presets::apply_lane_extra_defaults(&mut store, lane);
            presets::apply_lane_macro_defaults(&mut store, lane);
            presets::apply_lane_filter_defaults(&mut store, lane);
        }
        store
    }

    /// Unknown IDs read as 0.
    pub fn get(&self, id: ParamId) -> f32 {
        if !is_valid_param_id(id) {
            return 0.0;
        }
        self.values[id as usize]
    }

    /// Clamps to [0, 1]; unknown IDs are ignored. NaN is stored as 0.
    pub fn set(&mut self, id: ParamId, value: f32) {
        if !is_valid_param_id(id) {
            return;
        }
        self.values[id as usize] = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    pub fn global(&self, param: GlobalParam) -> f32 {
        self.get(param.id())
    }

    pub fn set_global(&mut self, param: GlobalParam, value: f32) {
        self.set(param.id(), value);
    }

    pub fn lane(&self, lane: usize, param: LaneParam) -> f32 {
        self.get(lane_param_id(lane, param))
    }

    pub fn extra(&self, lane: usize, param: LaneExtraParam) -> f32 {
        self.get(lane_extra_param_id(lane, param))
    }

    pub fn macro_value(&self, lane: usize, param: LaneMacroParam) -> f32 {
        self.get(lane_macro_param_id(lane, param))
    }

    pub fn filter(&self, lane: usize, param: LaneFilterParam) -> f32 {
        self.get(lane_filter_param_id(lane, param))
    }

    pub fn switch(&self, param: GlobalParam) -> bool {
        self.global(param) > 0.5
    }

    /// Internal tempo in BPM, 60..180.
    pub fn internal_tempo_bpm(&self) -> f64 {
        60.0 + self.global(GlobalParam::InternalTempo) as f64 * 120.0
    }

    pub fn apply_osc_filter_defaults(&mut self) {
        let [cutoff, resonance, env] = Self::DEFAULT_OSC_FILTER;
        self.set_global(GlobalParam::OscFilterCutoff, cutoff);
        self.set_global(GlobalParam::OscFilterResonance, resonance);
        self.set_global(GlobalParam::OscFilterEnv, env);
    }

    /// Values of every ID in canonical order.
    pub fn ordered_values(&self) -> Vec<f32> {
        ALL_PARAMETER_IDS.iter().map(|&id| self.get(id)).collect()
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}
