use crate::params::{
    lane_extra_param_id, lane_filter_param_id, lane_macro_param_id, lane_param_id, GlobalParam,
    LaneExtraParam, LaneFilterParam, LaneMacroParam, LaneParam, ParameterStore,
    LANE_EXTRA_PARAM_COUNT, LANE_FILTER_PARAM_COUNT, LANE_MACRO_PARAM_COUNT, LANE_PARAM_COUNT,
};
use crate::sequencing::PatternGrid;
use crate::LANE_COUNT;
use once_cell::sync::Lazy;

/// Base values for a lane no preset or state file says anything about.
pub const LANE_BASE_DEFAULTS: [f32; LANE_PARAM_COUNT] =
    [0.50, 0.40, 0.35, 0.35, 0.20, 0.15, 0.75, 0.50];

/// Base values used when older state files are missing a lane entirely.
pub const MISSING_LANE_BASE_VALUE: f32 = 0.5;

pub const LANE_EXTRA_DEFAULTS: [[f32; LANE_EXTRA_PARAM_COUNT]; LANE_COUNT] = [
    [0.84, 0.30, 0.76, 0.36, 0.26, 0.24],
    [0.46, 0.48, 0.62, 0.72, 0.58, 0.84],
    [0.20, 0.22, 0.38, 0.90, 0.20, 0.72],
    [0.42, 0.38, 0.48, 0.52, 0.42, 0.48],
    [0.44, 0.36, 0.50, 0.54, 0.44, 0.50],
    [0.52, 0.34, 0.54, 0.60, 0.40, 0.56],
    [0.54, 0.32, 0.56, 0.62, 0.38, 0.58],
    [0.48, 0.40, 0.58, 0.68, 0.52, 0.72],
    [0.38, 0.45, 0.62, 0.72, 0.58, 0.65],
];

pub const LANE_MACRO_DEFAULTS: [[f32; LANE_MACRO_PARAM_COUNT]; LANE_COUNT] = [
    [0.28, 0.44, 0.34, 0.56],
    [0.38, 0.56, 0.50, 0.72],
    [0.20, 0.36, 0.66, 0.86],
    [0.32, 0.48, 0.40, 0.54],
    [0.34, 0.46, 0.42, 0.56],
    [0.36, 0.50, 0.44, 0.58],
    [0.38, 0.48, 0.46, 0.60],
    [0.30, 0.52, 0.50, 0.62],
    [0.28, 0.54, 0.55, 0.68],
];

pub const LANE_FILTER_DEFAULTS: [[f32; LANE_FILTER_PARAM_COUNT]; LANE_COUNT] = [
    [0.65, 0.08, 0.40, 0.70, 0.05, 0.35],
    [0.68, 0.12, 0.30, 0.72, 0.08, 0.45],
    [0.82, 0.06, 0.20, 0.85, 0.04, 0.30],
    [0.72, 0.12, 0.38, 0.76, 0.08, 0.42],
    [0.74, 0.11, 0.40, 0.78, 0.07, 0.44],
    [0.70, 0.14, 0.36, 0.74, 0.09, 0.40],
    [0.72, 0.13, 0.38, 0.76, 0.08, 0.42],
    [0.68, 0.16, 0.42, 0.72, 0.10, 0.48],
    [0.66, 0.18, 0.45, 0.70, 0.12, 0.52],
];

pub fn apply_lane_base_values(
    store: &mut ParameterStore,
    lane: usize,
    values: &[f32; LANE_PARAM_COUNT],
) {
    for (&param, &value) in LaneParam::ALL.iter().zip(values) {
        store.set(lane_param_id(lane, param), value);
    }
}

pub fn apply_lane_base_defaults(store: &mut ParameterStore, lane: usize) {
    apply_lane_base_values(store, lane, &LANE_BASE_DEFAULTS);
}

pub fn apply_lane_extra_defaults(store: &mut ParameterStore, lane: usize) {
    if let Some(row) = LANE_EXTRA_DEFAULTS.get(lane) {
        for (&param, &value) in LaneExtraParam::ALL.iter().zip(row) {
            store.set(lane_extra_param_id(lane, param), value);
        }
    }
}

pub fn apply_lane_macro_defaults(store: &mut ParameterStore, lane: usize) {
    if let Some(row) = LANE_MACRO_DEFAULTS.get(lane) {
        for (&param, &value) in LaneMacroParam::ALL.iter().zip(row) {
            store.set(lane_macro_param_id(lane, param), value);
        }
    }
}

pub fn apply_lane_filter_defaults(store: &mut ParameterStore, lane: usize) {
    if let Some(row) = LANE_FILTER_DEFAULTS.get(lane) {
        for (&param, &value) in LaneFilterParam::ALL.iter().zip(row) {
            store.set(lane_filter_param_id(lane, param), value);
        }
    }
}

/// A factory kit: globals, per-lane base values and a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryPreset {
    pub name: &'static str,
    pub master: f32,
    pub internal_tempo: f32,
    pub swing: f32,
    pub lanes: [[f32; LANE_PARAM_COUNT]; LANE_COUNT],
    pub pattern: PatternGrid,
}

impl FactoryPreset {
    /// Write every lane and global value of this preset into `store`.
    ///
    /// Extra and filter values come from the lane default tables; the macros are derived from
    /// the lane's decay, transient attack, snap and noise decay.
    pub fn apply(&self, store: &mut ParameterStore) {
        store.set_global(GlobalParam::Master, self.master);
        store.set_global(GlobalParam::InternalTempo, self.internal_tempo);
        store.set_global(GlobalParam::Swing, self.swing);

        for (lane, base) in self.lanes.iter().enumerate() {
            apply_lane_base_values(store, lane, base);
            apply_lane_extra_defaults(store, lane);
            apply_lane_filter_defaults(store, lane);

            let decay = store.lane(lane, LaneParam::Decay);
            let transient_attack = store.extra(lane, LaneExtraParam::TransientAttack);
            let snap = store.extra(lane, LaneExtraParam::Snap);
            let noise_decay = store.extra(lane, LaneExtraParam::NoiseDecay);

            let macros = [
                (LaneMacroParam::TransientDecay, 0.18 + decay * 0.62),
                (LaneMacroParam::TransientMix, 0.24 + transient_attack * 0.70),
                (LaneMacroParam::NoiseResonance, 0.20 + snap * 0.68),
                (LaneMacroParam::NoiseEnvAmount, 0.28 + noise_decay * 0.56),
            ];
            for (param, value) in macros {
                store.set(lane_macro_param_id(lane, param), value);
            }
        }
    }
}

// Kick, Snare, Hat, Perc base values; the remaining lanes use LANE_BASE_DEFAULTS
struct PresetSource {
    name: &'static str,
    master: f32,
    internal_tempo: f32,
    swing: f32,
    lanes: [[f32; LANE_PARAM_COUNT]; 4],
    rows: [&'static str; 4],
}

const PRESET_SOURCES: [PresetSource; 5] = [
    PresetSource {
        name: "Buchla Punch Matrix",
        master: 0.82,
        internal_tempo: 0.56,
        swing: 0.09,
        lanes: [
            [0.45, 0.52, 0.42, 0.35, 0.06, 0.21, 0.92, 0.47],
            [0.52, 0.44, 0.62, 0.57, 0.55, 0.24, 0.70, 0.57],
            [0.67, 0.26, 0.74, 0.39, 0.90, 0.12, 0.55, 0.28],
            [0.58, 0.39, 0.67, 0.43, 0.29, 0.18, 0.62, 0.69],
        ],
        rows: [
            "x...x...x.x.x...",
            "..x..x....x..x..",
            "xxxxx.xxxxx.xxx.",
            "...x.x..x..x.x..",
        ],
    },
    PresetSource {
        name: "Coastline Electro Flux",
        master: 0.78,
        internal_tempo: 0.64,
        swing: 0.17,
        lanes: [
            [0.39, 0.61, 0.49, 0.44, 0.09, 0.30, 0.88, 0.46],
            [0.56, 0.40, 0.69, 0.63, 0.62, 0.31, 0.68, 0.58],
            [0.71, 0.31, 0.61, 0.34, 0.95, 0.18, 0.57, 0.30],
            [0.66, 0.36, 0.74, 0.50, 0.22, 0.25, 0.60, 0.72],
        ],
        rows: [
            "x.....x.x.....x.",
            "..x..x.x..x..x.x",
            "x.x.xxx.x.x.xxx.",
            "...xx....x.xx...",
        ],
    },
    PresetSource {
        name: "LPG Metallic Ritual",
        master: 0.75,
        internal_tempo: 0.47,
        swing: 0.23,
        lanes: [
            [0.47, 0.50, 0.53, 0.26, 0.05, 0.27, 0.89, 0.45],
            [0.63, 0.33, 0.79, 0.70, 0.66, 0.23, 0.66, 0.60],
            [0.73, 0.24, 0.82, 0.42, 0.98, 0.17, 0.58, 0.34],
            [0.61, 0.34, 0.88, 0.56, 0.25, 0.29, 0.64, 0.71],
        ],
        rows: [
            "x...x...x...x.x.",
            "..x....x..x....x",
            "xxx.x.xxx.x.xxx.",
            ".x.x.....x...x.x",
        ],
    },
    PresetSource {
        name: "West Coast Broken Clock",
        master: 0.80,
        internal_tempo: 0.60,
        swing: 0.31,
        lanes: [
            [0.42, 0.58, 0.57, 0.50, 0.10, 0.35, 0.90, 0.46],
            [0.54, 0.37, 0.74, 0.73, 0.74, 0.34, 0.67, 0.59],
            [0.68, 0.28, 0.79, 0.39, 0.99, 0.21, 0.53, 0.31],
            [0.70, 0.43, 0.86, 0.63, 0.31, 0.28, 0.63, 0.75],
        ],
        rows: [
            "x..x..x.x...x...",
            ".x..x..x.x..x..x",
            "xx.xx.x.xx.xx.x.",
            "..x..x.x..x..x.x",
        ],
    },
    PresetSource {
        name: "Voltage Dust Stepper",
        master: 0.77,
        internal_tempo: 0.52,
        swing: 0.14,
        lanes: [
            [0.44, 0.54, 0.44, 0.31, 0.07, 0.19, 0.87, 0.47],
            [0.57, 0.45, 0.60, 0.54, 0.49, 0.20, 0.69, 0.56],
            [0.65, 0.30, 0.70, 0.30, 0.90, 0.11, 0.55, 0.33],
            [0.60, 0.40, 0.63, 0.41, 0.23, 0.18, 0.61, 0.68],
        ],
        rows: [
            "x...x...x...x...",
            "..x..x....x..x..",
            "x.x.x.x.x.x.x.x.",
            "...x..x..x..x..x",
        ],
    },
];

pub static FACTORY_PRESETS: Lazy<Vec<FactoryPreset>> = Lazy::new(|| {
    PRESET_SOURCES
        .iter()
        .map(|source| {
            let mut lanes = [LANE_BASE_DEFAULTS; LANE_COUNT];
            let mut pattern = PatternGrid::empty();
            for (lane, (base, row)) in source.lanes.iter().zip(source.rows.iter()).enumerate() {
                lanes[lane] = *base;
                pattern.set_row(lane, PatternGrid::row_from_str(row));
            }
            FactoryPreset {
                name: source.name,
                master: source.master,
                internal_tempo: source.internal_tempo,
                swing: source.swing,
                lanes,
                pattern,
            }
        })
        .collect()
});

pub fn preset_count() -> usize {
    FACTORY_PRESETS.len()
}

/// Out-of-range indices select the last preset.
pub fn factory_preset(index: usize) -> &'static FactoryPreset {
    let index = index.min(preset_count() - 1);
    &FACTORY_PRESETS[index]
}

pub fn preset_index_from_normalized(normalized: f32) -> usize {
    let max_index = preset_count() - 1;
    let normalized = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
    ((normalized * max_index as f32).round() as usize).min(max_index)
}

pub fn normalized_from_preset_index(index: usize) -> f32 {
    let max_index = preset_count() - 1;
    if max_index == 0 {
        return 0.0;
    }
    index.min(max_index) as f32 / max_index as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_bank_contents() {
        assert_eq!(preset_count(), 5);
        let first = factory_preset(0);
        assert_eq!(first.name, "Buchla Punch Matrix");
        assert_eq!(first.lanes[0][6], 0.92);
        assert_eq!(first.lanes[8], LANE_BASE_DEFAULTS);

        let kick_hits: Vec<usize> = (0..16).filter(|&s| first.pattern.is_set(0, s)).collect();
        assert_eq!(kick_hits, vec![0, 4, 8, 10, 12]);
        for lane in 4..LANE_COUNT {
            assert!((0..16).all(|s| !first.pattern.is_set(lane, s)));
        }

        assert_eq!(factory_preset(99).name, "Voltage Dust Stepper");
    }

    #[test]
    fn test_pattern_rows_are_sixteen_steps() {
        for source in PRESET_SOURCES.iter() {
            for row in source.rows {
                assert_eq!(row.len(), 16, "{} has a malformed row {:?}", source.name, row);
            }
        }
    }

    #[test]
    fn test_preset_index_mapping() {
        assert_eq!(preset_index_from_normalized(0.0), 0);
        assert_eq!(preset_index_from_normalized(1.0), 4);
        assert_eq!(preset_index_from_normalized(0.5), 2);
        assert_eq!(preset_index_from_normalized(0.3), 1);
        assert_eq!(preset_index_from_normalized(7.0), 4);
        for index in 0..preset_count() {
            assert_eq!(preset_index_from_normalized(normalized_from_preset_index(index)), index);
        }
    }

    #[test]
    fn test_apply_derives_macros() {
        let mut store = ParameterStore::new();
        let preset = factory_preset(0);
        preset.apply(&mut store);

        assert_eq!(store.global(GlobalParam::Master), 0.82);
        assert_eq!(store.lane(1, LaneParam::Noise), 0.55);
        assert_eq!(store.extra(2, LaneExtraParam::NoiseTone), 0.90);
        assert_eq!(store.filter(3, LaneFilterParam::OscCutoff), 0.72);

        let expected = 0.18 + 0.52 * 0.62;
        let actual = store.macro_value(0, LaneMacroParam::TransientDecay);
        assert!((actual - expected).abs() < 1e-6, "{} vs {}", actual, expected);
        let expected = 0.20 + 0.84 * 0.68;
        let actual = store.macro_value(1, LaneMacroParam::NoiseResonance);
        assert!((actual - expected).abs() < 1e-6, "{} vs {}", actual, expected);
    }
}
