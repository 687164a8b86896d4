//! Versioned save/load of the engine's parameter values and pattern.
//!
//! State is a JSON document `{ version, preset, values, pattern? }`. `values` is a flat list
//! whose layout depends on `version`; older layouts are upgraded on load with documented
//! defaults for everything they didn't store.

use crate::error::{StateError, StateResult};
use crate::params::{
    lane_extra_param_id, lane_filter_param_id, lane_macro_param_id, lane_param_id, GlobalParam,
    LaneExtraParam, LaneFilterParam, LaneMacroParam, LaneParam, ParamId, ParameterStore,
    ALL_PARAMETER_IDS,
};
use crate::presets::{self, MISSING_LANE_BASE_VALUE};
use crate::sequencing::PatternGrid;
use crate::LANE_COUNT;
use serde::{Deserialize, Serialize};

pub const STATE_VERSION: u32 = 5;

// Versions 1-3 stored only the first six globals (through PresetSelect)
const LEGACY_GLOBAL_COUNT: usize = 6;
// Version 1 had four lanes, versions 2-4 had five
const V1_LANE_COUNT: usize = 4;
const V4_LANE_COUNT: usize = 5;
// Version 1 split the old fourth lane in two, nudging the copy right
const V1_SPLIT_PAN_OFFSET: f32 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    pub version: u32,
    pub preset: usize,
    pub values: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternGrid>,
}

/// Everything a successful load hands back to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredState {
    pub version: u32,
    pub params: ParameterStore,
    pub preset: usize,
    pub pattern: PatternGrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaneGroup {
    Base,
    Extra,
    Macro,
    Filter,
}

impl LaneGroup {
    fn ids(self, lane: usize) -> Vec<ParamId> {
        match self {
            LaneGroup::Base => LaneParam::ALL.iter().map(|&p| lane_param_id(lane, p)).collect(),
            LaneGroup::Extra => LaneExtraParam::ALL
                .iter()
                .map(|&p| lane_extra_param_id(lane, p))
                .collect(),
            LaneGroup::Macro => LaneMacroParam::ALL
                .iter()
                .map(|&p| lane_macro_param_id(lane, p))
                .collect(),
            LaneGroup::Filter => LaneFilterParam::ALL
                .iter()
                .map(|&p| lane_filter_param_id(lane, p))
                .collect(),
        }
    }

    fn apply_defaults(self, store: &mut ParameterStore, lane: usize) {
        match self {
            LaneGroup::Base => {
                for id in self.ids(lane) {
                    store.set(id, MISSING_LANE_BASE_VALUE);
                }
            }
            LaneGroup::Extra => presets::apply_lane_extra_defaults(store, lane),
            LaneGroup::Macro => presets::apply_lane_macro_defaults(store, lane),
            LaneGroup::Filter => presets::apply_lane_filter_defaults(store, lane),
        }
    }
}

const ALL_GROUPS: [LaneGroup; 4] = [
    LaneGroup::Base,
    LaneGroup::Extra,
    LaneGroup::Macro,
    LaneGroup::Filter,
];

/// Stored layout of one legacy version.
struct LegacyLayout {
    global_count: usize,
    lane_count: usize,
    groups: &'static [LaneGroup],
    /// Whether the oscillator filter globals fall back to their defaults.
    osc_filter_defaults: bool,
}

impl LegacyLayout {
    fn for_version(version: u32) -> Option<Self> {
        let layout = match version {
            1 => Self {
                global_count: LEGACY_GLOBAL_COUNT,
                lane_count: V1_LANE_COUNT,
                groups: &[LaneGroup::Base],
                osc_filter_defaults: true,
            },
            2 => Self {
                global_count: LEGACY_GLOBAL_COUNT,
                lane_count: V4_LANE_COUNT,
                groups: &[LaneGroup::Base, LaneGroup::Extra],
                osc_filter_defaults: true,
            },
            3 => Self {
                global_count: LEGACY_GLOBAL_COUNT,
                lane_count: V4_LANE_COUNT,
                groups: &[LaneGroup::Base, LaneGroup::Extra, LaneGroup::Macro],
                osc_filter_defaults: true,
            },
            4 => Self {
                global_count: GlobalParam::ALL.len(),
                lane_count: V4_LANE_COUNT,
                groups: &ALL_GROUPS,
                osc_filter_defaults: false,
            },
            _ => return None,
        };
        Some(layout)
    }

    /// Stored IDs in file order: globals, then each group lane by lane.
    fn ids(&self) -> Vec<ParamId> {
        let mut ids: Vec<ParamId> = GlobalParam::ALL[..self.global_count]
            .iter()
            .map(|p| p.id())
            .collect();
        for &group in self.groups {
            for lane in 0..self.lane_count {
                ids.extend(group.ids(lane));
            }
        }
        ids
    }

    fn fill_missing(&self, store: &mut ParameterStore) {
        for group in ALL_GROUPS {
            let stored = self.groups.contains(&group);
            let first_missing_lane = if stored { self.lane_count } else { 0 };
            for lane in first_missing_lane..LANE_COUNT {
                group.apply_defaults(store, lane);
            }
        }
        if self.osc_filter_defaults {
            store.apply_osc_filter_defaults();
        }
    }
}

fn read_values(
    store: &mut ParameterStore,
    version: u32,
    ids: &[ParamId],
    values: &[f32],
) -> StateResult<()> {
    if values.len() < ids.len() {
        return Err(StateError::Truncated {
            version,
            expected: ids.len(),
            found: values.len(),
        });
    }
    for (&id, &value) in ids.iter().zip(values) {
        store.set(id, value);
    }
    Ok(())
}

fn split_fourth_lane(store: &mut ParameterStore) {
    for param in LaneParam::ALL {
        let mut value = store.lane(3, param);
        if param == LaneParam::Pan {
            value = (value + V1_SPLIT_PAN_OFFSET).clamp(0.0, 1.0);
        }
        store.set(lane_param_id(4, param), value);
    }
}

impl EngineState {
    pub fn capture(params: &ParameterStore, preset: usize, pattern: &PatternGrid) -> Self {
        Self {
            version: STATE_VERSION,
            preset,
            values: params.ordered_values(),
            pattern: Some(*pattern),
        }
    }

    pub fn to_json(&self) -> StateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> StateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply this state on top of `current`. Nothing is returned unless the whole state is
    /// valid, so a failed load leaves the engine as it was.
    pub fn restore(&self, current: &ParameterStore) -> StateResult<RestoredState> {
        let mut params = current.clone();
        let preset = self.preset.min(presets::preset_count() - 1);

        if self.version == STATE_VERSION {
            read_values(&mut params, self.version, &ALL_PARAMETER_IDS, &self.values)?;
        } else {
            let layout = LegacyLayout::for_version(self.version)
                .ok_or(StateError::UnsupportedVersion(self.version))?;
            read_values(&mut params, self.version, &layout.ids(), &self.values)?;
            layout.fill_missing(&mut params);
            if self.version == 1 {
                split_fourth_lane(&mut params);
            }
        }

        let pattern = self
            .pattern
            .unwrap_or_else(|| presets::factory_preset(preset).pattern);

        Ok(RestoredState {
            version: self.version,
            params,
            preset,
            pattern,
        })
    }
}
