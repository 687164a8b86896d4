//! Sound-generation core of a west coast style percussion synthesizer.
//!
//! Nine lanes, each a single [`DrumVoice`] (folded two-operator body, resonant noise, click
//! transient) driven by a 16-step [`StepSequencer`] and mixed on a stereo voice bus. The
//! [`DrumMachine`] ties them to a normalized parameter surface, factory presets and a
//! versioned state format; host adapters feed it blocks of transport, triggers and buffers.

pub mod audio;
#[cfg(feature = "device-output")]
pub mod audio_output;
pub mod commands;
pub mod config;
pub mod error;
pub mod params;
pub mod presets;
pub mod sequencing;
pub mod state;

/// Number of drum lanes, one voice each.
pub const LANE_COUNT: usize = 9;
/// Steps in a pattern row.
pub const PATTERN_STEPS: usize = 16;

pub use audio::instruments::{DrumVoice, LaneCharacter, LaneFrame};
pub use audio::mixer::VoiceBus;
pub use audio::systems::{BlockStatus, DrumMachine};
pub use audio::StereoAudioGenerator;
#[cfg(feature = "device-output")]
pub use audio_output::AudioOutput;
pub use commands::{
    AudioCommand, AudioCommandQueue, AudioCommandReceiver, AudioCommandSender, TriggerEvent,
};
pub use config::EngineConfig;
#[cfg(feature = "device-output")]
pub use error::AudioOutputError;
pub use error::{ConfigError, StateError, StateResult};
pub use params::{GlobalParam, ParamId, ParameterStore};
pub use sequencing::{PatternGrid, StepSequencer, TransportInfo};
pub use state::{EngineState, STATE_VERSION};
