mod character;
mod drum_voice;
mod lane_frame;

pub use character::{CharacterTuning, LaneCharacter};
pub use drum_voice::DrumVoice;
pub use lane_frame::{LaneFrame, NoiseFrame, OscFrame, TransientFrame};
