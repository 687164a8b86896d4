pub mod pattern;
pub mod step_sequencer;

pub use pattern::*;
pub use step_sequencer::*;
