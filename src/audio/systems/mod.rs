pub mod drum_machine;

pub use drum_machine::{BlockStatus, DrumMachine};
