pub mod envelopes;
pub mod filters;
pub mod instruments;
pub mod mixer;
pub mod oscillators;
pub mod shapers;
pub mod systems;

pub const PI: f32 = std::f32::consts::PI;
pub const TWO_PI: f32 = 2.0 * PI;

// Basic trait for audio generators that produce a single sample output
pub trait AudioGenerator {
    fn next_sample(&mut self) -> f32;
    fn set_sample_rate(&mut self, sample_rate: f32);
}

pub trait StereoAudioGenerator {
    fn next_sample(&mut self) -> (f32, f32);
    fn set_sample_rate(&mut self, sample_rate: f32);
}
