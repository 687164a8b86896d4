use crate::audio::systems::DrumMachine;
use crate::error::AudioOutputError;
use cpal::{traits::*, Sample};
use std::sync::{Arc, Mutex};

// Scratch size when the device doesn't fix its buffer length
const DEFAULT_SCRATCH_FRAMES: usize = 4096;

/// Plays a shared [`DrumMachine`] on the default output device until dropped.
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    pub fn new(drum_machine: Arc<Mutex<DrumMachine>>) -> Result<Self, AudioOutputError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioOutputError::NoDevice)?;

        let config = device.default_output_config()?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        if let Ok(mut machine) = drum_machine.lock() {
            machine.set_sample_rate(sample_rate as f32);
        }

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::run::<f32>(&device, &config.into(), drum_machine)?,
            cpal::SampleFormat::I16 => Self::run::<i16>(&device, &config.into(), drum_machine)?,
            cpal::SampleFormat::U16 => Self::run::<u16>(&device, &config.into(), drum_machine)?,
            other => return Err(AudioOutputError::UnsupportedFormat(other.to_string())),
        };

        stream.play()?;
        log::info!("Audio output started: {} Hz, {} channels", sample_rate, channels);

        Ok(AudioOutput {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    fn run<T>(
        device: &cpal::Device,
        config: &cpal::StreamConfig,
        drum_machine: Arc<Mutex<DrumMachine>>,
    ) -> Result<cpal::Stream, cpal::BuildStreamError>
    where
        T: Sample + cpal::SizedSample + cpal::FromSample<f32>,
    {
        let channels = (config.channels as usize).max(1);
        let frames = match config.buffer_size {
            cpal::BufferSize::Fixed(frames) => (frames as usize).max(1),
            cpal::BufferSize::Default => DEFAULT_SCRATCH_FRAMES,
        };
        let mut scratch = vec![0.0f32; frames * channels];

        let stream = device.build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // A control thread holding the lock costs one silent buffer
                let machine = drum_machine.try_lock().ok();
                fill_buffer(machine, data, &mut scratch, channels);
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;

        Ok(stream)
    }
}

/// Render `data` through `scratch`, a block of at most `scratch.len()` samples at a time.
/// Without a machine the buffer is silenced. Never allocates.
fn fill_buffer<M, T>(machine: Option<M>, data: &mut [T], scratch: &mut [f32], channels: usize)
where
    M: std::ops::DerefMut<Target = DrumMachine>,
    T: Sample + cpal::FromSample<f32>,
{
    if scratch.is_empty() {
        data.fill(T::from_sample(0.0f32));
        return;
    }

    let mut machine = machine;
    for chunk in data.chunks_mut(scratch.len()) {
        let rendered = &mut scratch[..chunk.len()];
        match machine.as_mut() {
            Some(machine) => {
                machine.generate(rendered, channels);
            }
            None => rendered.fill(0.0),
        }

        for (out, &sample) in chunk.iter_mut().zip(rendered.iter()) {
            // Limiting and NaN protection
            let sample = if sample.is_finite() {
                sample.clamp(-0.95, 0.95)
            } else {
                0.0
            };
            *out = T::from_sample(sample);
        }
    }
}
