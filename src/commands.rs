use crate::params::ParamId;
use crate::sequencing::PatternGrid;
use crossbeam::queue::SegQueue;
use std::sync::Arc;

/// A hit on one lane. With a note, the lane's frame is reshaped for the note's octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    pub lane: usize,
    pub note: Option<u8>,
}

impl TriggerEvent {
    pub fn lane(lane: usize) -> Self {
        Self { lane, note: None }
    }

    /// `None` if the note doesn't map to any lane.
    pub fn from_midi_note(note: u8) -> Option<Self> {
        crate::params::lane_for_midi_note(note).map(|lane| Self {
            lane,
            note: Some(note),
        })
    }
}

#[derive(Debug, Clone)]
pub enum AudioCommand {
    SetParameter { id: ParamId, value: f32 },
    Trigger(TriggerEvent),
    SetPattern(PatternGrid),
    LoadPreset(usize),
    /// Silence every voice and rewind the sequencer.
    Reset,
}

/// Lock-free command queue for control changes
/// Uses a multiple-producer, single-consumer queue from crossbeam
pub struct AudioCommandQueue {
    queue: Arc<SegQueue<AudioCommand>>,
}

impl AudioCommandQueue {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(SegQueue::new()),
        }
    }

    /// Get a handle for sending commands (for control threads)
    pub fn sender(&self) -> AudioCommandSender {
        AudioCommandSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Get a handle for receiving commands (for the audio thread)
    pub fn receiver(&self) -> AudioCommandReceiver {
        AudioCommandReceiver {
            queue: Arc::clone(&self.queue),
        }
    }
}

impl Default for AudioCommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AudioCommandSender {
    queue: Arc<SegQueue<AudioCommand>>,
}

impl AudioCommandSender {
    /// Non-blocking
    pub fn send(&self, command: AudioCommand) {
        self.queue.push(command);
    }

    pub fn set_parameter(&self, id: ParamId, value: f32) {
        self.send(AudioCommand::SetParameter { id, value });
    }

    pub fn trigger(&self, event: TriggerEvent) {
        self.send(AudioCommand::Trigger(event));
    }
}

pub struct AudioCommandReceiver {
    queue: Arc<SegQueue<AudioCommand>>,
}

impl AudioCommandReceiver {
    /// Apply every pending command in arrival order.
    /// Called at the start of each audio block, before any sample is rendered.
    pub fn process_commands<F>(&self, mut apply_command: F) -> usize
    where
        F: FnMut(AudioCommand),
    {
        let mut applied = 0;
        while let Some(command) = self.queue.pop() {
            apply_command(command);
            applied += 1;
        }
        applied
    }

    pub fn has_commands(&self) -> bool {
        !self.queue.is_empty()
    }
}
