use crate::audio::instruments::{DrumVoice, LaneFrame};
use crate::audio::mixer::VoiceBus;
use crate::audio::StereoAudioGenerator;
use crate::commands::{AudioCommand, AudioCommandReceiver, TriggerEvent};
use crate::config::EngineConfig;
use crate::error::StateResult;
use crate::params::{
    derive_lane_frames, frame_for_note, lane_extra_param_id, lane_filter_param_id,
    lane_macro_param_id, lane_param_id, GlobalParam, LaneExtraParam, LaneFilterParam,
    LaneMacroParam, LaneParam, ParamId, ParameterStore,
};
use crate::presets;
use crate::sequencing::{PatternGrid, StepSequencer, TransportInfo};
use crate::state::{EngineState, STATE_VERSION};
use crate::LANE_COUNT;

/// What the engine reports back after each block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockStatus {
    /// Step the sequencer fires next.
    pub current_step: usize,
    /// Lanes hit within the last LED flash period.
    pub lane_leds: [bool; LANE_COUNT],
}

// Decays are nudged around their current value instead of re-rolled
const DECAY_JITTER: f32 = 0.10;

/// The whole instrument: parameters, sequencer, one voice per lane and the bus.
///
/// Control changes (parameters, presets, patterns, explicit hits) are applied only between
/// blocks; every sample of a block renders against the same lane frames.
pub struct DrumMachine {
    config: EngineConfig,
    params: ParameterStore,
    lane_frames: [LaneFrame; LANE_COUNT],
    lane_pans: [f32; LANE_COUNT],
    frames_dirty: bool,

    voices: Vec<DrumVoice>,
    bus: VoiceBus,
    sequencer: StepSequencer,
    triggers: [bool; LANE_COUNT],

    loaded_preset: usize,
    preset_pending: bool,

    led_flash_samples: u32,
    led_countdown: [u32; LANE_COUNT],

    command_receiver: Option<AudioCommandReceiver>,
    rng: fastrand::Rng,
}

impl DrumMachine {
    pub fn new(sample_rate: f32) -> Self {
        Self::from_config(EngineConfig::with_sample_rate(sample_rate))
    }

    pub fn from_config(config: EngineConfig) -> Self {
        let sample_rate = config.sample_rate.max(1000.0);
        let voices = (0..LANE_COUNT)
            .map(|lane| {
                let seed = 0x9E37_79B9 ^ (lane as u32 + 1).wrapping_mul(0x85EB_CA6B);
                DrumVoice::with_seed(sample_rate, seed)
            })
            .collect();

        let mut machine = Self {
            params: ParameterStore::new(),
            lane_frames: [LaneFrame::default(); LANE_COUNT],
            lane_pans: [0.0; LANE_COUNT],
            frames_dirty: true,
            voices,
            bus: VoiceBus::new(config.master_headroom),
            sequencer: StepSequencer::new(sample_rate as f64),
            triggers: [false; LANE_COUNT],
            loaded_preset: 0,
            preset_pending: false,
            led_flash_samples: config.led_flash_samples(),
            led_countdown: [0; LANE_COUNT],
            command_receiver: None,
            rng: fastrand::Rng::new(),
            config,
        };
        machine.load_preset(machine.config.initial_preset);
        machine
    }

    /// Commands from this receiver are drained at the start of every block.
    pub fn with_command_receiver(mut self, receiver: AudioCommandReceiver) -> Self {
        self.command_receiver = Some(receiver);
        self
    }

    pub fn set_command_receiver(&mut self, receiver: AudioCommandReceiver) {
        self.command_receiver = Some(receiver);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = sample_rate.max(1000.0);
        self.config.sample_rate = sample_rate;
        self.sequencer.set_sample_rate(sample_rate as f64);
        for voice in self.voices.iter_mut() {
            voice.set_sample_rate(sample_rate);
        }
        self.led_flash_samples = self.config.led_flash_samples();
    }

    /// Activation resets voices, sequencer and LEDs; deactivation leaves everything as is.
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.reset();
        }
    }

    pub fn reset(&mut self) {
        self.sequencer.reset();
        for voice in self.voices.iter_mut() {
            voice.reset();
        }
        self.led_countdown = [0; LANE_COUNT];
    }

    pub fn parameters(&self) -> &ParameterStore {
        &self.params
    }

    pub fn parameter(&self, id: ParamId) -> f32 {
        self.params.get(id)
    }

    /// Set one normalized parameter. Safe to call from the audio thread; never logs.
    ///
    /// PresetSelect schedules a preset load for the next block boundary. Randomize above 0.5
    /// re-rolls every lane and snaps back to 0.
    pub fn set_parameter(&mut self, id: ParamId, value: f32) {
        self.params.set(id, value);
        self.frames_dirty = true;

        if id == GlobalParam::PresetSelect.id() {
            self.loaded_preset = presets::preset_index_from_normalized(self.params.get(id));
            self.preset_pending = true;
        } else if id == GlobalParam::Randomize.id() && self.params.switch(GlobalParam::Randomize) {
            self.randomize_lanes();
            self.params.set_global(GlobalParam::Randomize, 0.0);
        }
    }

    pub fn loaded_preset(&self) -> usize {
        self.loaded_preset
    }

    /// Replace every lane value, the globals the preset carries and the pattern.
    pub fn load_preset(&mut self, index: usize) {
        self.apply_preset(index);
        log::info!(
            "Loaded preset {} \"{}\"",
            self.loaded_preset,
            presets::factory_preset(self.loaded_preset).name
        );
    }

    fn apply_preset(&mut self, index: usize) {
        let preset = presets::factory_preset(index);
        self.loaded_preset = index.min(presets::preset_count() - 1);
        preset.apply(&mut self.params);
        self.params.set_global(
            GlobalParam::PresetSelect,
            presets::normalized_from_preset_index(self.loaded_preset),
        );
        self.sequencer.set_pattern(preset.pattern);
        self.preset_pending = false;
        self.update_lane_frames();
    }

    pub fn pattern(&self) -> &PatternGrid {
        self.sequencer.pattern()
    }

    pub fn set_pattern(&mut self, pattern: PatternGrid) {
        self.sequencer.set_pattern(pattern);
    }

    /// Reseed the generator behind the Randomize control.
    pub fn seed_randomizer(&mut self, seed: u64) {
        self.rng = fastrand::Rng::with_seed(seed);
    }

    /// Re-roll every lane's timbre within ranges that stay musical.
    pub fn randomize(&mut self) {
        self.randomize_lanes();
        log::debug!("Randomized all lanes");
    }

    fn randomize_lanes(&mut self) {
        let rng = &mut self.rng;
        let params = &mut self.params;

        let mut range = |lo: f32, hi: f32| lo + rng.f32() * (hi - lo);

        for lane in 0..LANE_COUNT {
            let decay = params.lane(lane, LaneParam::Decay);
            let pitch_decay = params.extra(lane, LaneExtraParam::PitchEnvDecay);
            let noise_decay = params.extra(lane, LaneExtraParam::NoiseDecay);
            let transient_decay = params.macro_value(lane, LaneMacroParam::TransientDecay);

            let base = [
                (LaneParam::Tune, range(0.32, 0.58)),
                (LaneParam::Decay, decay + range(-DECAY_JITTER, DECAY_JITTER)),
                (LaneParam::Fold, range(0.25, 0.75)),
                (LaneParam::Fm, range(0.20, 0.65)),
                (LaneParam::Noise, range(0.15, 0.55)),
                (LaneParam::Drive, range(0.10, 0.45)),
                (LaneParam::Level, range(0.55, 0.92)),
                (LaneParam::Pan, range(0.25, 0.75)),
            ];
            for (param, value) in base {
                params.set(lane_param_id(lane, param), value);
            }

            let extra = [
                (LaneExtraParam::PitchEnvAmount, range(0.25, 0.75)),
                (LaneExtraParam::PitchEnvDecay, pitch_decay + range(-DECAY_JITTER, DECAY_JITTER)),
                (LaneExtraParam::TransientAttack, range(0.18, 0.55)),
                (LaneExtraParam::NoiseTone, range(0.35, 0.75)),
                (LaneExtraParam::NoiseDecay, noise_decay + range(-DECAY_JITTER, DECAY_JITTER)),
                (LaneExtraParam::Snap, range(0.20, 0.65)),
            ];
            for (param, value) in extra {
                params.set(lane_extra_param_id(lane, param), value);
            }

            let transient_decay = transient_decay + range(-DECAY_JITTER, DECAY_JITTER);
            let macros = [
                (LaneMacroParam::TransientDecay, transient_decay),
                (LaneMacroParam::TransientMix, range(0.30, 0.70)),
                (LaneMacroParam::NoiseResonance, range(0.25, 0.65)),
                (LaneMacroParam::NoiseEnvAmount, range(0.35, 0.75)),
            ];
            for (param, value) in macros {
                params.set(lane_macro_param_id(lane, param), value);
            }

            let filters = [
                (LaneFilterParam::OscCutoff, range(0.50, 0.85)),
                (LaneFilterParam::OscResonance, range(0.02, 0.18)),
                (LaneFilterParam::OscEnv, range(0.20, 0.55)),
                (LaneFilterParam::TransientCutoff, range(0.55, 0.88)),
                (LaneFilterParam::TransientResonance, range(0.02, 0.12)),
                (LaneFilterParam::TransientEnv, range(0.22, 0.55)),
            ];
            for (param, value) in filters {
                params.set(lane_filter_param_id(lane, param), value);
            }
        }

        self.frames_dirty = true;
    }

    pub fn lane_frame(&self, lane: usize) -> Option<&LaneFrame> {
        self.lane_frames.get(lane)
    }

    fn update_lane_frames(&mut self) {
        self.lane_frames = derive_lane_frames(&self.params);
        for (pan, frame) in self.lane_pans.iter_mut().zip(self.lane_frames.iter()) {
            *pan = frame.pan;
        }
        self.bus.set_master(self.params.global(GlobalParam::Master));
        self.frames_dirty = false;
    }

    /// Fire a lane now. Lanes out of range are ignored.
    pub fn trigger(&mut self, event: TriggerEvent) {
        let Some(frame) = self.lane_frames.get(event.lane) else {
            return;
        };
        let frame = match event.note {
            Some(note) => frame_for_note(frame, note),
            None => *frame,
        };
        self.voices[event.lane].trigger(&frame);
        self.led_countdown[event.lane] = self.led_flash_samples;
    }

    fn apply_command(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::SetParameter { id, value } => self.set_parameter(id, value),
            AudioCommand::Trigger(event) => {
                // Hits see every parameter change queued ahead of them
                if self.frames_dirty {
                    self.update_lane_frames();
                }
                self.trigger(event);
            }
            AudioCommand::SetPattern(pattern) => self.set_pattern(pattern),
            AudioCommand::LoadPreset(index) => self.apply_preset(index),
            AudioCommand::Reset => self.reset(),
        }
    }

    fn process_commands(&mut self) {
        if let Some(receiver) = self.command_receiver.take() {
            receiver.process_commands(|command| self.apply_command(command));
            self.command_receiver = Some(receiver);
        }
    }

    /// Apply everything queued for this block: commands, pending preset, transport and the
    /// block's explicit hits.
    pub fn begin_block(&mut self, transport: &TransportInfo, events: &[TriggerEvent]) {
        self.process_commands();

        if self.preset_pending {
            self.apply_preset(self.loaded_preset);
        }
        if self.frames_dirty {
            self.update_lane_frames();
        }

        let follow = self.params.switch(GlobalParam::FollowTransport);
        let run = self.params.switch(GlobalParam::Run);
        let tempo = match transport.bpm {
            Some(bpm) if follow => bpm,
            _ => self.params.internal_tempo_bpm(),
        };

        self.sequencer.set_tempo(tempo);
        self.sequencer.set_swing(self.params.global(GlobalParam::Swing) as f64);
        self.sequencer.set_running(run && (!follow || transport.playing));

        if follow && transport.playing {
            if let Some(ppq) = transport.ppq {
                self.sequencer.sync_to_host(ppq, transport.playing);
            }
        }

        for &event in events {
            self.trigger(event);
        }
    }

    /// Render one stereo sample against the current block's frames.
    pub fn render_sample(&mut self) -> (f32, f32) {
        self.sequencer.process_sample(&mut self.triggers);
        for (lane, &fire) in self.triggers.iter().enumerate() {
            if fire {
                self.voices[lane].trigger(&self.lane_frames[lane]);
                self.led_countdown[lane] = self.led_flash_samples;
            }
        }

        let output = self.bus.mix(&mut self.voices, &self.lane_pans);

        for countdown in self.led_countdown.iter_mut() {
            *countdown = countdown.saturating_sub(1);
        }
        output
    }

    pub fn status(&self) -> BlockStatus {
        let mut lane_leds = [false; LANE_COUNT];
        for (led, &countdown) in lane_leds.iter_mut().zip(self.led_countdown.iter()) {
            *led = countdown > 0;
        }
        BlockStatus {
            current_step: self.sequencer.current_step(),
            lane_leds,
        }
    }

    /// Render one block into planar buffers. Only the common length of the two is written.
    pub fn process_block(
        &mut self,
        transport: &TransportInfo,
        events: &[TriggerEvent],
        left: &mut [f32],
        right: &mut [f32],
    ) -> BlockStatus {
        self.begin_block(transport, events);
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (sample_l, sample_r) = self.render_sample();
            *l = sample_l;
            *r = sample_r;
        }
        self.status()
    }

    /// Render one free-running block into an interleaved buffer with `channels` channels.
    /// Mono gets the average of both sides; channels past the second are silent.
    pub fn generate(&mut self, data: &mut [f32], channels: usize) -> BlockStatus {
        let channels = channels.max(1);
        self.begin_block(&TransportInfo::default(), &[]);
        for frame in data.chunks_mut(channels) {
            let (left, right) = self.render_sample();
            if channels >= 2 && frame.len() >= 2 {
                frame[0] = left;
                frame[1] = right;
                for sample in frame.iter_mut().skip(2) {
                    *sample = 0.0;
                }
            } else {
                frame[0] = (left + right) * 0.5;
            }
        }
        self.status()
    }

    pub fn current_step(&self) -> usize {
        self.sequencer.current_step()
    }

    pub fn is_lane_active(&self, lane: usize) -> bool {
        self.voices.get(lane).is_some_and(|voice| voice.is_active())
    }

    pub fn save_state(&self) -> StateResult<String> {
        EngineState::capture(&self.params, self.loaded_preset, self.sequencer.pattern()).to_json()
    }

    /// Load a saved state. On error nothing changes.
    pub fn load_state(&mut self, json: &str) -> StateResult<()> {
        let restored = EngineState::from_json(json)?.restore(&self.params)?;
        if restored.version != STATE_VERSION {
            log::info!(
                "Upgrading version {} state to version {}",
                restored.version,
                STATE_VERSION
            );
        }

        self.params = restored.params;
        self.params.set_global(GlobalParam::Randomize, 0.0);
        self.loaded_preset = restored.preset;
        self.preset_pending = false;
        self.sequencer.set_pattern(restored.pattern);
        self.update_lane_frames();
        Ok(())
    }
}

impl StereoAudioGenerator for DrumMachine {
    fn next_sample(&mut self) -> (f32, f32) {
        self.render_sample()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        DrumMachine::set_sample_rate(self, sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::AudioCommandQueue;
    use std::cell::Cell;
    use std::sync::Once;

    const SR: f32 = 48000.0;
    const BLOCK: usize = 512;

    fn render_blocks(
        machine: &mut DrumMachine,
        transport: &TransportInfo,
        blocks: usize,
    ) -> (Vec<f32>, Vec<f32>) {
        let mut all_left = Vec::new();
        let mut all_right = Vec::new();
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        for _ in 0..blocks {
            machine.process_block(transport, &[], &mut left, &mut right);
            all_left.extend_from_slice(&left);
            all_right.extend_from_slice(&right);
        }
        (all_left, all_right)
    }

    thread_local! {
        static LOG_CALLS: Cell<usize> = const { Cell::new(0) };
    }

    // Counts records per thread so parallel tests don't see each other's logging
    struct CountingLogger;

    impl log::Log for CountingLogger {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }

        fn log(&self, _: &log::Record) {
            LOG_CALLS.with(|calls| calls.set(calls.get() + 1));
        }

        fn flush(&self) {}
    }

    static LOGGER: CountingLogger = CountingLogger;

    fn install_counting_logger() {
        static INSTALL: Once = Once::new();
        INSTALL.call_once(|| {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(log::LevelFilter::Trace);
        });
    }

    fn log_calls() -> usize {
        LOG_CALLS.with(|calls| calls.get())
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_idle_machine_is_silent() {
        let mut machine = DrumMachine::new(SR);
        let (left, right) = render_blocks(&mut machine, &TransportInfo::default(), 20);
        assert_eq!(peak(&left), 0.0);
        assert_eq!(peak(&right), 0.0);
        assert_eq!(machine.current_step(), 0);
    }

    #[test]
    fn test_explicit_trigger_sounds_and_lights_led() {
        let mut machine = DrumMachine::new(SR);
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];

        let status = machine.process_block(
            &TransportInfo::default(),
            &[TriggerEvent::lane(0)],
            &mut left,
            &mut right,
        );
        println!("Kick block peak: {}", peak(&left));
        assert!(peak(&left) > 0.01);
        assert!(status.lane_leds[0]);
        assert!(!status.lane_leds[1]);
        assert!(machine.is_lane_active(0));

        // LED goes dark after 45 ms (2160 samples at 48k)
        let (_, _) = render_blocks(&mut machine, &TransportInfo::default(), 4);
        assert!(!machine.status().lane_leds[0]);
    }

    #[test]
    fn test_out_of_range_trigger_is_ignored() {
        let mut machine = DrumMachine::new(SR);
        machine.trigger(TriggerEvent::lane(LANE_COUNT));
        machine.trigger(TriggerEvent::lane(usize::MAX));
        assert!((0..LANE_COUNT).all(|lane| !machine.is_lane_active(lane)));
    }

    #[test]
    fn test_running_sequencer_plays_preset_pattern() {
        let mut machine = DrumMachine::new(SR);
        machine.set_parameter(GlobalParam::Run.id(), 1.0);

        let (left, right) = render_blocks(&mut machine, &TransportInfo::default(), 200);
        assert!(peak(&left) > 0.01 && peak(&right) > 0.01);
        assert!(left.iter().chain(right.iter()).all(|s| s.is_finite() && s.abs() <= 1.0));
    }

    #[test]
    fn test_stopping_freezes_step() {
        let mut machine = DrumMachine::new(SR);
        machine.set_parameter(GlobalParam::Run.id(), 1.0);
        render_blocks(&mut machine, &TransportInfo::default(), 30);
        machine.set_parameter(GlobalParam::Run.id(), 0.0);
        render_blocks(&mut machine, &TransportInfo::default(), 1);
        let step = machine.current_step();
        render_blocks(&mut machine, &TransportInfo::default(), 50);
        assert_eq!(machine.current_step(), step);
    }

    #[test]
    fn test_follow_transport_locks_to_host() {
        let mut machine = DrumMachine::new(SR);
        machine.set_parameter(GlobalParam::Run.id(), 1.0);
        machine.set_parameter(GlobalParam::FollowTransport.id(), 1.0);

        // Host stopped: sequencer holds
        let stopped = TransportInfo {
            bpm: Some(120.0),
            playing: false,
            ppq: Some(0.0),
        };
        render_blocks(&mut machine, &stopped, 10);
        assert_eq!(machine.current_step(), 0);

        // Host playing halfway into step 6; after the block the next step is 7
        let mut left = vec![0.0; 16];
        let mut right = vec![0.0; 16];
        let status = machine.process_block(
            &TransportInfo::playing_at(120.0, 1.625),
            &[],
            &mut left,
            &mut right,
        );
        assert_eq!(status.current_step, 7);
    }

    #[test]
    fn test_follow_transport_with_swing_hits_every_step_once() {
        for &swing in &[0.5f32, 1.0] {
            let mut machine = DrumMachine::new(SR);
            machine.set_parameter(GlobalParam::Run.id(), 1.0);
            machine.set_parameter(GlobalParam::FollowTransport.id(), 1.0);
            machine.set_parameter(GlobalParam::Swing.id(), swing);
            let mut pattern = PatternGrid::empty();
            pattern.set_row(0, [true; crate::PATTERN_STEPS]);
            machine.set_pattern(pattern);

            // 120 BPM at 48k: 6000 samples per straight step, one bar is 96000
            let mut hits = Vec::new();
            let mut position = 0usize;
            while position < 96_000 {
                let ppq = position as f64 / SR as f64 * 2.0;
                machine.begin_block(&TransportInfo::playing_at(120.0, ppq), &[]);
                for i in 0..BLOCK {
                    machine.render_sample();
                    if machine.triggers[0] && position + i < 96_000 {
                        hits.push(position + i);
                    }
                }
                position += BLOCK;
            }

            println!("Swing {} hits: {:?}", swing, hits);
            assert_eq!(hits.len(), 16, "swing {} should give one hit per step", swing);

            let short = 6000.0 * (1.0 - swing as f64 * 0.45);
            for (step, &hit) in hits.iter().enumerate() {
                let swung = if step % 2 == 1 { short } else { 0.0 };
                let expected = (step / 2) as f64 * 12_000.0 + swung;
                assert!(
                    (hit as f64 - expected).abs() <= 1.0,
                    "swing {} step {} hit at {}, expected {}",
                    swing,
                    step,
                    hit,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_block_processing_never_logs() {
        install_counting_logger();
        let queue = AudioCommandQueue::new();
        let sender = queue.sender();
        let mut machine = DrumMachine::new(SR).with_command_receiver(queue.receiver());

        machine.set_parameter(GlobalParam::PresetSelect.id(), 1.0);
        sender.set_parameter(GlobalParam::Randomize.id(), 1.0);
        sender.send(AudioCommand::LoadPreset(2));
        sender.set_parameter(GlobalParam::PresetSelect.id(), 0.25);

        let before = log_calls();
        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        machine.process_block(&TransportInfo::default(), &[], &mut left, &mut right);
        assert_eq!(log_calls(), before, "process_block must not log");
        assert_eq!(machine.loaded_preset(), 1);

        // Host-side calls still report
        machine.load_preset(3);
        machine.randomize();
        assert_eq!(log_calls(), before + 2);
    }

    #[test]
    fn test_commands_apply_before_first_sample() {
        let queue = AudioCommandQueue::new();
        let sender = queue.sender();
        let mut machine = DrumMachine::new(SR).with_command_receiver(queue.receiver());

        sender.set_parameter(GlobalParam::Master.id(), 0.0);
        sender.trigger(TriggerEvent::lane(1));

        let mut left = vec![0.0; BLOCK];
        let mut right = vec![0.0; BLOCK];
        machine.process_block(&TransportInfo::default(), &[], &mut left, &mut right);
        assert!(machine.is_lane_active(1), "queued trigger fired");
        assert_eq!(peak(&left), 0.0, "master at 0 applied before the first sample");
        assert_eq!(machine.parameter(GlobalParam::Master.id()), 0.0);
    }

    #[test]
    fn test_preset_select_loads_at_block_boundary() {
        let mut machine = DrumMachine::new(SR);
        machine.set_parameter(GlobalParam::PresetSelect.id(), 1.0);
        assert_eq!(machine.loaded_preset(), 4);
        assert_eq!(machine.parameter(GlobalParam::Master.id()), 0.82, "not loaded yet");

        render_blocks(&mut machine, &TransportInfo::default(), 1);
        assert_eq!(machine.parameter(GlobalParam::Master.id()), 0.77);
        assert_eq!(machine.pattern(), &presets::factory_preset(4).pattern);
    }

    #[test]
    fn test_randomize_stays_in_range_and_resets() {
        let mut machine = DrumMachine::new(SR);
        machine.seed_randomizer(7);
        let before = machine.parameters().clone();
        machine.set_parameter(GlobalParam::Randomize.id(), 1.0);

        let params = machine.parameters();
        assert_eq!(params.global(GlobalParam::Randomize), 0.0);
        assert_ne!(params, &before);
        for lane in 0..LANE_COUNT {
            let tune = params.lane(lane, LaneParam::Tune);
            assert!((0.32..=0.58).contains(&tune), "lane {} tune {}", lane, tune);
            let level = params.lane(lane, LaneParam::Level);
            assert!((0.55..=0.92).contains(&level));
            let decay_shift =
                (params.lane(lane, LaneParam::Decay) - before.lane(lane, LaneParam::Decay)).abs();
            assert!(decay_shift <= DECAY_JITTER + 1e-6, "decay jumped by {}", decay_shift);
            let res = params.filter(lane, LaneFilterParam::TransientResonance);
            assert!((0.02..=0.12).contains(&res));
        }
    }

    #[test]
    fn test_state_round_trip() {
        let mut machine = DrumMachine::new(SR);
        machine.load_preset(3);
        machine.set_parameter(lane_param_id(2, LaneParam::Fold), 0.11);
        let mut pattern = PatternGrid::empty();
        pattern.set(8, 3, true);
        machine.set_pattern(pattern);
        let json = machine.save_state().unwrap();

        let mut other = DrumMachine::new(SR);
        other.load_state(&json).unwrap();
        assert_eq!(other.parameters(), machine.parameters());
        assert_eq!(other.loaded_preset(), 3);
        assert_eq!(other.pattern(), &pattern);
        assert_eq!(
            other.lane_frame(2),
            Some(&crate::params::derive_lane_frame(machine.parameters(), 2))
        );
    }

    #[test]
    fn test_failed_state_load_changes_nothing() {
        let mut machine = DrumMachine::new(SR);
        let before = machine.parameters().clone();
        assert!(machine.load_state(r#"{"version":2,"preset":0,"values":[0.1]}"#).is_err());
        assert!(machine.load_state("garbage").is_err());
        assert_eq!(machine.parameters(), &before);
    }

    #[test]
    fn test_generate_interleaved() {
        let mut machine = DrumMachine::new(44100.0);
        machine.trigger(TriggerEvent::lane(2));
        let mut data = vec![1.0f32; 4 * 256];
        machine.generate(&mut data, 4);
        assert!(data.chunks(4).all(|f| f[2] == 0.0 && f[3] == 0.0));
        assert!(data.chunks(4).any(|f| f[0] != 0.0));

        let mut mono = vec![0.0f32; 256];
        machine.trigger(TriggerEvent::lane(2));
        machine.generate(&mut mono, 1);
        assert!(mono.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_note_trigger_shapes_frame() {
        let mut machine = DrumMachine::new(SR);
        let low = TriggerEvent::from_midi_note(36).unwrap();
        assert_eq!(low.lane, 0);
        machine.trigger(low);
        assert!(machine.is_lane_active(0));
        let played = machine.voices[0].frame().osc.frequency_hz;
        assert!(played < machine.lane_frames[0].osc.frequency_hz);
    }

    #[test]
    fn test_set_active_resets() {
        let mut machine = DrumMachine::new(SR);
        machine.set_parameter(GlobalParam::Run.id(), 1.0);
        render_blocks(&mut machine, &TransportInfo::default(), 20);
        machine.set_active(true);
        assert_eq!(machine.current_step(), 0);
        assert!((0..LANE_COUNT).all(|lane| !machine.is_lane_active(lane)));
        assert!(machine.status().lane_leds.iter().all(|&led| !led));
    }
}
