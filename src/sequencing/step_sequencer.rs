use super::PatternGrid;
use crate::{LANE_COUNT, PATTERN_STEPS};

pub const MIN_TEMPO_BPM: f64 = 20.0;
pub const MAX_TEMPO_BPM: f64 = 300.0;
pub const MIN_SAMPLE_RATE: f64 = 1000.0;

// Odd steps stretch and even steps shrink by this fraction at full swing
const MAX_SWING_SKEW: f64 = 0.45;

/// Host transport snapshot for one block. `None` fields were not reported as valid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportInfo {
    pub bpm: Option<f64>,
    pub playing: bool,
    /// Musical position in quarter notes.
    pub ppq: Option<f64>,
}

impl TransportInfo {
    pub fn playing_at(bpm: f64, ppq: f64) -> Self {
        Self {
            bpm: Some(bpm),
            playing: true,
            ppq: Some(ppq),
        }
    }
}

/// Sample-accurate sixteen-step clock.
///
/// `current_step` is the step that fires next. The countdown is kept in fractional samples
/// and step lengths are added to it, so non-integer step lengths never drift.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    sample_rate: f64,
    tempo_bpm: f64,
    swing: f64,
    running: bool,
    current_step: usize,
    samples_to_next_step: f64,
    last_fired_step: Option<usize>,
    samples_since_fire: f64,
    pattern: PatternGrid,
}

impl StepSequencer {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate: sample_rate.max(MIN_SAMPLE_RATE),
            tempo_bpm: 120.0,
            swing: 0.0,
            running: false,
            current_step: 0,
            samples_to_next_step: 0.0,
            last_fired_step: None,
            samples_since_fire: f64::INFINITY,
            pattern: PatternGrid::empty(),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = if sample_rate.is_finite() {
            sample_rate.max(MIN_SAMPLE_RATE)
        } else {
            MIN_SAMPLE_RATE
        };
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo_bpm = if bpm.is_finite() {
            bpm.clamp(MIN_TEMPO_BPM, MAX_TEMPO_BPM)
        } else {
            MIN_TEMPO_BPM
        };
    }

    pub fn tempo(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn set_swing(&mut self, swing: f64) {
        self.swing = if swing.is_finite() {
            swing.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn swing(&self) -> f64 {
        self.swing
    }

    /// Stopping freezes the position; starting again resumes from it.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn set_pattern(&mut self, pattern: PatternGrid) {
        self.pattern = pattern;
    }

    pub fn pattern(&self) -> &PatternGrid {
        &self.pattern
    }

    /// Back to step 0, which fires on the next running sample.
    pub fn reset(&mut self) {
        self.current_step = 0;
        self.samples_to_next_step = 0.0;
        self.last_fired_step = None;
        self.samples_since_fire = f64::INFINITY;
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    fn straight_step_samples(&self) -> f64 {
        60.0 / self.tempo_bpm / 4.0 * self.sample_rate
    }

    /// Length of `step` in samples at the current tempo, swing and rate.
    pub fn step_duration_samples(&self, step: usize) -> f64 {
        let base = self.straight_step_samples();
        let skew = self.swing * MAX_SWING_SKEW;
        if step % 2 == 1 {
            base * (1.0 + skew)
        } else {
            base * (1.0 - skew)
        }
    }

    /// Phase-lock to a host position given in quarter notes.
    ///
    /// Ignored unless the host is playing and the position is finite. The position is placed
    /// on the swung grid, so a host running in step with the clock never moves it. A position
    /// within one sample of a step boundary makes that step fire on the next sample; otherwise
    /// the following step is scheduled for the remainder of the current one. A step that fired
    /// less than half a step ago is not fired again.
    pub fn sync_to_host(&mut self, ppq: f64, playing: bool) {
        if !playing || !ppq.is_finite() {
            return;
        }

        let (step, offset) = self.swung_position(ppq * 4.0);
        let duration = self.step_duration_samples(step);

        if offset < 1.0 && !self.fired_recently(step, duration) {
            self.current_step = step;
            self.samples_to_next_step = 0.0;
            return;
        }

        let next = (step + 1) % PATTERN_STEPS;
        let remaining = (duration - offset).max(0.0);
        let next_duration = self.step_duration_samples(next);
        if remaining < 1.0 && self.fired_recently(next, next_duration) {
            // The clock already fired the upcoming boundary a hair early
            self.current_step = (next + 1) % PATTERN_STEPS;
            self.samples_to_next_step = remaining + next_duration;
        } else {
            self.current_step = next;
            self.samples_to_next_step = remaining;
        }
    }

    /// Step index and samples elapsed within it for a position in straight sixteenths.
    fn swung_position(&self, absolute_steps: f64) -> (usize, f64) {
        let base = self.straight_step_samples();
        let skew = self.swing * MAX_SWING_SKEW;

        let pair = (absolute_steps * 0.5).floor();
        let within_pair = absolute_steps - pair * 2.0;
        let first = pair as i64 * 2;

        let (step, offset) = if within_pair < 1.0 - skew {
            (first, within_pair * base)
        } else {
            (first + 1, (within_pair - (1.0 - skew)) * base)
        };
        (step.rem_euclid(PATTERN_STEPS as i64) as usize, offset)
    }

    fn fired_recently(&self, step: usize, duration: f64) -> bool {
        self.last_fired_step == Some(step) && self.samples_since_fire < duration * 0.5
    }

    /// Advance one sample. `triggers` is cleared, then set for every lane whose cell at the
    /// firing step is on.
    pub fn process_sample(&mut self, triggers: &mut [bool; LANE_COUNT]) {
        triggers.fill(false);
        if !self.running {
            return;
        }

        if self.samples_to_next_step <= 0.0 {
            let step = self.current_step;
            self.pattern.column(step, triggers);
            self.samples_to_next_step += self.step_duration_samples(step);
            self.current_step = (step + 1) % PATTERN_STEPS;
            self.last_fired_step = Some(step);
            self.samples_since_fire = 0.0;
        }

        self.samples_to_next_step -= 1.0;
        self.samples_since_fire += 1.0;
    }
}
