use crate::audio::instruments::LaneFrame;
use crate::LANE_COUNT;

const KEYZONE_ROOT: u8 = 24; // C0
const TRACKING_CENTER: i32 = 60; // C3
const MIN_OCTAVE: i32 = -3;
const MAX_OCTAVE: i32 = 2;

fn lane_for_gm_note(note: u8) -> Option<usize> {
    match note {
        35 | 36 => Some(0),
        38 | 40 => Some(1),
        42 | 44 | 46 => Some(2),
        48 | 50 => Some(3),
        52 | 54 => Some(4),
        47 | 49 => Some(5),
        51 | 53 => Some(6),
        37 | 39 => Some(7),
        41 | 43 => Some(8),
        _ => None,
    }
}

/// Lane for a MIDI note.
///
/// From C0 up, C through G# of every octave map to lanes 0..8. Everything else falls back to
/// the General MIDI drum map.
pub fn lane_for_midi_note(note: u8) -> Option<usize> {
    if note > 127 {
        return None;
    }
    if note >= KEYZONE_ROOT {
        let in_octave = ((note - KEYZONE_ROOT) % 12) as usize;
        if in_octave < LANE_COUNT {
            return Some(in_octave);
        }
    }
    lane_for_gm_note(note)
}

/// Octaves from C3, clamped to the tracked range.
pub fn octave_offset(note: u8) -> i32 {
    (note as i32 - TRACKING_CENTER)
        .div_euclid(12)
        .clamp(MIN_OCTAVE, MAX_OCTAVE)
}

/// Reshape a lane's frame for the octave a note was played in.
///
/// Lower octaves get rounder (less FM, fold, noise and brightness, longer decay), higher ones
/// brighter. Octave 3 returns the frame untouched.
pub fn frame_for_note(frame: &LaneFrame, note: u8) -> LaneFrame {
    let mut frame = *frame;
    if note > 127 {
        return frame;
    }
    let octave = octave_offset(note);
    if octave == 0 {
        return frame;
    }

    frame.osc.frequency_hz = (frame.osc.frequency_hz * (octave as f32).exp2()).clamp(8.0, 20_000.0);

    let low = (-octave.min(0)) as f32 / 3.0;
    let high = octave.max(0) as f32 / 2.0;

    let harmonic = (1.0 - 0.55 * low + 0.20 * high).clamp(0.35, 1.25);
    let noise = (1.0 - 0.65 * low + 0.25 * high).clamp(0.25, 1.35);
    let transient = (1.0 - 0.25 * low + 0.15 * high).clamp(0.45, 1.25);

    frame.osc.fm_amount = (frame.osc.fm_amount * harmonic).clamp(0.0, 1.0);
    frame.osc.fold_amount = (frame.osc.fold_amount * harmonic).clamp(0.0, 1.0);
    frame.noise.amount = (frame.noise.amount * noise).clamp(0.0, 2.5);
    frame.noise.level = (frame.noise.level * noise).clamp(0.0, 2.5);
    frame.transient.amount = (frame.transient.amount * transient).clamp(0.0, 1.0);
    frame.transient.level = (frame.transient.level * transient).clamp(0.0, 2.5);
    frame.pitch_env_amount = (frame.pitch_env_amount * (1.0 - 0.30 * low)).clamp(0.0, 1.0);
    frame.decay_seconds = (frame.decay_seconds * (1.0 + 0.30 * low - 0.08 * high))
        .clamp(LaneFrame::MIN_DECAY_SECONDS, LaneFrame::MAX_DECAY_SECONDS);

    let body_cutoff = (1.0 - 0.32 * low + 0.18 * high).clamp(0.55, 1.20);
    let noise_cutoff = (1.0 - 0.45 * low + 0.25 * high).clamp(0.40, 1.35);
    frame.osc.filter_cutoff_hz = (frame.osc.filter_cutoff_hz * body_cutoff).clamp(80.0, 18_000.0);
    frame.noise.filter_cutoff_hz =
        (frame.noise.filter_cutoff_hz * noise_cutoff).clamp(120.0, 18_000.0);

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyzones() {
        assert_eq!(lane_for_midi_note(24), Some(0));
        assert_eq!(lane_for_midi_note(32), Some(8));
        assert_eq!(lane_for_midi_note(60), Some(0));
        assert_eq!(lane_for_midi_note(62), Some(2));
        assert_eq!(lane_for_midi_note(68), Some(8));
        assert_eq!(lane_for_midi_note(127), Some(7));
    }

    #[test]
    fn test_gm_fallback() {
        // A, A# and B of each octave above C0 aren't keyzones
        assert_eq!(lane_for_midi_note(45), None);
        assert_eq!(lane_for_midi_note(69), None);
        assert_eq!(lane_for_midi_note(0), None);
        assert_eq!(lane_for_midi_note(23), None);
        assert_eq!(lane_for_midi_note(200), None);
        // GM notes on A..B reach the drum map, the rest land in a keyzone
        assert_eq!(lane_for_midi_note(35), Some(0));
        assert_eq!(lane_for_midi_note(46), Some(2));
        assert_eq!(lane_for_midi_note(47), Some(5));
        assert_eq!(lane_for_midi_note(36), Some(0));
        assert_eq!(lane_for_midi_note(38), Some(2));
        assert_eq!(lane_for_gm_note(38), Some(1));
        assert_eq!(lane_for_gm_note(46), Some(2));
        assert_eq!(lane_for_gm_note(41), Some(8));
    }

    #[test]
    fn test_octave_offset() {
        assert_eq!(octave_offset(60), 0);
        assert_eq!(octave_offset(71), 0);
        assert_eq!(octave_offset(72), 1);
        assert_eq!(octave_offset(59), -1);
        assert_eq!(octave_offset(0), -3);
        assert_eq!(octave_offset(127), 2);
    }

    #[test]
    fn test_center_octave_is_identity() {
        let frame = LaneFrame::default();
        assert_eq!(frame_for_note(&frame, 60), frame);
        assert_eq!(frame_for_note(&frame, 64), frame);
    }

    #[test]
    fn test_octave_shaping() {
        let frame = LaneFrame::default();

        let up = frame_for_note(&frame, 72);
        assert!((up.osc.frequency_hz - frame.osc.frequency_hz * 2.0).abs() < 1e-3);
        assert!(up.osc.filter_cutoff_hz > frame.osc.filter_cutoff_hz);
        assert!(up.noise.level > frame.noise.level);
        assert!(up.decay_seconds < frame.decay_seconds);

        let down = frame_for_note(&frame, 36);
        assert!((down.osc.frequency_hz - frame.osc.frequency_hz / 4.0).abs() < 1e-3);
        assert!(down.osc.fm_amount < frame.osc.fm_amount);
        assert!(down.noise.amount < frame.noise.amount);
        assert!(down.pitch_env_amount < frame.pitch_env_amount);
        assert!(down.decay_seconds > frame.decay_seconds);
    }
}
