const SOFT_CLIP_DRIVE: f32 = 1.4;

/// Reflect a signal back into [-1, 1] as many times as it overshoots.
///
/// `amount` in [0, ~2] sets the pre-gain (`1 + amount * 7`). The reflection is the closed form
/// of bouncing off both rails, so the output is bounded for any gain.
#[inline]
pub fn wavefold(x: f32, amount: f32) -> f32 {
    let driven = x * (1.0 + amount.max(0.0) * 7.0);
    if (-1.0..=1.0).contains(&driven) {
        return driven;
    }
    1.0 - (((driven + 1.0).rem_euclid(4.0)) - 2.0).abs()
}

/// Master bus soft clip normalized so that full scale maps to full scale.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    (x * SOFT_CLIP_DRIVE).tanh() / SOFT_CLIP_DRIVE.tanh()
}

/// Voice output saturation: `tanh(x * (1 + drive * 8))`.
#[inline]
pub fn drive_saturate(x: f32, drive: f32) -> f32 {
    (x * (1.0 + drive * 8.0)).tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wavefold_passthrough_inside_range() {
        for i in -10..=10 {
            let x = i as f32 / 10.0;
            assert!((wavefold(x, 0.0) - x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_wavefold_reflects_single_bounce() {
        // gain 1 + 7/7 = 2
        let amount = 1.0 / 7.0;
        assert!((wavefold(0.75, amount) - 0.5).abs() < 1e-5, "2 * 0.75 = 1.5 -> 0.5");
        assert!((wavefold(-0.75, amount) + 0.5).abs() < 1e-5, "-1.5 -> -0.5");
    }

    #[test]
    fn test_wavefold_multi_bounce_bounded() {
        for i in -1000..=1000 {
            let x = i as f32 / 1000.0;
            for &amount in &[0.5, 1.0, 1.9, 5.0] {
                let y = wavefold(x, amount);
                assert!(
                    (-1.0..=1.0).contains(&y),
                    "wavefold({}, {}) = {} escaped the rails",
                    x,
                    amount,
                    y
                );
            }
        }
        // 3.5 -> 2 - 3.5 = -1.5 -> -2 + 1.5 = -0.5
        assert!((wavefold(0.5, 6.0 / 7.0) + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_soft_clip_shape() {
        assert_eq!(soft_clip(0.0), 0.0);
        assert!((soft_clip(1.0) - 1.0).abs() < 1e-6);
        assert!((soft_clip(-1.0) + 1.0).abs() < 1e-6);
        assert!(soft_clip(10.0) < 1.2);
        assert!(soft_clip(0.5) > 0.5, "soft clip lifts low levels");
    }

    #[test]
    fn test_drive_saturate_bounded() {
        for &drive in &[0.0, 0.5, 1.0] {
            for i in -50..=50 {
                let y = drive_saturate(i as f32 / 5.0, drive);
                assert!(y.abs() <= 1.0);
            }
        }
    }
}
