//! Speed-to-gain acceleration curve shared by pointer and scroll shaping.

const SPEED_RANGE_EPSILON: f32 = 1e-3;
const GAMMA_EPSILON: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionCurveSettings {
    /// Speeds at or below this use `base_gain`.
    pub min_speed: f32,
    /// Speeds at or above this use `max_gain`.
    pub max_speed: f32,
    pub base_gain: f32,
    pub max_gain: f32,
    /// Shape of the ramp between the two speeds; 1.0 is linear.
    pub gamma: f32,
}

impl MotionCurveSettings {
    pub const fn flat(gain: f32) -> Self {
        Self {
            min_speed: 0.0,
            max_speed: 1.0,
            base_gain: gain,
            max_gain: gain,
            gamma: 1.0,
        }
    }

    pub fn gain(&self, speed: f32) -> f32 {
        gain(speed, self)
    }
}

/// Maps an instantaneous speed to a gain multiplier.
///
/// Degenerate ranges are repaired rather than rejected: a negative
/// `min_speed` is floored at zero, `max_speed` is kept at least a small
/// epsilon above `min_speed`, and `gamma` is kept strictly positive.
pub fn gain(speed: f32, settings: &MotionCurveSettings) -> f32 {
    if speed.is_nan() {
        return settings.base_gain;
    }

    let min_speed = settings.min_speed.max(0.0);
    let max_speed = settings.max_speed.max(min_speed + SPEED_RANGE_EPSILON);
    let t = ((speed.abs() - min_speed) / (max_speed - min_speed)).clamp(0.0, 1.0);
    if t == 0.0 {
        return settings.base_gain;
    }

    let gamma = settings.gamma.max(GAMMA_EPSILON);
    settings.base_gain + t.powf(gamma) * (settings.max_gain - settings.base_gain)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTER: MotionCurveSettings = MotionCurveSettings {
        min_speed: 60.0,
        max_speed: 1400.0,
        base_gain: 1.0,
        max_gain: 3.2,
        gamma: 1.5,
    };

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-4
    }

    #[test]
    fn slow_speeds_use_base_gain() {
        for speed in [0.0, 1.0, 30.0, 59.9, 60.0, -60.0, -10.0] {
            assert_eq!(gain(speed, &POINTER), POINTER.base_gain, "speed {speed}");
        }
    }

    #[test]
    fn fast_speeds_saturate_at_max_gain() {
        for speed in [1400.0, 1401.0, 5_000.0, -9_000.0] {
            assert!(close(gain(speed, &POINTER), POINTER.max_gain), "speed {speed}");
        }
    }

    #[test]
    fn ramp_is_monotonic_between_bounds() {
        let mut last = gain(60.0, &POINTER);
        let mut speed = 80.0;
        while speed < 1400.0 {
            let g = gain(speed, &POINTER);
            assert!(g >= last, "gain dropped at {speed}: {g} < {last}");
            last = g;
            speed += 40.0;
        }
    }

    #[test]
    fn midpoint_follows_gamma() {
        let linear = MotionCurveSettings {
            gamma: 1.0,
            ..POINTER
        };
        let mid = (linear.min_speed + linear.max_speed) / 2.0;
        let expected = linear.base_gain + 0.5 * (linear.max_gain - linear.base_gain);
        assert!(close(gain(mid, &linear), expected));

        let steep = gain(mid, &POINTER);
        assert!(steep < expected, "gamma > 1 should bend the ramp downward");
    }

    #[test]
    fn inverted_range_is_repaired() {
        let broken = MotionCurveSettings {
            min_speed: 500.0,
            max_speed: 100.0,
            ..POINTER
        };
        assert_eq!(gain(400.0, &broken), broken.base_gain);
        assert!(close(gain(600.0, &broken), broken.max_gain));
        assert!(gain(500.0005, &broken).is_finite());
    }

    #[test]
    fn negative_min_speed_is_floored_and_zero_gamma_is_guarded() {
        let broken = MotionCurveSettings {
            min_speed: -50.0,
            max_speed: 100.0,
            gamma: 0.0,
            ..POINTER
        };
        assert_eq!(gain(0.0, &broken), broken.base_gain);
        let g = gain(50.0, &broken);
        assert!(g.is_finite());
        assert!(g > broken.base_gain);
    }

    #[test]
    fn nan_speed_uses_base_gain() {
        assert_eq!(gain(f32::NAN, &POINTER), POINTER.base_gain);
    }

    #[test]
    fn infinite_speed_saturates_at_max_gain() {
        assert!(close(gain(f32::INFINITY, &POINTER), POINTER.max_gain));
        assert!(close(gain(f32::NEG_INFINITY, &POINTER), POINTER.max_gain));
    }

    #[test]
    fn flat_curve_is_constant() {
        let flat = MotionCurveSettings::flat(1.0);
        for speed in [0.0, 0.5, 10.0, 10_000.0] {
            assert!(close(flat.gain(speed), 1.0));
        }
    }
}
