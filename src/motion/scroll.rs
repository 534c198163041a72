use super::{curve::MotionCurveSettings, frame_dt};
use crate::config::ScrollConfig;

/// Result of advancing inertia by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollUpdate {
    /// No inertia is running.
    Idle,
    /// Momentum produced this many scroll units.
    Delta(f32),
    /// Momentum just died out; any fractional scroll carry should be dropped.
    Settled,
}

#[derive(Clone, Debug)]
pub struct ScrollMotionEngine {
    curve: MotionCurveSettings,
    settings: ScrollConfig,
    velocity: f32,
    gesture_active: bool,
    inertia_active: bool,
}

impl ScrollMotionEngine {
    pub fn new(curve: MotionCurveSettings, settings: ScrollConfig) -> Self {
        Self {
            curve,
            settings,
            velocity: 0.0,
            gesture_active: false,
            inertia_active: false,
        }
    }

    pub fn reset(&mut self) {
        self.velocity = 0.0;
        self.gesture_active = false;
        self.inertia_active = false;
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture_active
    }

    pub fn is_inertia_active(&self) -> bool {
        self.inertia_active
    }

    /// Shapes one frame of finger motion and returns the scroll units to send.
    pub fn apply_gesture_delta(&mut self, dy: f32, dt: f32) -> Option<f32> {
        if dy == 0.0 || !dy.is_finite() {
            return None;
        }

        self.gesture_active = true;
        self.inertia_active = false;

        let dy = if self.settings.natural { -dy } else { dy };
        let dt = frame_dt(dt);
        let gain = self.curve.gain(dy.abs() / dt);
        let scaled = dy * gain;

        let max_velocity = self.settings.max_velocity.abs();
        let instant = (scaled / dt).clamp(-max_velocity, max_velocity);
        let blend = self.settings.blend;
        self.velocity = blend * instant + (1.0 - blend) * self.velocity;

        Some(scaled)
    }

    pub fn gesture_ended(&mut self) {
        self.gesture_active = false;
        if self.settings.inertia_enabled
            && self.velocity.abs() >= self.settings.min_velocity_for_inertia
        {
            self.inertia_active = true;
        } else {
            self.velocity = 0.0;
            self.inertia_active = false;
        }
    }

    /// Advances momentum by `dt` seconds. Called once per tick.
    pub fn update(&mut self, dt: f32) -> ScrollUpdate {
        if !self.inertia_active || self.gesture_active {
            return ScrollUpdate::Idle;
        }
        if !(dt.is_finite() && dt > 0.0) {
            return ScrollUpdate::Idle;
        }

        self.velocity *= (-self.settings.decay_per_second * dt).exp();
        if self.velocity.abs() < self.settings.min_velocity_for_inertia {
            self.inertia_active = false;
            self.velocity = 0.0;
            return ScrollUpdate::Settled;
        }

        ScrollUpdate::Delta(self.velocity * dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: ScrollConfig = ScrollConfig {
        inertia_enabled: true,
        blend: 0.35,
        max_velocity: 400.0,
        min_velocity_for_inertia: 5.0,
        decay_per_second: 4.0,
        natural: false,
    };

    fn engine() -> ScrollMotionEngine {
        ScrollMotionEngine::new(MotionCurveSettings::flat(1.0), SETTINGS)
    }

    #[test]
    fn zero_delta_is_ignored() {
        let mut scroll = engine();
        assert_eq!(scroll.apply_gesture_delta(0.0, 0.02), None);
        assert!(!scroll.is_gesture_active());
    }

    #[test]
    fn gesture_delta_is_scaled_and_blends_velocity() {
        let mut scroll = ScrollMotionEngine::new(MotionCurveSettings::flat(0.5), SETTINGS);
        let out = scroll.apply_gesture_delta(4.0, 0.1);
        assert_eq!(out, Some(2.0));
        // instant velocity 20/s blended from rest
        assert!((scroll.velocity() - 7.0).abs() < 1e-4);
        assert!(scroll.is_gesture_active());
    }

    #[test]
    fn instant_velocity_is_clamped() {
        let mut scroll = engine();
        scroll.apply_gesture_delta(100.0, 0.01);
        assert!((scroll.velocity() - 0.35 * 400.0).abs() < 1e-3);
    }

    #[test]
    fn natural_direction_flips_sign() {
        let mut scroll = ScrollMotionEngine::new(
            MotionCurveSettings::flat(1.0),
            ScrollConfig {
                natural: true,
                ..SETTINGS
            },
        );
        assert_eq!(scroll.apply_gesture_delta(3.0, 0.02), Some(-3.0));
    }

    #[test]
    fn inertia_decays_monotonically_and_disarms() {
        let mut scroll = engine();
        scroll.velocity = 200.0;
        scroll.gesture_ended();
        assert!(scroll.is_inertia_active());

        let mut last = scroll.velocity().abs();
        let mut settled_after = None;
        for tick in 0..100 {
            match scroll.update(0.1) {
                ScrollUpdate::Delta(delta) => {
                    assert!(delta > 0.0);
                    let now = scroll.velocity().abs();
                    assert!(now < last, "velocity must shrink every tick");
                    last = now;
                }
                ScrollUpdate::Settled => {
                    settled_after = Some(tick);
                    break;
                }
                ScrollUpdate::Idle => panic!("inertia stopped without settling"),
            }
        }

        // 200 * exp(-0.4 n) < 5 once n >= 10
        assert_eq!(settled_after, Some(9));
        assert!(!scroll.is_inertia_active());
        assert_eq!(scroll.velocity(), 0.0);
        assert_eq!(scroll.update(0.1), ScrollUpdate::Idle);
    }

    #[test]
    fn slow_release_does_not_arm_inertia() {
        let mut scroll = engine();
        scroll.velocity = 4.0;
        scroll.gesture_ended();
        assert!(!scroll.is_inertia_active());
        assert_eq!(scroll.velocity(), 0.0);
    }

    #[test]
    fn disabled_inertia_never_arms() {
        let mut scroll = ScrollMotionEngine::new(
            MotionCurveSettings::flat(1.0),
            ScrollConfig {
                inertia_enabled: false,
                ..SETTINGS
            },
        );
        scroll.velocity = 300.0;
        scroll.gesture_ended();
        assert_eq!(scroll.update(0.1), ScrollUpdate::Idle);
    }

    #[test]
    fn new_gesture_cancels_inertia() {
        let mut scroll = engine();
        scroll.velocity = 200.0;
        scroll.gesture_ended();
        scroll.apply_gesture_delta(1.0, 0.02);
        assert!(!scroll.is_inertia_active());
        assert_eq!(scroll.update(0.1), ScrollUpdate::Idle);
    }

    #[test]
    fn reset_zeroes_everything() {
        let mut scroll = engine();
        scroll.apply_gesture_delta(10.0, 0.02);
        scroll.gesture_ended();
        scroll.reset();
        assert_eq!(scroll.velocity(), 0.0);
        assert!(!scroll.is_gesture_active());
        assert!(!scroll.is_inertia_active());
    }
}
