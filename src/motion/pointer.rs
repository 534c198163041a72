use super::{curve::MotionCurveSettings, frame_dt};

// Accumulated float error must not swallow a unit that the exact sum would
// reach (ten steps of 0.3 have to produce 3, not 2).
const CARRY_SNAP: f32 = 1e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerStep {
    pub dx: i32,
    pub dy: i32,
}

/// Turns raw per-frame finger deltas into whole cursor units.
///
/// Fractions left over after truncation are carried into the next frame so
/// slow drags keep moving the cursor instead of rounding to zero forever.
#[derive(Clone, Debug)]
pub struct PointerMotionEngine {
    curve: MotionCurveSettings,
    accum_x: f32,
    accum_y: f32,
}

impl PointerMotionEngine {
    pub fn new(curve: MotionCurveSettings) -> Self {
        Self {
            curve,
            accum_x: 0.0,
            accum_y: 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.accum_x = 0.0;
        self.accum_y = 0.0;
    }

    pub fn carry(&self) -> (f32, f32) {
        (self.accum_x, self.accum_y)
    }

    pub fn apply_raw_delta(&mut self, dx: f32, dy: f32, dt: f32) -> Option<PointerStep> {
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return None;
        }

        let dt = frame_dt(dt);
        let speed = dx.hypot(dy) / dt;
        let gain = self.curve.gain(speed);

        self.accum_x += dx * gain;
        self.accum_y += dy * gain;

        let step = PointerStep {
            dx: take_whole(&mut self.accum_x),
            dy: take_whole(&mut self.accum_y),
        };
        if step.dx == 0 && step.dy == 0 {
            None
        } else {
            Some(step)
        }
    }
}

fn take_whole(accum: &mut f32) -> i32 {
    let whole = (*accum + CARRY_SNAP.copysign(*accum)).trunc();
    *accum -= whole;
    whole as i32
}
