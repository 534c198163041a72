pub mod curve;
pub mod pointer;
pub mod scroll;

pub use curve::{gain, MotionCurveSettings};
pub use pointer::{PointerMotionEngine, PointerStep};
pub use scroll::{ScrollMotionEngine, ScrollUpdate};

/// Shortest frame interval used for speed estimates.
pub const MIN_FRAME_DT: f32 = 1.0 / 240.0;

pub(crate) fn frame_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(MIN_FRAME_DT)
    } else {
        MIN_FRAME_DT
    }
}
