pub use crate::motion::curve::MotionCurveSettings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureConfig {
    /// Time a stationary single contact must rest before it becomes a hold.
    pub hold_delay_ms: u32,
    /// Largest displacement from the start point still treated as stationary.
    pub move_slop_px: f32,
    /// Largest gap between two touch-downs that still forms one gesture.
    pub pair_window_ms: u32,
    pub tap_max_duration_ms: u32,
    /// Largest gap between the two lifts of a two-finger tap.
    pub lift_window_ms: u32,
    pub dominance_ratio: f32,
    pub scroll_jitter_floor: f32,
    /// Delay between the synthetic press and release of a tap.
    pub tap_release_delay_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollConfig {
    pub inertia_enabled: bool,
    pub blend: f32,
    pub max_velocity: f32,
    pub min_velocity_for_inertia: f32,
    pub decay_per_second: f32,
    /// Content follows the fingers instead of the wheel convention.
    pub natural: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConfig {
    pub tick_hz: u32,
    pub stats_interval_ms: u32,
}

impl LinkConfig {
    pub fn tick_interval(&self) -> f64 {
        1.0 / f64::from(self.tick_hz.max(1))
    }

    pub fn stats_interval(&self) -> f64 {
        seconds(self.stats_interval_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchpadConfig {
    pub gesture: GestureConfig,
    pub pointer_curve: MotionCurveSettings,
    pub scroll_curve: MotionCurveSettings,
    pub scroll: ScrollConfig,
    pub link: LinkConfig,
}

impl Default for TouchpadConfig {
    fn default() -> Self {
        TOUCHPAD_CONFIG
    }
}

pub(crate) fn seconds(ms: u32) -> f64 {
    f64::from(ms) / 1_000.0
}

include!(concat!(env!("OUT_DIR"), "/touchpad_config.rs"));

pub fn active_config() -> &'static TouchpadConfig {
    &TOUCHPAD_CONFIG
}
