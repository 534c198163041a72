//! Build-time compiler for `config/touchpad.toml`.
//!
//! Parses the TOML file, checks it for values the runtime cannot work with and
//! renders a Rust source fragment defining `TOUCHPAD_CONFIG`. The fragment is
//! `include!`d by `padlink::config`, so field names here must stay in sync
//! with the structs declared there.

use std::{fmt, fmt::Write as _, fs, path::Path};

use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigCompilerError {
    Io(String),
    Parse(String),
    Validation(String),
}

impl fmt::Display for ConfigCompilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "io error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigCompilerError {}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TouchpadFile {
    pub gesture: GestureSection,
    pub pointer_curve: CurveSection,
    pub scroll_curve: CurveSection,
    pub scroll: ScrollSection,
    pub link: LinkSection,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GestureSection {
    pub hold_delay_ms: u32,
    pub move_slop_px: f32,
    pub pair_window_ms: u32,
    pub tap_max_duration_ms: u32,
    pub lift_window_ms: u32,
    pub dominance_ratio: f32,
    pub scroll_jitter_floor: f32,
    pub tap_release_delay_ms: u32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveSection {
    pub min_speed: f32,
    pub max_speed: f32,
    pub base_gain: f32,
    pub max_gain: f32,
    pub gamma: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrollSection {
    pub inertia_enabled: bool,
    pub blend: f32,
    pub max_velocity: f32,
    pub min_velocity_for_inertia: f32,
    pub decay_per_second: f32,
    #[serde(default)]
    pub natural: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSection {
    pub tick_hz: u32,
    pub stats_interval_ms: u32,
}

pub fn parse_touchpad_file(path: &Path) -> Result<TouchpadFile, ConfigCompilerError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ConfigCompilerError::Io(format!("{}: {e}", path.display())))?;
    parse_touchpad_str(&text)
}

pub fn parse_touchpad_str(text: &str) -> Result<TouchpadFile, ConfigCompilerError> {
    toml::from_str(text).map_err(|e| ConfigCompilerError::Parse(e.to_string()))
}

pub fn validate_config(config: &TouchpadFile) -> Result<(), ConfigCompilerError> {
    let gesture = &config.gesture;
    if gesture.hold_delay_ms == 0 {
        return invalid("gesture.hold_delay_ms must be > 0");
    }
    if gesture.tap_max_duration_ms == 0 {
        return invalid("gesture.tap_max_duration_ms must be > 0");
    }
    if gesture.pair_window_ms == 0 || gesture.lift_window_ms == 0 {
        return invalid("gesture.pair_window_ms and gesture.lift_window_ms must be > 0");
    }
    if gesture.tap_release_delay_ms == 0 {
        return invalid("gesture.tap_release_delay_ms must be > 0");
    }
    if !(gesture.move_slop_px.is_finite() && gesture.move_slop_px >= 0.0) {
        return invalid("gesture.move_slop_px must be a finite value >= 0");
    }
    if !(gesture.dominance_ratio.is_finite() && gesture.dominance_ratio >= 1.0) {
        return invalid("gesture.dominance_ratio must be >= 1.0");
    }
    if !(gesture.scroll_jitter_floor.is_finite() && gesture.scroll_jitter_floor >= 0.0) {
        return invalid("gesture.scroll_jitter_floor must be a finite value >= 0");
    }

    for (name, curve) in [
        ("pointer_curve", &config.pointer_curve),
        ("scroll_curve", &config.scroll_curve),
    ] {
        let values = [
            curve.min_speed,
            curve.max_speed,
            curve.base_gain,
            curve.max_gain,
            curve.gamma,
        ];
        // Inverted or empty speed ranges are repaired at runtime; only
        // non-numeric values are rejected here.
        if values.iter().any(|v| !v.is_finite()) {
            return invalid(&format!("all {name} fields must be finite numbers"));
        }
    }

    let scroll = &config.scroll;
    if !(scroll.blend > 0.0 && scroll.blend <= 1.0) {
        return invalid("scroll.blend must be in (0, 1]");
    }
    if !(scroll.max_velocity.is_finite() && scroll.max_velocity > 0.0) {
        return invalid("scroll.max_velocity must be > 0");
    }
    if !(scroll.min_velocity_for_inertia.is_finite() && scroll.min_velocity_for_inertia > 0.0) {
        return invalid("scroll.min_velocity_for_inertia must be > 0");
    }
    if !(scroll.decay_per_second.is_finite() && scroll.decay_per_second > 0.0) {
        return invalid("scroll.decay_per_second must be > 0");
    }

    if config.link.tick_hz == 0 {
        return invalid("link.tick_hz must be > 0");
    }
    if config.link.stats_interval_ms == 0 {
        return invalid("link.stats_interval_ms must be > 0");
    }

    Ok(())
}

fn invalid(msg: &str) -> Result<(), ConfigCompilerError> {
    Err(ConfigCompilerError::Validation(msg.to_owned()))
}

pub fn render_generated_config(config: &TouchpadFile) -> String {
    let g = &config.gesture;
    let s = &config.scroll;
    let mut out = String::new();

    out.push_str("// @generated by touchpad_config_compiler. Do not edit.\n");
    out.push_str("pub const TOUCHPAD_CONFIG: TouchpadConfig = TouchpadConfig {\n");
    out.push_str("    gesture: GestureConfig {\n");
    let _ = writeln!(out, "        hold_delay_ms: {},", g.hold_delay_ms);
    let _ = writeln!(out, "        move_slop_px: {},", float(g.move_slop_px));
    let _ = writeln!(out, "        pair_window_ms: {},", g.pair_window_ms);
    let _ = writeln!(out, "        tap_max_duration_ms: {},", g.tap_max_duration_ms);
    let _ = writeln!(out, "        lift_window_ms: {},", g.lift_window_ms);
    let _ = writeln!(out, "        dominance_ratio: {},", float(g.dominance_ratio));
    let _ = writeln!(
        out,
        "        scroll_jitter_floor: {},",
        float(g.scroll_jitter_floor)
    );
    let _ = writeln!(out, "        tap_release_delay_ms: {},", g.tap_release_delay_ms);
    out.push_str("    },\n");
    render_curve(&mut out, "pointer_curve", &config.pointer_curve);
    render_curve(&mut out, "scroll_curve", &config.scroll_curve);
    out.push_str("    scroll: ScrollConfig {\n");
    let _ = writeln!(out, "        inertia_enabled: {},", s.inertia_enabled);
    let _ = writeln!(out, "        blend: {},", float(s.blend));
    let _ = writeln!(out, "        max_velocity: {},", float(s.max_velocity));
    let _ = writeln!(
        out,
        "        min_velocity_for_inertia: {},",
        float(s.min_velocity_for_inertia)
    );
    let _ = writeln!(out, "        decay_per_second: {},", float(s.decay_per_second));
    let _ = writeln!(out, "        natural: {},", s.natural);
    out.push_str("    },\n");
    out.push_str("    link: LinkConfig {\n");
    let _ = writeln!(out, "        tick_hz: {},", config.link.tick_hz);
    let _ = writeln!(
        out,
        "        stats_interval_ms: {},",
        config.link.stats_interval_ms
    );
    out.push_str("    },\n");
    out.push_str("};\n");
    out
}

fn render_curve(out: &mut String, field: &str, curve: &CurveSection) {
    let _ = writeln!(out, "    {field}: MotionCurveSettings {{");
    let _ = writeln!(out, "        min_speed: {},", float(curve.min_speed));
    let _ = writeln!(out, "        max_speed: {},", float(curve.max_speed));
    let _ = writeln!(out, "        base_gain: {},", float(curve.base_gain));
    let _ = writeln!(out, "        max_gain: {},", float(curve.max_gain));
    let _ = writeln!(out, "        gamma: {},", float(curve.gamma));
    out.push_str("    },\n");
}

// `{:?}` keeps a decimal point or exponent, so the literal stays an f32.
fn float(value: f32) -> String {
    format!("{value:?}_f32")
}

pub fn generate_from_path(path: &Path) -> Result<String, ConfigCompilerError> {
    let config = parse_touchpad_file(path)?;
    validate_config(&config)?;
    Ok(render_generated_config(&config))
}
