use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use padlink::{
    active_config, link::FrameKind, Button, CaptureLink, LinkStats, ManualScheduler, Packet,
    TouchContact, TouchPhase, Touchpad,
};

#[derive(Debug, Parser)]
#[command(name = "touch_replay")]
#[command(about = "Replay a touch trace through the padlink pipeline")]
struct Cli {
    /// Trace file with `touch,ms,phase,id,x,y` lines.
    trace: PathBuf,
    /// Expected event labels, one per line.
    #[arg(long)]
    expect: Option<PathBuf>,
    /// Extra time to keep ticking after the last sample, in ms.
    #[arg(long, default_value_t = 2_000)]
    tail_ms: u64,
    /// Print gesture and link diagnostics to stderr.
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug)]
struct ReplaySample {
    ms: u64,
    contact: TouchContact,
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    log::set_logger(&LOGGER).map_err(|e| anyhow!("failed to install logger: {e}"))?;
    log::set_max_level(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });

    let samples = parse_trace(&cli.trace)?;
    let config = active_config();
    let tick_ms = 1_000.0 / f64::from(config.link.tick_hz.max(1));
    let mut pad = Touchpad::new(config, ManualScheduler::new(), CaptureLink::new());

    let mut frames: Vec<(f64, Packet)> = Vec::new();
    let mut stats: Vec<(f64, LinkStats)> = Vec::new();
    let mut next_tick_ms = tick_ms;

    let mut run_ticks_until = |pad: &mut Touchpad<ManualScheduler, CaptureLink>,
                               until_ms: f64,
                               next_tick_ms: &mut f64| {
        while *next_tick_ms <= until_ms {
            pad.scheduler_mut().advance_to(*next_tick_ms / 1_000.0);
            if let Some(window) = pad.on_tick(tick_ms / 1_000.0) {
                stats.push((*next_tick_ms, window));
            }
            for frame in pad.link_mut().take_frames() {
                if let Some(packet) = Packet::decode(&frame) {
                    frames.push((*next_tick_ms, packet));
                }
            }
            *next_tick_ms += tick_ms;
        }
        pad.scheduler_mut().advance_to(until_ms / 1_000.0);
    };

    for batch in samples.chunk_by(|a, b| a.ms == b.ms) {
        let ms = batch[0].ms;
        run_ticks_until(&mut pad, ms as f64, &mut next_tick_ms);
        let contacts: Vec<TouchContact> = batch.iter().map(|s| s.contact).collect();
        pad.on_touches_changed(&contacts, ms as f64 / 1_000.0);
    }
    let last_ms = samples.last().map_or(0, |s| s.ms);
    run_ticks_until(
        &mut pad,
        last_ms.saturating_add(cli.tail_ms) as f64,
        &mut next_tick_ms,
    );

    println!("frame,ms,kind,buttons,dx,dy");
    for (ms, packet) in &frames {
        println!(
            "frame,{:.0},{},{},{},{}",
            ms,
            kind_name(packet.kind),
            packet.buttons,
            packet.dx,
            packet.dy
        );
    }
    for (ms, window) in &stats {
        println!("stats,{:.0},{},{}", ms, window.sent, window.dropped);
    }

    let labels = event_labels(frames.iter().map(|(_, packet)| packet));
    println!("events,{}", labels.join(","));

    if let Some(expect_path) = cli.expect {
        let expected = parse_expected_labels(&expect_path)?;
        if labels != expected {
            eprintln!("expected events: {}", expected.join(","));
            eprintln!("actual events:   {}", labels.join(","));
            bail!("event sequence mismatch");
        }
    }

    Ok(())
}

fn parse_trace(path: &Path) -> Result<Vec<ReplaySample>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out: Vec<ReplaySample> = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line =
            line_result.with_context(|| format!("failed to read {}:{}", path.display(), line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == "touch,ms,phase,id,x,y" {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        if parts.len() != 6 || parts[0] != "touch" {
            bail!(
                "{}:{} invalid trace line, expected touch,ms,phase,id,x,y",
                path.display(),
                line_no
            );
        }

        let ms: u64 = parse_field(parts[1], path, line_no, "ms")?;
        let phase = parse_phase(parts[2]).ok_or_else(|| {
            anyhow!(
                "{}:{} invalid phase '{}'",
                path.display(),
                line_no,
                parts[2]
            )
        })?;
        let id: u64 = parse_field(parts[3], path, line_no, "id")?;
        let x: f32 = parse_field(parts[4], path, line_no, "x")?;
        let y: f32 = parse_field(parts[5], path, line_no, "y")?;

        if out.last().is_some_and(|prev| prev.ms > ms) {
            bail!("{}:{} timestamps go backwards", path.display(), line_no);
        }
        out.push(ReplaySample {
            ms,
            contact: TouchContact::new(id, x, y, phase),
        });
    }

    Ok(out)
}

fn parse_field<T>(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        anyhow!(
            "{}:{} invalid {} '{}': {}",
            path.display(),
            line_no,
            field,
            raw,
            e
        )
    })
}

fn parse_phase(raw: &str) -> Option<TouchPhase> {
    match raw.to_ascii_lowercase().as_str() {
        "began" | "down" => Some(TouchPhase::Began),
        "moved" | "move" => Some(TouchPhase::Moved),
        "stationary" | "still" => Some(TouchPhase::Stationary),
        "ended" | "up" => Some(TouchPhase::Ended),
        "cancelled" | "cancel" => Some(TouchPhase::Cancelled),
        _ => None,
    }
}

fn parse_expected_labels(path: &Path) -> Result<Vec<&'static str>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut labels = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line =
            line_result.with_context(|| format!("failed to read {}:{}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }
        let label = normalize_label(token).ok_or_else(|| {
            anyhow!(
                "{}:{} invalid expected event: {}",
                path.display(),
                line_no,
                token
            )
        })?;
        labels.push(label);
    }

    Ok(labels)
}

fn normalize_label(label: &str) -> Option<&'static str> {
    match label.to_ascii_lowercase().as_str() {
        "primary_down" => Some("primary_down"),
        "primary_up" => Some("primary_up"),
        "secondary_down" => Some("secondary_down"),
        "secondary_up" => Some("secondary_up"),
        "move" => Some("move"),
        "scroll_up" => Some("scroll_up"),
        "scroll_down" => Some("scroll_down"),
        _ => None,
    }
}

fn kind_name(kind: FrameKind) -> &'static str {
    match kind {
        FrameKind::Pointer => "pointer",
        FrameKind::Scroll => "scroll",
    }
}

/// Collapses a frame stream into button edges and runs of motion.
fn event_labels<'a>(packets: impl Iterator<Item = &'a Packet>) -> Vec<&'static str> {
    let mut labels: Vec<&'static str> = Vec::new();
    let mut buttons = 0u8;
    for packet in packets {
        for (button, down, up) in [
            (Button::Primary, "primary_down", "primary_up"),
            (Button::Secondary, "secondary_down", "secondary_up"),
        ] {
            let was = buttons & button.mask() != 0;
            let is = packet.is_pressed(button);
            if is && !was {
                labels.push(down);
            } else if was && !is {
                labels.push(up);
            }
        }
        buttons = packet.buttons;

        let motion = match packet.kind {
            FrameKind::Pointer if packet.dx != 0 || packet.dy != 0 => Some("move"),
            FrameKind::Scroll if packet.dy > 0 => Some("scroll_down"),
            FrameKind::Scroll if packet.dy < 0 => Some("scroll_up"),
            _ => None,
        };
        if let Some(motion) = motion {
            if labels.last() != Some(&motion) {
                labels.push(motion);
            }
        }
    }
    labels
}
