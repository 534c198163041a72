//! End-to-end runs of the touch pipeline against a captured link.

use padlink::{
    config::MotionCurveSettings, link::FrameKind, Button, CaptureLink, GestureStateId,
    LinkStats, ManualScheduler, Packet, Scheduler, TouchContact, TouchPhase, Touchpad,
    TouchpadConfig,
};

const TICK: f64 = 1.0 / 45.0;

struct Rig {
    pad: Touchpad<ManualScheduler, CaptureLink>,
    next_tick: f64,
    stats: Vec<LinkStats>,
}

impl Rig {
    fn new() -> Self {
        Self::with_config(TouchpadConfig::default())
    }

    fn with_config(config: TouchpadConfig) -> Self {
        Self {
            pad: Touchpad::new(&config, ManualScheduler::new(), CaptureLink::new()),
            next_tick: TICK,
            stats: Vec::new(),
        }
    }

    /// Ticks the pipeline at the fixed rate up to and including `until`.
    fn run_until(&mut self, until: f64) {
        while self.next_tick <= until {
            self.pad.scheduler_mut().advance_to(self.next_tick);
            if let Some(stats) = self.pad.on_tick(TICK) {
                self.stats.push(stats);
            }
            self.next_tick += TICK;
        }
        self.pad.scheduler_mut().advance_to(until);
    }

    fn touch(&mut self, at: f64, contacts: &[TouchContact]) {
        self.run_until(at);
        self.pad.on_touches_changed(contacts, at);
    }

    fn lift(&mut self, at: f64, contacts: &[TouchContact]) {
        self.run_until(at);
        self.pad.on_touches_ended(contacts, at);
    }

    fn packets(&self) -> Vec<Packet> {
        self.pad.link().packets()
    }

    fn button_masks(&self) -> Vec<u8> {
        self.packets()
            .iter()
            .filter(|p| p.kind == FrameKind::Pointer)
            .map(|p| p.buttons)
            .collect()
    }

    fn scroll_units(&self) -> Vec<i16> {
        self.packets()
            .iter()
            .filter(|p| p.kind == FrameKind::Scroll)
            .map(|p| p.dy)
            .collect()
    }
}

fn contact(id: u64, x: f32, y: f32, phase: TouchPhase) -> TouchContact {
    TouchContact::new(id, x, y, phase)
}

#[test]
fn single_tap_clicks_primary_once() {
    let mut rig = Rig::new();
    rig.touch(0.0, &[contact(1, 50.0, 50.0, TouchPhase::Began)]);
    rig.lift(0.1, &[contact(1, 50.0, 50.0, TouchPhase::Ended)]);
    rig.run_until(0.6);

    let masks = rig.button_masks();
    assert_eq!(masks.first(), Some(&Button::PRIMARY_BIT));
    assert_eq!(masks.last(), Some(&0));
    assert_eq!(masks.iter().filter(|mask| **mask == 0).count(), 1);
    assert!(rig.scroll_units().is_empty());
    assert_eq!(rig.pad.state(), GestureStateId::Idle);
}

#[test]
fn hold_then_drag_keeps_button_down() {
    let mut rig = Rig::with_config(TouchpadConfig {
        pointer_curve: MotionCurveSettings::flat(1.0),
        ..TouchpadConfig::default()
    });
    rig.touch(0.0, &[contact(1, 50.0, 50.0, TouchPhase::Began)]);
    rig.run_until(0.6);
    rig.touch(0.62, &[contact(1, 80.0, 50.0, TouchPhase::Moved)]);
    rig.run_until(0.7);
    rig.lift(0.72, &[contact(1, 80.0, 50.0, TouchPhase::Ended)]);
    rig.run_until(0.8);

    let packets = rig.packets();
    let dragged: i32 = packets
        .iter()
        .filter(|p| p.is_pressed(Button::Primary))
        .map(|p| i32::from(p.dx))
        .sum();
    assert_eq!(dragged, 30);
    assert_eq!(packets.last().map(|p| p.buttons), Some(0));
}

#[test]
fn two_finger_tap_clicks_secondary() {
    let mut rig = Rig::new();
    rig.touch(
        0.0,
        &[
            contact(1, 40.0, 60.0, TouchPhase::Began),
            contact(2, 90.0, 60.0, TouchPhase::Began),
        ],
    );
    rig.lift(0.09, &[contact(1, 40.0, 60.0, TouchPhase::Ended)]);
    rig.lift(0.13, &[contact(2, 90.0, 60.0, TouchPhase::Ended)]);
    rig.run_until(0.5);

    let masks = rig.button_masks();
    assert!(masks.contains(&Button::SECONDARY_BIT));
    assert!(!masks.iter().any(|mask| mask & Button::PRIMARY_BIT != 0));
    assert_eq!(masks.last(), Some(&0));
}

#[test]
fn two_finger_swipe_scrolls_and_coasts() {
    let mut rig = Rig::new();
    rig.touch(
        0.0,
        &[
            contact(1, 40.0, 100.0, TouchPhase::Began),
            contact(2, 90.0, 100.0, TouchPhase::Began),
        ],
    );
    let mut t = 0.0;
    let mut y = 100.0;
    for _ in 0..8 {
        t += 0.02;
        y += 20.0;
        rig.touch(
            t,
            &[
                contact(1, 40.0, y, TouchPhase::Moved),
                contact(2, 90.0, y, TouchPhase::Moved),
            ],
        );
    }
    rig.lift(
        t + 0.01,
        &[
            contact(1, 40.0, y, TouchPhase::Ended),
            contact(2, 90.0, y, TouchPhase::Ended),
        ],
    );
    let during_gesture = rig.scroll_units().len();
    assert!(during_gesture > 0);
    assert!(rig.pad.classifier().is_scrolling());

    rig.run_until(t + 3.0);
    let units = rig.scroll_units();
    assert!(units.len() > during_gesture, "inertia keeps scrolling");
    assert!(units.iter().all(|unit| *unit > 0));
    assert!(!rig.pad.classifier().is_scrolling());
    assert!(rig.button_masks().iter().all(|mask| *mask == 0));
}

#[test]
fn natural_scrolling_reverses_direction() {
    let mut config = TouchpadConfig::default();
    config.scroll.natural = true;
    let mut rig = Rig::with_config(config);
    rig.touch(
        0.0,
        &[
            contact(1, 40.0, 100.0, TouchPhase::Began),
            contact(2, 90.0, 100.0, TouchPhase::Began),
        ],
    );
    for step in 1..=4 {
        let y = 100.0 + 20.0 * step as f32;
        rig.touch(
            0.02 * f64::from(step),
            &[
                contact(1, 40.0, y, TouchPhase::Moved),
                contact(2, 90.0, y, TouchPhase::Moved),
            ],
        );
    }
    rig.run_until(0.2);

    let units = rig.scroll_units();
    assert!(!units.is_empty());
    assert!(units.iter().all(|unit| *unit < 0));
}

#[test]
fn scroll_remainder_does_not_leak_into_next_gesture() {
    let mut config = TouchpadConfig {
        scroll_curve: MotionCurveSettings::flat(0.1),
        ..TouchpadConfig::default()
    };
    config.scroll.inertia_enabled = false;
    let mut rig = Rig::with_config(config);

    for start in [0.0, 0.5] {
        rig.touch(
            start,
            &[
                contact(1, 40.0, 100.0, TouchPhase::Began),
                contact(2, 90.0, 100.0, TouchPhase::Began),
            ],
        );
        rig.touch(
            start + 0.02,
            &[
                contact(1, 40.0, 115.0, TouchPhase::Moved),
                contact(2, 90.0, 115.0, TouchPhase::Moved),
            ],
        );
        rig.touch(
            start + 0.04,
            &[
                contact(1, 40.0, 121.0, TouchPhase::Moved),
                contact(2, 90.0, 121.0, TouchPhase::Moved),
            ],
        );
        rig.lift(
            start + 0.06,
            &[
                contact(1, 40.0, 121.0, TouchPhase::Ended),
                contact(2, 90.0, 121.0, TouchPhase::Ended),
            ],
        );
    }
    rig.run_until(1.0);

    assert!(rig.scroll_units().is_empty());
    assert_eq!(rig.pad.state(), GestureStateId::Idle);
}

#[test]
fn three_fingers_send_nothing() {
    let mut rig = Rig::new();
    rig.touch(
        0.0,
        &[
            contact(1, 40.0, 100.0, TouchPhase::Began),
            contact(2, 90.0, 100.0, TouchPhase::Began),
            contact(3, 140.0, 100.0, TouchPhase::Began),
        ],
    );
    for step in 1..=5 {
        let y = 100.0 + 15.0 * step as f32;
        rig.touch(
            0.02 * f64::from(step),
            &[
                contact(1, 40.0, y, TouchPhase::Moved),
                contact(2, 90.0, y, TouchPhase::Moved),
                contact(3, 140.0, y, TouchPhase::Moved),
            ],
        );
    }
    rig.run_until(0.3);

    assert!(rig.packets().is_empty());
    assert_eq!(rig.pad.classifier().contact_count(), 3);
}

#[test]
fn click_survives_link_backpressure() {
    let mut rig = Rig::new();
    rig.pad.link_mut().set_accepting(false);
    rig.touch(0.0, &[contact(1, 50.0, 50.0, TouchPhase::Began)]);
    rig.lift(0.05, &[contact(1, 50.0, 50.0, TouchPhase::Ended)]);
    rig.run_until(0.3);
    assert!(rig.packets().is_empty());
    assert!(rig.pad.transport().stats().dropped > 0);

    rig.pad.link_mut().set_accepting(true);
    rig.run_until(0.5);
    assert_eq!(rig.button_masks(), vec![Button::PRIMARY_BIT, 0]);
}

#[test]
fn stats_are_reported_every_window() {
    let mut rig = Rig::new();
    rig.touch(0.0, &[contact(1, 50.0, 50.0, TouchPhase::Began)]);
    rig.run_until(8.5);

    assert_eq!(rig.stats.len(), 2);
    assert!(rig.stats.iter().all(|stats| stats.sent > 0));
    assert!(rig.stats.iter().all(|stats| stats.dropped == 0));
}

#[test]
fn reset_releases_held_button() {
    let mut rig = Rig::new();
    rig.touch(0.0, &[contact(1, 50.0, 50.0, TouchPhase::Began)]);
    rig.run_until(0.6);
    assert_eq!(rig.pad.transport().buttons(), Button::PRIMARY_BIT);

    rig.pad.reset();
    assert_eq!(rig.pad.transport().buttons(), 0);
    assert_eq!(rig.pad.state(), GestureStateId::Idle);
    assert_eq!(rig.pad.scheduler().pending(), 0);
    assert!(rig.pad.scheduler().now() >= 0.6);
}
