//! The assembled pipeline: touch reports in, paced frames out.

use crate::{
    config::{seconds, TouchpadConfig},
    gesture::{GestureAction, GestureClassifier, GestureOutput, GestureStateId},
    link::{Link, LinkStats, LinkTransport},
    scheduler::{Scheduler, TimerToken},
    types::{Button, TouchContact},
};

/// Wires a [`GestureClassifier`] to a [`LinkTransport`].
///
/// The host calls the `on_*` methods from its touch callbacks, its timer
/// callbacks and its fixed-rate tick. Polled schedulers (see
/// [`Scheduler::take_due`]) are drained at the start of every call.
pub struct Touchpad<S: Scheduler, L: Link> {
    config: TouchpadConfig,
    classifier: GestureClassifier,
    transport: LinkTransport<L>,
    scheduler: S,
    scroll_carry: f32,
    tap_serial: u32,
    tap_release: [Option<TimerToken>; 2],
}

impl<S: Scheduler, L: Link> Touchpad<S, L> {
    pub fn new(config: &TouchpadConfig, scheduler: S, link: L) -> Self {
        Self {
            config: *config,
            classifier: GestureClassifier::new(config),
            transport: LinkTransport::new(link, &config.link),
            scheduler,
            scroll_carry: 0.0,
            tap_serial: 0,
            tap_release: [None; 2],
        }
    }

    pub fn config(&self) -> &TouchpadConfig {
        &self.config
    }

    pub fn on_touches_changed(&mut self, contacts: &[TouchContact], timestamp: f64) {
        self.run_due_timers();
        let output = self
            .classifier
            .touches_changed(contacts, timestamp, &mut self.scheduler);
        self.apply(&output);
    }

    pub fn on_touches_ended(&mut self, contacts: &[TouchContact], timestamp: f64) {
        self.run_due_timers();
        let output = self
            .classifier
            .touches_ended(contacts, timestamp, &mut self.scheduler);
        self.apply(&output);
    }

    /// Entry point for schedulers that call back when a timer expires.
    pub fn on_timer(&mut self, token: TimerToken) {
        if let TimerToken::TapRelease { button, .. } = token {
            let slot = &mut self.tap_release[release_slot(button)];
            if *slot == Some(token) {
                *slot = None;
                self.transport.release(button);
            }
            return;
        }
        let output = self.classifier.timer_fired(token, &mut self.scheduler);
        self.apply(&output);
    }

    /// Runs scroll inertia and the link for one tick of `dt` seconds.
    pub fn on_tick(&mut self, dt: f64) -> Option<LinkStats> {
        self.run_due_timers();
        let output = self.classifier.tick(dt, &mut self.scheduler);
        self.apply(&output);
        self.transport.tick(dt)
    }

    /// Drops every contact and releases any held or pending button.
    pub fn reset(&mut self) {
        let output = self.classifier.reset(&mut self.scheduler);
        self.apply(&output);
        for (slot, button) in [Button::Primary, Button::Secondary].into_iter().enumerate() {
            if let Some(token) = self.tap_release[slot].take() {
                self.scheduler.cancel(token);
                self.transport.release(button);
            }
        }
        self.scroll_carry = 0.0;
    }

    pub fn state(&self) -> GestureStateId {
        self.classifier.state()
    }

    pub fn classifier(&self) -> &GestureClassifier {
        &self.classifier
    }

    pub fn transport(&self) -> &LinkTransport<L> {
        &self.transport
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn link(&self) -> &L {
        self.transport.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.transport.link_mut()
    }

    fn run_due_timers(&mut self) {
        while let Some(token) = self.scheduler.take_due() {
            self.on_timer(token);
        }
    }

    fn apply(&mut self, output: &GestureOutput) {
        for action in output.iter() {
            match *action {
                GestureAction::Pointer { dx, dy } => self.transport.add_pointer(dx, dy),
                GestureAction::Scroll { delta } => self.add_scroll(delta),
                GestureAction::ScrollSettled => self.scroll_carry = 0.0,
                GestureAction::ButtonDown(button) => self.transport.press(button),
                GestureAction::ButtonUp(button) => self.transport.release(button),
                GestureAction::Tap(button) => self.tap(button),
            }
        }
    }

    fn add_scroll(&mut self, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        self.scroll_carry += delta;
        let whole = self.scroll_carry.trunc();
        if whole != 0.0 {
            self.scroll_carry -= whole;
            self.transport.add_scroll(whole as i32);
        }
    }

    fn tap(&mut self, button: Button) {
        self.tap_serial = self.tap_serial.wrapping_add(1);
        let token = TimerToken::TapRelease {
            button,
            serial: self.tap_serial,
        };
        if let Some(previous) = self.tap_release[release_slot(button)].replace(token) {
            self.scheduler.cancel(previous);
        }
        self.transport.press(button);
        self.scheduler
            .schedule_once(seconds(self.config.gesture.tap_release_delay_ms), token);
    }
}

fn release_slot(button: Button) -> usize {
    match button {
        Button::Primary => 0,
        Button::Secondary => 1,
    }
}
