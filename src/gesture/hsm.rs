use statig::prelude::*;

use super::{
    types::{Contact, GestureAction, GestureStateId, TwoFingerContext},
    DispatchContext,
};
use crate::{
    config::{seconds, TouchpadConfig},
    motion::{PointerMotionEngine, ScrollMotionEngine, ScrollUpdate},
    scheduler::TimerToken,
    types::{Button, ContactId, Point},
};

mod core;
mod two_finger;

pub(super) const MAX_CONTACTS: usize = 16;

pub(super) type ContactArena = heapless::FnvIndexMap<ContactId, Contact, MAX_CONTACTS>;

#[derive(Clone, Copy, Debug)]
pub(super) enum GestureHsmEvent {
    Began {
        id: ContactId,
        point: Point,
        now: f64,
    },
    /// Records a new position for a known contact without processing it.
    Stage { id: ContactId, point: Point },
    /// Processes every staged position as one frame.
    Moved { now: f64 },
    Ended {
        id: ContactId,
        now: f64,
        cancelled: bool,
    },
    TimerFired { token: TimerToken, now: f64 },
    Tick { dt: f64 },
    Reset,
}

pub(super) struct GestureHsm {
    config: TouchpadConfig,
    contacts: ContactArena,
    pointer: PointerMotionEngine,
    scroll: ScrollMotionEngine,
    lift_deadline: Option<TimerToken>,
    next_serial: u32,
    state_id: GestureStateId,
}

#[state_machine(initial = "State::idle()")]
impl GestureHsm {
    #[state(superstate = "tracking")]
    fn idle(&mut self, context: &mut DispatchContext, event: &GestureHsmEvent) -> Outcome<State> {
        match event {
            GestureHsmEvent::Began { id, point, now } => {
                if !self.register(*id, *point, *now) {
                    return Handled;
                }
                match self.contacts.len() {
                    1 => {
                        self.arm_hold(context, *id);
                        self.enter_single(*id, false)
                    }
                    2 => self.enter_two_finger(context, *now),
                    _ => Handled,
                }
            }
            GestureHsmEvent::Moved { now } => {
                self.commit_moves(*now);
                Handled
            }
            GestureHsmEvent::Ended { id, .. } => {
                if let Some(contact) = self.contacts.remove(id) {
                    self.cancel_hold(context, &contact);
                }
                Handled
            }
            _ => Super,
        }
    }

    #[state(superstate = "tracking")]
    fn single_active(
        &mut self,
        id: &mut ContactId,
        suppress_tap: &mut bool,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Began { id: new_id, point, now } => {
                if !self.register(*new_id, *point, *now) {
                    return Handled;
                }
                if self.contacts.len() == 2 {
                    self.release_single(context, *id);
                    return self.enter_two_finger(context, *now);
                }
                Handled
            }
            GestureHsmEvent::Moved { now } => {
                self.track_single(context, *id, *now);
                self.commit_moves(*now);
                Handled
            }
            GestureHsmEvent::Ended { id: ended, now, cancelled } => {
                let Some(mut contact) = self.contacts.remove(ended) else {
                    return Handled;
                };
                contact.up_time = Some(*now);
                self.cancel_hold(context, &contact);

                if *ended == *id {
                    self.finish_single(context, &contact, *suppress_tap || *cancelled);
                }
                if self.contacts.is_empty() {
                    return self.enter_idle(context);
                }
                Handled
            }
            GestureHsmEvent::TimerFired { token, .. } => {
                if self.try_fire_hold(context, *id, *token) {
                    Handled
                } else {
                    Super
                }
            }
            _ => Super,
        }
    }

    #[state(superstate = "tracking")]
    fn two_finger_pending(
        &mut self,
        pair: &mut TwoFingerContext,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Began { id, point, now } => {
                if !self.register(*id, *point, *now) {
                    return Handled;
                }
                self.on_extra_contact(context, pair, *now)
            }
            GestureHsmEvent::Moved { now } => {
                let outcome = self.track_pending(context, pair, *now);
                self.commit_moves(*now);
                outcome
            }
            GestureHsmEvent::Ended { id, now, cancelled } => {
                self.on_pair_lift(context, pair, *id, *now, *cancelled, false)
            }
            GestureHsmEvent::TimerFired { token, now } => {
                if self.lift_deadline == Some(*token) && pair.first_lift.is_some() {
                    self.lift_deadline = None;
                    log::debug!("gesture: lift window expired, promoting remaining contact");
                    return self.promote_remaining(context, pair, *now);
                }
                Super
            }
            _ => Super,
        }
    }

    #[state(superstate = "tracking")]
    fn two_finger_scroll(
        &mut self,
        pair: &mut TwoFingerContext,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Began { id, point, now } => {
                self.register(*id, *point, *now);
                Handled
            }
            GestureHsmEvent::Moved { now } => {
                self.track_scroll(context, pair, *now);
                self.commit_moves(*now);
                Handled
            }
            GestureHsmEvent::Ended { id, now, cancelled } => {
                self.on_pair_lift(context, pair, *id, *now, *cancelled, true)
            }
            _ => Super,
        }
    }

    #[superstate]
    fn tracking(
        &mut self,
        context: &mut DispatchContext,
        event: &GestureHsmEvent,
    ) -> Outcome<State> {
        match event {
            GestureHsmEvent::Stage { id, point } => {
                if let Some(contact) = self.contacts.get_mut(id) {
                    contact.current_point = *point;
                } else {
                    log::trace!("gesture: move for unknown contact {id:?} skipped");
                }
                Handled
            }
            GestureHsmEvent::Tick { dt } => {
                match self.scroll.update(*dt as f32) {
                    ScrollUpdate::Idle => {}
                    ScrollUpdate::Delta(delta) => {
                        context.emit(GestureAction::Scroll { delta });
                    }
                    ScrollUpdate::Settled => context.emit(GestureAction::ScrollSettled),
                }
                Handled
            }
            GestureHsmEvent::TimerFired { token, .. } => {
                log::trace!("gesture: stale timer {token:?} ignored");
                Handled
            }
            GestureHsmEvent::Reset => {
                self.teardown(context);
                if self.scroll.is_gesture_active() || self.scroll.is_inertia_active() {
                    context.emit(GestureAction::ScrollSettled);
                }
                self.scroll.reset();
                self.state_id = GestureStateId::Idle;
                Transition(State::idle())
            }
            _ => Handled,
        }
    }
}

impl GestureHsm {
    pub(super) fn new(config: TouchpadConfig) -> Self {
        Self {
            config,
            contacts: ContactArena::new(),
            pointer: PointerMotionEngine::new(config.pointer_curve),
            scroll: ScrollMotionEngine::new(config.scroll_curve, config.scroll),
            lift_deadline: None,
            next_serial: 0,
            state_id: GestureStateId::Idle,
        }
    }

    pub(super) fn state_id(&self) -> GestureStateId {
        self.state_id
    }

    pub(super) fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub(super) fn scroll_engine(&self) -> &ScrollMotionEngine {
        &self.scroll
    }

    fn hold_delay(&self) -> f64 {
        seconds(self.config.gesture.hold_delay_ms)
    }

    fn lift_window(&self) -> f64 {
        seconds(self.config.gesture.lift_window_ms)
    }

    fn pair_window(&self) -> f64 {
        seconds(self.config.gesture.pair_window_ms)
    }

    fn tap_max_duration(&self) -> f64 {
        seconds(self.config.gesture.tap_max_duration_ms)
    }

    fn slop(&self) -> f32 {
        self.config.gesture.move_slop_px
    }

    fn next_serial(&mut self) -> u32 {
        self.next_serial = self.next_serial.wrapping_add(1);
        self.next_serial
    }

    fn enter_idle(&mut self, context: &mut DispatchContext) -> Outcome<State> {
        self.teardown(context);
        log::debug!("gesture: -> idle");
        self.state_id = GestureStateId::Idle;
        Transition(State::idle())
    }

    fn enter_single(&mut self, id: ContactId, suppress_tap: bool) -> Outcome<State> {
        log::debug!("gesture: -> single {id:?} (suppress_tap={suppress_tap})");
        self.state_id = GestureStateId::SingleActive;
        Transition(State::single_active(id, suppress_tap))
    }

    fn enter_pending(&mut self, pair: TwoFingerContext) -> Outcome<State> {
        log::debug!(
            "gesture: -> two-finger pending {:?}+{:?}",
            pair.touch1,
            pair.touch2
        );
        self.state_id = GestureStateId::TwoFingerPending;
        Transition(State::two_finger_pending(pair))
    }

    fn enter_scroll(&mut self, pair: TwoFingerContext) -> Outcome<State> {
        log::debug!(
            "gesture: -> two-finger scroll {:?}+{:?}",
            pair.touch1,
            pair.touch2
        );
        self.state_id = GestureStateId::TwoFingerScroll;
        Transition(State::two_finger_scroll(pair))
    }

    fn arm_hold(&mut self, context: &mut DispatchContext, id: ContactId) {
        let serial = self.next_serial();
        let token = TimerToken::Hold {
            contact: id,
            serial,
        };
        let delay = self.hold_delay();
        if let Some(contact) = self.contacts.get_mut(&id) {
            contact.hold_timer = Some(token);
            context.schedule(delay, token);
        }
    }

    fn cancel_hold(&mut self, context: &mut DispatchContext, contact: &Contact) {
        if let Some(token) = contact.hold_timer {
            context.cancel(token);
        }
    }

    /// Clears every contact and timer owned by the current gesture.
    fn teardown(&mut self, context: &mut DispatchContext) {
        for contact in self.contacts.values() {
            if let Some(token) = contact.hold_timer {
                context.cancel(token);
            }
            if contact.is_holding {
                context.emit(GestureAction::ButtonUp(Button::Primary));
            }
        }
        self.contacts.clear();
        if let Some(token) = self.lift_deadline.take() {
            context.cancel(token);
        }
        self.pointer.reset();
    }
}
