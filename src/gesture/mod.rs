//! Multi-touch gesture classification.
//!
//! [`GestureClassifier`] turns contact updates into pointer motion, primary
//! taps and holds, two-finger secondary taps and two-finger scrolling. The
//! state machine underneath is a `statig` HSM; pairing data for two-finger
//! gestures lives in the two-finger states themselves.

use statig::blocking::IntoStateMachineExt as _;

use crate::{
    config::TouchpadConfig,
    scheduler::{Scheduler, TimerToken},
    types::{TouchContact, TouchPhase},
};

mod hsm;
mod types;


pub use types::{GestureAction, GestureOutput, GestureStateId};

use hsm::{GestureHsm, GestureHsmEvent};
use types::TimerCommand;

const MAX_TIMER_COMMANDS: usize = 8;

#[derive(Default)]
pub(super) struct DispatchContext {
    actions: GestureOutput,
    timers: heapless::Vec<TimerCommand, MAX_TIMER_COMMANDS>,
}

impl DispatchContext {
    fn emit(&mut self, action: GestureAction) {
        self.actions.push(action);
    }

    fn schedule(&mut self, delay: f64, token: TimerToken) {
        self.push_timer(TimerCommand::Schedule { delay, token });
    }

    fn cancel(&mut self, token: TimerToken) {
        self.push_timer(TimerCommand::Cancel(token));
    }

    fn push_timer(&mut self, command: TimerCommand) {
        if self.timers.push(command).is_err() {
            log::warn!("gesture: timer command buffer full, dropping {command:?}");
        }
    }

    fn finish(self, scheduler: &mut impl Scheduler) -> GestureOutput {
        for command in &self.timers {
            match *command {
                TimerCommand::Schedule { delay, token } => scheduler.schedule_once(delay, token),
                TimerCommand::Cancel(token) => scheduler.cancel(token),
            }
        }
        self.actions
    }
}

pub struct GestureClassifier {
    machine: statig::blocking::StateMachine<GestureHsm>,
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(&TouchpadConfig::default())
    }
}

impl GestureClassifier {
    pub fn new(config: &TouchpadConfig) -> Self {
        Self {
            machine: GestureHsm::new(*config).state_machine(),
        }
    }

    /// Processes one surface report. Contacts in a terminal phase are removed
    /// after every position in the report has been applied.
    pub fn touches_changed(
        &mut self,
        contacts: &[TouchContact],
        timestamp: f64,
        scheduler: &mut impl Scheduler,
    ) -> GestureOutput {
        if !valid_timestamp(timestamp) {
            log::trace!("gesture: report with bad timestamp {timestamp} skipped");
            return GestureOutput::default();
        }

        let mut context = DispatchContext::default();
        for contact in contacts
            .iter()
            .filter(|contact| contact.phase == TouchPhase::Began)
        {
            if !contact.position.is_finite() {
                log::trace!("gesture: begin for {:?} at non-finite point", contact.id);
                continue;
            }
            self.dispatch(
                &GestureHsmEvent::Began {
                    id: contact.id,
                    point: contact.position,
                    now: timestamp,
                },
                &mut context,
            );
        }

        let mut staged = false;
        for contact in contacts
            .iter()
            .filter(|contact| contact.phase != TouchPhase::Began)
        {
            if !contact.position.is_finite() {
                log::trace!("gesture: move for {:?} at non-finite point", contact.id);
                continue;
            }
            self.dispatch(
                &GestureHsmEvent::Stage {
                    id: contact.id,
                    point: contact.position,
                },
                &mut context,
            );
            staged = true;
        }
        if staged {
            self.dispatch(&GestureHsmEvent::Moved { now: timestamp }, &mut context);
        }

        for contact in contacts.iter().filter(|contact| contact.phase.is_terminal()) {
            self.dispatch(
                &GestureHsmEvent::Ended {
                    id: contact.id,
                    now: timestamp,
                    cancelled: contact.phase == TouchPhase::Cancelled,
                },
                &mut context,
            );
        }

        context.finish(scheduler)
    }

    /// Processes contacts that left the surface. Every contact is treated as
    /// ended unless it reports `Cancelled`.
    pub fn touches_ended(
        &mut self,
        contacts: &[TouchContact],
        timestamp: f64,
        scheduler: &mut impl Scheduler,
    ) -> GestureOutput {
        let mut ended: heapless::Vec<TouchContact, { hsm::MAX_CONTACTS }> = heapless::Vec::new();
        for contact in contacts {
            let phase = if contact.phase == TouchPhase::Cancelled {
                TouchPhase::Cancelled
            } else {
                TouchPhase::Ended
            };
            if ended.push(TouchContact { phase, ..*contact }).is_err() {
                log::warn!("gesture: too many ended contacts, dropping {:?}", contact.id);
            }
        }
        self.touches_changed(&ended, timestamp, scheduler)
    }

    /// Delivers an expired one-shot timer. Tokens that no longer match any
    /// pending hold or lift deadline are ignored.
    pub fn timer_fired(
        &mut self,
        token: TimerToken,
        scheduler: &mut impl Scheduler,
    ) -> GestureOutput {
        let now = scheduler.now();
        let mut context = DispatchContext::default();
        self.dispatch(&GestureHsmEvent::TimerFired { token, now }, &mut context);
        context.finish(scheduler)
    }

    /// Advances scroll inertia by `dt` seconds.
    pub fn tick(&mut self, dt: f64, scheduler: &mut impl Scheduler) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.dispatch(&GestureHsmEvent::Tick { dt }, &mut context);
        context.finish(scheduler)
    }

    /// Drops every contact, timer and motion carry and returns to idle.
    pub fn reset(&mut self, scheduler: &mut impl Scheduler) -> GestureOutput {
        let mut context = DispatchContext::default();
        self.dispatch(&GestureHsmEvent::Reset, &mut context);
        context.finish(scheduler)
    }

    pub fn state(&self) -> GestureStateId {
        self.machine.inner().state_id()
    }

    pub fn contact_count(&self) -> usize {
        self.machine.inner().contact_count()
    }

    pub fn is_scrolling(&self) -> bool {
        let scroll = self.machine.inner().scroll_engine();
        scroll.is_gesture_active() || scroll.is_inertia_active()
    }

    fn dispatch(&mut self, event: &GestureHsmEvent, context: &mut DispatchContext) {
        self.machine.handle_with_context(event, context);
    }
}

fn valid_timestamp(timestamp: f64) -> bool {
    timestamp.is_finite() && timestamp >= 0.0
}
