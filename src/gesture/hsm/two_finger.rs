use super::*;
use crate::gesture::types::FirstLift;

impl GestureHsm {
    fn exceeded_slop(&mut self, id: ContactId) -> bool {
        let slop = self.slop();
        match self.contacts.get_mut(&id) {
            Some(contact) => {
                if contact.displacement() > slop {
                    contact.moved_beyond_slop = true;
                }
                contact.moved_beyond_slop
            }
            None => false,
        }
    }

    fn still_tap_candidate(&self, pair: &TwoFingerContext, now: f64) -> bool {
        pair.is_tap_candidate
            && pair.paired_in_window
            && now - pair.started_at <= self.tap_max_duration()
    }

    /// A finger beyond the tracked pair went down while pairing was pending.
    pub(super) fn on_extra_contact(
        &mut self,
        context: &mut DispatchContext,
        pair: &TwoFingerContext,
        now: f64,
    ) -> Outcome<State> {
        if pair.first_lift.is_some() && self.contacts.len() == 2 {
            if let Some(token) = self.lift_deadline.take() {
                context.cancel(token);
            }
            return match self.pair_earliest(now) {
                Some(next) => self.enter_scroll(next),
                None => Handled,
            };
        }
        Handled
    }

    pub(super) fn track_pending(
        &mut self,
        context: &mut DispatchContext,
        pair: &mut TwoFingerContext,
        now: f64,
    ) -> Outcome<State> {
        if self.contacts.len() >= 3 {
            return Handled;
        }

        if let Some(first) = pair.first_lift {
            let remaining = pair.partner_of(first.id);
            if self.exceeded_slop(remaining) {
                pair.is_tap_candidate = false;
                log::debug!("gesture: remaining contact left slop during lift window");
                return self.promote_remaining(context, pair, now);
            }
            return Handled;
        }

        let moved1 = self.exceeded_slop(pair.touch1);
        let moved2 = self.exceeded_slop(pair.touch2);
        pair.is_tap_candidate = self.still_tap_candidate(pair, now) && !moved1 && !moved2;
        if pair.is_tap_candidate {
            return Handled;
        }

        if let (Some(a), Some(b)) = (
            self.contacts.get(&pair.touch1),
            self.contacts.get(&pair.touch2),
        ) {
            pair.last_centroid = a.current_point.midpoint(b.current_point);
        }
        pair.last_scroll_at = now;
        self.enter_scroll(*pair)
    }

    pub(super) fn track_scroll(
        &mut self,
        context: &mut DispatchContext,
        pair: &mut TwoFingerContext,
        now: f64,
    ) {
        let (Some(a), Some(b)) = (
            self.contacts.get(&pair.touch1),
            self.contacts.get(&pair.touch2),
        ) else {
            return;
        };
        let centroid = a.current_point.midpoint(b.current_point);
        let centroid_dy = centroid.y - pair.last_centroid.y;
        pair.last_centroid = centroid;
        if self.contacts.len() >= 3 {
            return;
        }

        let (_, dy1) = a.frame_delta();
        let (_, dy2) = b.frame_delta();
        let ratio = self.config.gesture.dominance_ratio;
        let dy = if dy1.abs() > dy2.abs() * ratio {
            dy1
        } else if dy2.abs() > dy1.abs() * ratio {
            dy2
        } else {
            centroid_dy
        };
        if dy.abs() < self.config.gesture.scroll_jitter_floor {
            return;
        }

        let dt = (now - pair.last_scroll_at) as f32;
        pair.last_scroll_at = now;
        if let Some(delta) = self.scroll.apply_gesture_delta(dy, dt) {
            context.emit(GestureAction::Scroll { delta });
        }
    }

    pub(super) fn on_pair_lift(
        &mut self,
        context: &mut DispatchContext,
        pair: &mut TwoFingerContext,
        id: ContactId,
        now: f64,
        cancelled: bool,
        scrolling: bool,
    ) -> Outcome<State> {
        let slop = self.slop();
        let Some(mut contact) = self.contacts.remove(&id) else {
            return Handled;
        };
        contact.up_time = Some(now);
        self.cancel_hold(context, &contact);
        let moved = contact.moved_beyond_slop || contact.displacement() > slop;

        if !pair.involves(id) {
            return Handled;
        }

        if self.contacts.len() >= 2 {
            if let Some(token) = self.lift_deadline.take() {
                context.cancel(token);
            }
            return match self.pair_earliest(now) {
                Some(next) => self.enter_scroll(next),
                None => Handled,
            };
        }

        if let Some(first) = pair.first_lift {
            if let Some(token) = self.lift_deadline.take() {
                context.cancel(token);
            }
            let is_tap = !scrolling
                && self.still_tap_candidate(pair, now)
                && !first.cancelled
                && !cancelled
                && !first.moved_beyond_slop
                && !moved
                && now <= first.deadline;
            if is_tap {
                log::debug!("gesture: two-finger tap, lifts {:.3}s apart", now - first.at);
                context.emit(GestureAction::Tap(Button::Secondary));
            }
            self.end_scroll_gesture(context);
            return self.enter_idle(context);
        }

        let lift_window = self.lift_window();
        pair.first_lift = Some(FirstLift {
            id,
            at: now,
            deadline: now + lift_window,
            moved_beyond_slop: moved,
            cancelled,
        });

        let remaining = pair.partner_of(id);
        let remaining_moved = self.exceeded_slop(remaining);
        let candidate = !scrolling
            && !cancelled
            && !moved
            && !remaining_moved
            && self.still_tap_candidate(pair, now);
        pair.is_tap_candidate = candidate;

        if candidate {
            let token = TimerToken::LiftDeadline {
                serial: self.next_serial(),
            };
            self.lift_deadline = Some(token);
            context.schedule(lift_window, token);
            return Handled;
        }

        self.promote_remaining(context, pair, now)
    }

    /// Hands the finger still down after a first lift over to single-finger
    /// tracking, with a fresh start point and no tap of its own.
    pub(super) fn promote_remaining(
        &mut self,
        context: &mut DispatchContext,
        pair: &TwoFingerContext,
        now: f64,
    ) -> Outcome<State> {
        if let Some(token) = self.lift_deadline.take() {
            context.cancel(token);
        }
        self.end_scroll_gesture(context);
        self.pointer.reset();

        let Some(first) = pair.first_lift else {
            return self.enter_idle(context);
        };
        let remaining = pair.partner_of(first.id);
        match self.contacts.get_mut(&remaining) {
            Some(contact) => {
                contact.rebaseline(now);
                self.enter_single(remaining, true)
            }
            None => self.enter_idle(context),
        }
    }

    /// Closes an active scroll gesture. When no inertia follows, the pipeline
    /// is told the scroll has settled so it can drop any sub-unit remainder.
    fn end_scroll_gesture(&mut self, context: &mut DispatchContext) {
        if !self.scroll.is_gesture_active() {
            return;
        }
        self.scroll.gesture_ended();
        if !self.scroll.is_inertia_active() {
            context.emit(GestureAction::ScrollSettled);
        }
    }
}
