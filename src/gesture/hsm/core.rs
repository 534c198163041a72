use super::*;

impl GestureHsm {
    /// Adds a new contact to the arena. Returns `false` when the contact is
    /// already known or there is no room left.
    pub(super) fn register(&mut self, id: ContactId, point: Point, now: f64) -> bool {
        if self.contacts.contains_key(&id) {
            log::trace!("gesture: duplicate begin for {id:?} ignored");
            return false;
        }
        if self.contacts.insert(id, Contact::new(id, point, now)).is_err() {
            log::warn!("gesture: contact arena full, dropping {id:?}");
            return false;
        }
        true
    }

    /// Marks every staged position as processed.
    pub(super) fn commit_moves(&mut self, now: f64) {
        for contact in self.contacts.values_mut() {
            contact.previous_point = contact.current_point;
            contact.last_move_time = now;
        }
    }

    pub(super) fn track_single(&mut self, context: &mut DispatchContext, id: ContactId, now: f64) {
        let slop = self.slop();
        let Some(contact) = self.contacts.get_mut(&id) else {
            return;
        };

        if !contact.moved_beyond_slop && contact.displacement() > slop {
            contact.moved_beyond_slop = true;
            if !contact.is_holding {
                if let Some(token) = contact.hold_timer.take() {
                    context.cancel(token);
                }
            }
        }

        let (dx, dy) = contact.frame_delta();
        let dt = (now - contact.last_move_time) as f32;
        if let Some(step) = self.pointer.apply_raw_delta(dx, dy, dt) {
            context.emit(GestureAction::Pointer {
                dx: step.dx,
                dy: step.dy,
            });
        }
    }

    /// Handles a hold timer addressed to the single tracked contact.
    /// Returns `false` if the token does not belong to it.
    pub(super) fn try_fire_hold(
        &mut self,
        context: &mut DispatchContext,
        id: ContactId,
        token: TimerToken,
    ) -> bool {
        let slop = self.slop();
        let Some(contact) = self.contacts.get_mut(&id) else {
            return false;
        };
        if contact.hold_timer != Some(token) {
            return false;
        }

        contact.hold_timer = None;
        if contact.is_holding || contact.moved_beyond_slop || contact.displacement() > slop {
            return true;
        }

        contact.is_holding = true;
        log::debug!("gesture: hold on {id:?}");
        context.emit(GestureAction::ButtonDown(Button::Primary));
        true
    }

    pub(super) fn finish_single(
        &mut self,
        context: &mut DispatchContext,
        contact: &Contact,
        suppress_tap: bool,
    ) {
        if contact.is_holding {
            log::debug!("gesture: hold released on {:?}", contact.id);
            context.emit(GestureAction::ButtonUp(Button::Primary));
            return;
        }
        if suppress_tap || contact.moved_beyond_slop || contact.displacement() > self.slop() {
            return;
        }
        log::debug!(
            "gesture: tap on {:?} after {:.3}s",
            contact.id,
            contact.up_time.map_or(0.0, |up| up - contact.down_time)
        );
        context.emit(GestureAction::Tap(Button::Primary));
    }

    /// Drops single-finger state before a second finger takes over.
    pub(super) fn release_single(&mut self, context: &mut DispatchContext, id: ContactId) {
        let Some(contact) = self.contacts.get_mut(&id) else {
            return;
        };
        if let Some(token) = contact.hold_timer.take() {
            context.cancel(token);
        }
        if contact.is_holding {
            contact.is_holding = false;
            log::debug!("gesture: hold on {id:?} released by second contact");
            context.emit(GestureAction::ButtonUp(Button::Primary));
        }
        self.pointer.reset();
    }

    /// Pairs the two earliest contacts and enters two-finger mode.
    pub(super) fn enter_two_finger(
        &mut self,
        context: &mut DispatchContext,
        now: f64,
    ) -> Outcome<State> {
        let Some(pair) = self.pair_earliest(now) else {
            return Handled;
        };
        for id in [pair.touch1, pair.touch2] {
            if let Some(token) = self
                .contacts
                .get_mut(&id)
                .and_then(|contact| contact.hold_timer.take())
            {
                context.cancel(token);
            }
        }

        if pair.is_tap_candidate {
            self.enter_pending(pair)
        } else {
            self.enter_scroll(pair)
        }
    }

    /// Builds a pairing context from the two contacts that went down first.
    pub(super) fn pair_earliest(&self, now: f64) -> Option<TwoFingerContext> {
        let mut first: Option<&Contact> = None;
        let mut second: Option<&Contact> = None;
        for contact in self.contacts.values() {
            match first {
                Some(current) if contact.down_time >= current.down_time => {
                    if second.is_none_or(|s| contact.down_time < s.down_time) {
                        second = Some(contact);
                    }
                }
                _ => {
                    second = first;
                    first = Some(contact);
                }
            }
        }
        let (a, b) = (first?, second?);

        let paired_in_window = (b.down_time - a.down_time).abs() <= self.pair_window();
        Some(TwoFingerContext {
            touch1: a.id,
            touch2: b.id,
            started_at: a.down_time,
            paired_in_window,
            first_lift: None,
            is_tap_candidate: paired_in_window,
            last_centroid: a.current_point.midpoint(b.current_point),
            last_scroll_at: now,
        })
    }
}
