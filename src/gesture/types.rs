use crate::{
    scheduler::TimerToken,
    types::{Button, ContactId, Point},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureAction {
    ButtonDown(Button),
    ButtonUp(Button),
    /// A click: press now, release after the configured tap delay.
    Tap(Button),
    Pointer {
        dx: i32,
        dy: i32,
    },
    Scroll {
        delta: f32,
    },
    /// Inertia finished; fractional scroll carry can be dropped.
    ScrollSettled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureStateId {
    #[default]
    Idle,
    SingleActive,
    TwoFingerPending,
    TwoFingerScroll,
}

const MAX_ACTIONS: usize = 16;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureOutput {
    pub actions: heapless::Vec<GestureAction, MAX_ACTIONS>,
}

impl GestureOutput {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureAction> {
        self.actions.iter()
    }

    pub fn taps(&self, button: Button) -> usize {
        self.iter()
            .filter(|action| **action == GestureAction::Tap(button))
            .count()
    }

    pub(crate) fn extend(&mut self, other: &GestureOutput) {
        for action in other.iter() {
            self.push(*action);
        }
    }

    pub(crate) fn push(&mut self, action: GestureAction) {
        if self.actions.push(action).is_err() {
            log::warn!("gesture: action buffer full, dropping {action:?}");
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TimerCommand {
    Schedule { delay: f64, token: TimerToken },
    Cancel(TimerToken),
}

/// Per-finger bookkeeping, owned by the classifier's contact arena.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Contact {
    pub(crate) id: ContactId,
    pub(crate) start_point: Point,
    /// Last position the state machine has processed.
    pub(crate) previous_point: Point,
    /// Latest reported position, not yet processed.
    pub(crate) current_point: Point,
    pub(crate) down_time: f64,
    pub(crate) last_move_time: f64,
    pub(crate) up_time: Option<f64>,
    pub(crate) moved_beyond_slop: bool,
    pub(crate) is_holding: bool,
    pub(crate) hold_timer: Option<TimerToken>,
}

impl Contact {
    pub(crate) fn new(id: ContactId, point: Point, now: f64) -> Self {
        Self {
            id,
            start_point: point,
            previous_point: point,
            current_point: point,
            down_time: now,
            last_move_time: now,
            up_time: None,
            moved_beyond_slop: false,
            is_holding: false,
            hold_timer: None,
        }
    }

    pub(crate) fn displacement(&self) -> f32 {
        self.start_point.distance(self.current_point)
    }

    pub(crate) fn frame_delta(&self) -> (f32, f32) {
        (
            self.current_point.x - self.previous_point.x,
            self.current_point.y - self.previous_point.y,
        )
    }

    /// Moves the start point to where the finger is now and forgets any
    /// hold/slop history.
    pub(crate) fn rebaseline(&mut self, now: f64) {
        self.start_point = self.current_point;
        self.previous_point = self.current_point;
        self.last_move_time = now;
        self.moved_beyond_slop = false;
        self.is_holding = false;
        self.hold_timer = None;
    }
}

/// The lifted half of a two-finger gesture, kept after its contact is gone.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FirstLift {
    pub(crate) id: ContactId,
    pub(crate) at: f64,
    pub(crate) deadline: f64,
    pub(crate) moved_beyond_slop: bool,
    pub(crate) cancelled: bool,
}

/// Pairing state of a two-finger gesture.
///
/// `touch1` went down first. Both ids name registered contacts, except the one
/// recorded in `first_lift` once that finger has left the surface.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TwoFingerContext {
    pub(crate) touch1: ContactId,
    pub(crate) touch2: ContactId,
    pub(crate) started_at: f64,
    pub(crate) paired_in_window: bool,
    pub(crate) first_lift: Option<FirstLift>,
    pub(crate) is_tap_candidate: bool,
    pub(crate) last_centroid: Point,
    pub(crate) last_scroll_at: f64,
}

impl TwoFingerContext {
    pub(crate) fn involves(&self, id: ContactId) -> bool {
        self.touch1 == id || self.touch2 == id
    }

    pub(crate) fn partner_of(&self, id: ContactId) -> ContactId {
        if self.touch1 == id {
            self.touch2
        } else {
            self.touch1
        }
    }
}
