//! Time and one-shot timers, injected so gesture logic never reads a wall
//! clock directly.

use crate::types::{Button, ContactId};

const MANUAL_TIMER_CAPACITY: usize = 16;

/// Identifies a pending one-shot timer.
///
/// Tokens carry a serial so a timer that fires after its owner was replaced
/// can be recognised as stale and ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerToken {
    Hold { contact: ContactId, serial: u32 },
    LiftDeadline { serial: u32 },
    TapRelease { button: Button, serial: u32 },
}

pub trait Scheduler {
    /// Current time in seconds on the same clock as touch timestamps.
    fn now(&self) -> f64;

    fn schedule_once(&mut self, delay: f64, token: TimerToken);

    fn cancel(&mut self, token: TimerToken);

    /// Hands out the next expired timer, for schedulers that are polled
    /// rather than calling back into the pipeline.
    fn take_due(&mut self) -> Option<TimerToken> {
        None
    }
}

/// Deterministic scheduler whose clock only moves when told to.
#[derive(Clone, Debug, Default)]
pub struct ManualScheduler {
    now: f64,
    pending: heapless::Vec<(f64, TimerToken), MANUAL_TIMER_CAPACITY>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward. Non-finite or backwards times are ignored.
    pub fn advance_to(&mut self, now: f64) {
        if now.is_finite() && now > self.now {
            self.now = now;
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|(_, t)| *t == token)
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<f64> {
        self.pending
            .iter()
            .map(|(due, _)| *due)
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl Scheduler for ManualScheduler {
    fn now(&self) -> f64 {
        self.now
    }

    fn schedule_once(&mut self, delay: f64, token: TimerToken) {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        self.cancel(token);
        if self.pending.push((self.now + delay, token)).is_err() {
            log::warn!("scheduler: timer table full, dropping {token:?}");
        }
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(_, t)| *t != token);
    }

    fn take_due(&mut self) -> Option<TimerToken> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (due, _))| *due <= self.now)
            .min_by(|(_, (a, _)), (_, (b, _))| a.total_cmp(b))?;
        Some(self.pending.remove(index).1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold(serial: u32) -> TimerToken {
        TimerToken::Hold {
            contact: ContactId(1),
            serial,
        }
    }

    #[test]
    fn timers_fire_in_deadline_order() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_once(0.5, hold(1));
        scheduler.schedule_once(0.2, TimerToken::LiftDeadline { serial: 2 });

        scheduler.advance_to(0.1);
        assert_eq!(scheduler.take_due(), None);

        scheduler.advance_to(1.0);
        assert_eq!(
            scheduler.take_due(),
            Some(TimerToken::LiftDeadline { serial: 2 })
        );
        assert_eq!(scheduler.take_due(), Some(hold(1)));
        assert_eq!(scheduler.take_due(), None);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_once(0.1, hold(1));
        scheduler.cancel(hold(1));
        scheduler.advance_to(1.0);
        assert_eq!(scheduler.take_due(), None);
    }

    #[test]
    fn rescheduling_replaces_deadline() {
        let mut scheduler = ManualScheduler::new();
        scheduler.schedule_once(0.1, hold(1));
        scheduler.schedule_once(0.4, hold(1));
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_deadline(), Some(0.4));
    }

    #[test]
    fn clock_never_runs_backwards() {
        let mut scheduler = ManualScheduler::new();
        scheduler.advance_to(2.0);
        scheduler.advance_to(1.0);
        scheduler.advance_to(f64::NAN);
        assert_eq!(scheduler.now(), 2.0);
    }

    #[test]
    fn full_table_drops_new_timers() {
        let mut scheduler = ManualScheduler::new();
        for serial in 0..(MANUAL_TIMER_CAPACITY as u32 + 4) {
            scheduler.schedule_once(1.0, TimerToken::LiftDeadline { serial });
        }
        assert_eq!(scheduler.pending(), MANUAL_TIMER_CAPACITY);
    }
}
