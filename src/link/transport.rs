use super::{Link, LinkStats, Packet, SendOutcome};
use crate::{config::LinkConfig, types::Button};

/// Collects button and motion state between ticks and turns it into at most
/// one pointer frame and one scroll frame per tick.
///
/// Nothing is queued: a frame the link refuses is counted as dropped and its
/// motion is lost.
pub struct LinkTransport<L: Link> {
    link: L,
    buttons: u8,
    /// Buttons pressed since the last sent frame, released or not.
    latched: u8,
    dirty: bool,
    pending_dx: i32,
    pending_dy: i32,
    pending_scroll: i32,
    stats: LinkStats,
    stats_interval: f64,
}

impl<L: Link> LinkTransport<L> {
    pub fn new(link: L, config: &LinkConfig) -> Self {
        Self {
            link,
            buttons: 0,
            latched: 0,
            dirty: false,
            pending_dx: 0,
            pending_dy: 0,
            pending_scroll: 0,
            stats: LinkStats::default(),
            stats_interval: config.stats_interval(),
        }
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn into_link(self) -> L {
        self.link
    }

    /// Buttons currently held down.
    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    /// Counters for the stats window in progress.
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
        self.latched |= button.mask();
        self.dirty = true;
    }

    pub fn release(&mut self, button: Button) {
        if self.buttons & button.mask() != 0 {
            self.buttons &= !button.mask();
            self.dirty = true;
        }
    }

    pub fn add_pointer(&mut self, dx: i32, dy: i32) {
        self.pending_dx = self.pending_dx.saturating_add(dx);
        self.pending_dy = self.pending_dy.saturating_add(dy);
    }

    pub fn add_scroll(&mut self, units: i32) {
        self.pending_scroll = self.pending_scroll.saturating_add(units);
    }

    /// Sends whatever is due and advances the stats window by `dt` seconds.
    /// Returns the finished window's counters when one closes.
    pub fn tick(&mut self, dt: f64) -> Option<LinkStats> {
        let mask = self.buttons | self.latched;
        if mask != 0 || self.dirty || self.pending_dx != 0 || self.pending_dy != 0 {
            let packet = Packet::pointer(mask, self.pending_dx, self.pending_dy);
            self.pending_dx = 0;
            self.pending_dy = 0;
            if self.send(&packet) {
                self.latched = 0;
                // a click released before this frame still owes a release frame
                self.dirty = mask != self.buttons;
            }
        }

        if self.pending_scroll != 0 {
            let packet = Packet::scroll(self.buttons, self.pending_scroll);
            self.pending_scroll = 0;
            self.send(&packet);
        }

        self.advance_window(dt)
    }

    fn send(&mut self, packet: &Packet) -> bool {
        let sent = self.link.can_send_now()
            && self.link.try_send(&packet.encode()) == SendOutcome::Sent;
        if !sent {
            log::trace!("link: dropped {packet:?}");
        }
        self.stats.record(sent);
        sent
    }

    fn advance_window(&mut self, dt: f64) -> Option<LinkStats> {
        if dt.is_finite() && dt > 0.0 {
            self.stats.window += dt;
        }
        if self.stats.window < self.stats_interval {
            return None;
        }

        let snapshot = self.stats;
        log::info!(
            "link: sent={} dropped={} over {:.1}s",
            snapshot.sent,
            snapshot.dropped,
            snapshot.window
        );
        self.stats = LinkStats::default();
        Some(snapshot)
    }
}
