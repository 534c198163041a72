/// Send/drop counts for one stats window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LinkStats {
    pub sent: u32,
    pub dropped: u32,
    /// Length of the window in seconds.
    pub window: f64,
}

impl LinkStats {
    pub fn attempts(&self) -> u32 {
        self.sent.saturating_add(self.dropped)
    }

    /// Fraction of frames dropped in this window, 0 when nothing was sent.
    pub fn drop_ratio(&self) -> f32 {
        match self.attempts() {
            0 => 0.0,
            attempts => self.dropped as f32 / attempts as f32,
        }
    }

    pub(crate) fn record(&mut self, sent: bool) {
        if sent {
            self.sent = self.sent.saturating_add(1);
        } else {
            self.dropped = self.dropped.saturating_add(1);
        }
    }
}
