use super::{Link, Packet, SendOutcome, FRAME_LEN};

/// In-memory link that records every accepted frame.
///
/// Back-pressure is simulated with [`CaptureLink::set_accepting`].
#[derive(Clone, Debug)]
pub struct CaptureLink {
    frames: Vec<[u8; FRAME_LEN]>,
    accepting: bool,
    rejected: usize,
}

impl Default for CaptureLink {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureLink {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            accepting: true,
            rejected: 0,
        }
    }

    pub fn set_accepting(&mut self, accepting: bool) {
        self.accepting = accepting;
    }

    pub fn frames(&self) -> &[[u8; FRAME_LEN]] {
        &self.frames
    }

    /// Decoded view of the captured frames; undecodable frames are skipped.
    pub fn packets(&self) -> Vec<Packet> {
        self.frames.iter().filter_map(Packet::decode).collect()
    }

    pub fn take_frames(&mut self) -> Vec<[u8; FRAME_LEN]> {
        core::mem::take(&mut self.frames)
    }

    /// Frames turned away while the link was not accepting.
    pub fn rejected(&self) -> usize {
        self.rejected
    }
}

impl Link for CaptureLink {
    fn can_send_now(&self) -> bool {
        self.accepting
    }

    fn try_send(&mut self, frame: &[u8; FRAME_LEN]) -> SendOutcome {
        if !self.accepting {
            self.rejected += 1;
            return SendOutcome::WouldBlock;
        }
        self.frames.push(*frame);
        SendOutcome::Sent
    }
}
