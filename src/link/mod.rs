//! Outbound frame pacing over a lossy, flow-controlled link.

mod capture;
mod counters;
mod packet;
mod transport;


pub use capture::CaptureLink;
pub use counters::LinkStats;
pub use packet::{FrameKind, Packet, FRAME_LEN};
pub use transport::LinkTransport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// The link had no room; the frame was not taken.
    WouldBlock,
}

/// Best-effort sink for encoded frames. Implementations must never block.
pub trait Link {
    fn can_send_now(&self) -> bool;

    fn try_send(&mut self, frame: &[u8; FRAME_LEN]) -> SendOutcome;
}

impl<L: Link + ?Sized> Link for &mut L {
    fn can_send_now(&self) -> bool {
        (**self).can_send_now()
    }

    fn try_send(&mut self, frame: &[u8; FRAME_LEN]) -> SendOutcome {
        (**self).try_send(frame)
    }
}
