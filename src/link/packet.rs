use crate::types::Button;

pub const FRAME_LEN: usize = 6;

/// Second byte of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Pointer = 0x00,
    /// `dy` carries scroll units, `dx` is always zero.
    Scroll = 0x01,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Pointer),
            0x01 => Some(Self::Scroll),
            _ => None,
        }
    }
}

/// One outbound frame: button mask, kind tag, then `dx` and `dy` as
/// little-endian `i16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Packet {
    pub buttons: u8,
    pub kind: FrameKind,
    pub dx: i16,
    pub dy: i16,
}

impl Packet {
    pub fn pointer(buttons: u8, dx: i32, dy: i32) -> Self {
        Self {
            buttons,
            kind: FrameKind::Pointer,
            dx: clamp_i16(dx),
            dy: clamp_i16(dy),
        }
    }

    pub fn scroll(buttons: u8, units: i32) -> Self {
        Self {
            buttons,
            kind: FrameKind::Scroll,
            dx: 0,
            dy: clamp_i16(units),
        }
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let dx = self.dx.to_le_bytes();
        let dy = self.dy.to_le_bytes();
        [self.buttons, self.kind as u8, dx[0], dx[1], dy[0], dy[1]]
    }

    /// Parses a frame. Unknown kind tags yield `None`.
    pub fn decode(frame: &[u8; FRAME_LEN]) -> Option<Self> {
        Some(Self {
            buttons: frame[0],
            kind: FrameKind::from_byte(frame[1])?,
            dx: i16::from_le_bytes([frame[2], frame[3]]),
            dy: i16::from_le_bytes([frame[4], frame[5]]),
        })
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_frame_layout() {
        let frame = Packet::pointer(Button::PRIMARY_BIT, 300, -2).encode();
        assert_eq!(frame, [0x01, 0x00, 0x2c, 0x01, 0xfe, 0xff]);
    }

    #[test]
    fn scroll_frame_uses_dy_only() {
        let packet = Packet::scroll(0, -3);
        assert_eq!(packet.encode(), [0x00, 0x01, 0x00, 0x00, 0xfd, 0xff]);
        assert_eq!(Packet::decode(&packet.encode()), Some(packet));
    }

    #[test]
    fn deltas_saturate_at_i16_range() {
        let packet = Packet::pointer(0, 100_000, -100_000);
        assert_eq!(packet.dx, i16::MAX);
        assert_eq!(packet.dy, i16::MIN);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(Packet::decode(&[0, 0x7f, 0, 0, 0, 0]), None);
    }

    #[test]
    fn button_bits() {
        let packet = Packet::pointer(Button::SECONDARY_BIT, 0, 0);
        assert!(packet.is_pressed(Button::Secondary));
        assert!(!packet.is_pressed(Button::Primary));
    }
}
