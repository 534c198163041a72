#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }
}

/// Stable identity of one finger for the duration of its contact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContactId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Began,
    Moved,
    Stationary,
    Ended,
    Cancelled,
}

impl TouchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

/// One contact as reported by the touch surface, in surface coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TouchContact {
    pub id: ContactId,
    pub position: Point,
    pub phase: TouchPhase,
}

impl TouchContact {
    pub const fn new(id: u64, x: f32, y: f32, phase: TouchPhase) -> Self {
        Self {
            id: ContactId(id),
            position: Point::new(x, y),
            phase,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Primary,
    Secondary,
}

impl Button {
    pub const PRIMARY_BIT: u8 = 1 << 0;
    pub const SECONDARY_BIT: u8 = 1 << 1;

    pub const fn mask(self) -> u8 {
        match self {
            Self::Primary => Self::PRIMARY_BIT,
            Self::Secondary => Self::SECONDARY_BIT,
        }
    }
}
