// ── Cursor shapes and pointer modes ───────────────────────────────────────────

use serde::{Deserialize, Serialize};

use crate::platform::NativeCursor;

/// Cursor shapes the host can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorShape {
    Arrow,
    Ibeam,
    PointingHand,
    Cross,
    Wait,
    Busy,
    Drag,
    CanDrop,
    Forbidden,
    Vsize,
    Hsize,
    Bdiagsize,
    Fdiagsize,
    Move,
    Vsplit,
    Hsplit,
    Help,
}

impl CursorShape {
    pub fn native(self) -> NativeCursor {
        match self {
            Self::Arrow => NativeCursor::SystemDefault,
            Self::Ibeam => NativeCursor::IBeam,
            Self::PointingHand => NativeCursor::FollowLink,
            Self::Cross => NativeCursor::CrossHair,
            Self::Wait | Self::Busy => NativeCursor::Progress,
            Self::Drag => NativeCursor::Grabbing,
            Self::CanDrop => NativeCursor::Grab,
            Self::Forbidden => NativeCursor::NotAllowed,
            Self::Vsize | Self::Vsplit => NativeCursor::ResizeNorthSouth,
            Self::Hsize | Self::Hsplit => NativeCursor::ResizeEastWest,
            Self::Bdiagsize => NativeCursor::ResizeNorthEastSouthWest,
            Self::Fdiagsize => NativeCursor::ResizeNorthWestSouthEast,
            Self::Move => NativeCursor::Move,
            Self::Help => NativeCursor::Help,
        }
    }
}

/// How the pointer behaves relative to the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseMode {
    #[default]
    Visible,
    Hidden,
    /// Hidden and held inside the window; warps only move the logical position.
    Captured,
    /// Visible but held inside the window.
    Confined,
}

impl MouseMode {
    pub fn shows_cursor(self) -> bool {
        matches!(self, Self::Visible | Self::Confined)
    }

    pub fn grabs_cursor(self) -> bool {
        matches!(self, Self::Captured | Self::Confined)
    }
}
