use bitflags::bitflags;

use crate::window::WindowChange;

bitflags! {
    /// The `state` bitmask of `org_kde_lingmo_window_management`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowState: u32 {
        const ACTIVE = 1;
        const MINIMIZED = 1 << 1;
        const MAXIMIZED = 1 << 2;
        const FULLSCREEN = 1 << 3;
        const KEEP_ABOVE = 1 << 4;
        const KEEP_BELOW = 1 << 5;
        const ON_ALL_DESKTOPS = 1 << 6;
        const DEMANDS_ATTENTION = 1 << 7;
        const CLOSEABLE = 1 << 8;
        const MINIMIZABLE = 1 << 9;
        const MAXIMIZABLE = 1 << 10;
        const FULLSCREENABLE = 1 << 11;
        const SKIP_TASKBAR = 1 << 12;
        const SHADEABLE = 1 << 13;
        const SHADED = 1 << 14;
        const MOVABLE = 1 << 15;
        const RESIZABLE = 1 << 16;
        const VIRTUAL_DESKTOP_CHANGEABLE = 1 << 17;
        const SKIP_SWITCHER = 1 << 18;
    }
}

/// every bit of the mask and the field notification it maps to
pub(crate) const STATE_FIELDS: [(WindowState, WindowChange); 19] = [
    (WindowState::ACTIVE, WindowChange::Active),
    (WindowState::MINIMIZED, WindowChange::Minimized),
    (WindowState::MAXIMIZED, WindowChange::Maximized),
    (WindowState::FULLSCREEN, WindowChange::Fullscreen),
    (WindowState::KEEP_ABOVE, WindowChange::KeepAbove),
    (WindowState::KEEP_BELOW, WindowChange::KeepBelow),
    (WindowState::ON_ALL_DESKTOPS, WindowChange::OnAllDesktops),
    (WindowState::DEMANDS_ATTENTION, WindowChange::DemandsAttention),
    (WindowState::CLOSEABLE, WindowChange::Closeable),
    (WindowState::MINIMIZABLE, WindowChange::Minimizeable),
    (WindowState::MAXIMIZABLE, WindowChange::Maximizeable),
    (WindowState::FULLSCREENABLE, WindowChange::Fullscreenable),
    (WindowState::SKIP_TASKBAR, WindowChange::SkipTaskbar),
    (WindowState::SHADEABLE, WindowChange::Shadeable),
    (WindowState::SHADED, WindowChange::Shaded),
    (WindowState::MOVABLE, WindowChange::Movable),
    (WindowState::RESIZABLE, WindowChange::Resizable),
    (
        WindowState::VIRTUAL_DESKTOP_CHANGEABLE,
        WindowChange::VirtualDesktopChangeable,
    ),
    (WindowState::SKIP_SWITCHER, WindowChange::SkipSwitcher),
];

impl WindowState {
    /// Decode a wire mask. Bits this crate does not know about are dropped.
    pub fn from_wire(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }

    /// The field notifications needed to go from `self` to `other`, in bit order
    pub fn changes_to(self, other: WindowState) -> Vec<WindowChange> {
        STATE_FIELDS
            .iter()
            .filter(|(flag, _)| self.contains(*flag) != other.contains(*flag))
            .map(|(_, change)| change.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
