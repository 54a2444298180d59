//! Seams between the docking controller and the desktop shell.
//!
//! The shell owns the real OS window and screen topology; the controller
//! only ever touches them through these traits, which keeps the state
//! machine testable without a display server.

use crate::DockSide;
use crate::geometry::{Point, Rect};

/// The sidebar window, as the controller sees it.
pub trait DockWindow {
    fn bounds(&self) -> Rect;
    fn set_bounds(&mut self, bounds: Rect);
    fn show(&mut self);
    fn hide(&mut self);
    /// Toggle whether the window receives mouse events. Disabled while the
    /// sidebar slides out so a vanishing window cannot swallow clicks.
    fn set_mouse_interaction(&mut self, enabled: bool);
    /// True once the window has been closed; every controller path checks
    /// this before acting.
    fn is_destroyed(&self) -> bool;
}

/// Screen topology around the sidebar.
pub trait MonitorLayout {
    /// Work area of the monitor the given bounds sit on.
    fn work_area_for(&self, bounds: &Rect) -> Rect;
    /// True if another monitor continues past the given edge of this work
    /// area.
    fn has_adjacent_monitor(&self, work_area: &Rect, side: DockSide) -> bool;
    /// Absolute cursor position.
    fn cursor_position(&self) -> Point;
}
