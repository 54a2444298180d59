//! Sidebar docking state machine for the NextPeek shell.
//!
//! The controller polls cursor and window geometry on a fixed tick and
//! decides when the sidebar slides in and out, where it docks, and how it
//! reacts to pinning and multi-monitor layouts. The OS window and screen
//! topology stay behind the [`window::DockWindow`] and
//! [`window::MonitorLayout`] seams.

pub mod controller;
pub mod events;
pub mod geometry;
pub mod window;

pub use controller::{DockController, DockTuning};
pub use events::PinStateBus;
pub use geometry::{Point, Rect};
pub use window::{DockWindow, MonitorLayout};

/// Which screen edge the sidebar is docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockSide {
    Left,
    Right,
}

/// Lifecycle of the sidebar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockPhase {
    Hidden,
    /// Sliding in.
    Showing,
    Visible,
    /// Sliding out.
    Hiding,
}
