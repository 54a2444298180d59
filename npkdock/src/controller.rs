//! The sidebar docking state machine.
//!
//! A fixed-cadence tick reads the cursor and window bounds and drives the
//! show/hide lifecycle: trigger-band detection with a debounced show
//! delay, a cooldown against immediate re-triggers, fixed-step slide
//! animations, and a hide guard for edges another monitor continues past.
//! Pinning freezes the machine in the visible state.

use std::time::{Duration, Instant};

use tracing::debug;

use npkutils::{Cooldown, DelayGate};

use crate::events::PinStateBus;
use crate::geometry::{Rect, approx_eq, docked_bounds, hidden_x, nearest_side};
use crate::window::{DockWindow, MonitorLayout};
use crate::{DockPhase, DockSide};

/// Docking timing and geometry knobs.
#[derive(Debug, Clone)]
pub struct DockTuning {
    pub tick: Duration,
    /// Width of the edge band that triggers a show, in pixels.
    pub trigger_band_px: i32,
    pub show_delay: Duration,
    pub hide_delay: Duration,
    pub show_cooldown: Duration,
    pub animation: Duration,
    /// Sidebar width = work area width / this.
    pub width_fraction: i32,
    /// Pixels left visible when hidden.
    pub hide_reveal_px: i32,
    pub snap_tolerance_px: i32,
}

impl Default for DockTuning {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(50),
            trigger_band_px: 3,
            show_delay: Duration::from_millis(200),
            hide_delay: Duration::from_millis(400),
            show_cooldown: Duration::from_millis(500),
            animation: Duration::from_millis(250),
            width_fraction: 5,
            hide_reveal_px: 2,
            snap_tolerance_px: 8,
        }
    }
}

impl DockTuning {
    pub fn from_config() -> Self {
        let config = npkconfig::get_config();
        Self {
            tick: Duration::from_millis(config.get_dock_tick_ms()),
            trigger_band_px: config.get_dock_trigger_band_px() as i32,
            show_delay: Duration::from_millis(config.get_dock_show_delay_ms()),
            hide_delay: Duration::from_millis(config.get_dock_hide_delay_ms()),
            show_cooldown: Duration::from_millis(config.get_dock_show_cooldown_ms()),
            animation: Duration::from_millis(config.get_dock_animation_ms()),
            width_fraction: config.get_dock_width_fraction() as i32,
            hide_reveal_px: config.get_dock_hide_reveal_px() as i32,
            snap_tolerance_px: config.get_dock_snap_tolerance_px() as i32,
        }
    }
}

/// Fixed-step linear slide toward a target x.
#[derive(Debug, Clone)]
struct Animation {
    target_x: i32,
    step_px: i32,
}

impl Animation {
    fn new(from_x: i32, target_x: i32, tuning: &DockTuning) -> Self {
        let ticks = (tuning.animation.as_millis() / tuning.tick.as_millis().max(1)).max(1) as i32;
        let step_px = ((target_x - from_x).abs() / ticks).max(1);
        Self { target_x, step_px }
    }

    fn step_from(&self, x: i32) -> i32 {
        let distance = self.target_x - x;
        if distance.abs() <= self.step_px {
            self.target_x
        } else {
            x + self.step_px * distance.signum()
        }
    }
}

pub struct DockController<W: DockWindow, M: MonitorLayout> {
    window: W,
    monitors: M,
    side: DockSide,
    phase: DockPhase,
    pinned: bool,
    show_gate: DelayGate,
    hide_gate: DelayGate,
    show_cooldown: Cooldown,
    animation: Option<Animation>,
    pin_bus: PinStateBus,
    tuning: DockTuning,
}

impl<W: DockWindow, M: MonitorLayout> DockController<W, M> {
    /// The sidebar starts pinned and visible, docked where the shell
    /// created it.
    pub fn new(window: W, monitors: M, tuning: DockTuning) -> Self {
        Self {
            window,
            monitors,
            side: DockSide::Left,
            phase: DockPhase::Visible,
            pinned: true,
            show_gate: DelayGate::new(),
            hide_gate: DelayGate::new(),
            show_cooldown: Cooldown::new(),
            animation: None,
            pin_bus: PinStateBus::new(),
            tuning,
        }
    }

    pub fn phase(&self) -> DockPhase {
        self.phase
    }

    pub fn side(&self) -> DockSide {
        self.side
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn tick_interval(&self) -> Duration {
        self.tuning.tick
    }

    pub fn subscribe_pin_state(&self) -> crossbeam_channel::Receiver<bool> {
        self.pin_bus.subscribe()
    }

    /// One poll step. Call on a fixed cadence with the current instant.
    pub fn tick(&mut self, now: Instant) {
        if self.window.is_destroyed() {
            // The window is gone; drop pending timers instead of acting on
            // a dead resource.
            self.cancel_pending();
            return;
        }

        let bounds = self.window.bounds();
        let work = self.monitors.work_area_for(&bounds);
        let cursor = self.monitors.cursor_position();

        match self.phase {
            DockPhase::Hidden => {
                if self.pinned {
                    return;
                }
                if self.in_trigger_band(&work, cursor.x, cursor.y) {
                    if !self.show_gate.is_armed() && !self.show_cooldown.active(now) {
                        self.show_gate.arm(now, self.tuning.show_delay);
                    }
                } else {
                    // Left the band before the delay elapsed: no show.
                    self.show_gate.cancel();
                }
                if self.show_gate.fire(now) && !self.show_cooldown.active(now) {
                    self.begin_show(now, &work);
                }
            }
            DockPhase::Showing | DockPhase::Hiding => self.advance_animation(),
            DockPhase::Visible => {
                if self.pinned {
                    return;
                }
                let over_window = bounds.contains(cursor);
                let in_band = self.in_trigger_band(&work, cursor.x, cursor.y);
                if over_window || in_band {
                    self.hide_gate.cancel();
                } else if !self.hide_gate.is_armed() {
                    self.hide_gate.arm(now, self.tuning.hide_delay);
                }
                if self.hide_gate.fire(now) {
                    self.begin_hide(&work);
                }
            }
        }
    }

    /// Pin or unpin the sidebar.
    ///
    /// Pinning cancels all pending show/hide work and parks the window at
    /// its docked bounds. Unpinning snaps to the nearest edge and hands
    /// control back to the auto-hide logic.
    pub fn set_pinned(&mut self, pinned: bool) {
        if self.window.is_destroyed() {
            return;
        }
        self.cancel_pending();

        let bounds = self.window.bounds();
        let work = self.monitors.work_area_for(&bounds);

        if !pinned {
            self.side = nearest_side(&work, &bounds);
        }
        self.pinned = pinned;
        self.phase = DockPhase::Visible;
        let width = self.target_width(&work);
        self.window.set_bounds(docked_bounds(&work, self.side, width));
        self.window.show();
        self.window.set_mouse_interaction(true);

        self.pin_bus.broadcast(pinned);
    }

    /// Cycle the window between the left and right docked positions.
    ///
    /// Which side it currently sits on is decided by tolerance comparison
    /// against the expected docked bounds; when neither matches, the
    /// nearest side by center distance wins.
    pub fn snap(&mut self) {
        if self.window.is_destroyed() {
            return;
        }
        let bounds = self.window.bounds();
        let work = self.monitors.work_area_for(&bounds);
        let width = self.target_width(&work);
        let tolerance = self.tuning.snap_tolerance_px;

        let left = docked_bounds(&work, DockSide::Left, width);
        let right = docked_bounds(&work, DockSide::Right, width);

        let snapped_left =
            approx_eq(bounds.x, left.x, tolerance) && approx_eq(bounds.width, width, tolerance);
        let snapped_right =
            approx_eq(bounds.x, right.x, tolerance) && approx_eq(bounds.width, width, tolerance);

        self.side = if snapped_left {
            DockSide::Right
        } else if snapped_right {
            DockSide::Left
        } else {
            nearest_side(&work, &bounds)
        };

        self.cancel_pending();
        self.phase = DockPhase::Visible;
        self.window.set_bounds(docked_bounds(&work, self.side, width));
        self.window.show();
    }

    fn cancel_pending(&mut self) {
        self.show_gate.cancel();
        self.hide_gate.cancel();
        self.animation = None;
    }

    fn target_width(&self, work: &Rect) -> i32 {
        work.width / self.tuning.width_fraction.max(1)
    }

    fn in_trigger_band(&self, work: &Rect, x: i32, y: i32) -> bool {
        if y < work.y || y >= work.bottom() {
            return false;
        }
        let offset = match self.side {
            DockSide::Left => x - work.x,
            DockSide::Right => work.right() - 1 - x,
        };
        (0..=self.tuning.trigger_band_px).contains(&offset)
    }

    fn begin_show(&mut self, now: Instant, work: &Rect) {
        self.show_cooldown.start(now, self.tuning.show_cooldown);

        let width = self.target_width(work);
        let docked = docked_bounds(work, self.side, width);
        let start_x = hidden_x(work, self.side, width, self.tuning.hide_reveal_px);

        self.window.set_bounds(Rect { x: start_x, ..docked });
        self.window.show();
        // Interactive before the slide starts, not after it lands.
        self.window.set_mouse_interaction(true);

        self.animation = Some(Animation::new(start_x, docked.x, &self.tuning));
        self.phase = DockPhase::Showing;
        debug!(side = ?self.side, "sidebar showing");
    }

    fn begin_hide(&mut self, work: &Rect) {
        // A monitor continuing past this edge means "hiding" would slide
        // the sidebar onto the neighboring screen. Stay visible.
        if self.monitors.has_adjacent_monitor(work, self.side) {
            debug!(side = ?self.side, "hide refused, adjacent monitor shares this edge");
            return;
        }

        self.window.set_mouse_interaction(false);

        let bounds = self.window.bounds();
        let target = hidden_x(work, self.side, bounds.width, self.tuning.hide_reveal_px);
        self.animation = Some(Animation::new(bounds.x, target, &self.tuning));
        self.phase = DockPhase::Hiding;
        debug!(side = ?self.side, "sidebar hiding");
    }

    fn advance_animation(&mut self) {
        let Some(animation) = self.animation.clone() else {
            // No slide in flight: settle the phase directly.
            self.phase = match self.phase {
                DockPhase::Showing => DockPhase::Visible,
                _ => DockPhase::Hidden,
            };
            return;
        };

        let mut bounds = self.window.bounds();
        bounds.x = animation.step_from(bounds.x);
        let arrived = bounds.x == animation.target_x;
        self.window.set_bounds(bounds);

        if arrived {
            self.animation = None;
            match self.phase {
                DockPhase::Showing => self.phase = DockPhase::Visible,
                DockPhase::Hiding => {
                    self.window.hide();
                    self.phase = DockPhase::Hidden;
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_animation_fixed_steps_reach_target() {
        let tuning = DockTuning::default();
        let animation = Animation::new(-382, 0, &tuning);

        let mut x = -382;
        let mut steps = 0;
        while x != 0 {
            x = animation.step_from(x);
            steps += 1;
            assert!(steps < 100, "animation never arrives");
        }
        // ~250ms at 50ms ticks → 5 steps
        assert_eq!(steps, 5);
    }

    #[test]
    fn test_animation_zero_distance_arrives_immediately() {
        let tuning = DockTuning::default();
        let animation = Animation::new(10, 10, &tuning);
        assert_eq!(animation.step_from(10), 10);
    }
}
