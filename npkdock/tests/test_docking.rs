use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use npkdock::{
    DockController, DockPhase, DockSide, DockTuning, DockWindow, MonitorLayout, Point, Rect,
};

const TICK: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct WindowState {
    bounds: Rect,
    visible: bool,
    mouse_interaction: bool,
    destroyed: bool,
}

#[derive(Clone)]
struct FakeWindow(Arc<Mutex<WindowState>>);

impl FakeWindow {
    fn new(bounds: Rect) -> Self {
        Self(Arc::new(Mutex::new(WindowState {
            bounds,
            visible: true,
            mouse_interaction: true,
            destroyed: false,
        })))
    }

    fn bounds(&self) -> Rect {
        self.0.lock().unwrap().bounds
    }

    fn visible(&self) -> bool {
        self.0.lock().unwrap().visible
    }

    fn mouse_interaction(&self) -> bool {
        self.0.lock().unwrap().mouse_interaction
    }

    fn destroy(&self) {
        self.0.lock().unwrap().destroyed = true;
    }

    fn place(&self, bounds: Rect) {
        self.0.lock().unwrap().bounds = bounds;
    }
}

impl DockWindow for FakeWindow {
    fn bounds(&self) -> Rect {
        self.0.lock().unwrap().bounds
    }

    fn set_bounds(&mut self, bounds: Rect) {
        self.0.lock().unwrap().bounds = bounds;
    }

    fn show(&mut self) {
        self.0.lock().unwrap().visible = true;
    }

    fn hide(&mut self) {
        self.0.lock().unwrap().visible = false;
    }

    fn set_mouse_interaction(&mut self, enabled: bool) {
        self.0.lock().unwrap().mouse_interaction = enabled;
    }

    fn is_destroyed(&self) -> bool {
        self.0.lock().unwrap().destroyed
    }
}

#[derive(Debug)]
struct DesktopState {
    work: Rect,
    adjacent_left: bool,
    adjacent_right: bool,
    cursor: Point,
}

#[derive(Clone)]
struct FakeDesktop(Arc<Mutex<DesktopState>>);

impl FakeDesktop {
    fn new(work: Rect) -> Self {
        Self(Arc::new(Mutex::new(DesktopState {
            work,
            adjacent_left: false,
            adjacent_right: false,
            cursor: Point { x: 960, y: 500 },
        })))
    }

    fn set_cursor(&self, x: i32, y: i32) {
        self.0.lock().unwrap().cursor = Point { x, y };
    }

    fn set_adjacent_left(&self, adjacent: bool) {
        self.0.lock().unwrap().adjacent_left = adjacent;
    }
}

impl MonitorLayout for FakeDesktop {
    fn work_area_for(&self, _bounds: &Rect) -> Rect {
        self.0.lock().unwrap().work
    }

    fn has_adjacent_monitor(&self, _work_area: &Rect, side: DockSide) -> bool {
        let state = self.0.lock().unwrap();
        match side {
            DockSide::Left => state.adjacent_left,
            DockSide::Right => state.adjacent_right,
        }
    }

    fn cursor_position(&self) -> Point {
        self.0.lock().unwrap().cursor
    }
}

const WORK: Rect = Rect {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
};

fn setup() -> (FakeWindow, FakeDesktop, DockController<FakeWindow, FakeDesktop>) {
    setup_with(DockTuning::default())
}

fn setup_with(
    tuning: DockTuning,
) -> (FakeWindow, FakeDesktop, DockController<FakeWindow, FakeDesktop>) {
    let window = FakeWindow::new(Rect {
        x: 0,
        y: 0,
        width: 384,
        height: 1080,
    });
    let desktop = FakeDesktop::new(WORK);
    let controller = DockController::new(window.clone(), desktop.clone(), tuning);
    (window, desktop, controller)
}

/// Park the cursor mid-screen and tick until the sidebar has hidden.
fn drive_to_hidden(
    controller: &mut DockController<FakeWindow, FakeDesktop>,
    desktop: &FakeDesktop,
    mut now: Instant,
) -> Instant {
    desktop.set_cursor(960, 500);
    for _ in 0..60 {
        now += TICK;
        controller.tick(now);
        if controller.phase() == DockPhase::Hidden {
            return now;
        }
    }
    panic!("sidebar never hid");
}

#[test]
fn test_starts_visible_and_pinned() {
    let (window, _desktop, controller) = setup();
    assert_eq!(controller.phase(), DockPhase::Visible);
    assert!(controller.is_pinned());
    assert!(window.visible());
}

#[test]
fn test_pinned_sidebar_never_hides() {
    let (window, desktop, mut controller) = setup();
    desktop.set_cursor(960, 500);

    let mut now = Instant::now();
    for _ in 0..40 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);
    assert!(window.visible());
}

#[test]
fn test_unpinned_sidebar_hides_after_delay() {
    let (window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    desktop.set_cursor(960, 500);

    let mut now = Instant::now();
    // Under the hide delay: still visible
    for _ in 0..4 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);

    // Past the delay: hiding starts with mouse interaction off
    for _ in 0..6 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Hiding);
    assert!(!window.mouse_interaction());

    // Animation runs to the resting position, then the window hides
    for _ in 0..10 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Hidden);
    assert!(!window.visible());
    // Stops short of fully off-screen: 2 px remain past the edge
    assert_eq!(window.bounds().x, -382);
}

#[test]
fn test_show_delay_debounce_against_flicker() {
    let (_window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    let mut now = Instant::now();
    now = drive_to_hidden(&mut controller, &desktop, now);

    // Cursor brushes the trigger band for less than the show delay
    desktop.set_cursor(1, 500);
    now += TICK;
    controller.tick(now);
    now += TICK;
    controller.tick(now);

    desktop.set_cursor(960, 500);
    for _ in 0..20 {
        now += TICK;
        controller.tick(now);
    }
    // Never transitioned to Showing
    assert_eq!(controller.phase(), DockPhase::Hidden);
}

#[test]
fn test_show_after_delay_with_animation() {
    let (window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    let mut now = Instant::now();
    now = drive_to_hidden(&mut controller, &desktop, now);

    // Hover the trigger band at the docked edge
    desktop.set_cursor(0, 500);
    now += TICK;
    controller.tick(now);

    // Delay not elapsed yet
    now += Duration::from_millis(100);
    controller.tick(now);
    assert_eq!(controller.phase(), DockPhase::Hidden);

    // Delay elapsed: the slide starts, interactive immediately
    now += Duration::from_millis(150);
    controller.tick(now);
    assert_eq!(controller.phase(), DockPhase::Showing);
    assert!(window.visible());
    assert!(window.mouse_interaction());

    for _ in 0..10 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);
    // Docked flush to the edge, one fifth of the work area wide
    assert_eq!(window.bounds().x, 0);
    assert_eq!(window.bounds().width, 384);
}

#[test]
fn test_cursor_over_window_cancels_hide() {
    let (_window, desktop, mut controller) = setup();
    controller.set_pinned(false);

    let mut now = Instant::now();
    // One tick away from the window arms the hide gate
    desktop.set_cursor(960, 500);
    now += TICK;
    controller.tick(now);

    // Cursor returns over the sidebar before the delay elapses
    desktop.set_cursor(100, 500);
    now += TICK;
    controller.tick(now);

    // Long after the original deadline, still visible
    for _ in 0..20 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);
}

#[test]
fn test_hide_refused_on_edge_shared_with_adjacent_monitor() {
    let (window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    desktop.set_adjacent_left(true);
    desktop.set_cursor(960, 500);

    let mut now = Instant::now();
    for _ in 0..40 {
        now += TICK;
        controller.tick(now);
    }

    // The hide keeps being refused: sliding out would bleed onto the
    // neighboring screen
    assert_eq!(controller.phase(), DockPhase::Visible);
    assert!(window.visible());
    assert!(!controller.is_pinned());
}

#[test]
fn test_show_cooldown_blocks_immediate_retrigger() {
    let tuning = DockTuning {
        hide_delay: Duration::from_millis(100),
        animation: Duration::from_millis(100),
        show_cooldown: Duration::from_secs(10),
        ..DockTuning::default()
    };
    let (_window, desktop, mut controller) = setup_with(tuning);
    controller.set_pinned(false);
    let mut now = Instant::now();
    now = drive_to_hidden(&mut controller, &desktop, now);

    // First show: hover the band past the delay
    desktop.set_cursor(0, 500);
    for _ in 0..8 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);

    // Hide again quickly, then come right back to the edge
    now = drive_to_hidden(&mut controller, &desktop, now);
    desktop.set_cursor(0, 500);
    for _ in 0..20 {
        now += TICK;
        controller.tick(now);
    }
    // Still inside the 10s cooldown: no re-show
    assert_eq!(controller.phase(), DockPhase::Hidden);
}

#[test]
fn test_pin_cancels_pending_hide_and_broadcasts() {
    let (window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    let pin_events = controller.subscribe_pin_state();

    // Arm the hide gate
    desktop.set_cursor(960, 500);
    let mut now = Instant::now();
    now += TICK;
    controller.tick(now);

    controller.set_pinned(true);
    assert_eq!(pin_events.try_recv().unwrap(), true);

    // The pending hide never fires
    for _ in 0..30 {
        now += TICK;
        controller.tick(now);
    }
    assert_eq!(controller.phase(), DockPhase::Visible);
    assert!(window.visible());
    assert!(window.mouse_interaction());
    assert_eq!(window.bounds().x, 0);
}

#[test]
fn test_unpin_snaps_to_nearest_edge() {
    let (window, _desktop, mut controller) = setup();

    // Drag the window toward the right half of the screen
    window.place(Rect {
        x: 1400,
        y: 0,
        width: 384,
        height: 1080,
    });
    controller.set_pinned(false);

    assert_eq!(controller.side(), DockSide::Right);
    assert_eq!(window.bounds().x, 1920 - 384);
}

#[test]
fn test_snap_cycles_between_edges() {
    let (window, _desktop, mut controller) = setup();

    // Docked left (within tolerance) → snaps right
    controller.snap();
    assert_eq!(controller.side(), DockSide::Right);
    assert_eq!(window.bounds().x, 1536);

    // Docked right → snaps back left
    controller.snap();
    assert_eq!(controller.side(), DockSide::Left);
    assert_eq!(window.bounds().x, 0);

    // Free-floating window → nearest side by center distance
    window.place(Rect {
        x: 700,
        y: 0,
        width: 500,
        height: 1080,
    });
    controller.snap();
    assert_eq!(controller.side(), DockSide::Left);
    assert_eq!(window.bounds().x, 0);
    assert_eq!(window.bounds().width, 384);
}

#[test]
fn test_destroyed_window_makes_everything_a_no_op() {
    let (window, desktop, mut controller) = setup();
    controller.set_pinned(false);
    window.destroy();

    desktop.set_cursor(0, 500);
    let mut now = Instant::now();
    for _ in 0..20 {
        now += TICK;
        controller.tick(now);
    }

    let before = window.bounds();
    controller.snap();
    controller.set_pinned(true);
    assert_eq!(window.bounds(), before);
    assert_eq!(controller.phase(), DockPhase::Visible);
}
