//! The playback facade: the only surface UI code talks to.
//!
//! Each user intent posts a command into the sync store for the bridge to
//! pick up, and toggle-style intents additionally flip the UI-facing state
//! immediately. The optimistic value masks the round trip to the host; an
//! expiry window bounds how long a wrong guess can stay on screen.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use serde::Serialize;
use tracing::debug;

use npksync::model::{
    Command, CommandAction, NowPlaying, PlaylistRef, RepeatMode, ShuffleMode, TrackRef,
    clamp_fraction, visible_history, visible_queue,
};
use npksync::store::{SyncEvent, SyncStore};
use npkutils::{DelayGate, format_time};

/// Facade timing knobs.
#[derive(Debug, Clone)]
pub struct FacadeTuning {
    /// How long an optimistic toggle suppresses the authoritative value.
    pub grace_window: Duration,
    /// How long a manual seek position is shown in place of authoritative
    /// progress.
    pub seek_override: Duration,
}

impl Default for FacadeTuning {
    fn default() -> Self {
        Self {
            grace_window: Duration::from_millis(1500),
            seek_override: Duration::from_millis(3000),
        }
    }
}

impl FacadeTuning {
    pub fn from_config() -> Self {
        let config = npkconfig::get_config();
        Self {
            grace_window: Duration::from_millis(config.get_grace_window_ms()),
            seek_override: Duration::from_millis(config.get_seek_override_ms()),
        }
    }
}

/// A value shown instead of the authoritative one, for a bounded window.
///
/// Once the window expires the overlay stops applying and the next
/// authoritative value wins unconditionally, even if it contradicts the
/// optimistic guess.
#[derive(Debug, Default, Clone)]
struct Overlay<T: Copy> {
    value: Option<T>,
    gate: DelayGate,
}

impl<T: Copy> Overlay<T> {
    fn set(&mut self, value: T, now: Instant, window: Duration) {
        self.value = Some(value);
        self.gate.arm(now, window);
    }

    fn current(&self, now: Instant) -> Option<T> {
        if self.gate.is_pending(now) {
            self.value
        } else {
            None
        }
    }

    fn clear(&mut self) {
        self.value = None;
        self.gate.cancel();
    }
}

#[derive(Debug, Default)]
struct Overlays {
    play: Overlay<bool>,
    shuffle: Overlay<ShuffleMode>,
    repeat: Overlay<RepeatMode>,
    seek: Overlay<f64>,
}

/// What the UI renders: the stored snapshot with normalization and any
/// active optimistic overlays applied.
#[derive(Debug, Clone, Serialize)]
pub struct UiSnapshot {
    pub now_playing: Option<NowPlaying>,
    pub queue: Vec<TrackRef>,
    pub history: Vec<TrackRef>,
}

pub struct PlaybackFacade {
    store: Arc<SyncStore>,
    overlays: Mutex<Overlays>,
    tuning: FacadeTuning,
}

impl PlaybackFacade {
    pub fn new(store: Arc<SyncStore>, tuning: FacadeTuning) -> Self {
        Self {
            store,
            overlays: Mutex::new(Overlays::default()),
            tuning,
        }
    }

    pub fn new_configured(store: Arc<SyncStore>) -> Self {
        Self::new(store, FacadeTuning::from_config())
    }

    /// Signals to refetch [`Self::ui_snapshot`]; payloads carry no state.
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        self.store.subscribe()
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    pub async fn toggle_play_pause(&self) {
        self.toggle_play_pause_at(Instant::now()).await;
    }

    pub async fn toggle_play_pause_at(&self, now: Instant) {
        let snapshot = self.store.snapshot().await;
        let authoritative = snapshot
            .now_playing
            .as_ref()
            .map(|np| np.is_playing)
            .unwrap_or(false);
        let effective = {
            let overlays = self.overlays.lock().unwrap();
            overlays.play.current(now).unwrap_or(authoritative)
        };
        let desired = !effective;

        self.store
            .post_command(Command::simple(if desired {
                CommandAction::Play
            } else {
                CommandAction::Pause
            }))
            .await;

        self.overlays
            .lock()
            .unwrap()
            .play
            .set(desired, now, self.tuning.grace_window);
    }

    pub async fn next_track(&self) {
        self.store.post_command(Command::simple(CommandAction::Next)).await;
    }

    pub async fn previous_track(&self) {
        self.store
            .post_command(Command::simple(CommandAction::Previous))
            .await;
    }

    pub async fn set_shuffle(&self, on: bool) {
        self.set_shuffle_at(on, Instant::now()).await;
    }

    pub async fn set_shuffle_at(&self, on: bool, now: Instant) {
        self.store.post_command(Command::set_shuffle(on)).await;
        let optimistic = if on { ShuffleMode::Normal } else { ShuffleMode::Off };
        self.overlays
            .lock()
            .unwrap()
            .shuffle
            .set(optimistic, now, self.tuning.grace_window);
    }

    pub async fn set_repeat(&self, mode: RepeatMode) {
        self.set_repeat_at(mode, Instant::now()).await;
    }

    pub async fn set_repeat_at(&self, mode: RepeatMode, now: Instant) {
        self.store.post_command(Command::set_repeat_mode(mode)).await;
        self.overlays
            .lock()
            .unwrap()
            .repeat
            .set(mode, now, self.tuning.grace_window);
    }

    /// Seek to a fraction of the track. The dragged position is held as a
    /// manual override until the completion timeout, so the progress bar
    /// does not jump back while the host catches up.
    pub async fn seek(&self, position_percent: f64) {
        self.seek_at(position_percent, Instant::now()).await;
    }

    pub async fn seek_at(&self, position_percent: f64, now: Instant) {
        let fraction = clamp_fraction(position_percent);
        self.store.post_command(Command::seek(fraction)).await;
        self.overlays
            .lock()
            .unwrap()
            .seek
            .set(fraction, now, self.tuning.seek_override);
    }

    /// Drop the manual seek override immediately. Called on explicit
    /// failure of a seek instead of waiting out the completion timeout.
    pub fn cancel_seek_override(&self) {
        debug!("seek override cleared");
        self.overlays.lock().unwrap().seek.clear();
    }

    pub async fn play_track(&self, uri: impl Into<String>) {
        self.store.post_command(Command::play_track(uri)).await;
    }

    pub async fn play_playlist(&self, uri: impl Into<String>) {
        self.store.post_command(Command::play_playlist(uri)).await;
    }

    pub async fn request_recently_played(&self) {
        self.store
            .post_command(Command::simple(CommandAction::GetRecentlyPlayed))
            .await;
    }

    pub async fn recently_played(&self) -> Vec<TrackRef> {
        self.store.recently_played().await
    }

    /// Search playlists by name/description. May hold the caller briefly
    /// while a cold catalog is fetched through the command channel.
    pub async fn search_playlists(&self, query: &str) -> Vec<PlaylistRef> {
        self.store.search_playlists(query).await
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub async fn ui_snapshot(&self) -> UiSnapshot {
        self.ui_snapshot_at(Instant::now()).await
    }

    pub async fn ui_snapshot_at(&self, now: Instant) -> UiSnapshot {
        let snapshot = self.store.snapshot().await;

        let mut now_playing = snapshot.now_playing;
        let np_uri = now_playing.as_ref().and_then(|np| np.uri.clone());
        let queue = visible_queue(&snapshot.queue);
        let history = visible_history(&snapshot.history, np_uri.as_deref());

        let overlays = self.overlays.lock().unwrap();
        if let Some(np) = now_playing.as_mut() {
            if let Some(playing) = overlays.play.current(now) {
                np.is_playing = playing;
            }
            if let Some(shuffle) = overlays.shuffle.current(now) {
                np.shuffle = shuffle;
            }
            if let Some(repeat) = overlays.repeat.current(now) {
                np.repeat_mode = repeat;
            }
            if let Some(fraction) = overlays.seek.current(now) {
                np.progress_percent = fraction;
                np.progress = (fraction * np.duration as f64).round() as u64;
                np.formatted_progress = format_time(np.progress);
            }
        }

        UiSnapshot {
            now_playing,
            queue,
            history,
        }
    }
}
