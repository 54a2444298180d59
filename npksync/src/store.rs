//! The in-memory sync store.
//!
//! One `SyncStore` is created at shell startup and shared (behind `Arc`)
//! between the HTTP endpoints and the playback facade. It is the single
//! owner of the authoritative snapshot and of the pending command slot —
//! there is deliberately no static fallback, so tests construct as many
//! independent stores as they need.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::timeout;
use tracing::{debug, info};

use crate::model::{Command, PlaybackSnapshot, PlaylistRef, TrackRef};

/// Change notifications emitted by the store.
///
/// Payloads are refresh signals only: subscribers refetch the full state
/// from the store, which stays the single source of truth.
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// A new authoritative snapshot replaced the stored one.
    SnapshotReplaced,
    /// The incoming snapshot carried a recognized play state.
    PlayStateChanged(bool),
    /// The playlist catalog was (re)filled with this many entries.
    PlaylistsUpdated(usize),
    /// The recently-played list was (re)filled with this many entries.
    RecentlyPlayedUpdated(usize),
}

#[derive(Clone, Default)]
pub struct SyncEventBus {
    subscribers: Arc<StdMutex<Vec<Sender<SyncEvent>>>>,
}

impl SyncEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        let (tx, rx) = unbounded::<SyncEvent>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub(crate) fn broadcast(&self, event: SyncEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Single-writer, single-slot state shared between the bridge-facing HTTP
/// API and the shell-local playback facade.
pub struct SyncStore {
    snapshot: RwLock<PlaybackSnapshot>,
    command: Mutex<Option<Command>>,
    playlists: RwLock<Option<Vec<PlaylistRef>>>,
    recently_played: RwLock<Vec<TrackRef>>,
    /// Woken when a playlist catalog arrives; all held searches share the
    /// same arrival.
    playlists_ready: Notify,
    /// True while a `getPlaylists` command is in flight, so concurrent cold
    /// searches do not re-post it.
    catalog_requested: AtomicBool,
    playlist_wait: Duration,
    events: SyncEventBus,
}

impl SyncStore {
    pub fn new(playlist_wait: Duration) -> Arc<Self> {
        Arc::new(Self {
            snapshot: RwLock::new(PlaybackSnapshot::default()),
            command: Mutex::new(None),
            playlists: RwLock::new(None),
            recently_played: RwLock::new(Vec::new()),
            playlists_ready: Notify::new(),
            catalog_requested: AtomicBool::new(false),
            playlist_wait,
            events: SyncEventBus::new(),
        })
    }

    pub fn new_configured() -> Arc<Self> {
        let config = npkconfig::get_config();
        Self::new(Duration::from_millis(config.get_playlist_wait_ms()))
    }

    /// Subscribe to store change signals.
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Replace the authoritative snapshot wholesale. Latest push wins.
    pub async fn replace_snapshot(&self, snapshot: PlaybackSnapshot) {
        let snapshot = snapshot.normalized();
        let play_state = snapshot.now_playing.as_ref().map(|np| np.is_playing);

        *self.snapshot.write().await = snapshot;

        if let Some(is_playing) = play_state {
            self.events.broadcast(SyncEvent::PlayStateChanged(is_playing));
        }
        self.events.broadcast(SyncEvent::SnapshotReplaced);
    }

    pub async fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Post a command for the bridge. Overwrites any unconsumed
    /// predecessor: rapid repeated intents only need the latest to apply.
    pub async fn post_command(&self, command: Command) {
        let mut slot = self.command.lock().await;
        if let Some(previous) = slot.as_ref() {
            debug!(?previous.action, ?command.action, "overwriting unconsumed command");
        }
        *slot = Some(command);
    }

    /// Hand out the pending command and clear the slot. Each command is
    /// delivered at most once; acting on it is the consumer's problem.
    pub async fn take_command(&self) -> Command {
        self.command.lock().await.take().unwrap_or_else(Command::none)
    }

    /// Ingest the bridge's asynchronous answer to `getPlaylists` and wake
    /// every search held on it.
    pub async fn ingest_playlists(&self, playlists: Vec<PlaylistRef>) {
        let count = playlists.len();
        *self.playlists.write().await = Some(playlists);
        self.catalog_requested.store(false, Ordering::SeqCst);
        self.playlists_ready.notify_waiters();
        info!(count, "playlist catalog updated");
        self.events.broadcast(SyncEvent::PlaylistsUpdated(count));
    }

    /// Ingest the bridge's answer to `getRecentlyPlayed`.
    pub async fn ingest_recently_played(&self, tracks: Vec<TrackRef>) {
        let count = tracks.len();
        *self.recently_played.write().await = tracks;
        self.events.broadcast(SyncEvent::RecentlyPlayedUpdated(count));
    }

    pub async fn recently_played(&self) -> Vec<TrackRef> {
        self.recently_played.read().await.clone()
    }

    /// Case-insensitive substring search over the playlist catalog.
    ///
    /// With a cold catalog this posts a `getPlaylists` command (once, even
    /// under concurrent searches) and holds the caller for up to the
    /// configured wait; after the wait the possibly-still-empty catalog is
    /// filtered and returned. Forward progress is guaranteed by the
    /// timeout, not by the bridge answering.
    pub async fn search_playlists(&self, query: &str) -> Vec<PlaylistRef> {
        // Register interest before re-checking the catalog, so an arrival
        // between the check and the wait is not lost.
        let ready = self.playlists_ready.notified();

        if self.playlists.read().await.is_none() {
            if !self.catalog_requested.swap(true, Ordering::SeqCst) {
                debug!("cold playlist catalog, requesting from bridge");
                self.post_command(Command::simple(
                    crate::model::CommandAction::GetPlaylists,
                ))
                .await;
            }
            let _ = timeout(self.playlist_wait, ready).await;
        }

        let needle = query.to_lowercase();
        let catalog = self.playlists.read().await;
        catalog
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}
