//! The bridge client proper: mirrors host playback state out to the sync
//! server and executes commands pulled back from it.
//!
//! Two independent cadences drive the client: a debounced snapshot push
//! (host events plus a safety-net interval) and a fixed-rate command poll.
//! Every network call and every command handler swallows its own failure;
//! the loops never die, the next cycle retries naturally.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{Instant as TokioInstant, interval, sleep, sleep_until};
use tracing::{debug, info, warn};

use npksync::model::{
    Command, CommandAction, NowPlaying, PlaybackSnapshot, RepeatMode, TrackRef, clamp_fraction,
};
use npkutils::{Debouncer, format_time};

use crate::error::BridgeError;
use crate::extract;
use crate::host::{HostPlayer, SkipTarget};

/// Context URIs with this prefix are degenerate: they describe a single
/// track, not a playable collection.
const TRACK_URI_PREFIX: &str = "spotify:track:";

/// Bridge timing knobs.
#[derive(Debug, Clone)]
pub struct BridgeTuning {
    /// Command pull cadence.
    pub command_poll: Duration,
    /// Trailing debounce on snapshot pushes.
    pub push_debounce: Duration,
    /// Safety-net push interval when no host event fires.
    pub safety_push: Duration,
    /// Readiness gate retry interval.
    pub readiness_poll: Duration,
}

impl Default for BridgeTuning {
    fn default() -> Self {
        Self {
            command_poll: Duration::from_millis(500),
            push_debounce: Duration::from_millis(300),
            safety_push: Duration::from_millis(5000),
            readiness_poll: Duration::from_millis(500),
        }
    }
}

impl BridgeTuning {
    pub fn from_config() -> Self {
        let config = npkconfig::get_config();
        Self {
            command_poll: Duration::from_millis(config.get_command_poll_ms()),
            push_debounce: Duration::from_millis(config.get_push_debounce_ms()),
            safety_push: Duration::from_millis(config.get_safety_push_ms()),
            readiness_poll: Duration::from_millis(config.get_readiness_poll_ms()),
        }
    }
}

pub struct BridgeClient<H: HostPlayer> {
    host: H,
    http: reqwest::Client,
    base_url: String,
    tuning: BridgeTuning,
    /// Most recently observed non-track context URI. Used to recover a
    /// playable context when a track jump is requested while the current
    /// context is the track itself.
    last_known_context: Mutex<Option<String>>,
    push_gate: Mutex<Debouncer>,
}

impl<H: HostPlayer> BridgeClient<H> {
    pub fn new(host: H, base_url: impl Into<String>, tuning: BridgeTuning) -> Self {
        let push_debounce = tuning.push_debounce;
        Self {
            host,
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            tuning,
            last_known_context: Mutex::new(None),
            push_gate: Mutex::new(Debouncer::new(push_debounce)),
        }
    }

    pub fn new_configured(host: H) -> Self {
        let config = npkconfig::get_config();
        let base_url = format!("{}:{}", config.get_base_url(), config.get_http_port());
        Self::new(host, base_url, BridgeTuning::from_config())
    }

    /// Run the bridge loops forever.
    ///
    /// `triggers` carries host event notifications (song change, queue
    /// change, play/pause, progress); each one pokes the push debounce so
    /// only the trailing event in a tight window produces a POST.
    pub async fn run(&self, mut triggers: mpsc::Receiver<()>) {
        self.wait_until_ready().await;

        // Initial update, before any event fires
        self.push_snapshot().await;

        let mut poll = interval(self.tuning.command_poll);
        let mut safety = interval(self.tuning.safety_push);
        let mut triggers_closed = false;

        loop {
            let push_deadline = self.push_gate.lock().unwrap().deadline();
            let push_sleep = sleep_until(match push_deadline {
                Some(deadline) => TokioInstant::from_std(deadline),
                None => TokioInstant::now() + Duration::from_secs(3600),
            });

            tokio::select! {
                _ = poll.tick() => self.check_commands().await,
                _ = safety.tick() => self.poke_push(),
                event = triggers.recv(), if !triggers_closed => match event {
                    Some(()) => self.poke_push(),
                    // Event source gone; the safety-net timer keeps pushing.
                    None => triggers_closed = true,
                },
                _ = push_sleep, if push_deadline.is_some() => {
                    if self.push_gate.lock().unwrap().fire(Instant::now()) {
                        self.push_snapshot().await;
                    }
                }
            }
        }
    }

    /// Readiness gate: suspend until the host APIs are usable. Not a
    /// timeout — the host may take arbitrarily long to come up.
    pub async fn wait_until_ready(&self) {
        while !self.host.is_ready().await {
            sleep(self.tuning.readiness_poll).await;
        }
        info!("host APIs ready");
    }

    /// Register a push trigger; the actual POST happens once the triggers
    /// have been quiet for the debounce window.
    pub fn poke_push(&self) {
        self.push_gate.lock().unwrap().poke(Instant::now());
    }

    /// Build a fresh snapshot from host state and POST it. Failures are
    /// logged and swallowed; the next trigger retries naturally.
    pub async fn push_snapshot(&self) {
        let snapshot = self.build_snapshot().await;
        let url = format!("{}/api/updateQueue", self.base_url);
        match self.http.post(&url).json(&snapshot).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "snapshot push rejected");
            }
            Ok(_) => debug!("snapshot pushed"),
            Err(err) => warn!(%err, "snapshot push failed"),
        }
    }

    /// Read current host state. Nothing is cached across calls except the
    /// last known non-track context.
    async fn build_snapshot(&self) -> PlaybackSnapshot {
        let context = self.host.context_uri().await;
        self.update_known_context(context.as_deref());

        let repeat_mode = self.host.repeat_mode().await;
        let shuffle = self.host.shuffle_mode().await;

        let now_playing = match self.host.current_row().await {
            Some(row) => {
                let duration = self.host.duration_ms().await;
                let progress = self.host.progress_ms().await;
                let progress_percent = if duration > 0 {
                    clamp_fraction(progress as f64 / duration as f64)
                } else {
                    0.0
                };
                Some(NowPlaying {
                    title: extract::track_title(&row),
                    artist: extract::track_artist(&row),
                    album_cover: extract::track_cover(&row),
                    uri: extract::track_uri(&row),
                    is_playing: self.host.is_playing().await,
                    repeat_mode,
                    shuffle,
                    duration,
                    progress,
                    progress_percent,
                    formatted_duration: format_time(duration),
                    formatted_progress: format_time(progress),
                })
            }
            None => None,
        };

        let queue = self
            .host
            .queue_rows()
            .await
            .iter()
            .map(extract::map_track)
            .collect();

        // The host keeps previous tracks oldest first; the wire wants
        // most-recent-first.
        let mut history: Vec<TrackRef> = self
            .host
            .history_rows()
            .await
            .iter()
            .map(extract::map_track)
            .collect();
        history.reverse();

        PlaybackSnapshot {
            now_playing,
            queue,
            history,
            repeat_mode,
            shuffle,
        }
    }

    fn update_known_context(&self, context: Option<&str>) {
        if let Some(uri) = context {
            if !uri.is_empty() && !uri.starts_with(TRACK_URI_PREFIX) {
                *self.last_known_context.lock().unwrap() = Some(uri.to_string());
            }
        }
    }

    /// Resolution order: explicit context if non-degenerate, else the last
    /// known good one.
    fn effective_context(&self, context: Option<String>) -> Option<String> {
        match context {
            Some(uri) if !uri.is_empty() && !uri.starts_with(TRACK_URI_PREFIX) => Some(uri),
            _ => self.last_known_context.lock().unwrap().clone(),
        }
    }

    /// Poll the sync server once and execute any pending command.
    pub async fn check_commands(&self) {
        let url = format!("{}/api/command", self.base_url);
        let command: Command = match self.http.get(&url).send().await {
            Ok(response) => match response.json().await {
                Ok(command) => command,
                Err(err) => {
                    debug!(%err, "command poll body unreadable");
                    return;
                }
            },
            Err(err) => {
                debug!(%err, "command poll failed");
                return;
            }
        };

        if command.is_none() {
            return;
        }
        info!(?command.action, "received command");

        // A failing command must not take the polling loop down with it.
        if let Err(err) = self.dispatch(&command).await {
            warn!(action = ?command.action, %err, "command failed");
        }
    }

    async fn dispatch(&self, command: &Command) -> Result<(), BridgeError> {
        let data = command.data.as_ref();
        match command.action {
            CommandAction::Play => self.host.play().await,
            CommandAction::Pause => self.host.pause().await,
            CommandAction::Next => self.host.next().await,
            CommandAction::Previous => self.host.previous().await,
            CommandAction::PlayPlaylist => self.handle_play_playlist(data).await,
            CommandAction::PlayTrack => self.handle_play_track(data).await,
            CommandAction::SetShuffle => self.handle_set_shuffle(data).await,
            CommandAction::SetRepeatMode => self.handle_set_repeat(data).await,
            CommandAction::Seek => self.handle_seek(data).await,
            CommandAction::GetPlaylists => self.handle_get_playlists().await,
            CommandAction::GetRecentlyPlayed => {
                // Recently played is derived from the queue's trailing
                // history; answering is just a forced push.
                self.push_snapshot().await;
                Ok(())
            }
            CommandAction::None => Ok(()),
        }
    }

    async fn handle_play_playlist(&self, data: Option<&Value>) -> Result<(), BridgeError> {
        let Some(uri) = data.and_then(|d| d.get("uri")).and_then(Value::as_str) else {
            return Ok(());
        };
        self.host.play_uri(uri).await?;
        info!(uri, "playing playlist");
        Ok(())
    }

    /// Jump to a queue entry. Uses skip-to with (uri, slot id, context)
    /// instead of play-by-uri: the simpler primitive makes the host loop
    /// the single track.
    async fn handle_play_track(&self, data: Option<&Value>) -> Result<(), BridgeError> {
        let Some(uri) = data.and_then(|d| d.get("uri")).and_then(Value::as_str) else {
            return Ok(());
        };

        let context = self.host.context_uri().await;
        self.update_known_context(context.as_deref());
        let effective = self.effective_context(context);

        let rows = self.host.queue_rows().await;
        let uid = rows
            .iter()
            .find(|row| extract::row_matches_uri(row, uri))
            .and_then(extract::queue_uid);

        match (uid, effective) {
            (Some(uid), Some(context_uri)) => {
                self.host
                    .skip_to(&SkipTarget {
                        uri: uri.to_string(),
                        uid,
                        context_uri,
                    })
                    .await
            }
            // No resolvable entry: doing nothing beats the wrong primitive.
            _ => {
                debug!(uri, "no resolvable queue entry for track jump");
                Ok(())
            }
        }
    }

    async fn handle_set_shuffle(&self, data: Option<&Value>) -> Result<(), BridgeError> {
        let Some(raw) = data.and_then(|d| d.get("state")) else {
            return Ok(());
        };
        let Some(state) = numeric_value(raw) else {
            return Ok(());
        };

        // Only an explicit 1 turns shuffle on; this path never selects the
        // three-state smart shuffle.
        let on = state == 1.0;
        self.host.set_shuffle(on).await?;

        // Out-of-band push so the UI reflects the flip without waiting for
        // the next scheduled update.
        self.push_snapshot().await;
        Ok(())
    }

    async fn handle_set_repeat(&self, data: Option<&Value>) -> Result<(), BridgeError> {
        let Some(mode) = data
            .and_then(|d| d.get("mode"))
            .and_then(numeric_value)
            .filter(|m| *m >= 0.0)
        else {
            return Ok(());
        };
        if !self.host.can_set_repeat() {
            debug!("host exposes no repeat-mode setter");
            return Ok(());
        }

        let mode = RepeatMode::from(u8::try_from(mode as u64).unwrap_or(0));
        self.host.set_repeat(mode).await?;
        self.push_snapshot().await;
        Ok(())
    }

    async fn handle_seek(&self, data: Option<&Value>) -> Result<(), BridgeError> {
        let Some(data) = data else {
            return Ok(());
        };
        let raw = data.get("positionPercent").or_else(|| data.get("position"));
        let Some(percent) = raw.and_then(Value::as_f64).filter(|p| p.is_finite()) else {
            return Ok(());
        };

        let percent = clamp_fraction(percent);
        let duration = self.host.duration_ms().await;
        if duration > 0 {
            // The wire carries a fraction; the host primitive takes
            // absolute milliseconds. The conversion lives here and only
            // here.
            let position_ms = (percent * duration as f64).round() as u64;
            self.host.seek_ms(position_ms).await?;
        }
        Ok(())
    }

    async fn handle_get_playlists(&self) -> Result<(), BridgeError> {
        let playlists = match self.host.playlist_roots().await {
            Ok(playlists) => playlists,
            Err(err) => {
                warn!(%err, "failed to read playlist roots");
                Vec::new()
            }
        };

        let url = format!("{}/api/playlistsResponse", self.base_url);
        self.http
            .post(&url)
            .json(&serde_json::json!({ "playlists": playlists }))
            .send()
            .await?;
        Ok(())
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}
