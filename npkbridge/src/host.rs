//! Host-player abstraction.
//!
//! `HostPlayer` wraps whatever scripting surface the host music player
//! exposes behind a single control contract. The bridge client only talks
//! to the host through this trait, so transport commands, state reads and
//! queue scans stay host-neutral. Raw queue rows are passed through as
//! JSON values on purpose: the host exposes track identity inconsistently
//! depending on the data source, and the extractor strategies in
//! [`crate::extract`] are the one place that knows the possible shapes.

use async_trait::async_trait;
use serde_json::Value;

use npksync::model::{PlaylistRef, RepeatMode, ShuffleMode};

use crate::error::BridgeError;

/// Target for the host's "skip to queue entry" primitive.
///
/// Jumping by URI alone makes the host loop the single track; the skip
/// primitive needs the queue slot id and a context to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipTarget {
    pub uri: String,
    /// Host-internal queue slot identifier.
    pub uid: String,
    pub context_uri: String,
}

#[async_trait]
pub trait HostPlayer: Send + Sync {
    /// True once the host's player and network APIs are usable. The bridge
    /// polls this until it turns true; it never gives up.
    async fn is_ready(&self) -> bool;

    /// The currently loaded track as a raw host row, if any.
    async fn current_row(&self) -> Option<Value>;

    /// Upcoming tracks as raw host rows, merged from every queue source
    /// the host exposes, in host order.
    async fn queue_rows(&self) -> Vec<Value>;

    /// Previously played tracks as raw host rows, oldest first.
    async fn history_rows(&self) -> Vec<Value>;

    /// The playback context (playlist/album) URI, if the host knows one.
    async fn context_uri(&self) -> Option<String>;

    async fn is_playing(&self) -> bool;
    async fn duration_ms(&self) -> u64;
    async fn progress_ms(&self) -> u64;
    async fn repeat_mode(&self) -> RepeatMode;
    async fn shuffle_mode(&self) -> ShuffleMode;

    /// Capability flag: whether the host exposes a repeat-mode setter.
    fn can_set_repeat(&self) -> bool;

    async fn play(&self) -> Result<(), BridgeError>;
    async fn pause(&self) -> Result<(), BridgeError>;
    async fn next(&self) -> Result<(), BridgeError>;
    async fn previous(&self) -> Result<(), BridgeError>;

    /// Seek to an absolute position in milliseconds.
    async fn seek_ms(&self, position_ms: u64) -> Result<(), BridgeError>;

    async fn set_shuffle(&self, on: bool) -> Result<(), BridgeError>;
    async fn set_repeat(&self, mode: RepeatMode) -> Result<(), BridgeError>;

    /// Start playback of a context (playlist, album) by URI.
    async fn play_uri(&self, uri: &str) -> Result<(), BridgeError>;

    /// Jump to a specific queue entry without resetting the context.
    async fn skip_to(&self, target: &SkipTarget) -> Result<(), BridgeError>;

    /// The user's playlist roots.
    async fn playlist_roots(&self) -> Result<Vec<PlaylistRef>, BridgeError>;
}
