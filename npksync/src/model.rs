//! Wire model shared by the bridge script, the sync server and the UI
//! facade.
//!
//! Field names follow the JSON the bridge posts (camelCase, with the
//! historical `album_cover` exception), so every type here serializes to
//! exactly what travels over the localhost endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sentinel queue entry marking the end of user-queued tracks and the start
/// of algorithmic recommendations. Consumers truncate the visible queue at
/// this entry.
pub const QUEUE_DELIMITER_URI: &str = "spotify:delimiter";

/// Repeat setting of the host player. Numeric on the wire (0/1/2);
/// unrecognized numbers fall back to `Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl From<u8> for RepeatMode {
    fn from(value: u8) -> Self {
        match value {
            1 => RepeatMode::All,
            2 => RepeatMode::One,
            _ => RepeatMode::Off,
        }
    }
}

impl From<RepeatMode> for u8 {
    fn from(value: RepeatMode) -> Self {
        match value {
            RepeatMode::Off => 0,
            RepeatMode::All => 1,
            RepeatMode::One => 2,
        }
    }
}

/// Shuffle setting of the host player: 0 = off, 1 = normal, 2 = smart.
/// Numeric on the wire; unrecognized numbers fall back to `Off`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ShuffleMode {
    #[default]
    Off,
    Normal,
    Smart,
}

impl From<u8> for ShuffleMode {
    fn from(value: u8) -> Self {
        match value {
            1 => ShuffleMode::Normal,
            2 => ShuffleMode::Smart,
            _ => ShuffleMode::Off,
        }
    }
}

impl From<ShuffleMode> for u8 {
    fn from(value: ShuffleMode) -> Self {
        match value {
            ShuffleMode::Off => 0,
            ShuffleMode::Normal => 1,
            ShuffleMode::Smart => 2,
        }
    }
}

impl ShuffleMode {
    pub fn is_on(&self) -> bool {
        !matches!(self, ShuffleMode::Off)
    }
}

/// A track reference as it appears in the queue and history lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrackRef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// The currently loaded track plus transport state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NowPlaying {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default, rename = "album_cover", skip_serializing_if = "Option::is_none")]
    pub album_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    #[schema(value_type = u8)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    #[schema(value_type = u8)]
    pub shuffle: ShuffleMode,
    /// Track length in milliseconds.
    #[serde(default)]
    pub duration: u64,
    /// Playback position in milliseconds.
    #[serde(default)]
    pub progress: u64,
    /// Position as a fraction of the duration, in [0,1].
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub formatted_duration: String,
    #[serde(default)]
    pub formatted_progress: String,
}

impl NowPlaying {
    /// The bridge posts `nowPlaying: {}` when nothing is loaded; an entry
    /// with no title and no URI is that empty object.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.uri.is_none()
    }
}

/// Authoritative playback state, pushed wholesale by the bridge.
///
/// There is no delta form and no versioning: the latest push replaces
/// everything the server holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<NowPlaying>)]
    pub now_playing: Option<NowPlaying>,
    #[serde(default)]
    pub queue: Vec<TrackRef>,
    /// Most-recent-first previous tracks.
    #[serde(default)]
    pub history: Vec<TrackRef>,
    #[serde(default)]
    #[schema(value_type = u8)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    #[schema(value_type = u8)]
    pub shuffle: ShuffleMode,
}

impl PlaybackSnapshot {
    /// Collapse the `nowPlaying: {}` wire shape into `None`.
    pub fn normalized(mut self) -> Self {
        if self.now_playing.as_ref().is_some_and(NowPlaying::is_empty) {
            self.now_playing = None;
        }
        self
    }
}

/// A playlist root exposed by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Track count.
    #[serde(default)]
    pub tracks: u32,
    pub uri: String,
}

/// Command verbs the shell can ask the bridge to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum CommandAction {
    Play,
    Pause,
    Next,
    Previous,
    PlayTrack,
    PlayPlaylist,
    SetShuffle,
    SetRepeatMode,
    Seek,
    GetPlaylists,
    GetRecentlyPlayed,
    None,
}

/// A pending command. At most one exists at a time; a new post overwrites
/// any unconsumed predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Command {
    pub action: CommandAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}

impl Command {
    pub fn simple(action: CommandAction) -> Self {
        Self { action, data: None }
    }

    pub fn none() -> Self {
        Self::simple(CommandAction::None)
    }

    pub fn play_track(uri: impl Into<String>) -> Self {
        Self {
            action: CommandAction::PlayTrack,
            data: Some(serde_json::json!({ "uri": uri.into() })),
        }
    }

    pub fn play_playlist(uri: impl Into<String>) -> Self {
        Self {
            action: CommandAction::PlayPlaylist,
            data: Some(serde_json::json!({ "uri": uri.into() })),
        }
    }

    pub fn set_shuffle(on: bool) -> Self {
        Self {
            action: CommandAction::SetShuffle,
            data: Some(serde_json::json!({ "state": if on { 1 } else { 0 } })),
        }
    }

    pub fn set_repeat_mode(mode: RepeatMode) -> Self {
        Self {
            action: CommandAction::SetRepeatMode,
            data: Some(serde_json::json!({ "mode": u8::from(mode) })),
        }
    }

    /// Seek to a fraction of the track. The fraction is clamped to [0,1]
    /// here, before it ever reaches the wire.
    pub fn seek(position_percent: f64) -> Self {
        Self {
            action: CommandAction::Seek,
            data: Some(serde_json::json!({
                "positionPercent": clamp_fraction(position_percent)
            })),
        }
    }

    pub fn is_none(&self) -> bool {
        self.action == CommandAction::None
    }
}

/// Clamp a fraction to [0,1]; NaN maps to 0.
pub fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn is_delimiter(track: &TrackRef) -> bool {
    if track.uri.as_deref() == Some(QUEUE_DELIMITER_URI) {
        return true;
    }
    // Some host shapes render the separator as a pseudo-track whose title
    // is a run of dashes.
    !track.title.is_empty() && track.title.chars().all(|c| c == '-' || c == '—')
}

/// The consumer-visible queue: everything before the delimiter sentinel.
pub fn visible_queue(queue: &[TrackRef]) -> Vec<TrackRef> {
    let cut = queue.iter().position(is_delimiter).unwrap_or(queue.len());
    queue[..cut].to_vec()
}

/// The consumer-visible history: the leading entry is dropped when it
/// duplicates the currently playing track, and adjacent duplicates collapse
/// to one.
pub fn visible_history(history: &[TrackRef], now_playing_uri: Option<&str>) -> Vec<TrackRef> {
    let mut out: Vec<TrackRef> = Vec::with_capacity(history.len());
    for entry in history {
        if out.is_empty() {
            if let (Some(np), Some(uri)) = (now_playing_uri, entry.uri.as_deref()) {
                if np == uri {
                    continue;
                }
            }
        }
        if let Some(last) = out.last() {
            if same_track(last, entry) {
                continue;
            }
        }
        out.push(entry.clone());
    }
    out
}

fn same_track(a: &TrackRef, b: &TrackRef) -> bool {
    match (a.uri.as_deref(), b.uri.as_deref()) {
        (Some(ua), Some(ub)) => ua == ub,
        _ => a.title == b.title && a.artist == b.artist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, uri: &str) -> TrackRef {
        TrackRef {
            title: title.to_string(),
            artist: String::new(),
            album_cover: None,
            uri: Some(uri.to_string()),
        }
    }

    #[test]
    fn test_repeat_mode_wire_values() {
        assert_eq!(RepeatMode::from(0), RepeatMode::Off);
        assert_eq!(RepeatMode::from(1), RepeatMode::All);
        assert_eq!(RepeatMode::from(2), RepeatMode::One);
        // Unknown numbers degrade to Off rather than failing the parse
        assert_eq!(RepeatMode::from(7), RepeatMode::Off);

        let json = serde_json::to_string(&RepeatMode::One).unwrap();
        assert_eq!(json, "2");
    }

    #[test]
    fn test_empty_now_playing_normalizes_to_none() {
        let snapshot: PlaybackSnapshot =
            serde_json::from_str(r#"{"nowPlaying":{},"queue":[],"history":[]}"#).unwrap();
        assert!(snapshot.now_playing.is_some());
        assert!(snapshot.normalized().now_playing.is_none());
    }

    #[test]
    fn test_loaded_now_playing_survives_normalization() {
        let snapshot: PlaybackSnapshot = serde_json::from_str(
            r#"{"nowPlaying":{"title":"A","uri":"spotify:track:1","isPlaying":true}}"#,
        )
        .unwrap();
        let normalized = snapshot.normalized();
        let np = normalized.now_playing.expect("kept");
        assert_eq!(np.title, "A");
        assert!(np.is_playing);
    }

    #[test]
    fn test_queue_truncates_at_delimiter() {
        let queue = vec![
            track("A", "spotify:track:1"),
            track("B", "spotify:track:2"),
            track("", QUEUE_DELIMITER_URI),
            track("C", "spotify:track:3"),
        ];
        let visible = visible_queue(&queue);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].title, "B");
    }

    #[test]
    fn test_queue_truncates_at_dash_title() {
        let queue = vec![track("A", "spotify:track:1"), track("----", "spotify:track:sep")];
        assert_eq!(visible_queue(&queue).len(), 1);
    }

    #[test]
    fn test_queue_without_delimiter_is_untouched() {
        let queue = vec![track("A", "spotify:track:1"), track("B", "spotify:track:2")];
        assert_eq!(visible_queue(&queue).len(), 2);
    }

    #[test]
    fn test_history_drops_leading_now_playing_and_collapses_duplicates() {
        let history = vec![
            track("A", "spotify:track:now"),
            track("B", "spotify:track:2"),
            track("B", "spotify:track:2"),
            track("C", "spotify:track:3"),
        ];
        let visible = visible_history(&history, Some("spotify:track:now"));
        assert_eq!(
            visible.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
            vec!["B", "C"]
        );
    }

    #[test]
    fn test_history_keeps_now_playing_later_in_list() {
        let history = vec![track("B", "spotify:track:2"), track("A", "spotify:track:now")];
        let visible = visible_history(&history, Some("spotify:track:now"));
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_clamp_fraction() {
        assert_eq!(clamp_fraction(-0.5), 0.0);
        assert_eq!(clamp_fraction(1.7), 1.0);
        assert_eq!(clamp_fraction(0.5), 0.5);
        assert_eq!(clamp_fraction(f64::NAN), 0.0);
    }

    #[test]
    fn test_command_constructors() {
        let cmd = Command::set_shuffle(true);
        assert_eq!(cmd.action, CommandAction::SetShuffle);
        assert_eq!(cmd.data.unwrap()["state"], 1);

        let cmd = Command::seek(1.7);
        assert_eq!(cmd.data.unwrap()["positionPercent"], 1.0);

        let cmd = Command::none();
        assert!(cmd.is_none());
        assert_eq!(serde_json::to_string(&cmd).unwrap(), r#"{"action":"none"}"#);
    }
}
