//! Extractor strategies for the host's inconsistent track shapes.
//!
//! Depending on which API a row came from, the host nests track identity
//! under `contextTrack`, `track`, `item`, `metadata` or at the top level.
//! Each field is resolved by an explicit ordered list of strategies, first
//! non-empty result wins. New host shapes are added to the lists here,
//! never at call sites.

use serde_json::Value;

use npksync::model::TrackRef;
use npkutils::compare_numeric_aware;

/// URI lookup order, as JSON pointers into a raw row.
const URI_POINTERS: &[&str] = &[
    "/uri",
    "/contextTrack/uri",
    "/contextTrack/metadata/uri",
    "/track/uri",
    "/item/uri",
    "/metadata/uri",
];

/// Queue slot id lookup order.
const UID_POINTERS: &[&str] = &["/contextTrack/uid", "/uid"];

/// Title lookup order.
const TITLE_POINTERS: &[&str] = &[
    "/contextTrack/metadata/title",
    "/metadata/title",
    "/track/name",
    "/item/title",
    "/name",
];

/// Album art lookup order.
const COVER_POINTERS: &[&str] = &[
    "/contextTrack/metadata/image_url",
    "/metadata/image_url",
    "/track/album/images/0/url",
    "/item/album/images/0/url",
    "/album/images/0/url",
];

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

fn first_non_empty(row: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|p| row.pointer(p))
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// The track URI of a raw host row, whatever its shape.
pub fn track_uri(row: &Value) -> Option<String> {
    first_non_empty(row, URI_POINTERS)
}

/// The host-internal queue slot id of a raw host row.
pub fn queue_uid(row: &Value) -> Option<String> {
    first_non_empty(row, UID_POINTERS)
}

/// True if any known URI shape of `row` equals `uri`.
pub fn row_matches_uri(row: &Value, uri: &str) -> bool {
    URI_POINTERS
        .iter()
        .filter_map(|p| row.pointer(p))
        .filter_map(Value::as_str)
        .any(|candidate| candidate == uri)
}

pub fn track_title(row: &Value) -> String {
    first_non_empty(row, TITLE_POINTERS).unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

pub fn track_cover(row: &Value) -> Option<String> {
    first_non_empty(row, COVER_POINTERS)
}

/// Artist resolution tries, in order: numbered `artist_name*` metadata
/// keys (sorted numerically, the host splits collaborations across
/// `artist_name`, `artist_name:1`, ...), then the `track.artists` array.
pub fn track_artist(row: &Value) -> String {
    const STRATEGIES: &[fn(&Value) -> Option<String>] = &[
        |row| artists_from_metadata(row.pointer("/contextTrack/metadata")?),
        |row| artists_from_metadata(row.pointer("/metadata")?),
        |row| artists_from_array(row.pointer("/track/artists")?),
        |row| artists_from_array(row.pointer("/artists")?),
    ];

    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(row))
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
}

fn artists_from_metadata(metadata: &Value) -> Option<String> {
    let map = metadata.as_object()?;
    let mut keys: Vec<&String> = map
        .keys()
        .filter(|k| k.starts_with("artist_name"))
        .collect();
    keys.sort_by(|a, b| compare_numeric_aware(a, b));

    let joined = keys
        .iter()
        .filter_map(|k| map.get(*k))
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    (!joined.is_empty()).then_some(joined)
}

fn artists_from_array(artists: &Value) -> Option<String> {
    let joined = artists
        .as_array()?
        .iter()
        .filter_map(|a| a.get("name"))
        .filter_map(Value::as_str)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    (!joined.is_empty()).then_some(joined)
}

/// Normalize a raw host row into the wire track shape.
pub fn map_track(row: &Value) -> TrackRef {
    TrackRef {
        title: track_title(row),
        artist: track_artist(row),
        album_cover: track_cover(row),
        uri: track_uri(row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uri_strategy_order() {
        // Top-level uri wins over nested shapes
        let row = json!({
            "uri": "spotify:track:top",
            "contextTrack": {"uri": "spotify:track:nested"}
        });
        assert_eq!(track_uri(&row).unwrap(), "spotify:track:top");

        // Empty strings are skipped, not returned
        let row = json!({
            "uri": "",
            "track": {"uri": "spotify:track:deep"}
        });
        assert_eq!(track_uri(&row).unwrap(), "spotify:track:deep");

        let row = json!({"somethingElse": 1});
        assert!(track_uri(&row).is_none());
    }

    #[test]
    fn test_row_matches_any_uri_shape() {
        let row = json!({
            "contextTrack": {"metadata": {"uri": "spotify:track:abc"}}
        });
        assert!(row_matches_uri(&row, "spotify:track:abc"));
        assert!(!row_matches_uri(&row, "spotify:track:xyz"));
    }

    #[test]
    fn test_title_fallbacks() {
        let row = json!({"track": {"name": "From Track"}});
        assert_eq!(track_title(&row), "From Track");

        let row = json!({});
        assert_eq!(track_title(&row), "Unknown Title");
    }

    #[test]
    fn test_artist_from_numbered_metadata_keys() {
        let row = json!({
            "metadata": {
                "artist_name": "Lead",
                "artist_name:10": "Tenth",
                "artist_name:2": "Second"
            }
        });
        // Numeric-aware order: base key, :2, :10
        assert_eq!(track_artist(&row), "Lead, Second, Tenth");
    }

    #[test]
    fn test_artist_from_track_array() {
        let row = json!({
            "track": {"artists": [{"name": "A"}, {"name": "B"}]}
        });
        assert_eq!(track_artist(&row), "A, B");

        let row = json!({});
        assert_eq!(track_artist(&row), "Unknown Artist");
    }

    #[test]
    fn test_map_track_from_queue_shape() {
        let row = json!({
            "contextTrack": {
                "uid": "slot42",
                "uri": "spotify:track:q1",
                "metadata": {
                    "title": "Queued",
                    "artist_name": "Someone",
                    "image_url": "https://img/q1"
                }
            }
        });
        let track = map_track(&row);
        assert_eq!(track.title, "Queued");
        assert_eq!(track.artist, "Someone");
        assert_eq!(track.album_cover.as_deref(), Some("https://img/q1"));
        assert_eq!(track.uri.as_deref(), Some("spotify:track:q1"));
        assert_eq!(queue_uid(&row).as_deref(), Some("slot42"));
    }
}
