//! Spécification OpenAPI de l'API de synchronisation.

use utoipa::OpenApi;

use crate::api;
use crate::model;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::update_queue,
        api::pull_command,
        api::search_playlists,
        api::ingest_playlists,
        api::ingest_recently_played,
        api::get_snapshot,
    ),
    components(schemas(
        model::PlaybackSnapshot,
        model::NowPlaying,
        model::TrackRef,
        model::PlaylistRef,
        model::Command,
        model::CommandAction,
        api::StatusResponse,
        api::ErrorResponse,
        api::PlaylistsPayload,
        api::RecentlyPlayedPayload,
    )),
    tags(
        (name = "sync", description = "Bridge ↔ shell synchronization endpoints")
    )
)]
pub struct ApiDoc;
