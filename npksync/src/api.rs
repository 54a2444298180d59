//! API REST du pont de synchronisation.
//!
//! Ces endpoints sont le seul canal entre le script bridge (côté lecteur)
//! et le shell NextPeek. Tout passe en JSON sur le port local configuré;
//! aucune authentification (localhost de confiance).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::model::{PlaybackSnapshot, PlaylistRef, TrackRef};
use crate::store::SyncStore;

/// Router `/api` du serveur de synchronisation.
pub fn sync_api_router(store: Arc<SyncStore>) -> Router {
    Router::new()
        .route("/updateQueue", post(update_queue))
        .route("/command", get(pull_command))
        .route("/searchPlaylists", get(search_playlists))
        .route("/playlistsResponse", post(ingest_playlists))
        .route("/recentlyPlayedResponse", post(ingest_recently_played))
        .route("/snapshot", get(get_snapshot))
        .fallback(not_found)
        .with_state(store)
}

/// Réponse de statut générique.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// Réponse d'erreur REST générique.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Corps de réponse du catalogue de playlists.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaylistsPayload {
    #[serde(default)]
    pub playlists: Vec<PlaylistRef>,
}

/// Corps de réponse des morceaux récemment joués.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentlyPlayedPayload {
    #[serde(default)]
    pub recently_played: Vec<TrackRef>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    post,
    path = "/api/updateQueue",
    tag = "sync",
    request_body = PlaybackSnapshot,
    responses(
        (status = 200, description = "Snapshot remplacé", body = StatusResponse),
        (status = 400, description = "Corps JSON invalide, état précédent conservé", body = ErrorResponse)
    )
)]
pub async fn update_queue(
    State(store): State<Arc<SyncStore>>,
    payload: Result<Json<PlaybackSnapshot>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(snapshot)) => {
            store.replace_snapshot(snapshot).await;
            (StatusCode::OK, Json(StatusResponse::success())).into_response()
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "rejected malformed snapshot push");
            map_status(StatusCode::BAD_REQUEST, "INVALID_BODY", &rejection.body_text())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/command",
    tag = "sync",
    responses(
        (status = 200, description = "Commande en attente, effacée à la lecture", body = crate::model::Command)
    )
)]
pub async fn pull_command(State(store): State<Arc<SyncStore>>) -> Response {
    let command = store.take_command().await;
    if !command.is_none() {
        debug!(?command.action, "command handed to bridge");
    }
    (StatusCode::OK, Json(command)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/searchPlaylists",
    tag = "sync",
    params(("q" = String, Query, description = "Filtre insensible à la casse sur nom et description")),
    responses(
        (status = 200, description = "Playlists filtrées (peut bloquer ~2s sur catalogue froid)", body = PlaylistsPayload)
    )
)]
pub async fn search_playlists(
    State(store): State<Arc<SyncStore>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let playlists = store.search_playlists(&params.q).await;
    (StatusCode::OK, Json(PlaylistsPayload { playlists })).into_response()
}

#[utoipa::path(
    post,
    path = "/api/playlistsResponse",
    tag = "sync",
    request_body = PlaylistsPayload,
    responses(
        (status = 200, description = "Catalogue ingéré", body = StatusResponse),
        (status = 400, description = "Corps JSON invalide", body = ErrorResponse)
    )
)]
pub async fn ingest_playlists(
    State(store): State<Arc<SyncStore>>,
    payload: Result<Json<PlaylistsPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(body)) => {
            store.ingest_playlists(body.playlists).await;
            (StatusCode::OK, Json(StatusResponse::success())).into_response()
        }
        Err(rejection) => {
            map_status(StatusCode::BAD_REQUEST, "INVALID_BODY", &rejection.body_text())
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/recentlyPlayedResponse",
    tag = "sync",
    request_body = RecentlyPlayedPayload,
    responses(
        (status = 200, description = "Liste ingérée", body = StatusResponse),
        (status = 400, description = "Corps JSON invalide", body = ErrorResponse)
    )
)]
pub async fn ingest_recently_played(
    State(store): State<Arc<SyncStore>>,
    payload: Result<Json<RecentlyPlayedPayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(body)) => {
            store.ingest_recently_played(body.recently_played).await;
            (StatusCode::OK, Json(StatusResponse::success())).into_response()
        }
        Err(rejection) => {
            map_status(StatusCode::BAD_REQUEST, "INVALID_BODY", &rejection.body_text())
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/snapshot",
    tag = "sync",
    responses(
        (status = 200, description = "Dernier snapshot reçu", body = PlaybackSnapshot)
    )
)]
pub async fn get_snapshot(State(store): State<Arc<SyncStore>>) -> Response {
    (StatusCode::OK, Json(store.snapshot().await)).into_response()
}

async fn not_found() -> Response {
    map_status(StatusCode::NOT_FOUND, "NOT_FOUND", "Not found")
}

fn map_status(status: StatusCode, error: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}
