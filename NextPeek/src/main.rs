use npkplayback::PlaybackFacade;
use npkserver::ServerBuilder;
use npksync::{ApiDoc, SyncEvent, SyncStore, sync_api_router};
use tracing::{debug, info};
use utoipa::OpenApi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ========== PHASE 1 : Infrastructure serveur ==========

    let mut server = ServerBuilder::new_configured().build();
    server.init_logging().await;

    server
        .add_route("/info", || async {
            serde_json::json!({"name": "NextPeek", "version": env!("CARGO_PKG_VERSION")})
        })
        .await;

    // ========== PHASE 2 : Canal de synchronisation ==========

    info!("🎧 Initializing bridge sync channel...");
    let store = SyncStore::new_configured();
    server
        .add_openapi("/api", sync_api_router(store.clone()), ApiDoc::openapi(), "sync")
        .await;

    // La façade de lecture appartient à la couche shell/UI; ici on relaie
    // ses signaux vers les logs pour suivre les changements d'état venus
    // de l'extérieur (pause au clavier média, etc.).
    let facade = PlaybackFacade::new_configured(store.clone());
    let events = facade.subscribe();
    tokio::task::spawn_blocking(move || {
        while let Ok(event) = events.recv() {
            match event {
                SyncEvent::PlayStateChanged(is_playing) => {
                    info!(is_playing, "play state changed by host");
                }
                SyncEvent::SnapshotReplaced => debug!("queue updated"),
                SyncEvent::PlaylistsUpdated(count) => debug!(count, "playlists received"),
                SyncEvent::RecentlyPlayedUpdated(count) => {
                    debug!(count, "recently played received");
                }
            }
        }
    });

    // ========== PHASE 3 : Démarrage du serveur ==========

    info!("🌐 Starting HTTP server...");
    server.start().await;

    info!("✅ NextPeek sync server is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
