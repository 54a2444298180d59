//! # npksync - Canal de synchronisation bridge ↔ shell
//!
//! Cette crate porte le cœur du protocole NextPeek : le modèle de données
//! échangé avec le script bridge, le magasin mémoire à slot unique
//! ([`store::SyncStore`]) et les endpoints HTTP correspondants.
//!
//! ## Contrat
//!
//! - Le snapshot est remplacé en bloc à chaque push, dernier écrivain
//!   gagnant; aucune version, aucun delta.
//! - Au plus une commande en attente; un nouveau post écrase l'ancienne,
//!   la lecture efface le slot (livraison au-plus-une-fois).
//! - La recherche de playlists retient la requête HTTP (délai borné) le
//!   temps qu'un catalogue arrive du bridge.

pub mod api;
pub mod model;
pub mod openapi;
pub mod store;

pub use api::sync_api_router;
pub use model::{
    Command, CommandAction, NowPlaying, PlaybackSnapshot, PlaylistRef, RepeatMode, ShuffleMode,
    TrackRef, clamp_fraction, visible_history, visible_queue,
};
pub use openapi::ApiDoc;
pub use store::{SyncEvent, SyncStore};
