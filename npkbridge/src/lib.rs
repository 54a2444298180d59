//! In-host bridge client for NextPeek.
//!
//! This crate is the half of NextPeek that lives next to the host music
//! player: it observes player and queue state through the [`HostPlayer`]
//! trait, mirrors it to the local sync server as wholesale snapshots, and
//! polls the server for pending commands to execute against the host.
//!
//! The client holds no persistent state beyond the last known non-track
//! context URI, kept to recover a playable context for track jumps.

pub mod client;
pub mod error;
pub mod extract;
pub mod host;

pub use client::{BridgeClient, BridgeTuning};
pub use error::BridgeError;
pub use host::{HostPlayer, SkipTarget};
