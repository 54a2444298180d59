//! Playback facade for the NextPeek shell.
//!
//! Higher layers (the sidebar UI) must only interact with playback through
//! [`PlaybackFacade`] so that intents, optimistic state and normalization
//! stay in one place. Pin-state subscriptions come from the docking
//! controller; the theme subscription contract lives in [`events`].

pub mod events;
pub mod facade;

pub use events::{ThemeEvent, ThemeEventBus};
pub use facade::{FacadeTuning, PlaybackFacade, UiSnapshot};
