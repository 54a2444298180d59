//! Subscription contracts exposed to the UI layer.
//!
//! Theme selection lives entirely in the UI collaborator; only the
//! subscription contract is defined here so presentation code can observe
//! changes without knowing who produces them.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

/// A theme change notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemeEvent {
    /// Identifier of the newly selected theme.
    pub theme: String,
}

#[derive(Clone, Default)]
pub struct ThemeEventBus {
    subscribers: Arc<Mutex<Vec<Sender<ThemeEvent>>>>,
}

impl ThemeEventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<ThemeEvent> {
        let (tx, rx) = unbounded::<ThemeEvent>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub fn broadcast(&self, event: ThemeEvent) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
