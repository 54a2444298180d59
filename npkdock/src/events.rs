//! Pin-state notifications for the UI layer.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

#[derive(Clone, Default)]
pub struct PinStateBus {
    subscribers: Arc<Mutex<Vec<Sender<bool>>>>,
}

impl PinStateBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> Receiver<bool> {
        let (tx, rx) = unbounded::<bool>();
        {
            let mut subscribers = self.subscribers.lock().unwrap();
            subscribers.push(tx);
        }
        rx
    }

    pub(crate) fn broadcast(&self, pinned: bool) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| tx.send(pinned).is_ok());
    }
}
