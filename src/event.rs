// MIT License - Copyright (c) 2026 Peter Wright
// Status and disconnection events

use std::sync::{Arc, PoisonError, RwLock};

/// One raw line received from the receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvrStatusUpdateEvent {
    /// Name of the connection the line arrived on.
    pub source: String,
    pub data: String,
}

/// The reader lost the connection (remote close or read error).
#[derive(Debug, Clone)]
pub struct AvrDisconnectionEvent {
    pub source: String,
    pub cause: Arc<std::io::Error>,
}

/// Receives every line read from the receiver, in order.
///
/// Called on the reader task; the next line is not read until every listener
/// has returned, so implementations should hand heavy work off elsewhere.
pub trait AvrUpdateListener: Send + Sync {
    fn status_update_received(&self, event: &AvrStatusUpdateEvent);
}

pub trait AvrDisconnectionListener: Send + Sync {
    fn on_disconnection(&self, event: &AvrDisconnectionEvent);
}

impl<F> AvrUpdateListener for F
where
    F: Fn(&AvrStatusUpdateEvent) + Send + Sync,
{
    fn status_update_received(&self, event: &AvrStatusUpdateEvent) {
        self(event)
    }
}

impl<F> AvrDisconnectionListener for F
where
    F: Fn(&AvrDisconnectionEvent) + Send + Sync,
{
    fn on_disconnection(&self, event: &AvrDisconnectionEvent) {
        self(event)
    }
}

/// Append-only listener lists shared between the connection and its reader.
///
/// Delivery iterates a snapshot, so a listener registered while an event is
/// being delivered gets every later event but not necessarily the current one.
#[derive(Default)]
pub struct ListenerRegistry {
    update: RwLock<Vec<Arc<dyn AvrUpdateListener>>>,
    disconnection: RwLock<Vec<Arc<dyn AvrDisconnectionListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_update_listener(&self, listener: Arc<dyn AvrUpdateListener>) {
        self.update
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn add_disconnection_listener(&self, listener: Arc<dyn AvrDisconnectionListener>) {
        self.disconnection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn notify_update(&self, event: &AvrStatusUpdateEvent) {
        let snapshot = self
            .update
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in snapshot {
            listener.status_update_received(event);
        }
    }

    pub fn notify_disconnection(&self, event: &AvrDisconnectionEvent) {
        let snapshot = self
            .disconnection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in snapshot {
            listener.on_disconnection(event);
        }
    }

    pub fn update_listener_count(&self) -> usize {
        self.update.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn disconnection_listener_count(&self) -> usize {
        self.disconnection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
