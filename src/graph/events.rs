//! Notifications from the graph to the UI layer.
//!
//! Events are fire-and-forget: the model never waits on a receiver and a
//! dropped or full channel is not an error.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Channel capacity for graph events. A UI thread that stalls for longer than
/// this many events simply misses the oldest notifications.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Something the UI may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// Focus changed. `None` after a deselect-all.
    NodeFocussed(Option<String>),
    /// A node became the viewer.
    NodeViewing(String),
    /// A node's position changed.
    NodeMoved { name: String, x: f64, y: f64 },
    /// A script finished loading.
    ScriptLoaded,
    /// Every node was removed.
    ScriptCleared,
    /// An edit changed what the pipeline would compute.
    ScriptChanged,
    /// The model is set up and accepting edits.
    Ready,
}

/// Sending half held by the model.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<GraphEvent>,
}

impl EventSender {
    pub fn emit(&self, event: GraphEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::trace!("Event channel full, dropping {:?}", event);
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Receiving half held by the UI.
#[derive(Debug)]
pub struct EventBridge {
    rx: Receiver<GraphEvent>,
}

impl EventBridge {
    /// Create a connected sender/bridge pair.
    pub fn new() -> (EventSender, Self) {
        let (tx, rx) = bounded(EVENT_CHANNEL_CAPACITY);
        (EventSender { tx }, Self { rx })
    }

    /// Take every pending event without blocking.
    pub fn drain(&self) -> Vec<GraphEvent> {
        self.rx.try_iter().collect()
    }

    pub fn try_recv(&self) -> Option<GraphEvent> {
        self.rx.try_recv().ok()
    }
}
