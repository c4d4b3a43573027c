//! Event bus for forwarded events
//!
//! A tokio broadcast channel fans each event out to every subscriber.
//! Publishing never blocks and never fails: with no subscribers the event
//! is simply dropped, and a slow subscriber lags instead of stalling the
//! pipeline.

use graphtap_model::{Category, ForwardedEvent};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

/// Fan-out channel of forwarded events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Arc<ForwardedEvent>>,
}

impl EventBus {
    /// Create bus buffering `capacity` events per subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: Arc<ForwardedEvent>) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to every event published from now on
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            categories: None,
        }
    }

    /// Active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Receiving side of the bus, optionally filtered by category
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<Arc<ForwardedEvent>>,
    categories: Option<HashSet<Category>>,
}

impl Subscription {
    /// Only deliver events of these categories
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    fn wants(&self, event: &ForwardedEvent) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |set| set.contains(&event.category()))
    }

    /// Next matching event, or `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<Arc<ForwardedEvent>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching event if one is already buffered
    pub fn try_recv(&mut self) -> Option<Arc<ForwardedEvent>> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if self.wants(&event) => return Some(event),
                Ok(_) => {}
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "subscriber lagged, events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}
