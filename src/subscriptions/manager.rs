//! Subscription manager for broadcasting roster events.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{
    DropReason, RosterEvent, SubscriptionConfig, SubscriptionHandle, SubscriptionId,
};

/// Internal subscription state.
struct Subscription {
    config: SubscriptionConfig,
    sender: Sender<RosterEvent>,
}

impl Subscription {
    /// Try to send an event. Returns false if buffer is full or the
    /// receiver is gone (subscriber will be dropped).
    fn try_send(&self, event: RosterEvent) -> bool {
        self.sender.try_send(event).is_ok()
    }
}

/// Manages subscriptions and broadcasts events.
pub struct SubscriptionManager {
    /// Active subscriptions by ID.
    subscriptions: RwLock<HashMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    /// Create a new subscription manager.
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a new subscription.
    pub fn subscribe(&self, config: SubscriptionConfig) -> SubscriptionHandle {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.subscriptions
            .write()
            .insert(id, Subscription { config, sender });

        SubscriptionHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subs = self.subscriptions.write();
        if let Some(sub) = subs.remove(&id) {
            // Send dropped event (best effort)
            let _ = sub.sender.try_send(RosterEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Broadcast an event to matching subscriptions. Drops subscribers that
    /// fail to receive.
    pub fn broadcast(&self, event: RosterEvent) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscriptions.read();
            for (id, sub) in subs.iter() {
                if sub.config.filter.matches(&event) && !sub.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscriptions.write();
            for id in to_remove {
                if let Some(sub) = subs.remove(&id) {
                    tracing::warn!(subscription = id.0, "Dropping slow roster subscriber");
                    // Buffer is usually full here, so this rarely lands
                    let _ = sub.sender.try_send(RosterEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::SubscriptionFilter;
    use std::time::Duration;

    fn added(name: &str) -> RosterEvent {
        RosterEvent::NamesAdded {
            names: vec![name.to_string()],
        }
    }

    #[test]
    fn test_subscribe_unsubscribe() {
        let manager = SubscriptionManager::new();

        let handle = manager.subscribe(SubscriptionConfig::default());
        assert_eq!(manager.subscription_count(), 1);

        manager.unsubscribe(handle.id);
        assert_eq!(manager.subscription_count(), 0);

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(
            event,
            RosterEvent::Dropped {
                reason: DropReason::Unsubscribed
            }
        );
    }

    #[test]
    fn test_broadcast_to_matching() {
        let manager = SubscriptionManager::new();

        let handle = manager.subscribe(SubscriptionConfig {
            filter: SubscriptionFilter::roster(),
            ..Default::default()
        });

        manager.broadcast(added("Alice"));

        let event = handle.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(event, added("Alice"));
    }

    #[test]
    fn test_broadcast_filters_non_matching() {
        let manager = SubscriptionManager::new();

        let handle = manager.subscribe(SubscriptionConfig {
            filter: SubscriptionFilter::failures(),
            ..Default::default()
        });

        manager.broadcast(added("Alice"));
        manager.broadcast(RosterEvent::RosterCleared { removed: 1 });

        let result = handle.recv_timeout(Duration::from_millis(50));
        assert!(result.is_err());

        manager.broadcast(RosterEvent::StorageFailure {
            operation: "add_name".to_string(),
            message: "disk full".to_string(),
        });
        assert!(matches!(
            handle.try_recv(),
            Ok(RosterEvent::StorageFailure { .. })
        ));
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let manager = SubscriptionManager::new();
        let _handle = manager.subscribe(SubscriptionConfig {
            buffer_size: 2,
            filter: SubscriptionFilter::roster(),
        });

        for i in 0..10 {
            manager.broadcast(added(&format!("name-{i}")));
        }

        assert_eq!(manager.subscription_count(), 0);
    }

    #[test]
    fn test_disconnected_subscriber_is_removed() {
        let manager = SubscriptionManager::new();
        let handle = manager.subscribe(SubscriptionConfig::default());
        drop(handle);

        manager.broadcast(added("Alice"));
        assert_eq!(manager.subscription_count(), 0);
    }
}
