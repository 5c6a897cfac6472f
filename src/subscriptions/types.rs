//! Subscription types for roster notifications.

use crate::types::CallRecord;
use serde::{Deserialize, Serialize};

/// Configuration for a subscription.
#[derive(Clone, Debug)]
pub struct SubscriptionConfig {
    /// Max buffered events before dropping subscriber.
    /// Default: 256
    pub buffer_size: usize,

    /// Filter criteria.
    pub filter: SubscriptionFilter,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            filter: SubscriptionFilter::all(),
        }
    }
}

/// Filter criteria for subscriptions.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionFilter {
    /// Include name additions, removals and clears.
    pub include_roster: bool,

    /// Include recorded calls.
    pub include_history: bool,

    /// Include storage failures.
    pub include_failures: bool,
}

impl SubscriptionFilter {
    /// Subscribe to roster mutations.
    pub fn roster() -> Self {
        Self {
            include_roster: true,
            ..Default::default()
        }
    }

    /// Subscribe to recorded calls.
    pub fn history() -> Self {
        Self {
            include_history: true,
            ..Default::default()
        }
    }

    /// Subscribe to storage failures.
    pub fn failures() -> Self {
        Self {
            include_failures: true,
            ..Default::default()
        }
    }

    /// Subscribe to everything.
    pub fn all() -> Self {
        Self {
            include_roster: true,
            include_history: true,
            include_failures: true,
        }
    }

    /// Whether an event passes this filter.
    pub fn matches(&self, event: &RosterEvent) -> bool {
        match event {
            RosterEvent::NamesAdded { .. }
            | RosterEvent::NamesRemoved { .. }
            | RosterEvent::RosterCleared { .. } => self.include_roster,
            RosterEvent::CallRecorded { .. } => self.include_history,
            RosterEvent::StorageFailure { .. } => self.include_failures,
            RosterEvent::Dropped { .. } => true,
        }
    }
}

/// Events emitted to subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterEvent {
    // --- Roster Events ---
    /// Names were inserted (single add, bulk add or import).
    NamesAdded { names: Vec<String> },

    /// Names were deleted.
    NamesRemoved { names: Vec<String> },

    /// The roster was cleared.
    RosterCleared { removed: usize },

    // --- History Events ---
    /// A final pick was recorded.
    CallRecorded { record: CallRecord },

    // --- Failure Events ---
    /// A storage operation failed and was reported to its caller as a
    /// false, zero or empty result.
    StorageFailure { operation: String, message: String },

    // --- Lifecycle Events ---
    /// Subscription was dropped.
    Dropped { reason: DropReason },
}

/// Why a subscription was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Handle to manage a subscription.
pub struct SubscriptionHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<RosterEvent>,
}

impl SubscriptionHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<RosterEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<RosterEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<RosterEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain every event currently queued.
    pub fn drain(&self) -> Vec<RosterEvent> {
        self.receiver.try_iter().collect()
    }
}
