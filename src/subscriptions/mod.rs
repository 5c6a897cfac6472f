//! Subscription system for roster change notifications.
//!
//! Front ends register interest in roster mutations, recorded calls, or
//! storage failures and receive [`RosterEvent`]s over a bounded channel.
//! The store broadcasts after a mutation has been persisted. Subscribers
//! that fall behind are dropped rather than blocking the store.
//!
//! # Example
//!
//! ```ignore
//! let handle = store.subscribe(SubscriptionConfig {
//!     filter: SubscriptionFilter::roster(),
//!     ..Default::default()
//! });
//!
//! store.add_name("Alice");
//!
//! match handle.try_recv() {
//!     Ok(RosterEvent::NamesAdded { names }) => println!("added {names:?}"),
//!     _ => {}
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, RosterEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId,
};
