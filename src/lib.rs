//! # Roll Call
//!
//! A persisted class roster and a decelerating random name caller.
//!
//! ## Core Concepts
//!
//! - **Roster**: unique, trimmed names kept in a checksummed journal
//! - **History**: append-only log of every final pick
//! - **Roll**: a draw without replacement whose tick delay grows until it
//!   reaches `max_speed`, at which point the pick is recorded
//! - **Subscriptions**: change notifications for front ends
//!
//! ## Example
//!
//! ```ignore
//! use rollcall::{RollEngine, RosterConfig, RosterStore, Settings, Toggle};
//!
//! let store = RosterStore::open_or_create(RosterConfig::default())?;
//! store.add_names(&["Alice", "Bob", "Carol"]);
//!
//! let settings = Settings::load_or_default("config.json");
//! let mut engine = RollEngine::new(settings.random.clone())?;
//!
//! if let Toggle::Started { .. } = engine.toggle(&store)? {
//!     while let Some(tick) = engine.advance(&store) {
//!         if tick.is_final() {
//!             println!("Called: {}", tick.name);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod config;
pub mod error;
pub mod journal;
pub mod roll;
pub mod roster;
pub mod store;
pub mod subscriptions;
pub mod transfer;
pub mod types;

// Re-exports
pub use config::{ButtonStyle, RollConfig, Settings, SimpleModeSettings, ThemeMode, ThemeSettings};
pub use error::{Result, RollError, RosterError};
pub use journal::Journal;
pub use roll::{RollEngine, RosterSource, Tick, Toggle};
pub use roster::{HistoryLog, NameTable};
pub use store::{RosterConfig, RosterStore};
pub use subscriptions::{
    DropReason, RosterEvent, SubscriptionConfig, SubscriptionFilter, SubscriptionHandle,
    SubscriptionId, SubscriptionManager,
};
pub use transfer::{export_file, import_file, Format};
pub use types::*;
