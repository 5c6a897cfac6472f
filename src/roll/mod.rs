//! The decelerating roll.
//!
//! A roll draws names without replacement from a shuffled pool, one per
//! tick, while the delay between ticks grows from `min_speed` to
//! `max_speed`. The tick that arrives at `max_speed` is the final pick.
//!
//! The engine owns no timer. A front end calls [`RollEngine::advance`]
//! after each delay the previous tick asked for:
//!
//! ```ignore
//! let mut engine = RollEngine::new(settings.random.clone())?;
//! if let Toggle::Started { first_delay } = engine.toggle(&store)? {
//!     let mut delay = first_delay;
//!     loop {
//!         std::thread::sleep(delay);
//!         let Some(tick) = engine.advance(&store) else { break };
//!         show(&tick.name);
//!         match tick.next_delay {
//!             Some(next) => delay = next,
//!             None => break,
//!         }
//!     }
//! }
//! ```

mod engine;

pub use engine::{RollEngine, Tick, Toggle};

/// Where the engine gets names from and reports final picks to.
pub trait RosterSource {
    /// Current roster; the engine keeps its own copy.
    fn list_names(&self) -> Vec<String>;

    /// Record a final pick. Returns false if it could not be stored.
    fn record_call(&self, name: &str) -> bool;
}
