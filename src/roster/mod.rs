//! Durable roster tables.
//!
//! Names and call history each live in their own journal and are
//! replayed into memory on open. The in-memory copies answer every read.

mod history;
mod names;

pub use history::HistoryLog;
pub use names::NameTable;
