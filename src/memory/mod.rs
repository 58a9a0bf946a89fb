//! Persistence for engine state
//!
//! Engines are saved together as one JSON snapshot keyed by engine name.
//! The responder core never touches the filesystem; callers decide when to
//! save (explicitly or on the autosave interval) and when to load.

pub mod snapshot;

pub use snapshot::{decode, load, load_into, save, LoadOutcome, Snapshot, SNAPSHOT_VERSION};
