//! # Shared Registry Access
//!
//! The registry itself is single-threaded: every mutating call takes
//! `&mut self`. [`SharedRegistry`] puts one behind a `parking_lot::RwLock` so
//! several threads can hold it; readers run in parallel, writers are exclusive.

mod shared;

pub use shared::SharedRegistry;
