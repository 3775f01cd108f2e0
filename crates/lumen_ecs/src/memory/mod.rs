//! # Memory Management
//!
//! Raw storage primitives for component data.
//!
//! ## Design Philosophy
//!
//! Component bytes live in aligned heap buffers that only grow. This module
//! is the only place in the crate allowed to touch raw pointers; the rest of
//! the ECS works on byte slices.

mod aligned;

pub use aligned::{AlignedBuffer, AllocError};
