//! Garbage collection system
//!
//! A non-moving mark-sweep collector over a slot-table heap.
//!
//! # Architecture
//!
//! - **Heap**: slot table with free list and generation-checked handles
//! - **RootSet**: counted persistent roots plus call-scoped stack roots
//! - **Root**: RAII guard holding one persistent root count
//! - **collect**: mark from roots, sweep everything unmarked
//!
//! Native code is invisible to the collector. Any value held on the native
//! side across an allocation or a collection must be kept in a [`Root`].

mod collector;
mod heap;
mod roots;

pub(crate) use collector::collect;
pub use collector::GcStats;
pub use heap::Heap;
pub use roots::{Root, RootSet};
