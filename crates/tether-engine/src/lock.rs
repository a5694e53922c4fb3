//! Engine exclusivity lock
//!
//! The engine is single-threaded, but native code it calls into may run for
//! a long time or re-enter the engine. The exclusivity lock records whether
//! the current frame is allowed to touch engine state. It is reentrant: every
//! engine entry point takes it, nested entries just deepen it.
//!
//! Both guards below restore the previous state on drop, including during
//! unwinding, so a lock can never be left dropped or doubly held.

use std::cell::Cell;

/// Lock state shared by an engine and its guards
#[derive(Debug, Default)]
pub struct LockState {
    depth: Cell<u32>,
}

impl LockState {
    /// Current lock depth
    pub fn depth(&self) -> u32 {
        self.depth.get()
    }

    /// Whether the lock is held
    pub fn is_held(&self) -> bool {
        self.depth.get() > 0
    }

    /// Acquire the lock (reentrant)
    pub fn lock(&self) -> EngineLock<'_> {
        self.depth.set(self.depth.get() + 1);
        EngineLock { state: self }
    }

    /// Release every level of the lock until the guard is dropped
    pub fn drop_all(&self) -> DropAllLocks<'_> {
        let saved = self.depth.replace(0);
        DropAllLocks {
            state: self,
            saved,
        }
    }
}

/// RAII guard for one level of the exclusivity lock
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct EngineLock<'a> {
    state: &'a LockState,
}

impl Drop for EngineLock<'_> {
    fn drop(&mut self) {
        let depth = self.state.depth.get();
        debug_assert!(depth > 0, "engine lock released more often than taken");
        self.state.depth.set(depth.saturating_sub(1));
    }
}

/// RAII guard that keeps the exclusivity lock fully released.
///
/// Held around calls into native code; dropping it re-acquires the lock at
/// exactly the depth it had before.
#[must_use = "the lock is re-acquired as soon as the guard is dropped"]
pub struct DropAllLocks<'a> {
    state: &'a LockState,
    saved: u32,
}

impl DropAllLocks<'_> {
    /// Depth that will be restored on drop
    pub fn saved_depth(&self) -> u32 {
        self.saved
    }
}

impl Drop for DropAllLocks<'_> {
    fn drop(&mut self) {
        // Nested entries made while released have unwound by now
        self.state.depth.set(self.saved);
    }
}
