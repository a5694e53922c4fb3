//! Default constants for engine configuration.

/// Default number of allocations between collections at a safepoint.
pub const DEFAULT_GC_THRESHOLD: usize = 4096;

/// Default maximum number of live heap objects (0 = unlimited).
pub const DEFAULT_MAX_HEAP_OBJECTS: usize = 0;

/// Upper bound for nested value conversions (arrays inside objects inside ...).
pub const MAX_CONVERSION_DEPTH: usize = 64;

/// Largest array length; valid indices are `0..MAX_ARRAY_LENGTH`.
pub const MAX_ARRAY_LENGTH: usize = u32::MAX as usize;
