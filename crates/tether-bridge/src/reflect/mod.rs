//! Reflection over bound objects
//!
//! Bound objects are discovered one name at a time. A [`ReflectedClass`]
//! remembers every method and field the object confirmed, and a
//! [`ClassRegistry`] keeps one class per bound-object identity until it is
//! finalized.

mod class;
mod descriptor;
mod registry;

pub use class::ReflectedClass;
pub use descriptor::{Field, Method};
pub use registry::ClassRegistry;
