//! Per-object descriptor cache

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tether_engine::Engine;
use tracing::trace;

use super::descriptor::{Field, Method};
use crate::instance::Instance;

/// Methods and fields discovered on one bound object.
///
/// Only hits are cached. A name the object does not have is probed again on
/// every lookup, so objects that gain members later are still seen.
///
/// Lookups take the cache's read lock. Inserts take the engine lock and then
/// the write lock; when two lookups race on a miss, the first descriptor
/// stored is the one every later lookup returns.
#[derive(Debug, Default)]
pub struct ReflectedClass {
    methods: RwLock<FxHashMap<String, Arc<Method>>>,
    fields: RwLock<FxHashMap<String, Arc<Field>>>,
}

impl ReflectedClass {
    /// Create an empty class
    pub fn new() -> Self {
        Self::default()
    }

    /// Methods named `name`: at most one, since overloads are not supported
    pub fn methods_named(&self, engine: &Engine, name: &str, instance: &Instance) -> Vec<Arc<Method>> {
        if let Some(method) = self.methods.read().get(name) {
            return vec![Arc::clone(method)];
        }
        if !instance.bound_object().has_method(name) {
            return Vec::new();
        }

        let _lock = engine.lock();
        let mut methods = self.methods.write();
        let method = methods.entry(name.to_string()).or_insert_with(|| {
            trace!(name, "caching method descriptor");
            Arc::new(Method::new(name))
        });
        vec![Arc::clone(method)]
    }

    /// The field named `name`, if the object has one
    pub fn field_named(&self, engine: &Engine, name: &str, instance: &Instance) -> Option<Arc<Field>> {
        if let Some(field) = self.fields.read().get(name) {
            return Some(Arc::clone(field));
        }
        if !instance.bound_object().has_property(name) {
            return None;
        }

        let _lock = engine.lock();
        let mut fields = self.fields.write();
        let field = fields.entry(name.to_string()).or_insert_with(|| {
            trace!(name, "caching field descriptor");
            Arc::new(Field::new(name))
        });
        Some(Arc::clone(field))
    }

    /// Number of cached method descriptors
    pub fn method_count(&self) -> usize {
        self.methods.read().len()
    }

    /// Number of cached field descriptors
    pub fn field_count(&self) -> usize {
        self.fields.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use tether_sdk::{AbiResult, BoundObject, NativeError, NativeValue};

    use crate::reflect::ClassRegistry;

    #[derive(Default)]
    struct Probe {
        method_probes: Cell<usize>,
        property_probes: Cell<usize>,
    }

    impl BoundObject for Probe {
        fn has_method(&self, name: &str) -> bool {
            self.method_probes.set(self.method_probes.get() + 1);
            name == "run"
        }
        fn has_property(&self, name: &str) -> bool {
            self.property_probes.set(self.property_probes.get() + 1);
            name == "size"
        }
        fn invoke_method(&self, name: &str, _args: &[NativeValue]) -> AbiResult<NativeValue> {
            Err(NativeError::NotFound(name.to_string()))
        }
        fn get_property(&self, _name: &str) -> NativeValue {
            NativeValue::Int32(1)
        }
        fn set_property(&self, _name: &str, _value: NativeValue) {}
        fn string_value(&self) -> String {
            "probe".to_string()
        }
    }

    fn setup() -> (Engine, Rc<Probe>, Instance) {
        let engine = Engine::default();
        let probe = Rc::new(Probe::default());
        let instance = Instance::new(probe.clone(), Rc::new(ClassRegistry::default()));
        (engine, probe, instance)
    }

    #[test]
    fn test_method_hit_is_cached() {
        let (engine, probe, instance) = setup();
        let class = instance.class();

        let first = class.methods_named(&engine, "run", &instance);
        let second = class.methods_named(&engine, "run", &instance);

        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(probe.method_probes.get(), 1);
        assert_eq!(class.method_count(), 1);
    }

    #[test]
    fn test_method_miss_is_probed_every_time() {
        let (engine, probe, instance) = setup();
        let class = instance.class();

        for _ in 0..5 {
            assert!(class.methods_named(&engine, "missing", &instance).is_empty());
        }
        assert_eq!(probe.method_probes.get(), 5);
        assert_eq!(class.method_count(), 0);
    }

    #[test]
    fn test_field_lookup() {
        let (engine, probe, instance) = setup();
        let class = instance.class();

        let size = class.field_named(&engine, "size", &instance).unwrap();
        assert_eq!(size.name(), "size");
        assert!(Arc::ptr_eq(
            &size,
            &class.field_named(&engine, "size", &instance).unwrap()
        ));
        assert!(class.field_named(&engine, "nope", &instance).is_none());
        assert!(class.field_named(&engine, "nope", &instance).is_none());

        assert_eq!(probe.property_probes.get(), 3);
        assert_eq!(class.field_count(), 1);
    }

    #[test]
    fn test_insert_releases_engine_lock() {
        let (engine, _probe, instance) = setup();
        instance.class().methods_named(&engine, "run", &instance);
        assert!(!engine.is_locked());
    }
}
