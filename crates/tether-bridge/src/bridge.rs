//! Bridge context
//!
//! A [`Bridge`] owns the class registry for one engine. It is created once by
//! the embedder with [`Bridge::init`] and torn down with
//! [`Bridge::shutdown`], which consumes it. Host wrappers created through it
//! keep a handle to the registry and stay usable after shutdown; their
//! classes are resolved again from a fresh map.

use std::rc::Rc;

use tether_engine::Engine;
use tether_sdk::{BoundObject, NativeValue};
use tracing::debug;

use crate::marshal;
use crate::reflect::ClassRegistry;
use crate::script_value::ScriptValue;
use crate::BridgeResult;

/// Default number of classes the registry has room for before growing
pub const DEFAULT_REGISTRY_CAPACITY: usize = 64;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Initial capacity of the class registry
    pub registry_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            registry_capacity: DEFAULT_REGISTRY_CAPACITY,
        }
    }
}

/// Native side of one engine's object bridge
pub struct Bridge {
    engine: Engine,
    registry: Rc<ClassRegistry>,
    options: BridgeOptions,
}

impl Bridge {
    /// Create the bridge for `engine`
    pub fn init(engine: Engine, options: BridgeOptions) -> Self {
        debug!(registry_capacity = options.registry_capacity, "initializing bridge");
        let registry = Rc::new(ClassRegistry::with_capacity(options.registry_capacity));
        Self {
            engine,
            registry,
            options,
        }
    }

    /// The engine this bridge serves
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The class registry
    pub fn registry(&self) -> &Rc<ClassRegistry> {
        &self.registry
    }

    /// Bridge configuration
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }

    /// A new `undefined` value
    pub fn value(&self) -> ScriptValue {
        ScriptValue::new(&self.engine)
    }

    /// Expose `obj` to script inside a new host wrapper
    pub fn expose(&self, obj: Rc<dyn BoundObject>) -> BridgeResult<ScriptValue> {
        let wrapper = marshal::expose_object(&self.engine, &self.registry, &obj)?;
        Ok(ScriptValue::adopt(&self.engine, wrapper))
    }

    /// Convert a native value for script
    pub fn to_script(&self, value: &NativeValue) -> BridgeResult<ScriptValue> {
        marshal::native_to_script_value(&self.engine, &self.registry, value)
    }

    /// Convert a script value for native code
    pub fn to_native(&self, value: &ScriptValue) -> NativeValue {
        marshal::script_to_native(&self.engine, &self.registry, value.engine_value())
    }

    /// Tear the bridge down, dropping every reflected class
    pub fn shutdown(self) {
        debug!(classes = self.registry.len(), "shutting down bridge");
        self.registry.finalize();
    }
}
