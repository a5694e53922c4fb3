//! Method and field descriptors

use tether_engine::{Engine, Value};

use crate::instance::Instance;
use crate::marshal;
use crate::script_value::ScriptValue;
use crate::BridgeResult;

/// A method a bound object confirmed it has
#[derive(Debug, PartialEq, Eq)]
pub struct Method {
    name: String,
}

impl Method {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke this method on `instance`
    pub fn invoke(
        &self,
        engine: &Engine,
        instance: &Instance,
        args: &[Value],
    ) -> BridgeResult<ScriptValue> {
        instance.invoke_named(engine, &self.name, args)
    }
}

/// A property a bound object confirmed it has
#[derive(Debug, PartialEq, Eq)]
pub struct Field {
    name: String,
}

impl Field {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read the field from `instance`
    pub fn value_from_instance(
        &self,
        engine: &Engine,
        instance: &Instance,
    ) -> BridgeResult<ScriptValue> {
        let native = instance.bound_object().get_property(&self.name);
        marshal::native_to_script_value(engine, instance.registry(), &native)
    }

    /// Write `value` to the field on `instance`
    pub fn set_value_to_instance(&self, engine: &Engine, instance: &Instance, value: &Value) {
        let native = marshal::script_to_native(engine, instance.registry(), value);
        instance.bound_object().set_property(&self.name, native);
    }
}
