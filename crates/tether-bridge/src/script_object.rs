//! ScriptObject - a script object seen from native code
//!
//! When a script object is passed to a bound object it arrives as a
//! `ScriptObject`, which implements [`BoundObject`] on top of a rooted
//! [`ScriptValue`]. Native code can read and write its properties, call its
//! methods, or call it directly when it is a function. Passing the proxy back
//! to script yields the original object.
//!
//! A proxy stored inside a bound object that is itself reachable from the
//! proxied object forms a reference cycle the collector cannot see through;
//! such cycles are never freed.

use std::any::Any;
use std::rc::Rc;

use tether_engine::{EngineError, ObjectKind, Value};
use tether_sdk::{AbiResult, BoundObject, NativeError, NativeValue, PropertyKeys};
use tracing::warn;

use crate::marshal;
use crate::reflect::ClassRegistry;
use crate::script_value::ScriptValue;

/// Native view of a script object
pub struct ScriptObject {
    value: ScriptValue,
    registry: Rc<ClassRegistry>,
}

impl ScriptObject {
    /// Proxy `value`; nested objects are converted through `registry`
    pub fn new(value: ScriptValue, registry: Rc<ClassRegistry>) -> Self {
        Self { value, registry }
    }

    /// The proxied script value
    pub fn script_value(&self) -> &ScriptValue {
        &self.value
    }

    fn call_with(&self, callee: &Value, args: &[NativeValue]) -> AbiResult<NativeValue> {
        let engine = self.value.context();
        let args = args
            .iter()
            .map(|arg| marshal::native_to_script(engine, &self.registry, arg))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| NativeError::ArgumentError(err.to_string()))?;

        match engine.call(callee, self.value.engine_value(), &args) {
            Ok(result) => Ok(marshal::script_to_native(engine, &self.registry, &result)),
            Err(err @ EngineError::Exception(_)) => {
                let description = engine.describe_error(&err);
                engine.report_exception(&err);
                Err(NativeError::InvocationFailed(description))
            }
            Err(err) => Err(NativeError::InvocationFailed(err.to_string())),
        }
    }

    fn own_property_names(&self) -> Vec<String> {
        self.value
            .context()
            .own_property_names(self.value.engine_value())
            .unwrap_or_default()
    }
}

impl BoundObject for ScriptObject {
    fn has_method(&self, name: &str) -> bool {
        let engine = self.value.context();
        engine
            .get(self.value.engine_value(), name)
            .is_ok_and(|member| engine.object_kind(&member) == Some(ObjectKind::Function))
    }

    fn has_property(&self, name: &str) -> bool {
        self.own_property_names().iter().any(|key| key == name)
    }

    fn invoke_method(&self, name: &str, args: &[NativeValue]) -> AbiResult<NativeValue> {
        let engine = self.value.context();
        let method = engine
            .get(self.value.engine_value(), name)
            .map_err(|err| NativeError::InvocationFailed(err.to_string()))?;
        if engine.object_kind(&method) != Some(ObjectKind::Function) {
            return Err(NativeError::NotFound(name.to_string()));
        }
        let method = engine.root(method);
        self.call_with(method.value(), args)
    }

    fn invoke(&self, args: &[NativeValue]) -> AbiResult<NativeValue> {
        if !self.is_function() {
            return Err(NativeError::NotCallable);
        }
        self.call_with(self.value.engine_value(), args)
    }

    fn is_function(&self) -> bool {
        self.value.is_function()
    }

    fn get_property(&self, name: &str) -> NativeValue {
        let engine = self.value.context();
        match engine.get(self.value.engine_value(), name) {
            Ok(value) => marshal::script_to_native(engine, &self.registry, &value),
            Err(err) => {
                warn!(property = name, error = %err, "script property read failed");
                NativeValue::Void
            }
        }
    }

    fn set_property(&self, name: &str, value: NativeValue) {
        let engine = self.value.context();
        let result = marshal::native_to_script(engine, &self.registry, &value)
            .and_then(|value| Ok(engine.set(self.value.engine_value(), name, value)?));
        if let Err(err) = result {
            warn!(property = name, error = %err, "script property write failed");
        }
    }

    fn string_value(&self) -> String {
        self.value.context().to_display_string(self.value.engine_value())
    }

    fn properties(&self) -> PropertyKeys<'_> {
        Box::new(self.own_property_names().into_iter())
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }
}
