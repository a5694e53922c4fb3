//! Instance - the engine-facing adapter for one bound object
//!
//! The engine never talks to a bound object directly. Each exposed object is
//! wrapped in an `Instance`, which sits inside an engine host wrapper and
//! answers the engine's host-object questions: which names are methods,
//! which are fields, how to call them and how to enumerate them.
//!
//! Calls into the bound object itself (`invoke`, `invoke_method` and key
//! enumeration) run with the engine's exclusivity lock fully released, since
//! native code may block or re-enter the engine. A failed native call becomes
//! a thrown script `Error`; nothing here faults the engine.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tether_engine::{Engine, EngineError, EngineResult, HostObject, PreferredType, Value};
use tether_sdk::{BoundObject, NativeValue};
use tracing::warn;

use crate::marshal;
use crate::reflect::{ClassRegistry, Method, ReflectedClass};
use crate::script_value::ScriptValue;
use crate::{BridgeError, BridgeResult};

/// Adapter between one bound object and the engine
pub struct Instance {
    object: Rc<dyn BoundObject>,
    registry: Rc<ClassRegistry>,
    class: OnceCell<Arc<ReflectedClass>>,
}

impl Instance {
    /// Wrap `object`; its class is resolved through `registry` on first use
    pub fn new(object: Rc<dyn BoundObject>, registry: Rc<ClassRegistry>) -> Self {
        Self {
            object,
            registry,
            class: OnceCell::new(),
        }
    }

    /// The wrapped bound object
    pub fn bound_object(&self) -> &Rc<dyn BoundObject> {
        &self.object
    }

    /// The registry this instance resolves its class through
    pub fn registry(&self) -> &Rc<ClassRegistry> {
        &self.registry
    }

    /// The reflected class, resolved once and then reused
    pub fn class(&self) -> Arc<ReflectedClass> {
        Arc::clone(
            self.class
                .get_or_init(|| self.registry.class_for_object(&self.object)),
        )
    }

    /// Whether the bound object can be called as a function
    pub fn is_callable(&self) -> bool {
        self.object.is_function()
    }

    /// Bound objects are always truthy
    pub fn boolean_value(&self) -> bool {
        true
    }

    /// Call the bound object as a function.
    ///
    /// A bound object that is not callable yields `undefined` without being
    /// invoked.
    pub fn invoke_as_function(&self, engine: &Engine, args: &[Value]) -> BridgeResult<ScriptValue> {
        if !self.is_callable() {
            return Ok(ScriptValue::new(engine));
        }

        let native_args = self.marshal_args(engine, args);
        let outcome = {
            let _unlocked = engine.drop_all_locks();
            self.object.invoke(&native_args)
        };

        match outcome {
            Ok(result) => marshal::native_to_script_value(engine, &self.registry, &result),
            Err(err) => {
                warn!(error = %err, "bound object invocation failed");
                Err(BridgeError::invocation("error invoking object as function"))
            }
        }
    }

    /// Invoke the method resolved by [`ReflectedClass::methods_named`].
    ///
    /// # Panics
    ///
    /// Panics if `methods` holds more than one descriptor; overloads are not
    /// supported.
    pub fn invoke_method(
        &self,
        engine: &Engine,
        methods: &[Arc<Method>],
        args: &[Value],
    ) -> BridgeResult<ScriptValue> {
        assert!(
            methods.len() <= 1,
            "overloaded methods are not supported ({} candidates)",
            methods.len()
        );
        match methods.first() {
            Some(method) => method.invoke(engine, self, args),
            None => Err(BridgeError::invocation("error invoking method")),
        }
    }

    pub(crate) fn invoke_named(
        &self,
        engine: &Engine,
        name: &str,
        args: &[Value],
    ) -> BridgeResult<ScriptValue> {
        let native_args = self.marshal_args(engine, args);
        let outcome = {
            let _unlocked = engine.drop_all_locks();
            self.object.invoke_method(name, &native_args)
        };

        match outcome {
            Ok(result) => marshal::native_to_script_value(engine, &self.registry, &result),
            Err(err) => {
                warn!(method = name, error = %err, "bound method invocation failed");
                Err(BridgeError::invocation(format!(
                    "error invoking method '{}'",
                    name
                )))
            }
        }
    }

    /// Read a field. `None` means the bound object has no such field.
    pub fn get_property(&self, engine: &Engine, name: &str) -> BridgeResult<Option<ScriptValue>> {
        match self.class().field_named(engine, name, self) {
            Some(field) => field.value_from_instance(engine, self).map(Some),
            None => Ok(None),
        }
    }

    /// Write a field. `false` means the bound object has no such field.
    pub fn set_property(&self, engine: &Engine, name: &str, value: &Value) -> bool {
        match self.class().field_named(engine, name, self) {
            Some(field) => {
                field.set_value_to_instance(engine, self, value);
                true
            }
            None => false,
        }
    }

    /// The bound object's own property names
    pub fn enumerate_properties(&self, engine: &Engine) -> Vec<String> {
        let _unlocked = engine.drop_all_locks();
        self.object.properties().collect()
    }

    /// Primitive form: `0` when a number is preferred, otherwise the bound
    /// object's string value.
    pub fn coerce_to_primitive(&self, hint: PreferredType) -> Value {
        match hint {
            PreferredType::Number => Value::Number(0.0),
            _ => Value::string(&self.object.string_value()),
        }
    }

    fn marshal_args(&self, engine: &Engine, args: &[Value]) -> Vec<NativeValue> {
        args.iter()
            .map(|arg| marshal::script_to_native(engine, &self.registry, arg))
            .collect()
    }
}

/// Convert a bridge failure into something the engine can throw
fn into_engine_error(engine: &Engine, err: BridgeError) -> EngineError {
    match err {
        BridgeError::Engine(err) => err,
        BridgeError::Invocation { message } => engine.throw_error(&message),
        BridgeError::Exception(description) => engine.throw_error(&description),
    }
}

impl HostObject for Instance {
    fn get_property(&self, engine: &Engine, name: &str) -> EngineResult<Option<Value>> {
        Instance::get_property(self, engine, name)
            .map(|value| value.map(|v| v.engine_value().clone()))
            .map_err(|err| into_engine_error(engine, err))
    }

    fn set_property(&self, engine: &Engine, name: &str, value: &Value) -> EngineResult<bool> {
        Ok(Instance::set_property(self, engine, name, value))
    }

    fn has_method(&self, engine: &Engine, name: &str) -> bool {
        !self.class().methods_named(engine, name, self).is_empty()
    }

    fn invoke_method(&self, engine: &Engine, name: &str, args: &[Value]) -> EngineResult<Value> {
        let methods = self.class().methods_named(engine, name, self);
        Instance::invoke_method(self, engine, &methods, args)
            .map(|result| result.engine_value().clone())
            .map_err(|err| into_engine_error(engine, err))
    }

    fn is_callable(&self) -> bool {
        Instance::is_callable(self)
    }

    fn call(&self, engine: &Engine, args: &[Value]) -> EngineResult<Value> {
        self.invoke_as_function(engine, args)
            .map(|result| result.engine_value().clone())
            .map_err(|err| into_engine_error(engine, err))
    }

    fn own_property_names(&self, engine: &Engine) -> Vec<String> {
        self.enumerate_properties(engine)
    }

    fn to_primitive(&self, _engine: &Engine, hint: PreferredType) -> EngineResult<Value> {
        Ok(self.coerce_to_primitive(hint))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    use tether_sdk::{AbiResult, NativeError};

    /// Records what it saw; `echo` returns its first argument, `fail` fails
    struct Recorder {
        engine: Engine,
        callable: bool,
        invoked: Cell<usize>,
        locked_inside: RefCell<Vec<bool>>,
        label: RefCell<String>,
    }

    impl Recorder {
        fn new(engine: &Engine, callable: bool) -> Self {
            Self {
                engine: engine.clone(),
                callable,
                invoked: Cell::new(0),
                locked_inside: RefCell::new(Vec::new()),
                label: RefCell::new("recorder".to_string()),
            }
        }

        fn observe(&self) {
            self.invoked.set(self.invoked.get() + 1);
            self.locked_inside.borrow_mut().push(self.engine.is_locked());
        }
    }

    impl BoundObject for Recorder {
        fn has_method(&self, name: &str) -> bool {
            matches!(name, "echo" | "fail")
        }
        fn has_property(&self, name: &str) -> bool {
            name == "label"
        }
        fn invoke_method(&self, name: &str, args: &[NativeValue]) -> AbiResult<NativeValue> {
            self.observe();
            match name {
                "echo" => Ok(args.first().cloned().unwrap_or_default()),
                _ => Err(NativeError::InvocationFailed("refused".to_string())),
            }
        }
        fn invoke(&self, args: &[NativeValue]) -> AbiResult<NativeValue> {
            self.observe();
            Ok(NativeValue::Int32(args.len() as i32))
        }
        fn is_function(&self) -> bool {
            self.callable
        }
        fn get_property(&self, _name: &str) -> NativeValue {
            NativeValue::String(self.label.borrow().clone())
        }
        fn set_property(&self, _name: &str, value: NativeValue) {
            if let Some(s) = value.as_str() {
                *self.label.borrow_mut() = s.to_string();
            }
        }
        fn string_value(&self) -> String {
            format!("[{}]", self.label.borrow())
        }
        fn properties(&self) -> tether_sdk::PropertyKeys<'_> {
            self.observe();
            Box::new(vec!["label".to_string()].into_iter())
        }
    }

    fn instance(engine: &Engine, callable: bool) -> (Rc<Recorder>, Instance) {
        let recorder = Rc::new(Recorder::new(engine, callable));
        let instance = Instance::new(recorder.clone(), Rc::new(ClassRegistry::new()));
        (recorder, instance)
    }

    #[test]
    fn test_class_is_resolved_once() {
        let engine = Engine::default();
        let (_recorder, instance) = instance(&engine, false);
        let a = instance.class();
        instance.registry().finalize();
        let b = instance.class();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_non_callable_returns_undefined_without_invoking() {
        let engine = Engine::default();
        let (recorder, instance) = instance(&engine, false);

        let result = instance.invoke_as_function(&engine, &[Value::from(1)]).unwrap();
        assert!(result.is_undefined());
        assert_eq!(recorder.invoked.get(), 0);
    }

    #[test]
    fn test_invoke_as_function_releases_lock() {
        let engine = Engine::default();
        let (recorder, instance) = instance(&engine, true);

        let _held = engine.lock();
        let result = instance
            .invoke_as_function(&engine, &[Value::Null, Value::from(2)])
            .unwrap();
        assert_eq!(result.number_value(), 2.0);
        assert_eq!(recorder.locked_inside.borrow().as_slice(), [false]);
        assert!(engine.is_locked());
    }

    #[test]
    fn test_invoke_method_round_trips_argument() {
        let engine = Engine::default();
        let (recorder, instance) = instance(&engine, false);

        let methods = instance.class().methods_named(&engine, "echo", &instance);
        let result = instance
            .invoke_method(&engine, &methods, &[Value::from("hi")])
            .unwrap();
        assert_eq!(result.string_value(), "hi");
        assert_eq!(recorder.invoked.get(), 1);
    }

    #[test]
    fn test_failed_method_reports_fixed_message() {
        let engine = Engine::default();
        let (_recorder, instance) = instance(&engine, false);

        let methods = instance.class().methods_named(&engine, "fail", &instance);
        let err = instance.invoke_method(&engine, &methods, &[]).unwrap_err();
        assert_eq!(err.to_string(), "error invoking method 'fail'");
    }

    #[test]
    #[should_panic(expected = "overloaded methods are not supported")]
    fn test_overloads_panic() {
        let engine = Engine::default();
        let (_recorder, instance) = instance(&engine, false);
        let methods = vec![Arc::new(Method::new("echo")), Arc::new(Method::new("echo"))];
        let _ = instance.invoke_method(&engine, &methods, &[]);
    }

    #[test]
    fn test_fields_and_fallthrough() {
        let engine = Engine::default();
        let (recorder, instance) = instance(&engine, false);

        assert!(instance.set_property(&engine, "label", &Value::from("renamed")));
        assert_eq!(*recorder.label.borrow(), "renamed");
        let label = instance.get_property(&engine, "label").unwrap().unwrap();
        assert_eq!(label.string_value(), "renamed");

        assert!(!instance.set_property(&engine, "other", &Value::Null));
        assert!(instance.get_property(&engine, "other").unwrap().is_none());
    }

    #[test]
    fn test_enumerate_releases_lock() {
        let engine = Engine::default();
        let (recorder, instance) = instance(&engine, false);

        let _held = engine.lock();
        assert_eq!(instance.enumerate_properties(&engine), vec!["label".to_string()]);
        assert_eq!(recorder.locked_inside.borrow().as_slice(), [false]);
        assert!(engine.is_locked());
    }

    #[test]
    fn test_coerce_to_primitive() {
        let engine = Engine::default();
        let (_recorder, instance) = instance(&engine, false);
        assert_eq!(instance.coerce_to_primitive(PreferredType::Number), Value::Number(0.0));
        assert_eq!(
            instance.coerce_to_primitive(PreferredType::String),
            Value::from("[recorder]")
        );
        assert!(instance.boolean_value());
    }
}
