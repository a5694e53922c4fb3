//! Value conversion across the native/script boundary
//!
//! Primitives are copied. Objects are never copied: a bound object handed to
//! script is wrapped in a host wrapper around an [`Instance`], and a script
//! object handed to native code is wrapped in a [`ScriptObject`] proxy. Each
//! wrapper is unwrapped again when the value crosses back, so an object that
//! makes a round trip comes back as itself.

use std::rc::Rc;

use tether_engine::{Engine, Value};
use tether_sdk::{BoundObject, NativeValue};

use crate::instance::Instance;
use crate::reflect::ClassRegistry;
use crate::script_object::ScriptObject;
use crate::script_value::ScriptValue;
use crate::BridgeResult;

/// Convert an engine value for native code
pub fn script_to_native(engine: &Engine, registry: &Rc<ClassRegistry>, value: &Value) -> NativeValue {
    match value {
        Value::Undefined => NativeValue::Void,
        Value::Null => NativeValue::Null,
        Value::Bool(b) => NativeValue::Bool(*b),
        Value::Number(n) => NativeValue::Double(*n),
        Value::String(s) => NativeValue::String(s.to_string()),
        Value::Object(_) => {
            if let Some(host) = engine.host_object(value) {
                if let Some(instance) = host.as_any().downcast_ref::<Instance>() {
                    return NativeValue::Object(Rc::clone(instance.bound_object()));
                }
            }
            let proxy = ScriptObject::new(
                ScriptValue::adopt(engine, value.clone()),
                Rc::clone(registry),
            );
            NativeValue::Object(Rc::new(proxy))
        }
    }
}

/// Convert a native value for the engine.
///
/// The result is not rooted; use [`native_to_script_value`] when it has to
/// outlive the current engine call.
pub fn native_to_script(
    engine: &Engine,
    registry: &Rc<ClassRegistry>,
    value: &NativeValue,
) -> BridgeResult<Value> {
    Ok(match value {
        NativeValue::Void => Value::Undefined,
        NativeValue::Null => Value::Null,
        NativeValue::Bool(b) => Value::Bool(*b),
        NativeValue::Int32(i) => Value::Number(f64::from(*i)),
        NativeValue::Double(n) => Value::Number(*n),
        NativeValue::String(s) => Value::string(s),
        NativeValue::Object(obj) => expose_object(engine, registry, obj)?,
    })
}

/// Convert a native value for the engine and root the result
pub fn native_to_script_value(
    engine: &Engine,
    registry: &Rc<ClassRegistry>,
    value: &NativeValue,
) -> BridgeResult<ScriptValue> {
    let value = native_to_script(engine, registry, value)?;
    Ok(ScriptValue::adopt(engine, value))
}

/// Wrap a bound object for the engine, unwrapping script-object proxies
pub(crate) fn expose_object(
    engine: &Engine,
    registry: &Rc<ClassRegistry>,
    obj: &Rc<dyn BoundObject>,
) -> BridgeResult<Value> {
    if let Some(proxy) = obj.as_any().and_then(|any| any.downcast_ref::<ScriptObject>()) {
        return Ok(proxy.script_value().engine_value().clone());
    }
    let instance = Instance::new(Rc::clone(obj), Rc::clone(registry));
    Ok(engine.create_host_object(Rc::new(instance))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_sdk::{bound_identity, AbiResult};

    struct Token;

    impl BoundObject for Token {
        fn has_method(&self, _name: &str) -> bool {
            false
        }
        fn has_property(&self, _name: &str) -> bool {
            false
        }
        fn invoke_method(&self, _name: &str, _args: &[NativeValue]) -> AbiResult<NativeValue> {
            Ok(NativeValue::Void)
        }
        fn get_property(&self, _name: &str) -> NativeValue {
            NativeValue::Void
        }
        fn set_property(&self, _name: &str, _value: NativeValue) {}
        fn string_value(&self) -> String {
            "token".to_string()
        }
    }

    fn setup() -> (Engine, Rc<ClassRegistry>) {
        (Engine::default(), Rc::new(ClassRegistry::new()))
    }

    #[test]
    fn test_primitives() {
        let (engine, registry) = setup();
        assert_eq!(script_to_native(&engine, &registry, &Value::Undefined), NativeValue::Void);
        assert_eq!(script_to_native(&engine, &registry, &Value::from(1.5)), NativeValue::Double(1.5));
        assert_eq!(
            script_to_native(&engine, &registry, &Value::from("s")),
            NativeValue::String("s".to_string())
        );
        assert_eq!(
            native_to_script(&engine, &registry, &NativeValue::Int32(7)).unwrap(),
            Value::Number(7.0)
        );
        assert_eq!(
            native_to_script(&engine, &registry, &NativeValue::Null).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_bound_object_round_trip() {
        let (engine, registry) = setup();
        let token: Rc<dyn BoundObject> = Rc::new(Token);

        let wrapper = native_to_script(&engine, &registry, &NativeValue::Object(token.clone())).unwrap();
        assert!(engine.host_object(&wrapper).is_some());

        match script_to_native(&engine, &registry, &wrapper) {
            NativeValue::Object(back) => assert_eq!(bound_identity(&back), bound_identity(&token)),
            other => panic!("expected object, got {:?}", other),
        }
    }

    #[test]
    fn test_script_object_round_trip() {
        let (engine, registry) = setup();
        let obj = engine.create_object().unwrap();

        let native = script_to_native(&engine, &registry, &obj);
        let proxy = native.as_object().unwrap();
        assert!(proxy.as_any().is_some());

        let back = native_to_script(&engine, &registry, &native).unwrap();
        assert!(back.same_value(&obj));
        // No host wrapper was allocated for the round trip
        assert_eq!(engine.live_objects(), 1);
    }
}
