//! Property iteration cursor

use tether_engine::{Engine, Value};

use crate::script_value::ScriptValue;
use crate::BridgeResult;

/// Forward-only cursor over a snapshot of an object's own property names.
///
/// The key set is fixed when the cursor is created; values are read from and
/// written to the object live. The cursor does not root the object: it is
/// owned by the [`ScriptValue`] holding the object, which does.
#[derive(Debug)]
pub struct PropertyIterator {
    engine: Engine,
    object: Value,
    keys: Vec<String>,
    position: usize,
}

impl PropertyIterator {
    pub(crate) fn new(engine: Engine, object: Value, keys: Vec<String>) -> Self {
        Self {
            engine,
            object,
            keys,
            position: 0,
        }
    }

    /// Whether the cursor points at a key
    pub(crate) fn is_valid(&self) -> bool {
        self.position < self.keys.len()
    }

    /// Step to the next key; once past the end the cursor stays there
    pub(crate) fn advance(&mut self) -> bool {
        if self.position < self.keys.len() {
            self.position += 1;
        }
        self.is_valid()
    }

    /// Current key
    pub fn key(&self) -> &str {
        &self.keys[self.position]
    }

    /// Current value, read from the object now
    pub fn value(&self) -> BridgeResult<ScriptValue> {
        let value = self.engine.get(&self.object, self.key())?;
        Ok(ScriptValue::adopt(&self.engine, value))
    }

    /// Store `value` under the current key
    pub fn set_value(&self, value: &ScriptValue) -> BridgeResult<()> {
        self.engine
            .set(&self.object, self.key(), value.engine_value().clone())?;
        Ok(())
    }

    /// Number of keys in the snapshot
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the snapshot has no keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
