//! Binding registry for native callables.
//!
//! The embedder populates a [`Bindings`] table before interpretation and
//! tears it down afterwards; entries are immutable for the lifetime of one
//! run. A script reaches a native through a load declaration
//! (`fn name(...) : T {} = load name;`), which the interpreter resolves
//! against this table by name at call time.
//!
//! The free functions below let natives build typed return values and read
//! typed arguments without knowing the value layout.

use std::rc::Rc;

use indexmap::IndexMap;
use lyra_util::Symbol;

use crate::value::{TypeTag, Value};

/// A host callback: receives the callee value and the evaluated,
/// already-duplicated argument vector. Errors are reported by returning
/// `Err` with the diagnostic message; "returns nothing" is `Ok(null)`.
pub type NativeFn = Rc<dyn Fn(&Value, &[Value]) -> Result<Value, String>>;

/// Registry of native callables, addressable by name.
#[derive(Default)]
pub struct Bindings {
    map: IndexMap<Symbol, NativeFn>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under a name. Duplicate names are rejected.
    pub fn bind<F>(&mut self, name: &str, callback: F) -> bool
    where
        F: Fn(&Value, &[Value]) -> Result<Value, String> + 'static,
    {
        let key = Symbol::intern(name);
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, Rc::new(callback));
        true
    }

    /// Remove a binding. Removing an absent name succeeds.
    pub fn unbind(&mut self, name: &str) -> bool {
        self.map.shift_remove(&Symbol::intern(name));
        true
    }

    /// Resolve a native by name.
    pub fn lookup(&self, name: Symbol) -> Option<NativeFn> {
        self.map.get(&name).cloned()
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<Symbol> {
        self.map.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Build an unsigned-integer return value. `ty` must be one of the
/// unsigned integer types.
pub fn build_return_uint(ty: TypeTag, data: u64) -> Option<Value> {
    ty.is_unsigned_int().then(|| Value::uint(ty, data))
}

/// Build a signed-integer return value. `ty` must be one of the signed
/// integer types.
pub fn build_return_int(ty: TypeTag, data: i64) -> Option<Value> {
    ty.is_signed_int().then(|| Value::int(ty, data))
}

/// Build a float return value.
pub fn build_return_float(data: f64) -> Value {
    Value::float(data)
}

/// Build a string return value.
pub fn build_return_string(data: &str) -> Value {
    Value::string(data)
}

/// Build a bool return value.
pub fn build_return_bool(data: bool) -> Value {
    Value::bool_value(data)
}

/// Fetch an argument by index.
pub fn extract_parameter<'v>(args: &'v [Value], index: usize) -> Option<&'v Value> {
    args.get(index)
}
