//! Lexical environments.
//!
//! An environment is a name→value table with a link to its enclosing
//! scope. Lookups walk outward; assignments rebind in the innermost scope
//! that already defines the name. Scopes are reference-counted so block
//! scopes drop deterministically when execution leaves them while closures
//! keep their captured scope alive.

use std::cell::RefCell;
use std::rc::Rc;

use lyra_util::{FxHashMap, Symbol};

use crate::value::Value;

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

/// Why an assignment was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignError {
    /// No scope in the chain defines the name
    Undefined,
    /// The innermost binding is a constant
    Constant,
}

/// A single lexical scope.
pub struct Environment {
    values: FxHashMap<Symbol, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// Create a new global scope.
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: FxHashMap::default(),
            enclosing: None,
        }))
    }

    /// Create a scope nested inside `enclosing`.
    pub fn with_enclosing(enclosing: EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: FxHashMap::default(),
            enclosing: Some(enclosing),
        }))
    }

    /// Insert a binding in this scope.
    ///
    /// The value becomes environment-owned. Re-defining a name in the same
    /// scope replaces (and drops) the previous value.
    pub fn define(&mut self, name: Symbol, mut value: Value) {
        value.environment = true;
        self.values.insert(name, value);
    }

    /// Look a name up, walking outward through enclosing scopes.
    ///
    /// The returned copy still carries the `environment` flag; callers
    /// duplicate it before keeping it.
    pub fn get(&self, name: Symbol) -> Option<Value> {
        if let Some(value) = self.values.get(&name) {
            return Some(value.clone());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow().get(name),
            None => None,
        }
    }

    /// Rebind a name in the innermost scope that defines it.
    pub fn assign(&mut self, name: Symbol, value: Value) -> Result<(), AssignError> {
        if let Some(existing) = self.values.get(&name) {
            if existing.constant {
                return Err(AssignError::Constant);
            }
            self.define(name, value);
            return Ok(());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(AssignError::Undefined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeTag;
    use lyra_util::Symbol;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    #[test]
    fn test_define_marks_environment_owned() {
        let env = Environment::new();
        env.borrow_mut()
            .define(sym("a"), Value::uint(TypeTag::UInt8, 1));
        let got = env.borrow().get(sym("a")).unwrap();
        assert!(got.environment);
    }

    #[test]
    fn test_get_walks_outward() {
        let global = Environment::new();
        global
            .borrow_mut()
            .define(sym("x"), Value::uint(TypeTag::UInt8, 7));
        let inner = Environment::with_enclosing(global);
        assert_eq!(inner.borrow().get(sym("x")).unwrap().bits(), 7);
        assert!(inner.borrow().get(sym("missing")).is_none());
    }

    #[test]
    fn test_assign_rebinds_innermost_definition() {
        let global = Environment::new();
        global
            .borrow_mut()
            .define(sym("x"), Value::uint(TypeTag::UInt8, 1));
        let inner = Environment::with_enclosing(global.clone());
        inner
            .borrow_mut()
            .assign(sym("x"), Value::uint(TypeTag::UInt8, 2))
            .unwrap();
        assert_eq!(global.borrow().get(sym("x")).unwrap().bits(), 2);
    }

    #[test]
    fn test_inner_shadowing() {
        let global = Environment::new();
        global
            .borrow_mut()
            .define(sym("x"), Value::uint(TypeTag::UInt8, 1));
        let inner = Environment::with_enclosing(global.clone());
        inner
            .borrow_mut()
            .define(sym("x"), Value::uint(TypeTag::UInt8, 9));
        assert_eq!(inner.borrow().get(sym("x")).unwrap().bits(), 9);
        assert_eq!(global.borrow().get(sym("x")).unwrap().bits(), 1);
    }

    #[test]
    fn test_assign_undefined() {
        let env = Environment::new();
        let err = env
            .borrow_mut()
            .assign(sym("ghost"), Value::null())
            .unwrap_err();
        assert_eq!(err, AssignError::Undefined);
    }

    #[test]
    fn test_assign_constant_rejected() {
        let env = Environment::new();
        let mut pi = Value::float(3.14);
        pi.constant = true;
        env.borrow_mut().define(sym("PI"), pi);
        let err = env
            .borrow_mut()
            .assign(sym("PI"), Value::float(3.15))
            .unwrap_err();
        assert_eq!(err, AssignError::Constant);
    }

    #[test]
    fn test_redefine_replaces_in_same_scope() {
        let env = Environment::new();
        env.borrow_mut()
            .define(sym("a"), Value::uint(TypeTag::UInt8, 1));
        env.borrow_mut()
            .define(sym("a"), Value::uint(TypeTag::UInt8, 2));
        assert_eq!(env.borrow().get(sym("a")).unwrap().bits(), 2);
    }
}
