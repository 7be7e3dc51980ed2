use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::runtime::value::Value;

/// A variable scope linked to its enclosing scope.
///
/// Cloning an `Environment` clones the handle, not the bindings. Lookups walk
/// outward through parents; [`Environment::set`] rebinds the nearest existing
/// binding or creates one in this scope.
#[derive(Clone, Default)]
pub struct Environment(Rc<Scope>);

#[derive(Default)]
struct Scope {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

impl Environment {
    /// A new root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// A child scope whose parent is `self`.
    pub fn stack(&self) -> Self {
        Self(Rc::new(Scope { vars: RefCell::default(), parent: Some(self.clone()) }))
    }

    /// The root of this scope chain.
    pub fn global(&self) -> Self {
        let mut env = self.clone();
        while let Some(parent) = env.parent() {
            env = parent;
        }
        env
    }

    /// A child of the root scope, sharing nothing with `self` but the globals.
    pub fn isolated(&self) -> Self {
        self.global().stack()
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.parent.clone()
    }

    /// The stored value, which may be a reference. See [`Value::resolve`].
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.0.vars.borrow().get(name) {
            return Some(v.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Rebinds `name` where it is already bound, else defines it here.
    pub fn set(&self, name: &str, value: Value) {
        if let Err(value) = self.try_set(name, value) {
            self.define(name, value);
        }
    }

    /// Rebinds `name` in the nearest scope that has it. Hands the value back
    /// when no scope does.
    pub fn try_set(&self, name: &str, value: Value) -> Result<(), Value> {
        let mut env = Some(self);
        while let Some(scope) = env {
            if scope.contains_local(name) {
                let old = scope.0.vars.borrow_mut().insert(name.to_string(), value);
                drop(old);
                return Ok(());
            }
            env = scope.0.parent.as_ref();
        }
        Err(value)
    }

    /// Binds `name` in this scope, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        let old = self.0.vars.borrow_mut().insert(name.to_string(), value);
        drop(old);
    }

    /// Unbinds `name` from this scope only; outer bindings stay visible.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.0.vars.borrow_mut().remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contains_local(name) || self.0.parent.as_ref().is_some_and(|p| p.contains(name))
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.0.vars.borrow().contains_key(name)
    }

    /// Names bound directly in this scope, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.vars.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Bindings can hold functions that capture this scope, so only names are shown.
impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("names", &self.names())
            .field("has_parent", &self.0.parent.is_some())
            .finish()
    }
}
