//! Native library installed into an environment before scripts run.

use crate::error::RuntimeError;
use crate::runtime::environment::Environment;
use crate::runtime::function::{Function, Parameter};
use crate::runtime::value::Value;

pub mod array;
pub mod core;
pub mod func;
pub mod math;

// ─── Export ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Export {
    pub name: &'static str,
    pub value: Value,
}

/// A named group of global bindings.
pub trait Namespace {
    fn name(&self) -> &'static str;
    fn exports(&self) -> Vec<Export>;

    fn get_export(&self, name: &str) -> Option<Export> {
        self.exports().into_iter().find(|e| e.name == name)
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

pub struct NamespaceRegistry {
    namespaces: Vec<Box<dyn Namespace>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self { Self { namespaces: Vec::new() } }

    pub fn register(&mut self, ns: Box<dyn Namespace>) { self.namespaces.push(ns); }

    pub fn get(&self, name: &str) -> Option<&dyn Namespace> {
        self.namespaces.iter().find(|ns| ns.name() == name).map(|ns| ns.as_ref())
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.namespaces.iter().map(|ns| ns.name()).collect()
    }

    /// Defines every export of every namespace in `env`. Later namespaces
    /// win on name clashes.
    pub fn install(&self, env: &Environment) {
        for ns in &self.namespaces {
            let exports = ns.exports();
            tracing::trace!(namespace = ns.name(), exports = exports.len(), "install");
            for export in exports {
                env.define(export.name, export.value);
            }
        }
    }

    pub fn standard() -> Self {
        let mut r = Self::new();
        r.register(Box::new(core::CoreNamespace));
        r.register(Box::new(math::MathNamespace));
        r.register(Box::new(array::ArrayNamespace));
        r.register(Box::new(func::FuncNamespace));
        r
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self { Self::standard() }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

fn function<F>(name: &'static str, params: &[&str], f: F) -> Export
where
    F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
{
    Export { name, value: Value::Function(Function::bind(name, params, f)) }
}

fn function_with(name: &'static str, params: Vec<Parameter>, f: impl Fn(&[Value]) -> Result<Value, RuntimeError> + 'static) -> Export {
    Export { name, value: Value::Function(Function::native(name, params, f)) }
}

fn constant(name: &'static str, value: Value) -> Export {
    Export { name, value }
}

/// Argument `i` with references followed.
fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).map(Value::resolve).unwrap_or_default()
}

fn expect_function(args: &[Value], i: usize, who: &str) -> Result<Function, RuntimeError> {
    match arg(args, i) {
        Value::Function(f) => Ok(f),
        other => Err(RuntimeError::native(format!(
            "{who}: expected a function, got {}", other.type_name()
        ))),
    }
}
