use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::error::RuntimeError;
use crate::runtime::environment::Environment;
use crate::runtime::executor::Executor;
use crate::runtime::value::Value;
use crate::syntax::ast::{Expr, FnDecl};

/// Host callback behind a native function. Receives one value per declared
/// parameter, or every argument for variadic natives.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, RuntimeError>;

// ─── Parameters & arguments ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// Script default, evaluated in the callee scope at call time.
    Expr(Rc<Expr>),
    /// Native default.
    Value(Value),
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub default: Option<DefaultValue>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), default: None }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }
}

/// A call argument; `name` is set for `name: value`.
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Value,
}

impl Argument {
    pub fn positional(value: impl Into<Value>) -> Self {
        Self { name: None, value: value.into() }
    }

    pub fn named(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { name: Some(name.into()), value: value.into() }
    }
}

/// Matches arguments to parameters. `None` marks a parameter left to its
/// default.
///
/// Without named arguments binding is positional. Otherwise each parameter
/// first takes the argument carrying its exact name, then the remaining
/// parameters take, in order, the first unclaimed argument that is unnamed or
/// named after that parameter.
fn bind_arguments(params: &[Parameter], args: Vec<Argument>) -> Vec<Option<Value>> {
    if args.iter().all(|a| a.name.is_none()) {
        let mut values = args.into_iter().map(|a| a.value);
        return params.iter().map(|_| values.next()).collect();
    }

    let mut slots: Vec<Option<Value>> = vec![None; params.len()];
    let mut claimed = vec![false; args.len()];

    for (slot, param) in slots.iter_mut().zip(params) {
        let found = args.iter().enumerate()
            .find(|(i, a)| !claimed[*i] && a.name.as_deref() == Some(param.name.as_str()));
        if let Some((i, arg)) = found {
            *slot = Some(arg.value.clone());
            claimed[i] = true;
        }
    }

    for (slot, param) in slots.iter_mut().zip(params) {
        if slot.is_some() { continue; }
        let found = args.iter().enumerate().find(|(i, a)| {
            !claimed[*i] && a.name.as_ref().is_none_or(|n| *n == param.name)
        });
        if let Some((i, arg)) = found {
            *slot = Some(arg.value.clone());
            claimed[i] = true;
        }
    }

    slots
}

// ─── Function ────────────────────────────────────────────────────────────────

/// A callable value. Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct Function(Rc<Inner>);

struct Inner {
    name: String,
    params: Vec<Parameter>,
    kind: Kind,
}

enum Kind {
    Native { variadic: bool, f: Box<NativeFn> },
    Script { decl: Rc<FnDecl>, closure: Environment },
    /// `outer(inner(args))`
    Composite { outer: Function, inner: Function },
    /// `target` with its first parameter fixed.
    Partial { target: Function, bound: Value },
}

impl Function {
    fn from_parts(name: String, params: Vec<Parameter>, kind: Kind) -> Self {
        Self(Rc::new(Inner { name, params, kind }))
    }

    /// A native function with explicitly named parameters, addressable from
    /// script by position or by name.
    pub fn bind<F>(name: impl Into<String>, params: &[&str], f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        let params = params.iter().map(|p| Parameter::new(*p)).collect();
        Self::native(name, params, f)
    }

    /// A native function with parameters that may carry defaults.
    pub fn native<F>(name: impl Into<String>, params: Vec<Parameter>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        Self::from_parts(name.into(), params, Kind::Native { variadic: false, f: Box::new(f) })
    }

    /// A native function that receives every argument, in call order.
    pub fn variadic<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        Self::from_parts(name.into(), Vec::new(), Kind::Native { variadic: true, f: Box::new(f) })
    }

    /// A script function closing over `closure`, the scope it was declared in.
    pub fn script(decl: Rc<FnDecl>, closure: Environment) -> Self {
        let params = decl.params.iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                default: p.default.clone().map(DefaultValue::Expr),
            })
            .collect();
        Self::from_parts(decl.name.clone(), params, Kind::Script { decl, closure })
    }

    /// `self` with its first parameter bound to `value`.
    pub fn partial(&self, value: Value) -> Function {
        let params = self.0.params.iter().skip(1).cloned().collect();
        Self::from_parts(self.0.name.clone(), params, Kind::Partial { target: self.clone(), bound: value })
    }

    /// A function computing `self(inner(args))`.
    pub fn composite(&self, inner: &Function) -> Function {
        let name = format!("{}.{}", self.0.name, inner.0.name);
        Self::from_parts(name, inner.0.params.clone(), Kind::Composite {
            outer: self.clone(),
            inner: inner.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.0.params
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Identity used to order functions.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Calls with positional arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeError> {
        self.invoke(args.iter().cloned().map(Argument::positional).collect())
    }

    pub fn invoke(&self, args: Vec<Argument>) -> Result<Value, RuntimeError> {
        trace!(function = %self.0.name, args = args.len(), "invoke");

        match &self.0.kind {
            Kind::Native { variadic: true, f } => {
                let values: Vec<Value> = args.into_iter().map(|a| a.value).collect();
                f(&values)
            }
            Kind::Native { variadic: false, f } => {
                let values: Vec<Value> = bind_arguments(&self.0.params, args)
                    .into_iter()
                    .zip(&self.0.params)
                    .map(|(slot, param)| slot.unwrap_or_else(|| match &param.default {
                        Some(DefaultValue::Value(v)) => v.clone(),
                        _ => Value::Invalid,
                    }))
                    .collect();
                f(&values)
            }
            Kind::Script { decl, closure } => {
                let scope = closure.stack();
                let slots = bind_arguments(&self.0.params, args);
                for (slot, param) in slots.into_iter().zip(&self.0.params) {
                    let value = match (slot, &param.default) {
                        (Some(v), _) => v,
                        (None, Some(DefaultValue::Expr(expr))) => Executor::new(scope.clone()).eval(expr)?,
                        (None, Some(DefaultValue::Value(v))) => v.clone(),
                        (None, None) => Value::Invalid,
                    };
                    scope.define(&param.name, value);
                }
                Executor::new(scope).exec_body(&decl.body)
            }
            Kind::Composite { outer, inner } => {
                let intermediate = inner.invoke(args)?;
                outer.invoke(vec![Argument::positional(intermediate)])
            }
            Kind::Partial { target, bound } => {
                let first = match target.0.params.first() {
                    Some(p) => Argument::named(p.name.clone(), bound.clone()),
                    None => Argument::positional(bound.clone()),
                };
                let mut all = Vec::with_capacity(args.len() + 1);
                all.push(first);
                all.extend(args);
                target.invoke(all)
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<&str> = self.0.params.iter().map(|p| p.name.as_str()).collect();
        write!(f, "fn {}({})", self.0.name, params.join(", "))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({self})")
    }
}
