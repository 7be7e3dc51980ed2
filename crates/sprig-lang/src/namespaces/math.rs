use std::cmp::Ordering;

use super::{Export, Namespace, arg, constant, function};
use crate::runtime::value::{Number, Value};

pub struct MathNamespace;

/// Applies `f` to floats; integers pass through unchanged.
fn rounding(args: &[Value], f: fn(f64) -> f64) -> Value {
    match arg(args, 0).to_number() {
        Number::Int(n)   => Value::Int(n),
        Number::Float(x) => Value::Float(f(x)),
    }
}

fn pick(a: Value, b: Value, keep_a: impl Fn(Ordering) -> bool) -> Value {
    let (a, b) = (a.plus(), b.plus());
    if a.is_nan() || b.is_nan() {
        return Value::Float(f64::NAN);
    }
    if keep_a(a.compare(&b)) { a } else { b }
}

fn min(a: Value, b: Value) -> Value { pick(a, b, |o| o != Ordering::Greater) }
fn max(a: Value, b: Value) -> Value { pick(a, b, |o| o != Ordering::Less) }

impl Namespace for MathNamespace {
    fn name(&self) -> &'static str { "math" }

    fn exports(&self) -> Vec<Export> {
        vec![
            constant("PI", Value::Float(std::f64::consts::PI)),

            function("abs", &["x"], |args| Ok(match arg(args, 0).to_number() {
                Number::Int(n)   => Value::Int(n.wrapping_abs()),
                Number::Float(x) => Value::Float(x.abs()),
            })),
            function("min", &["a", "b"], |args| Ok(min(arg(args, 0), arg(args, 1)))),
            function("max", &["a", "b"], |args| Ok(max(arg(args, 0), arg(args, 1)))),
            function("clamp", &["x", "lo", "hi"], |args| {
                Ok(min(max(arg(args, 0), arg(args, 1)), arg(args, 2)))
            }),

            function("floor", &["x"], |args| Ok(rounding(args, f64::floor))),
            function("ceil",  &["x"], |args| Ok(rounding(args, f64::ceil))),
            function("round", &["x"], |args| Ok(rounding(args, f64::round))),
            function("sqrt",  &["x"], |args| Ok(Value::Float(arg(args, 0).as_float().sqrt()))),

            // integer power while it fits, float otherwise
            function("pow", &["base", "exp"], |args| {
                let (base, exp) = (arg(args, 0).to_number(), arg(args, 1).to_number());
                if let (Number::Int(b), Number::Int(e)) = (base, exp) {
                    if let Some(v) = u32::try_from(e).ok().and_then(|e| b.checked_pow(e)) {
                        return Ok(Value::Int(v));
                    }
                }
                Ok(Value::Float(base.as_f64().powf(exp.as_f64())))
            }),
        ]
    }
}
