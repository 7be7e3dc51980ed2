//! Conversions and inspection: `len`, `type`, `int`, `float`, `str`, `bool`,
//! `isNaN`, `isInf`, plus the `NaN` and `Inf` constants.

use super::{Export, Namespace, arg, constant, function};
use crate::runtime::value::{Number, Value};

pub struct CoreNamespace;

impl Namespace for CoreNamespace {
    fn name(&self) -> &'static str { "core" }

    fn exports(&self) -> Vec<Export> {
        vec![
            constant("NaN", Value::Float(f64::NAN)),
            constant("Inf", Value::Float(f64::INFINITY)),

            function("len", &["value"], |args| {
                let n = match arg(args, 0) {
                    Value::Invalid      => 0,
                    Value::Array(items) => items.borrow().len(),
                    other               => other.to_string().chars().count(),
                };
                Ok(Value::Int(n as i64))
            }),

            // unresolved, so `type(&x)` reports "reference"
            function("type", &["value"], |args| {
                let v = args.first().cloned().unwrap_or_default();
                Ok(Value::from(v.type_name()))
            }),

            function("int",   &["value"], |args| Ok(Value::Int(arg(args, 0).as_int()))),
            function("float", &["value"], |args| Ok(Value::Float(arg(args, 0).as_float()))),
            function("str",   &["value"], |args| Ok(Value::Str(arg(args, 0).to_string()))),
            function("bool",  &["value"], |args| Ok(Value::Bool(arg(args, 0).to_bool()))),

            function("isNaN", &["value"], |args| Ok(Value::Bool(arg(args, 0).to_number().is_nan()))),
            function("isInf", &["value"], |args| {
                let inf = matches!(arg(args, 0).to_number(), Number::Float(f) if f.is_infinite());
                Ok(Value::Bool(inf))
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::Interpreter;
    use crate::runtime::value::Value;
    use pretty_assertions::assert_eq;

    fn run(src: &str) -> Value {
        Interpreter::new().run(src).unwrap()
    }

    #[test]
    fn len_counts_chars_and_elements() {
        assert_eq!(run("len(\"héllo\")"), Value::Int(5));
        assert_eq!(run("len([1, 2, 3])"), Value::Int(3));
        assert_eq!(run("len(missing)"), Value::Int(0));
    }

    #[test]
    fn type_names() {
        assert_eq!(run("type(1.5)"), Value::from("float"));
        assert_eq!(run("type([])"), Value::from("array"));
        assert_eq!(run("type(len)"), Value::from("function"));
        assert_eq!(run("type(missing)"), Value::from("invalid"));
    }

    #[test]
    fn conversions() {
        assert_eq!(run("int(\"42\")"), Value::Int(42));
        assert_eq!(run("int(3.9)"), Value::Int(3));
        assert_eq!(run("float(2)"), Value::Float(2.0));
        assert_eq!(run("str(12) + 1"), Value::from("121"));
        assert_eq!(run("bool(0)"), Value::Bool(false));
        assert_eq!(run("bool(\"x\")"), Value::Bool(true));
    }

    #[test]
    fn nan_and_inf_checks() {
        assert_eq!(run("isNaN(NaN)"), Value::Bool(true));
        assert_eq!(run("isNaN(\"abc\")"), Value::Bool(true));
        assert_eq!(run("isNaN(1)"), Value::Bool(false));
        assert_eq!(run("isInf(Inf)"), Value::Bool(true));
        assert_eq!(run("isInf(1.5)"), Value::Bool(false));
    }
}
