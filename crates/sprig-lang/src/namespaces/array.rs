use super::{Export, Namespace, arg, function, function_with};
use crate::error::RuntimeError;
use crate::runtime::function::Parameter;
use crate::runtime::value::{Value, join};

pub struct ArrayNamespace;

fn expect_array(v: Value, who: &str) -> Result<std::rc::Rc<std::cell::RefCell<Vec<Value>>>, RuntimeError> {
    match v {
        Value::Array(items) => Ok(items),
        other => Err(RuntimeError::native(format!("{who}: expected an array, got {}", other.type_name()))),
    }
}

impl Namespace for ArrayNamespace {
    fn name(&self) -> &'static str { "array" }

    fn exports(&self) -> Vec<Export> {
        vec![
            // appends in place and returns the new length
            function("push", &["array", "value"], |args| {
                let items = expect_array(arg(args, 0), "push")?;
                let value = args.get(1).cloned().unwrap_or_default();
                let mut items = items.borrow_mut();
                items.push(value);
                Ok(Value::Int(items.len() as i64))
            }),

            function("pop", &["array"], |args| {
                let items = expect_array(arg(args, 0), "pop")?;
                let last = items.borrow_mut().pop();
                Ok(last.unwrap_or_default())
            }),

            function_with(
                "join",
                vec![Parameter::new("array"), Parameter::new("separator").with_default(",")],
                |args| {
                    let items = expect_array(arg(args, 0), "join")?;
                    let separator = arg(args, 1).to_string();
                    Ok(Value::Str(join(&items.borrow(), &separator)))
                },
            ),

            function("copy", &["value"], |args| Ok(arg(args, 0).deep_copy())),
        ]
    }
}
