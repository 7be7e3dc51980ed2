use super::{Export, Namespace, expect_function, function};
use crate::runtime::value::Value;

/// `partial(f, value)` and `compose(f, g)`.
pub struct FuncNamespace;

impl Namespace for FuncNamespace {
    fn name(&self) -> &'static str { "func" }

    fn exports(&self) -> Vec<Export> {
        vec![
            function("partial", &["f", "value"], |args| {
                let f = expect_function(args, 0, "partial")?;
                Ok(Value::Function(f.partial(args.get(1).cloned().unwrap_or_default())))
            }),
            function("compose", &["f", "g"], |args| {
                let f = expect_function(args, 0, "compose")?;
                let g = expect_function(args, 1, "compose")?;
                Ok(Value::Function(f.composite(&g)))
            }),
        ]
    }
}
