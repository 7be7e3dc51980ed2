use crate::error::{ErrorCode, RuntimeError};
use crate::runtime::environment::Environment;
use crate::runtime::value::{MAX_GROWTH, MAX_REFERENCE_DEPTH, Value};

/// An assignable location produced by evaluating an expression in
/// assignment position.
#[derive(Debug, Clone)]
pub enum Reference {
    /// Not a location; reads give the value, writes fail.
    Direct(Value),
    /// A variable looked up from `env`.
    Variable { env: Environment, name: String },
    /// `base[index]`
    Element { base: Box<Reference>, index: Value },
}

impl Reference {
    pub fn variable(env: &Environment, name: impl Into<String>) -> Self {
        Reference::Variable { env: env.clone(), name: name.into() }
    }

    pub fn element(base: Reference, index: Value) -> Self {
        Reference::Element { base: Box::new(base), index }
    }

    /// Current value, following any reference stored in the slot.
    pub fn get(&self) -> Value {
        self.get_raw().resolve()
    }

    /// Current slot content without following stored references.
    pub(crate) fn get_raw(&self) -> Value {
        match self {
            Reference::Direct(v) => v.clone(),
            Reference::Variable { env, name } => env.get(name).unwrap_or_default(),
            Reference::Element { base, index } => base.get().index_raw(index),
        }
    }

    /// Writes `value` to the location. A slot holding a reference forwards
    /// plain values to its target; a reference value replaces the slot.
    pub fn set(&self, value: Value) -> Result<(), RuntimeError> {
        self.set_at_depth(value, 0)
    }

    fn set_at_depth(&self, value: Value, depth: usize) -> Result<(), RuntimeError> {
        if depth > MAX_REFERENCE_DEPTH {
            return Err(RuntimeError::new(ErrorCode::R005, 0,
                format!("reference chain deeper than {MAX_REFERENCE_DEPTH}")));
        }

        match self {
            Reference::Direct(v) => Err(RuntimeError::new(ErrorCode::R002, 0,
                format!("cannot assign to a {} value", v.type_name()))),

            Reference::Variable { env, name } => {
                if !value.is_reference() {
                    if let Some(Value::Reference(target)) = env.get(name) {
                        return target.set_at_depth(value, depth + 1);
                    }
                }
                env.set(name, value);
                Ok(())
            }

            Reference::Element { base, index } => {
                let Some(i) = index.to_index() else {
                    return Err(RuntimeError::new(ErrorCode::R003, 0,
                        format!("invalid index `{index}`")));
                };
                match base.get() {
                    Value::Array(items) => {
                        let existing = items.borrow().get(i).cloned();
                        if let Some(Value::Reference(target)) = existing {
                            if !value.is_reference() {
                                return target.set_at_depth(value, depth + 1);
                            }
                        }
                        let mut items = items.borrow_mut();
                        if i >= items.len() {
                            check_growth(i)?;
                            items.resize(i + 1, Value::Invalid);
                        }
                        items[i] = value;
                        Ok(())
                    }
                    Value::Str(s) => {
                        if i >= MAX_GROWTH && i >= s.chars().count() {
                            check_growth(i)?;
                        }
                        let updated = replace_char(&s, i, &value.to_string());
                        base.set_at_depth(Value::Str(updated), depth + 1)
                    }
                    // assigning into an unset slot creates the array
                    Value::Invalid => {
                        check_growth(i)?;
                        let mut items = vec![Value::Invalid; i + 1];
                        items[i] = value;
                        base.set_at_depth(Value::array(items), depth + 1)
                    }
                    other => Err(RuntimeError::new(ErrorCode::R003, 0,
                        format!("cannot index into a {} value", other.type_name()))),
                }
            }
        }
    }
}

fn check_growth(index: usize) -> Result<(), RuntimeError> {
    if index >= MAX_GROWTH {
        return Err(RuntimeError::new(ErrorCode::R003, 0,
            format!("index {index} is past the {MAX_GROWTH} element limit")));
    }
    Ok(())
}

/// Replaces the character at `index` with `replacement`, padding with spaces
/// when the string is shorter.
fn replace_char(s: &str, index: usize, replacement: &str) -> String {
    let mut chars: Vec<String> = s.chars().map(String::from).collect();
    if index >= chars.len() {
        chars.resize(index + 1, " ".to_string());
    }
    chars[index] = replacement.to_string();
    chars.concat()
}
