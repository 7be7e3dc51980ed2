use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::runtime::function::Function;
use crate::runtime::reference::Reference;
use crate::syntax::ast::BinaryOp;

/// How many reference hops a read or write follows before giving up.
pub const MAX_REFERENCE_DEPTH: usize = 64;

/// Largest length a subscript write may grow an array or string to.
pub const MAX_GROWTH: usize = 1 << 24;

/// Identity of an array's storage, used to stop walks at cycles.
type ArrayPtr = *const RefCell<Vec<Value>>;

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Invalid,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Shared storage: copies of an array value alias the same elements.
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Function),
    /// Produced by `&expr`.
    Reference(Rc<Reference>),
}

/// Numeric view of a value after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n)   => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_nan(self) -> bool {
        matches!(self, Number::Float(f) if f.is_nan())
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n)   => Value::Int(n),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Parses `true`/`false` (any case), then an integer, then a float.
/// Blank text is not a number.
pub fn parse_number(text: &str) -> Option<Number> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    if t.eq_ignore_ascii_case("true") {
        return Some(Number::Int(1));
    }
    if t.eq_ignore_ascii_case("false") {
        return Some(Number::Int(0));
    }
    if let Ok(n) = t.parse::<i64>() {
        return Some(Number::Int(n));
    }
    t.parse::<f64>().ok().map(Number::Float)
}

// ─── Construction & inspection ───────────────────────────────────────────────

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Invalid      => "invalid",
            Value::Bool(_)      => "bool",
            Value::Int(_)       => "int",
            Value::Float(_)     => "float",
            Value::Str(_)       => "string",
            Value::Array(_)     => "array",
            Value::Function(_)  => "function",
            Value::Reference(_) => "reference",
        }
    }

    pub fn is_invalid(&self) -> bool { matches!(self, Value::Invalid) }
    pub fn is_reference(&self) -> bool { matches!(self, Value::Reference(_)) }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Follows references to the value they point at. A chain longer than
    /// [`MAX_REFERENCE_DEPTH`] reads as `Invalid`.
    pub fn resolve(&self) -> Value {
        let mut current = self.clone();
        for _ in 0..MAX_REFERENCE_DEPTH {
            match current {
                Value::Reference(r) => current = r.get_raw(),
                other => return other,
            }
        }
        match current {
            Value::Reference(_) => Value::Invalid,
            other => other,
        }
    }

    /// Recursively copies arrays so the result shares no storage with `self`.
    /// References are replaced by the value they currently point at. An array
    /// reached twice is copied once, so cycles come back as cycles.
    pub fn deep_copy(&self) -> Value {
        self.copy_with(&mut HashMap::new())
    }

    fn copy_with(&self, copies: &mut HashMap<ArrayPtr, Rc<RefCell<Vec<Value>>>>) -> Value {
        match self.resolve() {
            Value::Array(items) => {
                if let Some(copy) = copies.get(&Rc::as_ptr(&items)) {
                    return Value::Array(Rc::clone(copy));
                }
                let copy = Rc::new(RefCell::new(Vec::new()));
                copies.insert(Rc::as_ptr(&items), Rc::clone(&copy));
                let elements: Vec<Value> = items.borrow().iter().map(|v| v.copy_with(copies)).collect();
                *copy.borrow_mut() = elements;
                Value::Array(copy)
            }
            other => other,
        }
    }

    /// Element or character at `index`; `Invalid` when out of range or when
    /// the value cannot be subscripted.
    pub fn index(&self, index: &Value) -> Value {
        self.index_raw(index).resolve()
    }

    /// Like [`Value::index`] but returns a stored reference as-is.
    pub(crate) fn index_raw(&self, index: &Value) -> Value {
        let Some(i) = index.to_index() else { return Value::Invalid };
        match self.resolve() {
            Value::Array(items) => items.borrow().get(i).cloned().unwrap_or_default(),
            Value::Str(s) => s.chars().nth(i).map(|c| Value::Str(c.to_string())).unwrap_or_default(),
            _ => Value::Invalid,
        }
    }

    /// Non-negative integral index, if this value is one.
    pub fn to_index(&self) -> Option<usize> {
        match self.to_number() {
            Number::Int(n) if n >= 0 => usize::try_from(n).ok(),
            Number::Float(f) if f >= 0.0 && f.is_finite() && f.fract() == 0.0 => Some(f as usize),
            _ => None,
        }
    }
}

// ─── Coercion ────────────────────────────────────────────────────────────────

impl Value {
    pub fn to_number(&self) -> Number {
        match self {
            Value::Invalid      => Number::Int(0),
            Value::Bool(b)      => Number::Int(*b as i64),
            Value::Int(n)       => Number::Int(*n),
            Value::Float(f)     => Number::Float(*f),
            Value::Str(s)       => string_to_number(s),
            Value::Array(_)     => string_to_number(&self.to_string()),
            Value::Function(_)  => Number::Float(f64::NAN),
            Value::Reference(_) => self.resolve().to_number(),
        }
    }

    pub fn to_bool(&self) -> bool {
        match self {
            Value::Invalid      => false,
            Value::Bool(b)      => *b,
            Value::Int(n)       => *n != 0,
            Value::Float(f)     => *f != 0.0 && !f.is_nan(),
            Value::Str(s)       => match parse_number(s) {
                Some(n) => Value::from(n).to_bool(),
                None => !s.is_empty(),
            },
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Function(_)  => true,
            Value::Reference(_) => self.resolve().to_bool(),
        }
    }

    /// Integer view used by bitwise operators. NaN and infinities become 0.
    pub fn as_int(&self) -> i64 {
        match self.to_number() {
            Number::Int(n) => n,
            Number::Float(f) if f.is_finite() => f as i64,
            Number::Float(_) => 0,
        }
    }

    pub fn as_float(&self) -> f64 {
        self.to_number().as_f64()
    }
}

/// Lenient form used for arithmetic: blank is 0, garbage is NaN.
fn string_to_number(s: &str) -> Number {
    if s.trim().is_empty() {
        return Number::Int(0);
    }
    parse_number(s).unwrap_or(Number::Float(f64::NAN))
}

// ─── Arithmetic ──────────────────────────────────────────────────────────────

impl Value {
    /// Numeric view of `self` as the left or right side of an arithmetic
    /// operator. An array only reparses its text against a numeric `other`.
    fn operand(&self, other: &Value) -> Number {
        match (self.resolve(), other.resolve()) {
            (Value::Array(_), rhs) if rhs.is_numeric() => self.to_number(),
            (Value::Array(_) | Value::Function(_), _) => Number::Float(f64::NAN),
            (value, _) => value.to_number(),
        }
    }

    fn unary_operand(&self) -> Number {
        match self.resolve() {
            Value::Array(_) | Value::Function(_) => Number::Float(f64::NAN),
            value => value.to_number(),
        }
    }
}

/// Int op when both sides are Int and `int_op` succeeds, float op otherwise.
fn arith(
    l: Number,
    r: Number,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
) -> Value {
    if let (Number::Int(a), Number::Int(b)) = (l, r) {
        if let Some(v) = int_op(a, b) {
            return Value::Int(v);
        }
    }
    Value::Float(float_op(l.as_f64(), r.as_f64()))
}

impl Value {
    /// String concatenation when either side is a string or an array,
    /// numeric addition otherwise.
    pub fn add(&self, other: &Value) -> Value {
        let (l, r) = (self.resolve(), other.resolve());
        let textual = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_));
        if textual(&l) || textual(&r) {
            return Value::Str(format!("{l}{r}"));
        }
        arith(l.operand(&r), r.operand(&l), |a, b| Some(a.wrapping_add(b)), |a, b| a + b)
    }

    pub fn sub(&self, other: &Value) -> Value {
        arith(self.operand(other), other.operand(self), |a, b| Some(a.wrapping_sub(b)), |a, b| a - b)
    }

    pub fn mul(&self, other: &Value) -> Value {
        arith(self.operand(other), other.operand(self), |a, b| Some(a.wrapping_mul(b)), |a, b| a * b)
    }

    /// Integer division truncates; an integer zero divisor divides as float.
    pub fn div(&self, other: &Value) -> Value {
        arith(
            self.operand(other),
            other.operand(self),
            |a, b| (b != 0).then(|| a.wrapping_div(b)),
            |a, b| a / b,
        )
    }

    pub fn rem(&self, other: &Value) -> Value {
        arith(
            self.operand(other),
            other.operand(self),
            |a, b| (b != 0).then(|| a.wrapping_rem(b)),
            |a, b| a % b,
        )
    }

    pub fn bit_and(&self, other: &Value) -> Value { Value::Int(self.as_int() & other.as_int()) }
    pub fn bit_or(&self, other: &Value) -> Value  { Value::Int(self.as_int() | other.as_int()) }
    pub fn bit_xor(&self, other: &Value) -> Value { Value::Int(self.as_int() ^ other.as_int()) }

    pub fn shl(&self, other: &Value) -> Value {
        Value::Int(self.as_int().wrapping_shl((other.as_int() & 63) as u32))
    }

    pub fn shr(&self, other: &Value) -> Value {
        Value::Int(self.as_int().wrapping_shr((other.as_int() & 63) as u32))
    }

    /// Unary `+`: the numeric coercion. Arrays and functions give NaN.
    pub fn plus(&self) -> Value {
        Value::from(self.unary_operand())
    }

    pub fn neg(&self) -> Value {
        match self.unary_operand() {
            Number::Int(n)   => Value::Int(n.wrapping_neg()),
            Number::Float(f) => Value::Float(-f),
        }
    }

    pub fn not(&self) -> Value {
        Value::Bool(!self.to_bool())
    }

    pub fn bit_not(&self) -> Value {
        Value::Int(!self.as_int())
    }

    /// Numeric `self + delta`, used by `++` and `--`.
    pub fn step(&self, delta: i64) -> Value {
        arith(self.unary_operand(), Number::Int(delta), |a, b| Some(a.wrapping_add(b)), |a, b| a + b)
    }

    /// Applies a non-short-circuit binary operator. Compound assignment
    /// operators apply their base operator; `=` yields `other`.
    pub fn binary(&self, op: BinaryOp, other: &Value) -> Value {
        if let Some(base) = op.compound_base() {
            return self.binary(base, other);
        }
        match op {
            BinaryOp::Add    => self.add(other),
            BinaryOp::Sub    => self.sub(other),
            BinaryOp::Mul    => self.mul(other),
            BinaryOp::Div    => self.div(other),
            BinaryOp::Mod    => self.rem(other),
            BinaryOp::Shl    => self.shl(other),
            BinaryOp::Shr    => self.shr(other),
            BinaryOp::BitAnd => self.bit_and(other),
            BinaryOp::BitOr  => self.bit_or(other),
            BinaryOp::BitXor => self.bit_xor(other),
            BinaryOp::And    => Value::Bool(self.to_bool() && other.to_bool()),
            BinaryOp::Or     => Value::Bool(self.to_bool() || other.to_bool()),

            BinaryOp::Eq           => Value::Bool(self.loose_eq(other)),
            BinaryOp::NotEq        => Value::Bool(!self.loose_eq(other)),
            BinaryOp::Identical    => Value::Bool(self.identical(other)),
            BinaryOp::NotIdentical => Value::Bool(!self.identical(other)),
            BinaryOp::Lt   => Value::Bool(self.ordered(other, |o| o == Ordering::Less)),
            BinaryOp::LtEq => Value::Bool(self.ordered(other, |o| o != Ordering::Greater)),
            BinaryOp::Gt   => Value::Bool(self.ordered(other, |o| o == Ordering::Greater)),
            BinaryOp::GtEq => Value::Bool(self.ordered(other, |o| o != Ordering::Less)),
            BinaryOp::Compare => Value::Int(self.compare(other) as i64),

            _ => other.clone(),
        }
    }
}

// ─── Equality & ordering ─────────────────────────────────────────────────────

impl Value {
    /// Total order over every pair of values. NaN sorts lowest and equals
    /// only NaN; `Invalid` comes next.
    pub fn compare(&self, other: &Value) -> Ordering {
        compare_with(self, other, &mut Vec::new())
    }

    /// `==`: value equivalence after coercion. NaN equals nothing.
    pub fn loose_eq(&self, other: &Value) -> bool {
        let (l, r) = (self.resolve(), other.resolve());
        if l.to_number_if_numeric().is_some_and(Number::is_nan)
            || r.to_number_if_numeric().is_some_and(Number::is_nan)
        {
            return false;
        }
        compare_resolved(&l, &r, &mut Vec::new()) == Ordering::Equal
    }

    /// `===`: same variant and same representation.
    pub fn identical(&self, other: &Value) -> bool {
        identical_with(self, other, &mut Vec::new())
    }

    /// Relational operators are false whenever either side is NaN.
    fn ordered(&self, other: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        if self.resolve().is_nan() || other.resolve().is_nan() {
            return false;
        }
        accept(self.compare(other))
    }

    fn to_number_if_numeric(&self) -> Option<Number> {
        self.is_numeric().then(|| self.to_number())
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        _ => {
            let (x, y) = (a.as_f64(), b.as_f64());
            match (x.is_nan(), y.is_nan()) {
                (true, true)   => Ordering::Equal,
                (true, false)  => Ordering::Less,
                (false, true)  => Ordering::Greater,
                (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            }
        }
    }
}

/// Arrays already being compared against each other count as equal, so
/// self-containing arrays terminate.
fn identical_with(l: &Value, r: &Value, open: &mut Vec<(ArrayPtr, ArrayPtr)>) -> bool {
    match (l.resolve(), r.resolve()) {
        (Value::Invalid, Value::Invalid)   => true,
        (Value::Bool(a), Value::Bool(b))   => a == b,
        (Value::Int(a), Value::Int(b))     => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Str(a), Value::Str(b))     => a == b,
        (Value::Array(a), Value::Array(b)) => {
            let pair = (Rc::as_ptr(&a), Rc::as_ptr(&b));
            if Rc::ptr_eq(&a, &b) || open.contains(&pair) {
                return true;
            }
            open.push(pair);
            let same = {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| identical_with(x, y, open))
            };
            open.pop();
            same
        }
        (Value::Function(a), Value::Function(b)) => a.ptr_eq(&b),
        _ => false,
    }
}

fn compare_with(l: &Value, r: &Value, open: &mut Vec<(ArrayPtr, ArrayPtr)>) -> Ordering {
    compare_resolved(&l.resolve(), &r.resolve(), open)
}

fn compare_resolved(l: &Value, r: &Value, open: &mut Vec<(ArrayPtr, ArrayPtr)>) -> Ordering {
    match (l.is_nan(), r.is_nan()) {
        (true, true)  => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    match (l, r) {
        (Value::Invalid, Value::Invalid) => Ordering::Equal,
        (Value::Invalid, _) => Ordering::Less,
        (_, Value::Invalid) => Ordering::Greater,

        (Value::Array(a), Value::Array(b)) => {
            let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
            if Rc::ptr_eq(a, b) || open.contains(&pair) {
                return Ordering::Equal;
            }
            open.push(pair);
            let ord = {
                let (a, b) = (a.borrow(), b.borrow());
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| compare_with(x, y, open))
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or_else(|| a.len().cmp(&b.len()))
            };
            open.pop();
            ord
        }
        (Value::Array(a), scalar) => compare_array_scalar(a, scalar, open),
        (scalar, Value::Array(b)) => compare_array_scalar(b, scalar, open).reverse(),

        (Value::Function(a), Value::Function(b)) => a.addr().cmp(&b.addr()),
        (Value::Function(_), _) => Ordering::Greater,
        (_, Value::Function(_)) => Ordering::Less,

        (Value::Str(a), Value::Str(b)) => a.cmp(b),
        (Value::Str(s), n) => compare_str_scalar(s, n),
        (n, Value::Str(s)) => compare_str_scalar(s, n).reverse(),

        _ => compare_numbers(l.to_number(), r.to_number()),
    }
}

/// A string that parses as a number compares numerically, otherwise as text.
fn compare_str_scalar(s: &str, scalar: &Value) -> Ordering {
    match parse_number(s) {
        Some(n) => compare_numbers(n, scalar.to_number()),
        None => s.cmp(scalar.to_string().as_str()),
    }
}

fn compare_array_scalar(
    items: &RefCell<Vec<Value>>,
    scalar: &Value,
    open: &mut Vec<(ArrayPtr, ArrayPtr)>,
) -> Ordering {
    {
        let items = items.borrow();
        if items.len() == 1 && scalar.is_numeric() {
            return compare_with(&items[0], scalar, open);
        }
    }
    let joined = join(&items.borrow(), ",");
    joined.as_str().cmp(scalar.to_string().as_str())
}

pub(crate) fn join(items: &[Value], separator: &str) -> String {
    let mut out = String::new();
    render_joined(items, separator, &mut out, &mut Vec::new());
    out
}

fn render_joined(items: &[Value], separator: &str, out: &mut String, open: &mut Vec<ArrayPtr>) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        item.render(out, open);
    }
}

impl Value {
    /// Appends the display text. An array that contains itself renders the
    /// inner occurrence as `[...]`.
    fn render(&self, out: &mut String, open: &mut Vec<ArrayPtr>) {
        match self {
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if open.contains(&ptr) {
                    out.push_str("[...]");
                    return;
                }
                open.push(ptr);
                render_joined(&items.borrow(), ",", out, open);
                open.pop();
            }
            Value::Reference(_) => self.resolve().render(out, open),
            scalar => out.push_str(&scalar.to_string()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.identical(other)
    }
}

// ─── Display ─────────────────────────────────────────────────────────────────

pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        f.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Invalid      => Ok(()),
            Value::Bool(b)      => write!(f, "{b}"),
            Value::Int(n)       => write!(f, "{n}"),
            Value::Float(x)     => f.write_str(&format_float(*x)),
            Value::Str(s)       => f.write_str(s),
            Value::Array(_) => {
                let mut out = String::new();
                self.render(&mut out, &mut Vec::new());
                f.write_str(&out)
            }
            Value::Function(func) => write!(f, "{func}"),
            Value::Reference(_) => write!(f, "{}", self.resolve()),
        }
    }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<bool> for Value { fn from(b: bool) -> Self { Value::Bool(b) } }
impl From<i64> for Value { fn from(n: i64) -> Self { Value::Int(n) } }
impl From<i32> for Value { fn from(n: i32) -> Self { Value::Int(n as i64) } }
impl From<f64> for Value { fn from(f: f64) -> Self { Value::Float(f) } }
impl From<&str> for Value { fn from(s: &str) -> Self { Value::Str(s.to_string()) } }
impl From<String> for Value { fn from(s: String) -> Self { Value::Str(s) } }
impl From<Vec<Value>> for Value { fn from(items: Vec<Value>) -> Self { Value::array(items) } }
impl From<Function> for Value { fn from(f: Function) -> Self { Value::Function(f) } }

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value { Value::from(text) }

    #[test]
    fn int_addition_stays_int() {
        assert_eq!(Value::Int(1).add(&Value::Int(2)), Value::Int(3));
    }

    #[test]
    fn mixed_addition_promotes_to_float() {
        assert_eq!(Value::Float(1.0).add(&Value::Float(0.5)), Value::Float(1.5));
        assert_eq!(Value::Int(1).add(&Value::Float(0.5)), Value::Float(1.5));
    }

    #[test]
    fn string_wins_addition() {
        assert_eq!(s("aa").add(&s("bb")), s("aabb"));
        assert_eq!(Value::Int(10).add(&s("10")), s("1010"));
        assert_eq!(Value::Invalid.add(&s("10")), s("10"));
    }

    #[test]
    fn array_addition_concatenates_text() {
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.add(&Value::Int(3)), s("1,23"));
    }

    #[test]
    fn strings_coerce_in_subtraction() {
        assert_eq!(s("10").sub(&Value::Int(4)), Value::Int(6));
        assert_eq!(s("true").mul(&Value::Int(5)), Value::Int(5));
        assert_eq!(s("2.5").mul(&Value::Int(2)), Value::Float(5.0));
        assert_eq!(s("").sub(&Value::Int(1)), Value::Int(-1));
        assert!(s("abc").sub(&Value::Int(1)).is_nan());
    }

    #[test]
    fn integer_division_truncates() {
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Value::Int(3));
        assert_eq!(Value::Int(7).rem(&Value::Int(4)), Value::Int(3));
    }

    #[test]
    fn integer_division_by_zero_uses_float() {
        assert_eq!(Value::Int(1).div(&Value::Int(0)), Value::Float(f64::INFINITY));
        assert!(Value::Int(1).rem(&Value::Int(0)).is_nan());
    }

    #[test]
    fn bitwise_uses_integer_view() {
        assert_eq!(Value::Float(6.9).bit_and(&Value::Int(3)), Value::Int(2));
        assert_eq!(Value::Int(1).shl(&Value::Int(4)), Value::Int(16));
        assert_eq!(Value::Int(-16).shr(&Value::Int(2)), Value::Int(-4));
        assert_eq!(Value::Int(0).bit_not(), Value::Int(-1));
        assert_eq!(Value::Float(f64::NAN).bit_or(&Value::Int(5)), Value::Int(5));
    }

    #[test]
    fn unary_coercions() {
        assert_eq!(s("42").plus(), Value::Int(42));
        assert_eq!(s("").neg(), Value::Int(0));
        assert!(s("x").neg().is_nan());
        assert_eq!(Value::Bool(true).neg(), Value::Int(-1));
        assert!(Value::array(vec![]).not().to_bool());
    }

    #[test]
    fn unary_on_arrays_and_functions_is_nan() {
        let f = Value::from(Function::variadic("f", |_| Ok(Value::Invalid)));
        assert!(Value::array(vec![Value::Int(5)]).plus().is_nan());
        assert!(Value::array(vec![]).neg().is_nan());
        assert!(Value::array(vec![s("3")]).neg().is_nan());
        assert!(f.neg().is_nan());
        assert!(f.plus().is_nan());
        assert!(Value::array(vec![Value::Int(1)]).step(1).is_nan());
    }

    #[test]
    fn arrays_reparse_only_against_numbers() {
        let one = Value::array(vec![Value::Int(1)]);
        let two = Value::array(vec![Value::Int(2)]);
        assert!(one.sub(&two).is_nan());
        assert!(one.mul(&s("2")).is_nan());
        assert_eq!(one.sub(&Value::Int(3)), Value::Int(-2));
        assert_eq!(Value::Float(1.5).mul(&two), Value::Float(3.0));
        assert_eq!(Value::Bool(true).add(&Value::Int(1)), Value::Int(2));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Invalid.to_bool());
        assert!(!Value::Float(f64::NAN).to_bool());
        assert!(!s("0").to_bool());
        assert!(!s("false").to_bool());
        assert!(!s("").to_bool());
        assert!(s("abc").to_bool());
        assert!(Value::array(vec![Value::Int(0)]).to_bool());
    }

    #[test]
    fn loose_equality_crosses_types() {
        assert!(Value::Int(1).loose_eq(&s("1")));
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(Value::array(vec![Value::Int(5)]).loose_eq(&Value::Int(5)));
        assert!(Value::array(vec![Value::Int(1), Value::Int(2)]).loose_eq(&s("1,2")));
        assert!(!Value::Invalid.loose_eq(&Value::Int(0)));
    }

    #[test]
    fn identity_requires_same_variant() {
        assert!(!Value::Int(1).identical(&s("1")));
        assert!(!Value::Int(1).identical(&Value::Float(1.0)));
        assert!(Value::Int(1).identical(&Value::Int(1)));
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(1)]);
        assert!(a.identical(&b));
    }

    #[test]
    fn nan_is_never_equal() {
        let nan = Value::Float(f64::NAN);
        assert!(!nan.loose_eq(&nan));
        assert!(!nan.identical(&nan));
        assert_eq!(nan.binary(BinaryOp::NotEq, &nan), Value::Bool(true));
    }

    #[test]
    fn nan_sorts_lowest_but_relations_are_false() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.compare(&Value::Int(i64::MIN)), Ordering::Less);
        assert_eq!(Value::Invalid.compare(&nan), Ordering::Greater);
        assert_eq!(nan.compare(&nan), Ordering::Equal);
        for op in [BinaryOp::Lt, BinaryOp::LtEq, BinaryOp::Gt, BinaryOp::GtEq] {
            assert_eq!(nan.binary(op, &Value::Int(1)), Value::Bool(false));
            assert_eq!(Value::Int(1).binary(op, &nan), Value::Bool(false));
        }
    }

    #[test]
    fn string_number_comparison() {
        assert_eq!(s("10").compare(&Value::Int(9)), Ordering::Greater);
        assert_eq!(s("abc").compare(&Value::Int(9)), Ordering::Greater);
        assert_eq!(s("1").compare(&Value::Int(9)), Ordering::Less);
        assert_eq!(s("b").compare(&s("a")), Ordering::Greater);
    }

    #[test]
    fn array_comparison() {
        let a = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::array(vec![Value::Int(1), Value::Int(3)]);
        let c = Value::array(vec![Value::Int(1)]);
        assert_eq!(a.compare(&b), Ordering::Less);
        assert_eq!(a.compare(&c), Ordering::Greater);
        assert_eq!(Value::Int(3).compare(&b), Ordering::Greater);
    }

    #[test]
    fn spaceship_operator() {
        assert_eq!(Value::Int(1).binary(BinaryOp::Compare, &Value::Int(2)), Value::Int(-1));
        assert_eq!(s("2").binary(BinaryOp::Compare, &Value::Int(2)), Value::Int(0));
    }

    #[test]
    fn display_forms() {
        assert_eq!(Value::Invalid.to_string(), "");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Float(f64::NAN).to_string(), "NaN");
        let nested = Value::array(vec![Value::Int(1), Value::array(vec![s("a"), Value::Bool(true)])]);
        assert_eq!(nested.to_string(), "1,a,true");
    }

    #[test]
    fn indexing() {
        let arr = Value::array(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(arr.index(&Value::Int(1)), Value::Int(20));
        assert!(arr.index(&Value::Int(2)).is_invalid());
        assert!(arr.index(&Value::Int(-1)).is_invalid());
        assert_eq!(s("héllo").index(&Value::Int(1)), s("é"));
        assert!(Value::Int(5).index(&Value::Int(0)).is_invalid());
    }

    #[test]
    fn deep_copy_detaches_storage() {
        let inner = Value::array(vec![Value::Int(1)]);
        let outer = Value::array(vec![inner.clone()]);
        let copy = outer.deep_copy();
        if let Value::Array(items) = &inner {
            items.borrow_mut().push(Value::Int(2));
        }
        assert_eq!(outer.to_string(), "1,2");
        assert_eq!(copy.to_string(), "1");
    }

    fn self_containing(head: Value) -> Value {
        let arr = Value::array(vec![head]);
        if let Value::Array(items) = &arr {
            items.borrow_mut().push(arr.clone());
        }
        arr
    }

    #[test]
    fn self_containing_arrays_terminate() {
        let a = self_containing(Value::Int(1));
        let b = self_containing(Value::Int(1));
        assert_eq!(a.to_string(), "1,[...]");
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert!(a.identical(&b));
        assert!(a.loose_eq(&b));
        assert!(a.sub(&Value::Int(1)).is_nan());

        let copy = a.deep_copy();
        let Value::Array(items) = &copy else { panic!("expected array") };
        let Value::Array(inner) = items.borrow()[1].clone() else { panic!("expected array") };
        assert!(Rc::ptr_eq(items, &inner));
        assert!(copy.identical(&a));
        assert!(!copy.identical(&self_containing(Value::Int(2))));
    }

    #[test]
    fn integer_overflow_wraps() {
        assert_eq!(Value::Int(i64::MAX).step(1), Value::Int(i64::MIN));
    }
}
