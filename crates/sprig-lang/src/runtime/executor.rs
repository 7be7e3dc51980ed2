//! Tree-walking evaluator. Statements yield a value plus a control signal;
//! expressions yield a value, or a [`Reference`] when in assignment position.

use std::rc::Rc;

use crate::error::{ErrorCode, RuntimeError};
use crate::runtime::environment::Environment;
use crate::runtime::function::{Argument, Function};
use crate::runtime::reference::Reference;
use crate::runtime::value::Value;
use crate::syntax::ast::*;

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    None,
    Return,
    Break,
    Continue,
}

pub type Flow = (Value, Signal);

pub struct Executor {
    env: Environment,
}

impl Executor {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Runs a whole program. The result is the value of the last statement
    /// executed, or of a top-level `return`.
    pub fn exec_program(&self, program: &Program) -> Result<Value, RuntimeError> {
        self.exec_body(&program.statements)
    }

    /// Runs a function body or program, consuming any control signal.
    pub fn exec_body(&self, stmts: &[Stmt]) -> Result<Value, RuntimeError> {
        let (value, _) = self.exec_all(stmts)?;
        Ok(value)
    }

    /// Runs statements in order, stopping at the first non-`None` signal.
    pub fn exec_all(&self, stmts: &[Stmt]) -> Result<Flow, RuntimeError> {
        let mut last = Value::Invalid;
        for stmt in stmts {
            let (value, signal) = self.exec(stmt)?;
            last = value;
            if signal != Signal::None {
                return Ok((last, signal));
            }
        }
        Ok((last, Signal::None))
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    pub fn exec(&self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Block(stmts, _) => Executor::new(self.env.stack()).exec_all(stmts),

            Stmt::If(s) => {
                if self.eval(&s.condition)?.to_bool() {
                    self.exec(&s.then_branch)
                } else if let Some(else_branch) = &s.else_branch {
                    self.exec(else_branch)
                } else {
                    Ok((Value::Invalid, Signal::None))
                }
            }

            Stmt::Switch(s) => self.exec_switch(s),

            Stmt::While(s) => {
                let mut last = Value::Invalid;
                while self.eval(&s.condition)?.to_bool() {
                    let (value, signal) = self.exec(&s.body)?;
                    last = value;
                    match signal {
                        Signal::Return => return Ok((last, Signal::Return)),
                        Signal::Break  => break,
                        Signal::Continue | Signal::None => {}
                    }
                }
                Ok((last, Signal::None))
            }

            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.eval(init)?;
                }
                let mut last = Value::Invalid;
                loop {
                    if let Some(cond) = &s.condition {
                        if !self.eval(cond)?.to_bool() { break; }
                    }
                    let (value, signal) = self.exec(&s.body)?;
                    last = value;
                    match signal {
                        Signal::Return => return Ok((last, Signal::Return)),
                        Signal::Break  => break,
                        Signal::Continue | Signal::None => {}
                    }
                    if let Some(step) = &s.step {
                        self.eval(step)?;
                    }
                }
                Ok((last, Signal::None))
            }

            Stmt::Break(_)    => Ok((Value::Invalid, Signal::Break)),
            Stmt::Continue(_) => Ok((Value::Invalid, Signal::Continue)),

            Stmt::Return(value, _) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Invalid,
                };
                Ok((value, Signal::Return))
            }

            Stmt::Expr(expr) => Ok((self.eval(expr)?, Signal::None)),

            Stmt::FnDecl(decl) => {
                let f = Value::Function(Function::script(Rc::clone(decl), self.env.clone()));
                self.env.define(&decl.name, f.clone());
                Ok((f, Signal::None))
            }
        }
    }

    /// Jumps to the first matching `case` (or the first `default`) and falls
    /// through the following sections until `break` or `return`.
    fn exec_switch(&self, s: &SwitchStmt) -> Result<Flow, RuntimeError> {
        let discriminant = self.eval(&s.discriminant)?;

        let mut matched = None;
        let mut fallback = None;
        'search: for (i, section) in s.sections.iter().enumerate() {
            for label in &section.labels {
                match label {
                    SwitchLabel::Case(expr) => {
                        if self.eval(expr)?.loose_eq(&discriminant) {
                            matched = Some(i);
                            break 'search;
                        }
                    }
                    SwitchLabel::Default => {
                        fallback.get_or_insert(i);
                    }
                }
            }
        }

        let Some(start) = matched.or(fallback) else {
            return Ok((Value::Invalid, Signal::None));
        };

        let mut last = Value::Invalid;
        for section in &s.sections[start..] {
            let (value, signal) = self.exec_all(&section.body)?;
            last = value;
            match signal {
                Signal::None  => {}
                Signal::Break => return Ok((last, Signal::None)),
                other         => return Ok((last, other)),
            }
        }
        Ok((last, Signal::None))
    }

    // ─── Expressions ─────────────────────────────────────────────────────────

    pub fn eval(&self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Bool(b, _)  => Ok(Value::Bool(*b)),
            Expr::Int(n, _)   => Ok(Value::Int(*n)),
            Expr::Float(f, _) => Ok(Value::Float(*f)),
            Expr::Str(s, _)   => Ok(Value::Str(s.clone())),

            Expr::Interpolation(parts, _) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        InterpPart::Text(text) => out.push_str(text),
                        InterpPart::Expr(e) => out.push_str(&self.eval(e)?.to_string()),
                    }
                }
                Ok(Value::Str(out))
            }

            Expr::List(items, _) => {
                let values = items.iter().map(|e| self.eval(e)).collect::<Result<Vec<_>, _>>()?;
                Ok(Value::array(values))
            }

            Expr::Variable(name, _) => {
                Ok(self.env.get(name).map(|v| v.resolve()).unwrap_or_default())
            }

            Expr::Prefix { op, operand, span } => self.eval_prefix(*op, operand, span.line),

            Expr::Postfix { op, operand, span } => {
                let target = self.eval_reference(operand)?;
                let old = target.get();
                let new = match op {
                    PostfixOp::Increment => old.step(1),
                    PostfixOp::Decrement => old.step(-1),
                };
                target.set(new).map_err(|e| e.at(span.line))?;
                Ok(old)
            }

            Expr::Binary { left, op, right, span } => self.eval_binary(left, *op, right, span.line),

            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                if self.eval(condition)?.to_bool() {
                    self.eval(then_expr)
                } else {
                    self.eval(else_expr)
                }
            }

            Expr::Invocation { callee, args, span } => self.eval_call(callee, args, span.line),

            Expr::Subscript { target, index, .. } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                Ok(target.index(&index))
            }
        }
    }

    fn eval_prefix(&self, op: PrefixOp, operand: &Expr, line: usize) -> Result<Value, RuntimeError> {
        match op {
            PrefixOp::Plus   => Ok(self.eval(operand)?.plus()),
            PrefixOp::Neg    => Ok(self.eval(operand)?.neg()),
            PrefixOp::Not    => Ok(self.eval(operand)?.not()),
            PrefixOp::BitNot => Ok(self.eval(operand)?.bit_not()),

            PrefixOp::Increment | PrefixOp::Decrement => {
                let target = self.eval_reference(operand)?;
                let delta = if op == PrefixOp::Increment { 1 } else { -1 };
                let new = target.get().step(delta);
                target.set(new.clone()).map_err(|e| e.at(line))?;
                Ok(new)
            }

            PrefixOp::Ref => match self.eval_reference(operand)? {
                Reference::Direct(value) => Ok(value),
                location => Ok(Value::Reference(Rc::new(location))),
            },
        }
    }

    fn eval_binary(&self, left: &Expr, op: BinaryOp, right: &Expr, line: usize) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::And => {
                if !self.eval(left)?.to_bool() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval(right)?.to_bool()))
            }
            BinaryOp::Or => {
                if self.eval(left)?.to_bool() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval(right)?.to_bool()))
            }
            BinaryOp::Assign => {
                let target = self.eval_reference(left)?;
                let value = self.eval(right)?;
                target.set(value.clone()).map_err(|e| e.at(line))?;
                Ok(value)
            }
            _ if op.is_assignment() => {
                let target = self.eval_reference(left)?;
                let current = target.get();
                let rhs = self.eval(right)?;
                let value = current.binary(op, &rhs);
                target.set(value.clone()).map_err(|e| e.at(line))?;
                Ok(value)
            }
            _ => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                Ok(l.binary(op, &r))
            }
        }
    }

    fn eval_call(&self, callee: &Expr, args: &[CallArg], line: usize) -> Result<Value, RuntimeError> {
        let Value::Function(f) = self.eval(callee)? else {
            let what = match callee {
                Expr::Variable(name, _) => format!("`{name}`"),
                _ => "expression".to_string(),
            };
            return Err(RuntimeError::new(ErrorCode::R001, line, format!("{what} is not a function")));
        };

        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(Argument { name: arg.name.clone(), value: self.eval(&arg.value)? });
        }
        f.invoke(arguments).map_err(|e| e.at(line))
    }

    /// Evaluates `expr` as an assignable location. Expressions that name no
    /// location come back as [`Reference::Direct`].
    pub fn eval_reference(&self, expr: &Expr) -> Result<Reference, RuntimeError> {
        match expr {
            Expr::Variable(name, _) => Ok(Reference::variable(&self.env, name.as_str())),
            Expr::Subscript { target, index, .. } => {
                let base = self.eval_reference(target)?;
                let index = self.eval(index)?;
                Ok(Reference::element(base, index))
            }
            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                if self.eval(condition)?.to_bool() {
                    self.eval_reference(then_expr)
                } else {
                    self.eval_reference(else_expr)
                }
            }
            _ => Ok(Reference::Direct(self.eval(expr)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::lexer::Lexer;
    use crate::syntax::parser::Parser;
    use pretty_assertions::assert_eq;

    fn exec_in(env: &Environment, src: &str) -> Result<Value, RuntimeError> {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        let program = Parser::new().parse(tokens.into()).expect("parse failed");
        Executor::new(env.clone()).exec_program(&program)
    }

    fn exec(src: &str) -> Value {
        exec_in(&Environment::new(), src).unwrap_or_else(|e| panic!("runtime error: {e}"))
    }

    #[test]
    fn program_value_is_last_statement() {
        assert_eq!(exec("1; 2; 3"), Value::Int(3));
        assert!(exec("").is_invalid());
    }

    #[test]
    fn top_level_return_stops_the_program() {
        assert_eq!(exec("x = 1; return x + 1; x = 10;"), Value::Int(2));
    }

    #[test]
    fn only_blocks_open_a_scope() {
        let env = Environment::new();
        exec_in(&env, "if (true) a = 1; { b = 2; } while (!c) c = true;").unwrap();
        assert!(env.contains_local("a"));
        assert!(!env.contains("b"));
        assert!(env.contains_local("c"));
    }

    #[test]
    fn while_loop_with_break_and_continue() {
        let src = "i = 0; sum = 0;
                   while (true) {
                       i++;
                       if (i > 10) break;
                       if (i % 2 == 0) continue;
                       sum += i;
                   }
                   sum";
        assert_eq!(exec(src), Value::Int(25));
    }

    #[test]
    fn for_loop_runs_step_after_continue() {
        let src = "n = 0; for (i = 0; i < 5; i++) { if (i == 2) continue; n += 1; } n";
        assert_eq!(exec(src), Value::Int(4));
    }

    #[test]
    fn function_result_without_return_is_last_value() {
        assert_eq!(exec("fn f(x) { x * 2 } f(4)"), Value::Int(8));
    }

    #[test]
    fn function_declaration_evaluates_to_function() {
        assert_eq!(exec("fn f() {}").type_name(), "function");
    }

    #[test]
    fn closures_see_later_mutation() {
        assert_eq!(exec("k = 1; fn f() { return k; } k = 5; f()"), Value::Int(5));
    }

    #[test]
    fn default_may_reference_earlier_parameter() {
        assert_eq!(exec("fn f(a, b = a * 10) { return a + b; } f(2)"), Value::Int(22));
    }

    #[test]
    fn compound_assignment_returns_new_value() {
        assert_eq!(exec("x = 5; x <<= 2"), Value::Int(20));
        assert_eq!(exec("s = \"a\"; s += 1; s"), Value::from("a1"));
    }

    #[test]
    fn increments() {
        assert_eq!(exec("i = 1; j = i++; j * 10 + i"), Value::Int(12));
        assert_eq!(exec("i = 1; j = ++i; j * 10 + i"), Value::Int(22));
        assert_eq!(exec("a = [5]; a[0]--; a[0]"), Value::Int(4));
    }

    #[test]
    fn arrays_alias() {
        assert_eq!(exec("a = [1, 2]; b = a; b[0] = 9; a[0]"), Value::Int(9));
    }

    #[test]
    fn address_of_gives_by_reference_parameters() {
        let src = "fn swap(p, q) { t = p; p = q; q = t; }
                   x = 1; y = 2; swap(&x, &y); x * 10 + y";
        assert_eq!(exec(src), Value::Int(21));
    }

    #[test]
    fn address_of_plain_value_is_the_value() {
        assert_eq!(exec("r = &(1 + 2); r"), Value::Int(3));
    }

    #[test]
    fn calling_a_non_function_fails() {
        let err = exec_in(&Environment::new(), "x = 1;\nmissing(x)").unwrap_err();
        assert_eq!(err.code, ErrorCode::R001);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn assigning_to_a_literal_fails() {
        let err = exec_in(&Environment::new(), "1 = 2").unwrap_err();
        assert_eq!(err.code, ErrorCode::R002);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn native_errors_get_call_site_line() {
        let env = Environment::new();
        env.define("fail", Value::Function(Function::bind("fail", &[], |_| {
            Err(RuntimeError::native("nope"))
        })));
        let err = exec_in(&env, "\n\nfail()").unwrap_err();
        assert_eq!(err.code, ErrorCode::R004);
        assert_eq!(err.line, 3);
    }
}
