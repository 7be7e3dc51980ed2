use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{Error, RuntimeError, SyntaxError};
use crate::namespaces::NamespaceRegistry;
use crate::runtime::environment::Environment;
use crate::runtime::executor::Executor;
use crate::runtime::value::Value;
use crate::syntax::ast::Program;
use crate::syntax::lexer::Lexer;
use crate::syntax::parser::Parser;
use crate::syntax::token::Token;

type ResultHook = Box<dyn Fn(&Value)>;
type SyntaxHook = Box<dyn Fn(&SyntaxError)>;
type RuntimeHook = Box<dyn Fn(&RuntimeError)>;
type ErrorHook = Box<dyn Fn(&Error)>;

/// Runs source text: lex, parse, execute.
///
/// Holds the environment scripts run in, a cache of the last source's tokens
/// and parse tree, and the hooks notified on success or failure.
pub struct Interpreter {
    env: Environment,
    parser: Parser,
    tokens: Option<(String, Rc<[Token]>)>,
    result_hooks: Vec<ResultHook>,
    syntax_hooks: Vec<SyntaxHook>,
    runtime_hooks: Vec<RuntimeHook>,
    error_hooks: Vec<ErrorHook>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter with a fresh root environment holding the standard
    /// namespaces.
    pub fn new() -> Self {
        let env = Environment::new();
        NamespaceRegistry::standard().install(&env);
        Self::with_environment(env)
    }

    /// An interpreter that runs in `env` as given. Interpreters built from
    /// clones of one environment share their globals.
    pub fn with_environment(env: Environment) -> Self {
        Self {
            env,
            parser: Parser::new(),
            tokens: None,
            result_hooks: Vec::new(),
            syntax_hooks: Vec::new(),
            runtime_hooks: Vec::new(),
            error_hooks: Vec::new(),
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    // ─── Hooks ───────────────────────────────────────────────────────────────

    pub fn on_result(&mut self, hook: impl Fn(&Value) + 'static) -> &mut Self {
        self.result_hooks.push(Box::new(hook));
        self
    }

    pub fn on_int_result(&mut self, hook: impl Fn(i64) + 'static) -> &mut Self {
        self.on_result(move |v| hook(v.as_int()))
    }

    pub fn on_float_result(&mut self, hook: impl Fn(f64) + 'static) -> &mut Self {
        self.on_result(move |v| hook(v.as_float()))
    }

    pub fn on_bool_result(&mut self, hook: impl Fn(bool) + 'static) -> &mut Self {
        self.on_result(move |v| hook(v.to_bool()))
    }

    pub fn on_string_result(&mut self, hook: impl Fn(&str) + 'static) -> &mut Self {
        self.on_result(move |v| hook(&v.to_string()))
    }

    /// Claims syntax errors.
    pub fn on_syntax_error(&mut self, hook: impl Fn(&SyntaxError) + 'static) -> &mut Self {
        self.syntax_hooks.push(Box::new(hook));
        self
    }

    /// Claims runtime errors.
    pub fn on_runtime_error(&mut self, hook: impl Fn(&RuntimeError) + 'static) -> &mut Self {
        self.runtime_hooks.push(Box::new(hook));
        self
    }

    /// Claims any error that no typed hook claimed.
    pub fn on_error(&mut self, hook: impl Fn(&Error) + 'static) -> &mut Self {
        self.error_hooks.push(Box::new(hook));
        self
    }

    // ─── Running ─────────────────────────────────────────────────────────────

    /// Runs `source` in the interpreter's environment.
    ///
    /// On success the result hooks see a deep copy of the result, which is
    /// also returned. On failure the error goes to the hooks for its kind, or
    /// to the catch-all hooks when there are none; a claimed error yields
    /// `Ok(Value::Invalid)`, an unclaimed one is returned.
    pub fn run(&mut self, source: &str) -> Result<Value, Error> {
        let env = self.env.clone();
        self.run_in(source, &env)
    }

    /// Runs `source` in a new child of the root scope, so its top-level
    /// bindings are dropped afterwards.
    pub fn run_isolated(&mut self, source: &str) -> Result<Value, Error> {
        let env = self.env.isolated();
        self.run_in(source, &env)
    }

    /// Runs `source` in `env` instead of the interpreter's environment.
    pub fn run_in(&mut self, source: &str, env: &Environment) -> Result<Value, Error> {
        match self.execute(source, env) {
            Ok(value) => {
                let value = value.deep_copy();
                debug!(result = value.type_name(), "run finished");
                for hook in &self.result_hooks {
                    hook(&value);
                }
                Ok(value)
            }
            Err(err) => {
                debug!(code = %err.code(), line = err.line(), "run failed");
                if self.dispatch_error(&err) {
                    Ok(Value::Invalid)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Lexes and parses without running. Shares the run cache.
    pub fn parse(&mut self, source: &str) -> Result<Rc<Program>, SyntaxError> {
        let tokens = self.tokenize(source)?;
        self.parser.parse(tokens)
    }

    /// Lexes `source`, reusing the previous token list for identical text.
    pub fn tokenize(&mut self, source: &str) -> Result<Rc<[Token]>, SyntaxError> {
        if let Some((cached, tokens)) = &self.tokens {
            if cached == source {
                trace!("token cache hit");
                return Ok(Rc::clone(tokens));
            }
        }
        let tokens: Rc<[Token]> = Lexer::new(source).tokenize()?.into();
        debug!(tokens = tokens.len(), "tokenized");
        self.tokens = Some((source.to_string(), Rc::clone(&tokens)));
        Ok(tokens)
    }

    fn execute(&mut self, source: &str, env: &Environment) -> Result<Value, Error> {
        let program = self.parse(source)?;
        debug!(statements = program.statements.len(), "parsed");
        let value = Executor::new(env.clone()).exec_program(&program)?;
        Ok(value)
    }

    /// Returns whether any hook claimed the error.
    fn dispatch_error(&self, err: &Error) -> bool {
        let typed = match err {
            Error::Syntax(e) => {
                self.syntax_hooks.iter().for_each(|hook| hook(e));
                self.syntax_hooks.len()
            }
            Error::Runtime(e) => {
                self.runtime_hooks.iter().for_each(|hook| hook(e));
                self.runtime_hooks.len()
            }
        };
        if typed > 0 {
            trace!(hooks = typed, "error claimed by typed hooks");
            return true;
        }
        self.error_hooks.iter().for_each(|hook| hook(err));
        trace!(hooks = self.error_hooks.len(), "error passed to catch-all hooks");
        !self.error_hooks.is_empty()
    }
}
