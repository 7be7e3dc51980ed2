//! Sprig: a small, dynamically typed scripting language for embedding.
//!
//! Source text is lexed, parsed into an AST and evaluated by a tree-walking
//! executor against a chain of environments. Hosts seed variables and native
//! functions into an [`Environment`], run snippets through an [`Interpreter`]
//! and read back a [`Value`].
//!
//! ```
//! use sprig_lang::{Function, Interpreter, Value};
//!
//! let mut interp = Interpreter::new();
//! interp.environment().define("scale", Value::Int(3));
//! interp.environment().define(
//!     "twice",
//!     Function::bind("twice", &["x"], |args| Ok(args[0].mul(&Value::Int(2)))).into(),
//! );
//! let out = interp.run("fn area(w, h = w) { w * h * scale } twice(area(2))").unwrap();
//! assert_eq!(out, Value::Int(24));
//! ```

pub mod error;
pub mod namespaces;
pub mod runtime;
pub mod syntax;

pub use error::{Error, ErrorCode, RuntimeError, SyntaxError};
pub use namespaces::{Namespace, NamespaceRegistry};
pub use runtime::environment::Environment;
pub use runtime::executor::{Executor, Signal};
pub use runtime::function::{Argument, Function, Parameter};
pub use runtime::interpreter::Interpreter;
pub use runtime::reference::Reference;
pub use runtime::value::{Number, Value};
pub use syntax::token::{Token, TokenKind};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Runs `source` once in a fresh interpreter with the standard namespaces.
pub fn run(source: &str) -> Result<Value, Error> {
    Interpreter::new().run(source)
}

/// Lexes `source` into tokens, ending with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    syntax::lexer::Lexer::new(source).tokenize()
}

/// Lexes and parses `source`.
pub fn parse(source: &str) -> Result<syntax::ast::Program, SyntaxError> {
    let program = syntax::parser::Parser::new().parse(tokenize(source)?.into())?;
    Ok(std::rc::Rc::unwrap_or_clone(program))
}
