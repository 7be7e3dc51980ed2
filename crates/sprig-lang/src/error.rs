use thiserror::Error;

/// Error codes prefixed by phase: L = lexer, P = parser, R = runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer
    L001, // unexpected character
    L002, // unterminated string literal
    L003, // invalid escape sequence

    // Parser
    P001, // unexpected token
    P002, // missing expected token
    P003, // missing function body
    P004, // missing default value

    // Runtime
    R001, // not callable
    R002, // not assignable
    R003, // invalid subscript target or index
    R004, // native function failure
    R005, // reference chain too deep
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L001 => "L001",
            Self::L002 => "L002",
            Self::L003 => "L003",
            Self::P001 => "P001",
            Self::P002 => "P002",
            Self::P003 => "P003",
            Self::P004 => "P004",
            Self::R001 => "R001",
            Self::R002 => "R002",
            Self::R003 => "R003",
            Self::R004 => "R004",
            Self::R005 => "R005",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Syntax ──────────────────────────────────────────────────────────────────

/// Raised by the lexer and the parser. Position is 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {line}:{column}: {message}")]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(code: ErrorCode, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

// ─── Runtime ─────────────────────────────────────────────────────────────────

/// Raised by the executor. `line` is 0 when the error originates in native
/// code and has not yet been attributed to a call site.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] line {line}: {message}")]
pub struct RuntimeError {
    pub code: ErrorCode,
    pub line: usize,
    pub message: String,
}

impl RuntimeError {
    pub fn new(code: ErrorCode, line: usize, message: impl Into<String>) -> Self {
        Self { code, line, message: message.into() }
    }

    /// Error raised from inside a native function body.
    pub fn native(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::R004, 0, message)
    }

    /// Attribute an unplaced error to `line`. Already placed errors keep theirs.
    pub fn at(mut self, line: usize) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────

/// Everything `Interpreter::run` can fail with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("syntax error {0}")]
    Syntax(#[from] SyntaxError),
    #[error("runtime error {0}")]
    Runtime(#[from] RuntimeError),
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Syntax(e) => e.code,
            Self::Runtime(e) => e.code,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Self::Syntax(e) => e.line,
            Self::Runtime(e) => e.line,
        }
    }
}
