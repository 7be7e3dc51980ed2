use std::rc::Rc;

/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

/// Root of a parsed script: the global statement list.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

// ─── Functions ───────────────────────────────────────────────────────────────

/// `fn name(a, b = a + 1) { ... }`
#[derive(Debug)]
pub struct FnDecl {
    pub name: String,
    pub params: Vec<ParamDecl>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: String,
    /// Evaluated in the callee scope when the caller leaves the parameter unset.
    pub default: Option<Rc<Expr>>,
    pub span: Span,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `{ ... }`
    Block(Vec<Stmt>, Span),
    /// `if (cond) stmt else stmt`
    If(IfStmt),
    /// `switch (x) { case 1: ... default: ... }`
    Switch(SwitchStmt),
    /// `while (cond) stmt`
    While(WhileStmt),
    /// `for (init; cond; step) stmt`
    For(ForStmt),
    Break(Span),
    Continue(Span),
    /// `return expr` or bare `return`
    Return(Option<Expr>, Span),
    /// A standalone expression, e.g. an assignment or a call.
    Expr(Expr),
    /// `fn name(params) { body }`; shared with every Function value built from it.
    FnDecl(Rc<FnDecl>),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub discriminant: Expr,
    pub sections: Vec<SwitchSection>,
    pub span: Span,
}

/// One or more labels followed by the statements up to the next label.
#[derive(Debug, Clone)]
pub struct SwitchSection {
    pub labels: Vec<SwitchLabel>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum SwitchLabel {
    Case(Expr),
    Default,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<Expr>,
    pub condition: Option<Expr>,
    pub step: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Bool(bool, Span),
    Int(i64, Span),
    Float(f64, Span),
    Str(String, Span),

    /// `"text {expr} text"`
    Interpolation(Vec<InterpPart>, Span),

    /// `[1, 2, 3]`
    List(Vec<Expr>, Span),

    Variable(String, Span),

    /// `-x`, `!x`, `++x`, `&x`
    Prefix {
        op: PrefixOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `x++`, `x--`
    Postfix {
        op: PostfixOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `a + b`, `a == b`, `a = b`, `a += b`, etc.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },

    /// `cond ? then : else`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },

    /// `callee(args, name: value)`
    Invocation {
        callee: Box<Expr>,
        args: Vec<CallArg>,
        span: Span,
    },

    /// `target[index]`
    Subscript {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Bool(_, s)             => *s,
            Expr::Int(_, s)              => *s,
            Expr::Float(_, s)            => *s,
            Expr::Str(_, s)              => *s,
            Expr::Interpolation(_, s)    => *s,
            Expr::List(_, s)             => *s,
            Expr::Variable(_, s)         => *s,
            Expr::Prefix { span, .. }    => *span,
            Expr::Postfix { span, .. }   => *span,
            Expr::Binary { span, .. }    => *span,
            Expr::Ternary { span, .. }   => *span,
            Expr::Invocation { span, .. } => *span,
            Expr::Subscript { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

/// A call argument; `name` is set for `name: value`.
#[derive(Debug, Clone)]
pub struct CallArg {
    pub name: Option<String>,
    pub value: Expr,
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    Shl, Shr,
    BitAnd, BitOr, BitXor,
    And, Or,
    Eq, NotEq, Identical, NotIdentical,
    Lt, LtEq, Gt, GtEq,
    Compare,

    Assign,
    AddAssign, SubAssign, MulAssign, DivAssign, ModAssign,
    AndAssign, OrAssign, XorAssign, ShlAssign, ShrAssign,
}

impl BinaryOp {
    /// For compound assignment, the operator applied before writing back.
    pub fn compound_base(self) -> Option<BinaryOp> {
        match self {
            Self::AddAssign => Some(Self::Add),
            Self::SubAssign => Some(Self::Sub),
            Self::MulAssign => Some(Self::Mul),
            Self::DivAssign => Some(Self::Div),
            Self::ModAssign => Some(Self::Mod),
            Self::AndAssign => Some(Self::BitAnd),
            Self::OrAssign  => Some(Self::BitOr),
            Self::XorAssign => Some(Self::BitXor),
            Self::ShlAssign => Some(Self::Shl),
            Self::ShrAssign => Some(Self::Shr),
            _ => None,
        }
    }

    pub fn is_assignment(self) -> bool {
        self == Self::Assign || self.compound_base().is_some()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",   Self::Sub => "-",   Self::Mul => "*",
            Self::Div => "/",   Self::Mod => "%",
            Self::Shl => "<<",  Self::Shr => ">>",
            Self::BitAnd => "&", Self::BitOr => "|", Self::BitXor => "^",
            Self::And => "&&",  Self::Or => "||",
            Self::Eq => "==",   Self::NotEq => "!=",
            Self::Identical => "===", Self::NotIdentical => "!==",
            Self::Lt => "<",    Self::LtEq => "<=",
            Self::Gt => ">",    Self::GtEq => ">=",
            Self::Compare => "<=>",
            Self::Assign => "=",
            Self::AddAssign => "+=", Self::SubAssign => "-=",
            Self::MulAssign => "*=", Self::DivAssign => "/=",
            Self::ModAssign => "%=", Self::AndAssign => "&=",
            Self::OrAssign => "|=",  Self::XorAssign => "^=",
            Self::ShlAssign => "<<=", Self::ShrAssign => ">>=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Plus,
    Neg,
    Not,
    BitNot,
    Increment,
    Decrement,
    /// `&x`: take a reference to an assignable expression.
    Ref,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}
