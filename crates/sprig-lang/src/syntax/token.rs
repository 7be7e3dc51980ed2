#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    Bool(bool),
    Ident(String),

    // String literals are split into fragments so the parser can see
    // interpolated expressions: `"a{x}b"` lexes as
    // StrOpen StrText("a") InterpOpen Ident(x) InterpClose StrText("b") StrClose
    StrOpen,
    StrText(String),
    InterpOpen,
    InterpClose,
    StrClose,

    // Keywords
    If,
    Else,
    Switch,
    Case,
    Default,
    While,
    Break,
    Continue,
    For,
    Return,
    Fn,

    // Arithmetic
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    PlusPlus,   // ++
    MinusMinus, // --

    // Assignment
    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=
    PercentEq, // %=
    AmpEq,     // &=
    PipeEq,    // |=
    CaretEq,   // ^=
    ShlEq,     // <<=
    ShrEq,     // >>=

    // Comparison
    EqEq,      // ==
    BangEq,    // !=
    EqEqEq,    // ===
    BangEqEq,  // !==
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Spaceship, // <=>

    // Bitwise / logical
    Shl,      // <<
    Shr,      // >>
    Amp,      // &
    Pipe,     // |
    Caret,    // ^
    Tilde,    // ~
    Bang,     // !
    AmpAmp,   // &&
    PipePipe, // ||

    // Punctuation
    Question,  // ?
    Colon,     // :
    Semicolon, // ;
    Comma,     // ,
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    LBrace,    // {
    RBrace,    // }

    Eof,
}

/// Maps an identifier string to its keyword token, or returns `Ident`.
pub fn keyword_or_ident(s: String) -> TokenKind {
    match s.as_str() {
        "true"     => TokenKind::Bool(true),
        "false"    => TokenKind::Bool(false),
        "if"       => TokenKind::If,
        "else"     => TokenKind::Else,
        "switch"   => TokenKind::Switch,
        "case"     => TokenKind::Case,
        "default"  => TokenKind::Default,
        "while"    => TokenKind::While,
        "break"    => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "for"      => TokenKind::For,
        "return"   => TokenKind::Return,
        "fn"       => TokenKind::Fn,
        _          => TokenKind::Ident(s),
    }
}

/// Operator spellings, longest first so the lexer can match greedily.
pub const OPERATORS: &[&str] = &[
    "<<=", ">>=", "===", "!==", "<=>",
    "==", "!=", "<=", ">=", "<<", ">>", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=",
    "+", "-", "*", "/", "%", "=", "<", ">", "!", "~", "&", "|", "^",
    "?", ":", ";", ",", "(", ")", "[", "]", "{", "}",
];

/// Token kind for an entry of [`OPERATORS`].
pub fn operator_kind(op: &str) -> Option<TokenKind> {
    let kind = match op {
        "<<=" => TokenKind::ShlEq,
        ">>=" => TokenKind::ShrEq,
        "===" => TokenKind::EqEqEq,
        "!==" => TokenKind::BangEqEq,
        "<=>" => TokenKind::Spaceship,
        "=="  => TokenKind::EqEq,
        "!="  => TokenKind::BangEq,
        "<="  => TokenKind::LtEq,
        ">="  => TokenKind::GtEq,
        "<<"  => TokenKind::Shl,
        ">>"  => TokenKind::Shr,
        "&&"  => TokenKind::AmpAmp,
        "||"  => TokenKind::PipePipe,
        "++"  => TokenKind::PlusPlus,
        "--"  => TokenKind::MinusMinus,
        "+="  => TokenKind::PlusEq,
        "-="  => TokenKind::MinusEq,
        "*="  => TokenKind::StarEq,
        "/="  => TokenKind::SlashEq,
        "%="  => TokenKind::PercentEq,
        "&="  => TokenKind::AmpEq,
        "|="  => TokenKind::PipeEq,
        "^="  => TokenKind::CaretEq,
        "+"   => TokenKind::Plus,
        "-"   => TokenKind::Minus,
        "*"   => TokenKind::Star,
        "/"   => TokenKind::Slash,
        "%"   => TokenKind::Percent,
        "="   => TokenKind::Eq,
        "<"   => TokenKind::Lt,
        ">"   => TokenKind::Gt,
        "!"   => TokenKind::Bang,
        "~"   => TokenKind::Tilde,
        "&"   => TokenKind::Amp,
        "|"   => TokenKind::Pipe,
        "^"   => TokenKind::Caret,
        "?"   => TokenKind::Question,
        ":"   => TokenKind::Colon,
        ";"   => TokenKind::Semicolon,
        ","   => TokenKind::Comma,
        "("   => TokenKind::LParen,
        ")"   => TokenKind::RParen,
        "["   => TokenKind::LBracket,
        "]"   => TokenKind::RBracket,
        "{"   => TokenKind::LBrace,
        "}"   => TokenKind::RBrace,
        _     => return None,
    };
    Some(kind)
}

// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Self {
        Self { kind, lexeme: lexeme.into(), line, column }
    }
}
