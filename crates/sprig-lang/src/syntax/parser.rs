use std::rc::Rc;

use tracing::trace;

use crate::error::{ErrorCode, SyntaxError};
use crate::syntax::ast::*;
use crate::syntax::token::{Token, TokenKind};

/// Binding power of an operator, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assignment, // = += ... and ?:
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    Equality,
    Relational,
    Spaceship,
    Shift,
    Additive,
    Multiplicative,
    Unary,
    Postfix, // call, subscript, x++
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Ternary,
    Call,
    Subscript,
    Postfix(PostfixOp),
}

#[derive(Debug, Clone, Copy)]
struct InfixOp {
    kind: Infix,
    precedence: Precedence,
    right_assoc: bool,
}

/// Led-table: how a token continues an expression already on the left.
fn find_binary_op(kind: &TokenKind) -> Option<InfixOp> {
    use Precedence as P;
    let (kind, precedence) = match kind {
        TokenKind::LParen     => (Infix::Call, P::Postfix),
        TokenKind::LBracket   => (Infix::Subscript, P::Postfix),
        TokenKind::PlusPlus   => (Infix::Postfix(PostfixOp::Increment), P::Postfix),
        TokenKind::MinusMinus => (Infix::Postfix(PostfixOp::Decrement), P::Postfix),

        TokenKind::Star    => (Infix::Binary(BinaryOp::Mul), P::Multiplicative),
        TokenKind::Slash   => (Infix::Binary(BinaryOp::Div), P::Multiplicative),
        TokenKind::Percent => (Infix::Binary(BinaryOp::Mod), P::Multiplicative),
        TokenKind::Plus    => (Infix::Binary(BinaryOp::Add), P::Additive),
        TokenKind::Minus   => (Infix::Binary(BinaryOp::Sub), P::Additive),
        TokenKind::Shl     => (Infix::Binary(BinaryOp::Shl), P::Shift),
        TokenKind::Shr     => (Infix::Binary(BinaryOp::Shr), P::Shift),
        TokenKind::Spaceship => (Infix::Binary(BinaryOp::Compare), P::Spaceship),
        TokenKind::Lt      => (Infix::Binary(BinaryOp::Lt), P::Relational),
        TokenKind::LtEq    => (Infix::Binary(BinaryOp::LtEq), P::Relational),
        TokenKind::Gt      => (Infix::Binary(BinaryOp::Gt), P::Relational),
        TokenKind::GtEq    => (Infix::Binary(BinaryOp::GtEq), P::Relational),
        TokenKind::EqEq    => (Infix::Binary(BinaryOp::Eq), P::Equality),
        TokenKind::BangEq  => (Infix::Binary(BinaryOp::NotEq), P::Equality),
        TokenKind::EqEqEq  => (Infix::Binary(BinaryOp::Identical), P::Equality),
        TokenKind::BangEqEq => (Infix::Binary(BinaryOp::NotIdentical), P::Equality),
        TokenKind::Amp     => (Infix::Binary(BinaryOp::BitAnd), P::BitAnd),
        TokenKind::Caret   => (Infix::Binary(BinaryOp::BitXor), P::BitXor),
        TokenKind::Pipe    => (Infix::Binary(BinaryOp::BitOr), P::BitOr),
        TokenKind::AmpAmp  => (Infix::Binary(BinaryOp::And), P::LogicalAnd),
        TokenKind::PipePipe => (Infix::Binary(BinaryOp::Or), P::LogicalOr),

        TokenKind::Question  => (Infix::Ternary, P::Assignment),
        TokenKind::Eq        => (Infix::Binary(BinaryOp::Assign), P::Assignment),
        TokenKind::PlusEq    => (Infix::Binary(BinaryOp::AddAssign), P::Assignment),
        TokenKind::MinusEq   => (Infix::Binary(BinaryOp::SubAssign), P::Assignment),
        TokenKind::StarEq    => (Infix::Binary(BinaryOp::MulAssign), P::Assignment),
        TokenKind::SlashEq   => (Infix::Binary(BinaryOp::DivAssign), P::Assignment),
        TokenKind::PercentEq => (Infix::Binary(BinaryOp::ModAssign), P::Assignment),
        TokenKind::AmpEq     => (Infix::Binary(BinaryOp::AndAssign), P::Assignment),
        TokenKind::PipeEq    => (Infix::Binary(BinaryOp::OrAssign), P::Assignment),
        TokenKind::CaretEq   => (Infix::Binary(BinaryOp::XorAssign), P::Assignment),
        TokenKind::ShlEq     => (Infix::Binary(BinaryOp::ShlAssign), P::Assignment),
        TokenKind::ShrEq     => (Infix::Binary(BinaryOp::ShrAssign), P::Assignment),
        _ => return None,
    };
    Some(InfixOp { kind, precedence, right_assoc: precedence == P::Assignment })
}

/// Nud-table for the unary operators.
fn find_prefix_op(kind: &TokenKind) -> Option<PrefixOp> {
    match kind {
        TokenKind::Plus       => Some(PrefixOp::Plus),
        TokenKind::Minus      => Some(PrefixOp::Neg),
        TokenKind::Bang       => Some(PrefixOp::Not),
        TokenKind::Tilde      => Some(PrefixOp::BitNot),
        TokenKind::PlusPlus   => Some(PrefixOp::Increment),
        TokenKind::MinusMinus => Some(PrefixOp::Decrement),
        TokenKind::Amp        => Some(PrefixOp::Ref),
        _ => None,
    }
}

// ─── Parser ──────────────────────────────────────────────────────────────────

/// Builds a [`Program`] from tokens. Remembers the last token list it parsed;
/// handing it the same list again returns the cached tree.
#[derive(Default)]
pub struct Parser {
    last: Option<(Rc<[Token]>, Rc<Program>)>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, tokens: Rc<[Token]>) -> Result<Rc<Program>, SyntaxError> {
        if let Some((cached, program)) = &self.last {
            if Rc::ptr_eq(cached, &tokens) {
                trace!("parse cache hit");
                return Ok(Rc::clone(program));
            }
        }
        let program = Rc::new(Cursor::new(&tokens).parse_program()?);
        self.last = Some((tokens, Rc::clone(&program)));
        Ok(program)
    }
}

struct Cursor<'t> {
    tokens: &'t [Token],
    pos: usize,
    eof: Token,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        let eof = match tokens.last() {
            Some(t) => Token::new(TokenKind::Eof, "", t.line, t.column),
            None => Token::new(TokenKind::Eof, "", 1, 1),
        };
        Self { tokens, pos: 0, eof }
    }

    fn parse_program(mut self) -> Result<Program, SyntaxError> {
        let statements = self.parse_statements(|_| false)?;
        Ok(Program { statements })
    }

    /// Parses statements until end of input or until `stop` accepts the
    /// lookahead. A token that starts no statement is skipped.
    fn parse_statements(&mut self, stop: impl Fn(&TokenKind) -> bool) -> Result<Vec<Stmt>, SyntaxError> {
        let mut stmts = Vec::new();
        while !self.is_at_end() && !stop(&self.peek().kind) {
            let pos_before = self.pos;
            if let Some(stmt) = self.parse_statement()? {
                stmts.push(stmt);
            }
            // guarantee progress on tokens that begin no statement
            if self.pos == pos_before {
                self.advance();
            }
        }
        Ok(stmts)
    }

    // ─── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Option<Stmt>, SyntaxError> {
        let span = self.span();
        let kind = self.peek().kind.clone();
        let stmt = match kind {
            TokenKind::LBrace   => Stmt::Block(self.parse_block()?, span),
            TokenKind::If       => self.parse_if()?,
            TokenKind::Switch   => self.parse_switch()?,
            TokenKind::While    => self.parse_while()?,
            TokenKind::For      => self.parse_for()?,
            TokenKind::Fn       => self.parse_fn_decl()?,
            TokenKind::Break    => { self.advance(); self.matches(TokenKind::Semicolon); Stmt::Break(span) }
            TokenKind::Continue => { self.advance(); self.matches(TokenKind::Semicolon); Stmt::Continue(span) }
            TokenKind::Return   => {
                self.advance();
                let value = self.parse_expression(Precedence::Lowest)?;
                self.matches(TokenKind::Semicolon);
                Stmt::Return(value, span)
            }
            TokenKind::Semicolon => {
                self.advance();
                return Ok(None);
            }
            _ => match self.parse_expression(Precedence::Lowest)? {
                Some(expr) => {
                    self.matches(TokenKind::Semicolon);
                    Stmt::Expr(expr)
                }
                None => return Ok(None),
            },
        };
        Ok(Some(stmt))
    }

    /// A statement in body position; a lone `;` is an empty body.
    fn expect_statement(&mut self) -> Result<Stmt, SyntaxError> {
        if self.check(TokenKind::Semicolon) {
            let span = self.span();
            self.advance();
            return Ok(Stmt::Block(Vec::new(), span));
        }
        match self.parse_statement()? {
            Some(stmt) => Ok(stmt),
            None => Err(self.unexpected("statement")),
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let stmts = self.parse_statements(|k| *k == TokenKind::RBrace)?;
        self.expect(TokenKind::RBrace, "`}`")?;
        Ok(stmts)
    }

    /// `( expr )` as used by `if`, `while` and `switch`.
    fn parse_condition(&mut self) -> Result<Expr, SyntaxError> {
        self.expect(TokenKind::LParen, "`(`")?;
        let expr = self.expect_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen, "`)`")?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::If, "`if`")?;
        let condition = self.parse_condition()?;
        let then_branch = Box::new(self.expect_statement()?);
        let else_branch = if self.matches(TokenKind::Else) {
            Some(Box::new(self.expect_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { condition, then_branch, else_branch, span }))
    }

    fn parse_switch(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Switch, "`switch`")?;
        let discriminant = self.parse_condition()?;

        let mut sections = Vec::new();
        if self.matches(TokenKind::LBrace) {
            while !self.check(TokenKind::RBrace) && !self.is_at_end() {
                let labels = self.parse_switch_labels()?;
                let body = self.parse_statements(|k| {
                    matches!(k, TokenKind::Case | TokenKind::Default | TokenKind::RBrace)
                })?;
                sections.push(SwitchSection { labels, body });
            }
            self.expect(TokenKind::RBrace, "`}`")?;
        } else {
            // single unbraced section: labels followed by one statement
            let labels = self.parse_switch_labels()?;
            let body = vec![self.expect_statement()?];
            sections.push(SwitchSection { labels, body });
        }

        Ok(Stmt::Switch(SwitchStmt { discriminant, sections, span }))
    }

    /// One or more `case expr:` / `default:` labels.
    fn parse_switch_labels(&mut self) -> Result<Vec<SwitchLabel>, SyntaxError> {
        let mut labels = Vec::new();
        loop {
            if self.matches(TokenKind::Case) {
                let value = self.expect_expression(Precedence::Lowest)?;
                self.expect(TokenKind::Colon, "`:`")?;
                labels.push(SwitchLabel::Case(value));
            } else if self.matches(TokenKind::Default) {
                self.expect(TokenKind::Colon, "`:`")?;
                labels.push(SwitchLabel::Default);
            } else {
                break;
            }
        }
        if labels.is_empty() {
            return Err(self.unexpected("`case` or `default`"));
        }
        Ok(labels)
    }

    fn parse_while(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::While, "`while`")?;
        let condition = self.parse_condition()?;
        let body = Box::new(self.expect_statement()?);
        Ok(Stmt::While(WhileStmt { condition, body, span }))
    }

    fn parse_for(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::For, "`for`")?;
        self.expect(TokenKind::LParen, "`(`")?;
        let init = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        let condition = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        let step = self.parse_expression(Precedence::Lowest)?;
        self.expect(TokenKind::RParen, "`)`")?;
        let body = Box::new(self.expect_statement()?);
        Ok(Stmt::For(ForStmt { init, condition, step, body, span }))
    }

    fn parse_fn_decl(&mut self) -> Result<Stmt, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::Fn, "`fn`")?;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen, "`(`")?;

        let mut params = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let param_span = self.span();
            let param = self.expect_ident()?;
            let default = if self.matches(TokenKind::Eq) {
                match self.parse_expression(Precedence::Assignment)? {
                    Some(expr) => Some(Rc::new(expr)),
                    None => return Err(self.error(ErrorCode::P004,
                        format!("missing default value for parameter `{param}`"))),
                }
            } else {
                None
            };
            params.push(ParamDecl { name: param, default, span: param_span });
            if !self.matches(TokenKind::Comma) { break; }
        }
        self.expect(TokenKind::RParen, "`)`")?;

        if !self.check(TokenKind::LBrace) {
            return Err(self.error(ErrorCode::P003, format!("missing body for function `{name}`")));
        }
        let body = self.parse_block()?;
        Ok(Stmt::FnDecl(Rc::new(FnDecl { name, params, body, span })))
    }

    // ─── Expressions (precedence climbing) ───────────────────────────────────

    /// Returns `None` when the lookahead cannot start an expression.
    fn parse_expression(&mut self, min: Precedence) -> Result<Option<Expr>, SyntaxError> {
        let Some(mut left) = self.parse_prefix()? else { return Ok(None) };

        while let Some(op) = find_binary_op(&self.peek().kind) {
            let continues = op.precedence > min || (op.right_assoc && op.precedence >= min);
            if !continues { break; }
            left = self.parse_infix(left, op)?;
        }
        Ok(Some(left))
    }

    fn expect_expression(&mut self, min: Precedence) -> Result<Expr, SyntaxError> {
        match self.parse_expression(min)? {
            Some(expr) => Ok(expr),
            None => Err(self.unexpected("expression")),
        }
    }

    fn parse_prefix(&mut self) -> Result<Option<Expr>, SyntaxError> {
        let tok = self.peek().clone();
        let span = Span::new(tok.line, tok.column);

        if let Some(op) = find_prefix_op(&tok.kind) {
            self.advance();
            let operand = self.expect_expression(Precedence::Unary)?;
            return Ok(Some(Expr::Prefix { op, operand: Box::new(operand), span }));
        }

        let expr = match tok.kind {
            TokenKind::Int(v)   => { self.advance(); Expr::Int(v, span) }
            TokenKind::Float(v) => { self.advance(); Expr::Float(v, span) }
            TokenKind::Bool(v)  => { self.advance(); Expr::Bool(v, span) }
            TokenKind::Ident(name) => { self.advance(); Expr::Variable(name, span) }
            TokenKind::StrOpen  => self.parse_string()?,

            // grouped expression
            TokenKind::LParen => {
                self.advance();
                let expr = self.expect_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen, "`)`")?;
                expr
            }

            // list literal
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                while !self.check(TokenKind::RBracket) && !self.is_at_end() {
                    items.push(self.expect_expression(Precedence::Lowest)?);
                    if !self.matches(TokenKind::Comma) { break; }
                }
                self.expect(TokenKind::RBracket, "`]`")?;
                Expr::List(items, span)
            }

            _ => return Ok(None),
        };
        Ok(Some(expr))
    }

    fn parse_infix(&mut self, left: Expr, op: InfixOp) -> Result<Expr, SyntaxError> {
        let span = left.span();
        self.advance(); // operator token

        let expr = match op.kind {
            Infix::Binary(bin) => {
                let right = self.expect_expression(op.precedence)?;
                Expr::Binary { left: Box::new(left), op: bin, right: Box::new(right), span }
            }
            Infix::Ternary => {
                let then_expr = self.expect_expression(Precedence::Lowest)?;
                self.expect(TokenKind::Colon, "`:`")?;
                let else_expr = self.expect_expression(Precedence::Assignment)?;
                Expr::Ternary {
                    condition: Box::new(left),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    span,
                }
            }
            Infix::Call => {
                let args = self.parse_arguments()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Expr::Invocation { callee: Box::new(left), args, span }
            }
            Infix::Subscript => {
                let index = self.expect_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RBracket, "`]`")?;
                Expr::Subscript { target: Box::new(left), index: Box::new(index), span }
            }
            Infix::Postfix(post) => Expr::Postfix { op: post, operand: Box::new(left), span },
        };
        Ok(expr)
    }

    /// `"text {expr} text"`; the `StrOpen` token is the lookahead.
    fn parse_string(&mut self) -> Result<Expr, SyntaxError> {
        let span = self.span();
        self.expect(TokenKind::StrOpen, "string")?;

        let mut parts = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::StrText(text) => {
                    self.advance();
                    parts.push(InterpPart::Text(text));
                }
                TokenKind::InterpOpen => {
                    self.advance();
                    let expr = self.expect_expression(Precedence::Lowest)?;
                    self.expect(TokenKind::InterpClose, "`}`")?;
                    parts.push(InterpPart::Expr(expr));
                }
                TokenKind::StrClose => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("end of string")),
            }
        }

        if parts.iter().all(|p| matches!(p, InterpPart::Text(_))) {
            let text = parts.into_iter()
                .map(|p| match p { InterpPart::Text(t) => t, InterpPart::Expr(_) => String::new() })
                .collect();
            return Ok(Expr::Str(text, span));
        }
        Ok(Expr::Interpolation(parts, span))
    }

    // ─── Argument lists ──────────────────────────────────────────────────────

    /// Positional and `name: value` arguments, in any order.
    fn parse_arguments(&mut self) -> Result<Vec<CallArg>, SyntaxError> {
        let mut args = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_at_end() {
            let name = match &self.peek().kind {
                TokenKind::Ident(n) if self.peek_next_is(TokenKind::Colon) => {
                    let n = n.clone();
                    self.advance();
                    self.advance();
                    Some(n)
                }
                _ => None,
            };
            let value = self.expect_expression(Precedence::Lowest)?;
            args.push(CallArg { name, value });
            if !self.matches(TokenKind::Comma) { break; }
        }
        Ok(args)
    }

    // ─── Token primitives ────────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek_next_is(&self, kind: TokenKind) -> bool {
        self.tokens.get(self.pos + 1).is_some_and(|t| t.kind == kind)
    }

    fn span(&self) -> Span {
        let tok = self.peek();
        Span::new(tok.line, tok.column)
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() { self.pos += 1; }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) { self.advance(); true } else { false }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.describe_lookahead();
            Err(self.error(ErrorCode::P002, format!("expected {what}, found {found}")))
        }
    }

    fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(name) => { self.advance(); Ok(name) }
            _ => {
                let found = self.describe_lookahead();
                Err(self.error(ErrorCode::P002, format!("expected identifier, found {found}")))
            }
        }
    }

    fn unexpected(&self, what: &str) -> SyntaxError {
        let found = self.describe_lookahead();
        self.error(ErrorCode::P001, format!("expected {what}, found {found}"))
    }

    fn describe_lookahead(&self) -> String {
        match self.peek().kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => format!("`{}`", self.peek().lexeme),
        }
    }

    /// Error at the offending token; at end of input, just past the last
    /// consumed token.
    fn error(&self, code: ErrorCode, message: String) -> SyntaxError {
        let tok = self.peek();
        if tok.kind == TokenKind::Eof && self.pos > 0 {
            if let Some(last) = self.tokens.get(self.pos - 1) {
                let width = last.lexeme.chars().count().max(1);
                return SyntaxError::new(code, last.line, last.column + width, message);
            }
        }
        SyntaxError::new(code, tok.line, tok.column, message)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
