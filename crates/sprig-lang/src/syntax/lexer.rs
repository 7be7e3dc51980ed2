use crate::error::{ErrorCode, SyntaxError};
use crate::syntax::token::{keyword_or_ident, operator_kind, Token, TokenKind, OPERATORS};

/// What the lexer is currently inside of. The stack lets interpolated
/// expressions contain string literals that interpolate again.
#[derive(Debug)]
enum Mode {
    /// String literal text. Position is the opening quote.
    Text { line: usize, column: usize },
    /// Expression between `{` and `}` of a string; `depth` counts plain braces.
    Interp { depth: usize },
}

/// Line-oriented tokenizer. Only block comments carry state across lines.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    modes: Vec<Mode>,
    in_block_comment: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, tokens: Vec::new(), modes: Vec::new(), in_block_comment: false }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let (mut end_line, mut end_column) = (1, 1);

        for (index, text) in self.source.lines().enumerate() {
            let line = index + 1;
            let chars: Vec<char> = text.chars().collect();
            self.lex_line(&chars, line)?;

            // string literals never span lines
            if let Some((open_line, open_column)) = self.open_string() {
                return Err(SyntaxError::new(ErrorCode::L002, open_line, open_column,
                    "unterminated string literal"));
            }
            end_line = line;
            end_column = chars.len() + 1;
        }

        self.tokens.push(Token::new(TokenKind::Eof, "", end_line, end_column));
        Ok(self.tokens)
    }

    fn lex_line(&mut self, chars: &[char], line: usize) -> Result<(), SyntaxError> {
        let mut pos = 0;
        while pos < chars.len() {
            if self.in_block_comment {
                match find_comment_end(chars, pos) {
                    Some(end) => { self.in_block_comment = false; pos = end; }
                    None => return Ok(()),
                }
                continue;
            }
            pos = match self.modes.last() {
                Some(Mode::Text { .. }) => self.lex_text(chars, pos, line)?,
                _ => self.lex_code(chars, pos, line)?,
            };
        }
        Ok(())
    }

    // ─── Code ────────────────────────────────────────────────────────────────

    /// Lexes at most one token starting at `pos`; returns the next position.
    fn lex_code(&mut self, chars: &[char], pos: usize, line: usize) -> Result<usize, SyntaxError> {
        let ch = chars[pos];
        let next = chars.get(pos + 1).copied();
        let col = pos + 1;

        match ch {
            c if c.is_whitespace() => Ok(pos + 1),
            '/' if next == Some('/') => Ok(chars.len()),
            '/' if next == Some('*') => {
                self.in_block_comment = true;
                Ok(pos + 2)
            }
            '"' => {
                self.push(TokenKind::StrOpen, "\"", line, col);
                self.modes.push(Mode::Text { line, column: col });
                Ok(pos + 1)
            }
            '0'..='9' => Ok(self.lex_number(chars, pos, line)),
            c if c.is_ascii_alphabetic() || c == '$' => Ok(self.lex_ident(chars, pos, line)),
            '{' => {
                if let Some(Mode::Interp { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                self.push(TokenKind::LBrace, "{", line, col);
                Ok(pos + 1)
            }
            '}' => {
                let closes_interp = match self.modes.last_mut() {
                    Some(Mode::Interp { depth }) if *depth == 0 => true,
                    Some(Mode::Interp { depth }) => { *depth -= 1; false }
                    _ => false,
                };
                if closes_interp {
                    self.modes.pop();
                    self.push(TokenKind::InterpClose, "}", line, col);
                } else {
                    self.push(TokenKind::RBrace, "}", line, col);
                }
                Ok(pos + 1)
            }
            _ => {
                for op in OPERATORS {
                    if matches_at(chars, pos, op) {
                        if let Some(kind) = operator_kind(op) {
                            self.push(kind, *op, line, col);
                            return Ok(pos + op.chars().count());
                        }
                    }
                }
                Err(SyntaxError::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{ch}`")))
            }
        }
    }

    fn lex_number(&mut self, chars: &[char], start: usize, line: usize) -> usize {
        let mut end = digits_end(chars, start);
        // a dot only belongs to the number when a digit follows it
        let is_float = chars.get(end) == Some(&'.')
            && chars.get(end + 1).is_some_and(|c| c.is_ascii_digit());
        if is_float {
            end = digits_end(chars, end + 1);
        }

        let lexeme: String = chars[start..end].iter().collect();
        let kind = if is_float {
            TokenKind::Float(lexeme.parse().unwrap_or_default())
        } else {
            match lexeme.parse::<i64>() {
                Ok(n) => TokenKind::Int(n),
                // too large for an int: keep the magnitude as a float
                Err(_) => TokenKind::Float(lexeme.parse().unwrap_or(f64::INFINITY)),
            }
        };
        self.push(kind, lexeme, line, start + 1);
        end
    }

    fn lex_ident(&mut self, chars: &[char], start: usize, line: usize) -> usize {
        let mut end = start + 1;
        while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
            end += 1;
        }
        let lexeme: String = chars[start..end].iter().collect();
        self.push(keyword_or_ident(lexeme.clone()), lexeme, line, start + 1);
        end
    }

    // ─── String text ─────────────────────────────────────────────────────────

    /// Consumes literal text up to the closing quote, an interpolation
    /// opener, or the end of the line.
    fn lex_text(&mut self, chars: &[char], start: usize, line: usize) -> Result<usize, SyntaxError> {
        let mut text = String::new();
        let mut pos = start;

        while pos < chars.len() {
            let ch = chars[pos];
            let next = chars.get(pos + 1).copied();
            match ch {
                '"' => {
                    self.push_text(text, line, start);
                    self.push(TokenKind::StrClose, "\"", line, pos + 1);
                    self.modes.pop();
                    return Ok(pos + 1);
                }
                '\\' => {
                    let Some(escaped) = next else {
                        // dangling backslash; reported as unterminated at end of line
                        return Ok(chars.len());
                    };
                    text.push(unescape(escaped).ok_or_else(|| SyntaxError::new(
                        ErrorCode::L003, line, pos + 1,
                        format!("unknown escape sequence `\\{escaped}`"),
                    ))?);
                    pos += 2;
                }
                '{' if next == Some('{') => { text.push('{'); pos += 2; }
                '}' if next == Some('}') => { text.push('}'); pos += 2; }
                '{' => {
                    self.push_text(text, line, start);
                    self.push(TokenKind::InterpOpen, "{", line, pos + 1);
                    self.modes.push(Mode::Interp { depth: 0 });
                    return Ok(pos + 1);
                }
                _ => { text.push(ch); pos += 1; }
            }
        }

        self.push_text(text, line, start);
        Ok(pos)
    }

    fn push_text(&mut self, text: String, line: usize, start: usize) {
        if !text.is_empty() {
            self.tokens.push(Token::new(TokenKind::StrText(text.clone()), text, line, start + 1));
        }
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, lexeme, line, column));
    }

    /// Position of the innermost string literal still open, if any.
    fn open_string(&self) -> Option<(usize, usize)> {
        self.modes.iter().rev().find_map(|m| match m {
            Mode::Text { line, column } => Some((*line, *column)),
            Mode::Interp { .. } => None,
        })
    }
}

fn matches_at(chars: &[char], pos: usize, op: &str) -> bool {
    op.chars().enumerate().all(|(i, c)| chars.get(pos + i) == Some(&c))
}

fn digits_end(chars: &[char], mut pos: usize) -> usize {
    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    pos
}

/// Index just past the `*/` that closes a block comment, if it is on this line.
fn find_comment_end(chars: &[char], from: usize) -> Option<usize> {
    (from..chars.len().saturating_sub(1))
        .find(|&i| chars[i] == '*' && chars[i + 1] == '/')
        .map(|i| i + 2)
}

fn unescape(ch: char) -> Option<char> {
    match ch {
        '"'  => Some('"'),
        '\\' => Some('\\'),
        'n'  => Some('\n'),
        't'  => Some('\t'),
        'r'  => Some('\r'),
        '0'  => Some('\0'),
        '{'  => Some('{'),
        '}'  => Some('}'),
        _    => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
