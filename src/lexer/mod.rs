pub mod token;
pub use token::{Token, TokenKind, keyword};

use crate::diagnostics::CompileError;

/// Tokenize Flow source text into a flat token stream.
pub fn lex(source: &str) -> Result<Vec<Token>, CompileError> {
    Lexer::new(source).tokenize()
}

/// Byte-at-a-time scanner. Owns its own position, indentation stack, and
/// output buffer so concurrent tokenizations are independent.
pub struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    indents: Vec<u32>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            indents: vec![0],
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, CompileError> {
        while !self.at_end() {
            if self.column == 1 {
                self.handle_indentation()?;
                if self.at_end() {
                    break;
                }
            }
            self.scan_token()?;
        }

        // Unwind any open indentation levels.
        while self.indents.len() > 1 {
            self.indents.pop();
            self.emit(TokenKind::Dedent, "");
        }
        self.emit(TokenKind::Eof, "");

        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), CompileError> {
        let ch = self.current();

        match ch {
            b'\n' => {
                self.emit(TokenKind::Newline, "\n");
                self.pos += 1;
                self.line += 1;
                self.column = 1;
            }
            b' ' | b'\t' => self.skip_whitespace(),
            b'/' if self.peek() == b'/' => self.skip_comment(),
            b'"' => self.scan_string()?,
            b'0'..=b'9' => self.scan_number(),
            b'_' => self.scan_identifier(),
            c if c.is_ascii_alphabetic() => self.scan_identifier(),
            _ => self.scan_operator()?,
        }

        Ok(())
    }

    fn scan_operator(&mut self) -> Result<(), CompileError> {
        match self.current() {
            b'+' => self.emit_advance(TokenKind::Plus, "+"),
            b'-' => self.emit_advance(TokenKind::Minus, "-"),
            b'*' => self.emit_advance(TokenKind::Star, "*"),
            b'/' => self.emit_advance(TokenKind::Slash, "/"),
            b'%' => self.emit_advance(TokenKind::Percent, "%"),
            b'<' => self.scan_compare(TokenKind::Lt, "<", TokenKind::Le, "<="),
            b'>' => self.scan_compare(TokenKind::Gt, ">", TokenKind::Ge, ">="),
            b'=' => {
                if self.peek() == b'=' {
                    self.emit(TokenKind::EqEq, "==");
                    self.advance();
                    self.advance();
                } else {
                    return Err(self.unexpected_char());
                }
            }
            b'!' => {
                if self.peek() == b'=' {
                    self.emit(TokenKind::Ne, "!=");
                    self.advance();
                    self.advance();
                } else {
                    return Err(self.unexpected_char());
                }
            }
            b'\'' => {
                if self.peek() == b's' {
                    self.emit(TokenKind::Possessive, "'s");
                    self.advance();
                    self.advance();
                } else {
                    return Err(self.unexpected_char());
                }
            }
            b'(' => self.emit_advance(TokenKind::LParen, "("),
            b')' => self.emit_advance(TokenKind::RParen, ")"),
            b'[' => self.emit_advance(TokenKind::LBracket, "["),
            b']' => self.emit_advance(TokenKind::RBracket, "]"),
            b'{' => self.emit_advance(TokenKind::LBrace, "{"),
            b'}' => self.emit_advance(TokenKind::RBrace, "}"),
            b':' => self.emit_advance(TokenKind::Colon, ":"),
            b',' => self.emit_advance(TokenKind::Comma, ","),
            b'|' => self.emit_advance(TokenKind::Pipe, "|"),
            b'@' => self.emit_advance(TokenKind::AtSign, "@"),
            _ => return Err(self.unexpected_char()),
        }

        Ok(())
    }

    fn scan_compare(&mut self, single: TokenKind, single_val: &str, double: TokenKind, double_val: &str) {
        if self.peek() == b'=' {
            self.emit(double, double_val);
            self.advance();
            self.advance();
        } else {
            self.emit_advance(single, single_val);
        }
    }

    fn scan_string(&mut self) -> Result<(), CompileError> {
        let (start_line, start_column) = (self.line, self.column);
        self.advance(); // opening quote
        let mut value = String::new();

        while self.current() != b'"' && !self.at_end() {
            if self.current() == b'\n' {
                return Err(CompileError::lex("unterminated string", start_line, start_column));
            }
            if self.current() == b'\\' {
                self.advance();
                match self.current() {
                    b'n' => value.push('\n'),
                    b't' => value.push('\t'),
                    b'r' => value.push('\r'),
                    b'\\' => value.push('\\'),
                    b'"' => value.push('"'),
                    b'0' => value.push('\0'),
                    other => {
                        // Unknown escape, keep as-is
                        value.push('\\');
                        value.push(other as char);
                    }
                }
            } else {
                value.push(self.current() as char);
            }
            self.advance();
        }

        if self.at_end() {
            return Err(CompileError::lex("unterminated string", start_line, start_column));
        }

        self.tokens.push(Token::new(TokenKind::Str, value, start_line, start_column));
        self.advance(); // closing quote
        Ok(())
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        let (start_line, start_column) = (self.line, self.column);
        let mut is_float = false;

        while self.current().is_ascii_digit() {
            self.advance();
        }

        if self.current() == b'.' && self.peek().is_ascii_digit() {
            is_float = true;
            self.advance(); // dot
            while self.current().is_ascii_digit() {
                self.advance();
            }
        }

        let kind = if is_float { TokenKind::Float } else { TokenKind::Int };
        let value = self.src[start..self.pos].to_string();
        self.tokens.push(Token::new(kind, value, start_line, start_column));
    }

    fn scan_identifier(&mut self) {
        let start = self.pos;
        let (start_line, start_column) = (self.line, self.column);

        while self.current().is_ascii_alphanumeric() || self.current() == b'_' {
            self.advance();
        }

        let value = &self.src[start..self.pos];
        let kind = keyword(value).unwrap_or(TokenKind::Ident);
        self.tokens.push(Token::new(kind, value, start_line, start_column));
    }

    /// Indentation bookkeeping at the start of a logical line. Blank and
    /// comment-only lines leave the stack untouched.
    fn handle_indentation(&mut self) -> Result<(), CompileError> {
        let mut indent = 0u32;
        loop {
            match self.current() {
                b' ' => indent += 1,
                b'\t' => indent += 4,
                _ => break,
            }
            self.advance();
        }

        if self.current() == b'\n' || (self.current() == b'/' && self.peek() == b'/') {
            return Ok(());
        }

        let current = *self.indents.last().unwrap();

        if indent > current {
            self.indents.push(indent);
            self.emit(TokenKind::Indent, "");
        } else if indent < current {
            while self.indents.len() > 1 && *self.indents.last().unwrap() > indent {
                self.indents.pop();
                self.emit(TokenKind::Dedent, "");
            }
            if *self.indents.last().unwrap() != indent {
                return Err(CompileError::lex(
                    format!("inconsistent indentation: width {indent} matches no enclosing block"),
                    self.line,
                    self.column,
                ));
            }
        }

        Ok(())
    }

    fn current(&self) -> u8 {
        if self.at_end() { 0 } else { self.bytes[self.pos] }
    }

    fn peek(&self) -> u8 {
        if self.pos + 1 >= self.bytes.len() { 0 } else { self.bytes[self.pos + 1] }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.column += 1;
    }

    fn emit(&mut self, kind: TokenKind, value: &str) {
        self.tokens.push(Token::new(kind, value, self.line, self.column));
    }

    fn emit_advance(&mut self, kind: TokenKind, value: &str) {
        self.emit(kind, value);
        self.advance();
    }

    fn skip_whitespace(&mut self) {
        while self.current() == b' ' || self.current() == b'\t' {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        while self.current() != b'\n' && !self.at_end() {
            self.advance();
        }
    }

    fn unexpected_char(&self) -> CompileError {
        CompileError::lex(
            format!("unexpected character '{}'", self.current() as char),
            self.line,
            self.column,
        )
    }
}
