pub mod ast;

use crate::diagnostics::CompileError;
use crate::lexer::{Token, TokenKind};
use ast::*;

/// Parse Flow source text straight through the lexer into a Program.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    let tokens = crate::lexer::lex(source)?;
    Parser::new(&tokens).parse_program()
}

/// Recursive-descent parser over a finished token stream. Never touches the
/// raw source; one token of pushback is the only lookbehind it uses.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let eof = tokens
            .last()
            .filter(|t| t.kind == TokenKind::Eof)
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", 1, 1));
        Self { tokens, pos: 0, eof }
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut statements = Vec::new();

        while !self.at_end() {
            self.skip_newlines();
            if self.at_end() {
                break;
            }
            statements.push(self.parse_top_level()?);
        }

        Ok(Program { statements })
    }

    // ── Top level ────────────────────────────────────────────────────

    fn parse_top_level(&mut self) -> Result<Stmt, CompileError> {
        if self.eat(TokenKind::AtSign) {
            return self.parse_decorator();
        }
        if self.eat(TokenKind::To) {
            return Ok(Stmt::Function(self.parse_function()?));
        }
        if self.eat(TokenKind::A) {
            return self.parse_struct_or_method();
        }
        if self.eat(TokenKind::Test) {
            return self.parse_test();
        }

        Err(self.err_expected("'to', 'a', 'test', or '@' at top level"))
    }

    fn parse_decorator(&mut self) -> Result<Stmt, CompileError> {
        let name = self.expect_ident("decorator name after '@'")?;
        self.skip_newlines();

        self.expect(TokenKind::To, "'to' after decorator")?;
        let function = self.parse_function()?;

        Ok(Stmt::Decorator { name, function })
    }

    fn parse_function(&mut self) -> Result<Function, CompileError> {
        let name = self.expect_ident("function name")?;

        let mut params = Vec::new();
        while matches!(self.current().kind, TokenKind::Ident | TokenKind::A) {
            params.push(self.current().value.clone());
            self.advance();
            self.eat(TokenKind::And); // optional 'and' between parameters
        }

        self.expect(TokenKind::Colon, "':' after function signature")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Function { name, params, body })
    }

    fn parse_struct_or_method(&mut self) -> Result<Stmt, CompileError> {
        let name = self.expect_ident("struct name")?;

        if self.eat(TokenKind::Has) {
            return self.parse_struct_fields(name);
        }
        if self.eat(TokenKind::Can) {
            return self.parse_method(name);
        }

        Err(self.err_expected("'has' or 'can' after struct name"))
    }

    fn parse_struct_fields(&mut self, name: String) -> Result<Stmt, CompileError> {
        self.expect(TokenKind::Colon, "':' after 'has'")?;
        self.skip_newlines();

        let mut fields = Vec::new();
        if self.eat(TokenKind::Indent) {
            while !self.check(TokenKind::Dedent) && !self.at_end() {
                self.skip_newlines();
                if self.check(TokenKind::Dedent) {
                    break;
                }

                let field_name = self.expect_ident("field name")?;
                self.expect(TokenKind::As, "'as' after field name")?;
                let field_type = self.expect_ident("field type")?;

                fields.push(Field { name: field_name, ty: field_type });
                self.skip_newlines();
            }
            self.eat(TokenKind::Dedent);
        }

        Ok(Stmt::Struct(StructDecl { name, fields }))
    }

    fn parse_method(&mut self, struct_name: String) -> Result<Stmt, CompileError> {
        let name = self.expect_ident("method name")?;
        self.expect(TokenKind::Colon, "':' after method name")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::Method(MethodDecl { struct_name, name, body }))
    }

    fn parse_test(&mut self) -> Result<Stmt, CompileError> {
        let mut name = String::new();
        if self.check(TokenKind::Str) {
            name = self.current().value.clone();
            self.advance();
        }

        self.expect(TokenKind::Colon, "':' after test name")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::Test { name, body })
    }

    // ── Blocks ───────────────────────────────────────────────────────

    /// Either an INDENT-delimited statement sequence or a single inline
    /// statement after the header's colon.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, CompileError> {
        if !self.eat(TokenKind::Indent) {
            if self.check(TokenKind::Newline) || self.at_end() {
                return Ok(Vec::new());
            }
            return Ok(vec![self.parse_statement()?]);
        }

        let mut stmts = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.at_end() {
            self.skip_newlines();
            if self.check(TokenKind::Dedent) {
                break;
            }
            stmts.push(self.parse_statement()?);
            self.skip_newlines();
        }

        self.eat(TokenKind::Dedent);
        Ok(stmts)
    }

    // ── Statements ───────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        match self.current().kind {
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for_each(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::While => self.parse_while(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Skip => {
                self.advance();
                Ok(Stmt::Skip)
            }
            TokenKind::Stop => {
                self.advance();
                Ok(Stmt::Stop)
            }
            TokenKind::Say => {
                self.advance();
                Ok(Stmt::Say(self.parse_expression()?))
            }
            TokenKind::Print => {
                self.advance();
                Ok(Stmt::Print(self.parse_expression()?))
            }
            TokenKind::Pause => {
                self.advance();
                Ok(Stmt::Pause(self.parse_expression()?))
            }
            TokenKind::Write => self.parse_write_file(false),
            TokenKind::Append => self.parse_write_file(true),
            TokenKind::Using => self.parse_using(),
            TokenKind::Yield => {
                self.advance();
                Ok(Stmt::Yield(self.parse_expression()?))
            }
            TokenKind::Log => self.parse_log(),
            TokenKind::Assert => self.parse_assert(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                self.advance();
                Ok(Stmt::Throw(self.parse_expression()?))
            }
            TokenKind::Do => self.parse_do_together(),
            TokenKind::Send => self.parse_send(),
            TokenKind::Ident | TokenKind::A => self.parse_ident_statement(),
            _ => Err(self.err_at_current(format!("unexpected token {}", self.current().kind))),
        }
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon, "':' after if condition")?;
        self.skip_newlines();
        let then_body = self.parse_block()?;

        let mut else_ifs = Vec::new();
        let mut else_body = Vec::new();

        while self.eat(TokenKind::Otherwise) {
            if self.eat(TokenKind::If) {
                let condition = self.parse_expression()?;
                self.expect(TokenKind::Colon, "':' after otherwise if condition")?;
                self.skip_newlines();
                let body = self.parse_block()?;
                else_ifs.push(ElseIf { condition, body });
            } else {
                self.expect(TokenKind::Colon, "':' after otherwise")?;
                self.skip_newlines();
                else_body = self.parse_block()?;
                break;
            }
        }

        Ok(Stmt::If { condition, then_body, else_ifs, else_body })
    }

    fn parse_for_each(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        self.expect(TokenKind::Each, "'each' after 'for'")?;
        let var = self.expect_ident("variable name")?;
        self.expect(TokenKind::In, "'in' after variable name")?;

        let start = self.parse_expression()?;
        let end = if self.eat(TokenKind::To) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(TokenKind::Colon, "':' after for each")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::ForEach { var, start, end, body })
    }

    fn parse_repeat(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        if !self.check(TokenKind::Int) {
            return Err(self.err_expected("integer after 'repeat'"));
        }
        let count = self.parse_int_value()?;
        self.advance();

        self.expect(TokenKind::Times, "'times' after count")?;
        self.expect(TokenKind::Colon, "':' after 'times'")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::Repeat { count, body })
    }

    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon, "':' after while condition")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::While { condition, body })
    }

    fn parse_return(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        if self.check(TokenKind::Newline) || self.check(TokenKind::Dedent) || self.at_end() {
            return Ok(Stmt::Return(None));
        }

        // Comparison level, so 'and' stays free to join multiple values.
        let first = self.parse_comparison()?;

        if self.check(TokenKind::And) {
            let mut elements = vec![first];
            while self.eat(TokenKind::And) {
                elements.push(self.parse_comparison()?);
            }
            return Ok(Stmt::Return(Some(Expr::Tuple(elements))));
        }

        Ok(Stmt::Return(Some(first)))
    }

    fn parse_write_file(&mut self, append: bool) -> Result<Stmt, CompileError> {
        self.advance();

        // A bare identifier right before 'to' is the content itself, not the
        // start of a slice.
        let content = if matches!(self.current().kind, TokenKind::Ident | TokenKind::A)
            && self.peek().kind == TokenKind::To
        {
            let name = self.current().value.clone();
            self.advance();
            Expr::Ident(name)
        } else {
            self.parse_expression()?
        };

        self.expect(TokenKind::To, "'to' after content")?;
        let path = self.parse_expression()?;

        Ok(Stmt::WriteFile { content, path, append })
    }

    fn parse_using(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        let name = self.expect_ident("variable name after 'using'")?;
        self.expect(TokenKind::Is, "'is' after variable name")?;
        let value = self.parse_expression()?;
        self.expect(TokenKind::Colon, "':' after using expression")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::Using { name, value, body })
    }

    fn parse_log(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        let level = if self.eat(TokenKind::Info) {
            LogLevel::Info
        } else if self.eat(TokenKind::Warn) {
            LogLevel::Warn
        } else if self.eat(TokenKind::Error) {
            LogLevel::Error
        } else {
            LogLevel::Info
        };

        let message = self.parse_expression()?;
        Ok(Stmt::Log { level, message })
    }

    fn parse_assert(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        let condition = self.parse_expression()?;
        let message = if self.eat(TokenKind::Comma) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        Ok(Stmt::Assert { condition, message })
    }

    fn parse_try(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        self.expect(TokenKind::Colon, "':' after 'try'")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        self.expect(TokenKind::Catch, "'catch' after try block")?;

        let mut err_name = String::from("err");
        if self.check(TokenKind::Ident) {
            err_name = self.current().value.clone();
            self.advance();
        }

        self.expect(TokenKind::Colon, "':' after 'catch'")?;
        self.skip_newlines();
        let catch_body = self.parse_block()?;

        Ok(Stmt::Try { body, err_name, catch_body })
    }

    fn parse_do_together(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        self.expect(TokenKind::Together, "'together' after 'do'")?;
        self.expect(TokenKind::Colon, "':' after 'do together'")?;
        self.skip_newlines();
        let body = self.parse_block()?;

        Ok(Stmt::DoTogether(body))
    }

    fn parse_send(&mut self) -> Result<Stmt, CompileError> {
        self.advance();

        // Same guard as write: a bare identifier before 'to' is the message.
        let message = if matches!(self.current().kind, TokenKind::Ident | TokenKind::A)
            && self.peek().kind == TokenKind::To
        {
            let name = self.current().value.clone();
            self.advance();
            Expr::Ident(name)
        } else {
            self.parse_expression()?
        };

        self.expect(TokenKind::To, "'to' after message")?;
        let socket = self.parse_expression()?;

        Ok(Stmt::SocketSend { message, socket })
    }

    fn parse_ident_statement(&mut self) -> Result<Stmt, CompileError> {
        let name = self.current().value.clone();
        self.advance();

        // Unpacking: a, b is value
        if self.eat(TokenKind::Comma) {
            return self.parse_unpack(name);
        }

        // Assignment: name is value
        if self.eat(TokenKind::Is) {
            let value = self.parse_expression()?;
            let mutable = self.parse_mutable_marker();
            return Ok(Stmt::Assign { name, value, mutable });
        }

        // Reassignment: name becomes value
        if self.eat(TokenKind::Becomes) {
            let value = self.parse_expression()?;
            return Ok(Stmt::Reassign { name, value });
        }

        // Expression statement: push the identifier back and re-parse.
        self.pos -= 1;
        let expr = self.parse_expression()?;
        Ok(Stmt::Expr(expr))
    }

    fn parse_unpack(&mut self, first: String) -> Result<Stmt, CompileError> {
        let mut names = vec![first];
        loop {
            if !self.check(TokenKind::Ident) {
                return Err(self.err_expected("identifier in unpacking"));
            }
            names.push(self.current().value.clone());
            self.advance();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::Is, "'is' after unpacking names")?;
        let value = self.parse_expression()?;
        let mutable = self.parse_mutable_marker();

        Ok(Stmt::Unpack { names, value, mutable })
    }

    fn parse_mutable_marker(&mut self) -> bool {
        if self.eat(TokenKind::Comma) {
            if self.eat(TokenKind::Can) && self.eat(TokenKind::Change) {
                return true;
            }
        }
        false
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.parse_pipe()
    }

    fn parse_pipe(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_or()?;

        while self.eat(TokenKind::Pipe) {
            // The right-hand side of a pipe must be a bare callable name;
            // anything richer is rejected rather than emitted wrong.
            let target = self.expect_ident("callable name after '|'")?;
            if self.is_arg_start() {
                return Err(self.err_at_current(
                    "pipe target must be a bare callable name".to_string(),
                ));
            }
            left = Expr::Pipe { value: Box::new(left), target };
        }

        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_and()?;

        while self.eat(TokenKind::Or) {
            let rhs = self.parse_and()?;
            left = Expr::Binary { op: BinOp::Or, lhs: Box::new(left), rhs: Box::new(rhs) };
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;

        while self.eat(TokenKind::And) {
            let rhs = self.parse_comparison()?;
            left = Expr::Binary { op: BinOp::And, lhs: Box::new(left), rhs: Box::new(rhs) };
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_addition()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                // 'is' in expression position reads as equality
                TokenKind::Is => BinOp::Eq,
                _ => return Ok(left),
            };
            self.advance();

            let rhs = self.parse_addition()?;
            left = Expr::Binary { op, lhs: Box::new(left), rhs: Box::new(rhs) };
        }
    }

    fn parse_addition(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplication()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();

            let rhs = self.parse_multiplication()?;
            left = Expr::Binary { op, lhs: Box::new(left), rhs: Box::new(rhs) };
        }
    }

    fn parse_multiplication(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();

            let rhs = self.parse_unary()?;
            left = Expr::Binary { op, lhs: Box::new(left), rhs: Box::new(rhs) };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.eat(TokenKind::Not) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }

        if self.eat(TokenKind::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.eat(TokenKind::Possessive) {
                let field = self.expect_ident("field name after 's")?;
                expr = Expr::FieldAccess { object: Box::new(expr), field };
            } else if self.eat(TokenKind::At) {
                let index = self.parse_expression()?;
                expr = Expr::Index { object: Box::new(expr), index: Box::new(index) };
            } else if self.eat(TokenKind::From) {
                let start = self.parse_primary()?;
                let end = if self.eat(TokenKind::To) {
                    Some(Box::new(self.parse_primary()?))
                } else {
                    None
                };
                expr = Expr::Slice { object: Box::new(expr), start: Some(Box::new(start)), end };
            } else if self.check(TokenKind::To) {
                // 'to' only slices a bare identifier; anywhere else it
                // belongs to the surrounding form (range, write target).
                if matches!(expr, Expr::Ident(_)) {
                    self.advance();
                    let end = self.parse_primary()?;
                    expr = Expr::Slice { object: Box::new(expr), start: None, end: Some(Box::new(end)) };
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.current().kind {
            TokenKind::Int => {
                let value = self.parse_int_value()?;
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::Float => {
                let value: f64 = self.current().value.parse().map_err(|_| {
                    self.err_at_current(format!("invalid float literal '{}'", self.current().value))
                })?;
                self.advance();
                Ok(Expr::Float(value))
            }
            TokenKind::Str => {
                let value = self.current().value.clone();
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::Yes => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::No => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::My => {
                self.advance();
                let field = self.expect_ident("field name after 'my'")?;
                Ok(Expr::MyField(field))
            }
            TokenKind::Read => {
                self.advance();
                Ok(Expr::ReadFile(Box::new(self.parse_argument()?)))
            }
            TokenKind::Ask => {
                self.advance();
                let prompt = if self.is_expr_start() {
                    Some(Box::new(self.parse_argument()?))
                } else {
                    None
                };
                Ok(Expr::Ask(prompt))
            }
            TokenKind::Now => {
                self.advance();
                Ok(Expr::Now)
            }
            TokenKind::Today => {
                self.advance();
                Ok(Expr::Today)
            }
            TokenKind::Clock => {
                self.advance();
                Ok(Expr::Clock)
            }
            TokenKind::Env => {
                self.advance();
                Ok(Expr::Env(Box::new(self.parse_argument()?)))
            }
            TokenKind::Run => {
                self.advance();
                Ok(Expr::RunCommand(Box::new(self.parse_argument()?)))
            }
            TokenKind::Open => {
                self.advance();
                Ok(Expr::OpenFile(Box::new(self.parse_argument()?)))
            }
            TokenKind::Fetch => {
                self.advance();
                Ok(Expr::Fetch(Box::new(self.parse_argument()?)))
            }
            TokenKind::Parse => {
                self.advance();
                Ok(Expr::JsonParse(Box::new(self.parse_argument()?)))
            }
            TokenKind::Stringify => {
                self.advance();
                Ok(Expr::JsonStringify(Box::new(self.parse_argument()?)))
            }
            TokenKind::Match => {
                self.advance();
                let pattern = self.parse_argument()?;
                self.expect(TokenKind::In, "'in' after pattern")?;
                let text = self.parse_argument()?;
                Ok(Expr::RegexMatch { pattern: Box::new(pattern), text: Box::new(text) })
            }
            TokenKind::Find => {
                self.advance();
                let pattern = self.parse_argument()?;
                self.expect(TokenKind::In, "'in' after pattern")?;
                let text = self.parse_argument()?;
                Ok(Expr::RegexFindAll { pattern: Box::new(pattern), text: Box::new(text) })
            }
            TokenKind::Replace => self.parse_regex_replace(),
            TokenKind::Hash => self.parse_hash(),
            TokenKind::Wait => {
                self.advance();
                Ok(Expr::Wait(Box::new(self.parse_expression()?)))
            }
            TokenKind::Connect => {
                self.advance();
                Ok(Expr::SocketConnect(Box::new(self.parse_argument()?)))
            }
            TokenKind::Ident | TokenKind::A => self.parse_ident_or_call(),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_list(),
            _ => Err(self.err_at_current(format!("unexpected token {}", self.current().kind))),
        }
    }

    fn parse_regex_replace(&mut self) -> Result<Expr, CompileError> {
        self.advance();
        let pattern = self.parse_argument()?;
        self.expect(TokenKind::In, "'in' after pattern")?;
        let text = self.parse_argument()?;

        if !(self.check(TokenKind::Ident) && self.current().value == "with") {
            return Err(self.err_expected("'with' in replace"));
        }
        self.advance();

        let replacement = self.parse_argument()?;
        Ok(Expr::RegexReplace {
            pattern: Box::new(pattern),
            text: Box::new(text),
            replacement: Box::new(replacement),
        })
    }

    fn parse_hash(&mut self) -> Result<Expr, CompileError> {
        self.advance();

        let mut algorithm = HashAlgorithm::Sha256;
        if self.check(TokenKind::Ident) {
            let named = match self.current().value.as_str() {
                "sha256" => Some(HashAlgorithm::Sha256),
                "sha1" => Some(HashAlgorithm::Sha1),
                "md5" => Some(HashAlgorithm::Md5),
                _ => None,
            };
            if let Some(algo) = named {
                algorithm = algo;
                self.advance();
            }
        }

        let value = self.parse_argument()?;
        Ok(Expr::Hash { algorithm, value: Box::new(value) })
    }

    fn parse_ident_or_call(&mut self) -> Result<Expr, CompileError> {
        let name = self.current().value.clone();
        self.advance();

        let mut args = Vec::new();
        while self.is_arg_start() {
            args.push(self.parse_argument()?);
            self.eat(TokenKind::And); // optional 'and' between arguments
        }

        if args.is_empty() {
            Ok(Expr::Ident(name))
        } else {
            Ok(Expr::Call { name, args })
        }
    }

    fn parse_list(&mut self) -> Result<Expr, CompileError> {
        self.advance();

        if self.eat(TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.parse_or()?;

        // A 'for' after the first element flips this into a comprehension.
        if self.eat(TokenKind::For) {
            return self.parse_list_comp(first);
        }

        let mut elements = vec![first];
        while self.eat(TokenKind::Comma) {
            elements.push(self.parse_expression()?);
        }

        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expr::List(elements))
    }

    fn parse_list_comp(&mut self, expr: Expr) -> Result<Expr, CompileError> {
        self.expect(TokenKind::Each, "'each' after 'for'")?;
        let var = self.expect_ident("variable name")?;
        self.expect(TokenKind::In, "'in' after variable")?;

        let start = self.parse_or()?;
        let end = if self.eat(TokenKind::To) {
            Some(Box::new(self.parse_or()?))
        } else {
            None
        };

        let filter = if self.eat(TokenKind::Where) {
            Some(Box::new(self.parse_or()?))
        } else {
            None
        };

        self.expect(TokenKind::RBracket, "']'")?;

        Ok(Expr::ListComp { expr: Box::new(expr), var, start: Box::new(start), end, filter })
    }

    /// One space-separated call argument: a literal, identifier, list, or
    /// parenthesized expression.
    fn parse_argument(&mut self) -> Result<Expr, CompileError> {
        match self.current().kind {
            TokenKind::Int => {
                let value = self.parse_int_value()?;
                self.advance();
                Ok(Expr::Int(value))
            }
            TokenKind::Float => {
                let value: f64 = self.current().value.parse().map_err(|_| {
                    self.err_at_current(format!("invalid float literal '{}'", self.current().value))
                })?;
                self.advance();
                Ok(Expr::Float(value))
            }
            TokenKind::Str => {
                let value = self.current().value.clone();
                self.advance();
                Ok(Expr::Str(value))
            }
            TokenKind::Yes => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            TokenKind::No => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            TokenKind::Ident | TokenKind::A => {
                let name = self.current().value.clone();
                self.advance();
                Ok(Expr::Ident(name))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_list(),
            _ => Err(self.err_expected("argument")),
        }
    }

    fn is_arg_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::Yes
                | TokenKind::No
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::Ident
                | TokenKind::A
        )
    }

    fn is_expr_start(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Ident
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Str
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Yes
                | TokenKind::No
                | TokenKind::Not
                | TokenKind::Minus
                | TokenKind::A
        )
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn parse_int_value(&self) -> Result<i64, CompileError> {
        self.current().value.parse().map_err(|_| {
            self.err_at_current(format!("integer literal '{}' out of range", self.current().value))
        })
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos + 1).unwrap_or(&self.eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), CompileError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.err_expected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, CompileError> {
        if self.check(TokenKind::Ident) {
            let name = self.current().value.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.err_expected(what))
        }
    }

    fn at_end(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn skip_newlines(&mut self) {
        while self.eat(TokenKind::Newline) {}
    }

    fn err_expected(&self, what: &str) -> CompileError {
        self.err_at_current(format!("expected {what}, found {}", self.current().kind))
    }

    fn err_at_current(&self, msg: String) -> CompileError {
        let tok = self.current();
        CompileError::parse(msg, tok.line, tok.column)
    }
}
