//! Parser for the SMPL language
//!
//! A recursive descent parser that produces a [`Program`] from a token stream.
//! Binary operators are handled by precedence climbing.
//!
//! Nesting is capped at [`MAX_NESTING`] so later tree walks over a parsed
//! program stay within a bounded stack.

use crate::ast::*;
use crate::common::{NodeId, Span, ensure_sufficient_stack};
use crate::diagnostics::{CompileError, SourceFile};
use crate::lexer::{Token, TokenKind};

/// Deepest expression nesting accepted before `parse::nesting_too_deep`
pub const MAX_NESTING: usize = 512;

/// Parse a token stream into a program
pub fn parse(tokens: &[Token], source: &str) -> Result<Program, CompileError> {
    parse_file(tokens, &SourceFile::anonymous(source))
}

/// Parse a token stream produced from a named source file
pub fn parse_file(tokens: &[Token], file: &SourceFile) -> Result<Program, CompileError> {
    let mut parser = Parser::new(tokens, file);
    let program = parser.parse_program()?;
    tracing::trace!("parsed {} statements from {}", program.seq.len(), file.name);
    Ok(program)
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
    eof: Token,
    /// Open `expr`/unary levels on the call stack
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        let end = file.content.len();
        Self {
            tokens,
            pos: 0,
            file,
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
                text: String::new(),
            },
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consume `kind` if present
    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("`{}`", kind)))
        }
    }

    fn span(&self) -> Span {
        self.current().span
    }

    /// Span of the most recently consumed token
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::DUMMY, |t| t.span)
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let tok = self.current();
        if tok.kind == TokenKind::Eof {
            CompileError::UnexpectedEof {
                expected: expected.to_string(),
                span: tok.span.into(),
                src: self.file.to_named_source(),
            }
        } else {
            CompileError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("`{}`", tok.text),
                span: tok.span.into(),
                src: self.file.to_named_source(),
            }
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        if self.depth >= MAX_NESTING {
            return Err(CompileError::NestingTooDeep {
                limit: MAX_NESTING,
                span: self.span().into(),
                src: self.file.to_named_source(),
            });
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Result<Program, CompileError> {
        let seq = self.parse_seq(TokenKind::Eof)?;
        self.expect(TokenKind::Eof)?;
        Ok(Program::new(seq))
    }

    /// Statements separated by `;` up to (not including) `end`
    fn parse_seq(&mut self, end: TokenKind) -> Result<StmtSequence, CompileError> {
        let start = self.span();
        let mut stmts = Vec::new();

        while !self.at(end) {
            stmts.push(self.parse_stmt()?);
            if !self.eat(TokenKind::Semi) {
                break;
            }
        }

        if !self.at(end) {
            let expected = if end == TokenKind::Eof {
                "`;` or end of input".to_string()
            } else {
                format!("`;` or `{}`", end)
            };
            return Err(self.unexpected(&expected));
        }

        let mut seq = StmtSequence::new(stmts);
        if seq.span.is_dummy() {
            seq.span = Span::new(start.start, start.start);
        }
        Ok(seq)
    }

    // ==================== STATEMENTS ====================

    fn parse_stmt(&mut self) -> Result<Expr, CompileError> {
        if self.at(TokenKind::Ident) && self.peek_n(1) == TokenKind::Assign {
            return self.parse_assignment();
        }
        self.parse_expr()
    }

    fn peek_n(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn parse_assignment(&mut self) -> Result<Expr, CompileError> {
        let name_tok = self.expect(TokenKind::Ident)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expr()?;
        let span = name_tok.span.merge(value.span());
        Ok(Expr::assign(name_tok.text, value).with_span(span))
    }

    fn parse_if(&mut self) -> Result<Expr, CompileError> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Then)?;
        let body = self.parse_stmt()?;
        let stmt = if self.eat(TokenKind::Else) {
            let other = self.parse_stmt()?;
            IfStatement::new(condition, body, other)
        } else {
            IfStatement::without_else(condition, body)
        };
        let span = start.merge(self.prev_span());
        Ok(Expr::If(stmt.with_span(span)))
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        self.nested(|p| match p.peek() {
            TokenKind::If => p.parse_if(),
            TokenKind::Proc => p.parse_proc(),
            _ => p.parse_expr_with_precedence(0),
        })
    }

    fn parse_expr_with_precedence(&mut self, min_prec: u8) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }

            self.advance();
            // All binary operators are left-associative
            let right = self.parse_expr_with_precedence(prec + 1)?;
            let span = left.span().merge(right.span());
            left = Expr::binary(op, left, right).with_span(span);
        }

        Ok(left)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek() {
            TokenKind::Or => BinaryOp::Or,
            TokenKind::And => BinaryOp::And,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        if op == UnaryOp::Neg && self.peek_n(1) == TokenKind::IntLit {
            if let Some(literal) = self.negative_literal()? {
                return Ok(literal);
            }
        }
        let start = self.advance().span;
        let operand = self.nested(Self::parse_unary)?;
        let span = start.merge(operand.span());
        Ok(Expr::unary(op, operand).with_span(span))
    }

    /// `-INT` not followed by a call is a single negative literal
    fn negative_literal(&mut self) -> Result<Option<Expr>, CompileError> {
        // `-0` stays a negation so it prints back unchanged
        let zero = self
            .tokens
            .get(self.pos + 1)
            .is_some_and(|t| t.text.bytes().all(|b| b == b'0' || b == b'_'));
        if zero || self.peek_n(2) == TokenKind::LParen {
            return Ok(None);
        }
        let start = self.advance().span;
        let tok = self.advance();
        let text = format!("-{}", tok.text.replace('_', ""));
        let value = text.parse::<i64>().map_err(|_| self.invalid_integer(&tok))?;
        Ok(Some(Expr::int(value).with_span(start.merge(tok.span))))
    }

    fn invalid_integer(&self, tok: &Token) -> CompileError {
        CompileError::InvalidInteger {
            text: tok.text.clone(),
            span: tok.span.into(),
            src: self.file.to_named_source(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;

        while self.at(TokenKind::LParen) {
            self.advance();
            let mut args = Vec::new();
            while !self.at(TokenKind::RParen) {
                args.push(self.parse_expr()?);
                if !self.at(TokenKind::RParen) {
                    self.expect(TokenKind::Comma)?;
                }
            }
            let end = self.expect(TokenKind::RParen)?.span;
            let span = expr.span().merge(end);
            expr = Expr::call(expr, args).with_span(span);
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match self.peek() {
            TokenKind::IntLit => {
                let tok = self.advance();
                // Only reachable out of range as `-9223372036854775808(...)`
                let value: i64 = tok
                    .text
                    .replace('_', "")
                    .parse()
                    .map_err(|_| self.invalid_integer(&tok))?;
                Ok(Expr::int(value).with_span(tok.span))
            }
            TokenKind::True => Ok(Expr::boolean(true).with_span(self.advance().span)),
            TokenKind::False => Ok(Expr::boolean(false).with_span(self.advance().span)),
            TokenKind::Ident => {
                let tok = self.advance();
                Ok(Expr::ident(tok.text).with_span(tok.span))
            }
            TokenKind::LParen => {
                let start = self.advance().span;
                if self.at(TokenKind::RParen) {
                    let end = self.advance().span;
                    return Ok(Expr::unit().with_span(start.merge(end)));
                }
                let inner = self.parse_stmt()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBrace => {
                let start = self.advance().span;
                let seq = self.parse_seq(TokenKind::RBrace)?;
                let end = self.expect(TokenKind::RBrace)?.span;
                let span = start.merge(end);
                Ok(Expr::Block(BlockExpr {
                    id: NodeId::fresh(),
                    seq,
                    span,
                }))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Proc => self.parse_proc(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_proc(&mut self) -> Result<Expr, CompileError> {
        let start = self.expect(TokenKind::Proc)?.span;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) {
            params.push(self.expect(TokenKind::Ident)?.text);
            if !self.at(TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_expr()?;
        let span = start.merge(body.span());
        Ok(Expr::proc(params, body).with_span(span))
    }
}
