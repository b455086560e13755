//! Recursive-descent parser for the Slate language.
//!
//! Grammar (left-associative, `*` `/` bind tighter than `+` `-`):
//!
//! ```text
//! program   := function*
//! function  := IDENT '(' ')' ':' type block
//! block     := '{' statement* '}'
//! statement := var_decl | call_stmt | if_stmt | block
//! var_decl  := IDENT ':' type '=' expr ';'
//! call_stmt := IDENT '(' (expr (',' expr)*)? ')' ';'
//! if_stmt   := 'if' expr block ('else' block)?
//! expr      := term (('+' | '-') term)*
//! term      := primary (('*' | '/') primary)*
//! primary   := NUMBER | IDENT | '(' expr ')'
//! ```

use crate::common::errors::ParseError;

use super::ast::Ast;
use super::token::{Primitive, Token, TokenKind};

/// The recursive-descent parser over a token slice.
pub struct Parser<'a> {
    tokens: &'a [Token],
    cur: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, cur: 0 }
    }

    /// Parse a whole program: a sequence of function definitions.
    pub fn parse_program(mut self) -> Result<Ast, ParseError> {
        let mut items = Vec::new();
        while !self.at_end() {
            items.push(self.parse_function()?);
        }
        Ok(Ast::Program { items })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cur)
    }

    fn at_end(&self) -> bool {
        self.cur >= self.tokens.len()
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.cur);
        if token.is_some() {
            self.cur += 1;
        }
        token
    }

    fn have(&self, kind: &TokenKind) -> bool {
        self.peek().map(|t| &t.kind == kind).unwrap_or(false)
    }

    /// Consume a token of exactly `kind` or fail.
    fn expect(&mut self, kind: &TokenKind) -> Result<(), ParseError> {
        if self.have(kind) {
            self.cur += 1;
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    /// Consume the token if it matches; report whether it did.
    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.have(kind) {
            self.cur += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.advance().map(|t| t.kind.clone()) {
            Some(TokenKind::Ident(name)) => Ok(name),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "identifier".to_string(),
            }),
        }
    }

    fn expect_type(&mut self) -> Result<Primitive, ParseError> {
        match self.advance().map(|t| t.kind.clone()) {
            Some(TokenKind::Type(p)) => Ok(p),
            Some(other) => Err(ParseError::UnexpectedToken {
                expected: "type name".to_string(),
                found: other.to_string(),
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "type name".to_string(),
            }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.to_string(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn parse_function(&mut self) -> Result<Ast, ParseError> {
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen)?;
        self.expect(&TokenKind::RParen)?;
        self.expect(&TokenKind::Colon)?;
        let return_type = self.expect_type()?;
        let body = self.parse_block()?;

        Ok(Ast::Function {
            name,
            return_type,
            body: Box::new(body),
        })
    }

    fn parse_block(&mut self) -> Result<Ast, ParseError> {
        self.expect(&TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.have(&TokenKind::RBrace) {
            if self.at_end() {
                return Err(ParseError::UnexpectedEof {
                    expected: "}".to_string(),
                });
            }
            stmts.push(self.parse_statement()?);
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(Ast::Block { stmts })
    }

    fn parse_statement(&mut self) -> Result<Ast, ParseError> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Ident(_)) => self.parse_ident_statement(),
            Some(TokenKind::LBrace) => self.parse_block(),
            Some(TokenKind::If) => self.parse_if(),
            Some(kind @ (TokenKind::While | TokenKind::For)) => Err(ParseError::ReservedKeyword {
                keyword: kind.to_string(),
            }),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// A statement starting with an identifier: a declaration or a call.
    fn parse_ident_statement(&mut self) -> Result<Ast, ParseError> {
        let name = self.expect_ident()?;

        if self.eat(&TokenKind::Colon) {
            let ty = self.expect_type()?;
            self.expect(&TokenKind::Assign)?;
            let value = self.parse_expr()?;
            self.expect(&TokenKind::Semi)?;
            return Ok(Ast::VarDecl {
                name,
                ty,
                value: Box::new(value),
            });
        }

        if self.eat(&TokenKind::LParen) {
            let call = self.finish_call(name)?;
            self.expect(&TokenKind::Semi)?;
            return Ok(call);
        }

        Err(self.unexpected("':' or '(' after identifier"))
    }

    fn finish_call(&mut self, name: String) -> Result<Ast, ParseError> {
        let mut args = Vec::new();
        while !self.have(&TokenKind::RParen) {
            if self.at_end() {
                return Err(ParseError::UnexpectedEof {
                    expected: ")".to_string(),
                });
            }
            args.push(self.parse_expr()?);
            if !self.have(&TokenKind::RParen) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(Ast::Call { name, args })
    }

    fn parse_if(&mut self) -> Result<Ast, ParseError> {
        self.expect(&TokenKind::If)?;
        let condition = self.parse_expr()?;
        let then_block = self.parse_block()?;

        let else_block = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_block()?))
        } else {
            None
        };

        Ok(Ast::If {
            condition: Box::new(condition),
            then_block: Box::new(then_block),
            else_block,
        })
    }

    fn parse_expr(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(kind @ (TokenKind::Plus | TokenKind::Minus)) => kind.clone(),
                _ => break,
            };
            self.cur += 1;
            let right = self.parse_term()?;
            left = Ast::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Ast, ParseError> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(kind @ (TokenKind::Star | TokenKind::Slash)) => kind.clone(),
                _ => break,
            };
            self.cur += 1;
            let right = self.parse_primary()?;
            left = Ast::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Ast, ParseError> {
        match self.peek().map(|t| t.kind.clone()) {
            Some(TokenKind::Number(value)) => {
                self.cur += 1;
                Ok(Ast::Number(value))
            }
            Some(TokenKind::Ident(name)) => {
                self.cur += 1;
                Ok(Ast::Ident(name))
            }
            Some(TokenKind::LParen) => {
                self.cur += 1;
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

/// Parse a token stream into a program AST.
pub fn parse(tokens: &[Token]) -> Result<Ast, ParseError> {
    Parser::new(tokens).parse_program()
}
