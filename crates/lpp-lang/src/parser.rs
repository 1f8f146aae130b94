use lpp_solver::{Direction, Relation};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::{Lexer, Span, Token, TokenKind};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found `{found}` at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of line: expected {0}")]
    UnexpectedEof(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unknown direction `{0}`: expected Maximize or Minimize")]
    UnknownDirection(String),
    #[error("Missing relation (<=, >= or =) in `{0}`")]
    MissingRelation(String),
    #[error("More than one relation in `{0}`")]
    MultipleRelations(String),
}

/// Parse an expression like `5x1 - x2 + 0.5x3` into its coefficients and
/// variable names, in source order.
pub fn parse_linear_terms(expr: &str) -> Result<(Vec<f64>, Vec<String>), ParseError> {
    let terms = Parser::parse_terms(expr)?;
    Ok((terms.coefficients(), terms.variables()))
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Comment tokens are dropped up front
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();
        Self { tokens, pos: 0 }
    }

    fn from_source(source: &str) -> Self {
        Self::new(Lexer::tokenize(source))
    }

    pub fn parse_terms(source: &str) -> Result<LinearTerms, ParseError> {
        let mut parser = Self::from_source(source);
        let terms = parser.parse_linear_terms()?;
        parser.expect_end("operator or end of expression")?;
        Ok(terms)
    }

    /// Parse `<Direction>: <var> = <terms>`
    pub fn parse_objective(source: &str) -> Result<ObjectiveLine, ParseError> {
        let mut parser = Self::from_source(source);

        let direction_token = parser.expect(TokenKind::Ident, "Maximize or Minimize")?;
        let direction = match direction_token.text.to_lowercase().as_str() {
            "maximize" | "max" => Direction::Maximize,
            "minimize" | "min" => Direction::Minimize,
            _ => return Err(ParseError::UnknownDirection(direction_token.text)),
        };
        parser.expect(TokenKind::Colon, ":")?;
        let variable = parser.expect(TokenKind::Ident, "objective variable")?.text;
        parser.expect(TokenKind::Eq, "=")?;
        let expr = parser.parse_linear_terms()?;
        let end = parser.expect_end("operator or end of objective")?;

        Ok(ObjectiveLine {
            span: direction_token.span.merge(end),
            direction,
            variable,
            expr,
        })
    }

    /// Parse `<terms> <relation> <number>`
    pub fn parse_constraint(source: &str) -> Result<ConstraintLine, ParseError> {
        let mut parser = Self::from_source(source);
        let text = source.trim().to_string();

        let relations = parser
            .tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Le | TokenKind::Ge | TokenKind::Eq))
            .count();
        match relations {
            0 => return Err(ParseError::MissingRelation(text)),
            1 => {}
            _ => return Err(ParseError::MultipleRelations(text)),
        }

        let start = parser.current_span();
        let lhs = parser.parse_linear_terms()?;
        let relation = match parser.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return Err(parser.unexpected("operator or relation")),
        };
        parser.advance();
        let rhs = parser.parse_signed_number()?;
        let end = parser.expect_end("end of constraint")?;

        Ok(ConstraintLine {
            span: start.merge(end),
            text,
            lhs,
            relation,
            rhs,
        })
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_span(&self) -> Span {
        self.current().map(|t| t.span).unwrap_or(Span::new(0, 0))
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: t.text.clone(),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof(expected.to_string()),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek_kind() == kind {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.unexpected(expected))
    }

    /// Require the end of input and return the span up to it
    fn expect_end(&mut self, expected: &str) -> Result<Span, ParseError> {
        if self.peek_kind() != TokenKind::Eof {
            return Err(self.unexpected(expected));
        }
        let end = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|t| t.span)
            .unwrap_or(Span::new(0, 0));
        Ok(end)
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number, "number")?;
        token
            .text
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let mut sign = 1.0;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            if self.peek_kind() == TokenKind::Minus {
                sign = -sign;
            }
            self.advance();
        }
        Ok(sign * self.parse_number()?)
    }

    /// Terms are `[sign] [number] [*] identifier`. The first term may omit the
    /// sign; every later term starts with `+` or `-`.
    fn parse_linear_terms(&mut self) -> Result<LinearTerms, ParseError> {
        let mut terms = Vec::new();

        loop {
            let start = self.current_span();
            let mut sign = 1.0;
            let mut signed = false;
            while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
                if self.peek_kind() == TokenKind::Minus {
                    sign = -sign;
                }
                self.advance();
                signed = true;
            }
            if !signed && !terms.is_empty() {
                break;
            }

            let magnitude = if self.peek_kind() == TokenKind::Number {
                let value = self.parse_number()?;
                if self.peek_kind() == TokenKind::Star {
                    self.advance();
                }
                value
            } else {
                1.0
            };

            let variable = self.expect(TokenKind::Ident, "variable")?;
            terms.push(Term {
                span: start.merge(variable.span),
                coefficient: sign * magnitude,
                variable: variable.text,
            });
        }

        Ok(LinearTerms { terms })
    }
}
