//! Recursive-descent parser for the note query language.
//!
//! Grammar (one token of lookahead):
//!
//! ```text
//! query   := clause*
//! clause  := '#' TERM ['*']
//!          | TERM ':' target
//!          | target
//!          | '`' PHRASE '`'
//! target  := TERM ['*']
//!          | '"' PHRASE '"'
//! ```
//!
//! Clauses are independent and combine as a disjunction: every clause is
//! optional and contributes to the score.

use super::lexer::{Lexer, Token, TokenKind};
use super::node::QueryNode;
use thiserror::Error;

/// Field that `#tag` shorthand is scoped to
pub const TAGS_FIELD: &str = "tags";

/// Malformed query text. `position` is a byte offset into the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Parse a query string into a disjunction of its clauses.
pub fn parse_query(input: &str) -> Result<QueryNode, ParseError> {
    QueryParser::new(input).parse()
}

struct QueryParser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
}

impl<'a> QueryParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lexer: Lexer::new(input),
            lookahead: None,
        }
    }

    fn parse(&mut self) -> Result<QueryNode, ParseError> {
        let mut clauses = Vec::new();

        loop {
            let token = self.next()?;
            if token.kind == TokenKind::Eof {
                break;
            }
            if let Some(clause) = self.parse_clause(token)? {
                clauses.push(clause);
            }
        }

        Ok(QueryNode::any_of(clauses))
    }

    /// Parse one clause starting at `token`. Empty terms and phrases parse
    /// successfully but produce no clause.
    fn parse_clause(&mut self, token: Token) -> Result<Option<QueryNode>, ParseError> {
        match token.kind {
            TokenKind::Hash => {
                let tag = self.next()?;
                if tag.kind != TokenKind::Term {
                    return Err(ParseError::new("expected tag name after '#'", tag.pos));
                }
                Ok(self
                    .parse_term(tag)
                    .map(|node| node.scoped_to(TAGS_FIELD)))
            }
            TokenKind::Term => {
                if self.peek()?.kind == TokenKind::Colon {
                    let colon = self.next()?;
                    return self.parse_field_target(token.text, colon.pos);
                }
                Ok(self.parse_term(token))
            }
            TokenKind::Quote => self.parse_phrase(token.pos),
            TokenKind::Backtick => self.parse_literal(token.pos),
            _ => Err(unexpected(&token)),
        }
    }

    fn parse_field_target(
        &mut self,
        field: String,
        colon_pos: usize,
    ) -> Result<Option<QueryNode>, ParseError> {
        let target = self.next()?;
        let node = match target.kind {
            TokenKind::Term => self.parse_term(target),
            TokenKind::Quote => self.parse_phrase(target.pos)?,
            TokenKind::Eof => {
                return Err(ParseError::new(
                    format!("expected term or phrase after '{field}:'"),
                    colon_pos,
                ));
            }
            _ => return Err(unexpected(&target)),
        };
        Ok(node.map(|node| node.scoped_to(field)))
    }

    /// A term with an optional trailing `*`.
    fn parse_term(&mut self, token: Token) -> Option<QueryNode> {
        let is_prefix = matches!(self.peek(), Ok(t) if t.kind == TokenKind::Star);
        if is_prefix {
            self.lookahead = None;
        }

        if token.text.is_empty() {
            return None;
        }
        Some(if is_prefix {
            QueryNode::prefix(token.text)
        } else {
            QueryNode::term(token.text)
        })
    }

    fn parse_phrase(&mut self, open_pos: usize) -> Result<Option<QueryNode>, ParseError> {
        let content = self.delimited('"', open_pos)?;
        let phrase = content.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok((!phrase.is_empty()).then(|| QueryNode::phrase(phrase)))
    }

    fn parse_literal(&mut self, open_pos: usize) -> Result<Option<QueryNode>, ParseError> {
        let content = self.delimited('`', open_pos)?;
        let values: Vec<String> = content.split_whitespace().map(str::to_string).collect();
        Ok((!values.is_empty()).then_some(QueryNode::LiteralTerms { values }))
    }

    /// Read raw text up to the closing `delim` and consume the delimiter.
    fn delimited(&mut self, delim: char, open_pos: usize) -> Result<String, ParseError> {
        debug_assert!(self.lookahead.is_none());
        let content = self.lexer.phrase(delim);

        let close = self.next()?;
        let closed = match delim {
            '"' => close.kind == TokenKind::Quote,
            _ => close.kind == TokenKind::Backtick,
        };
        if !closed {
            let what = if delim == '"' { "quote" } else { "backtick" };
            return Err(ParseError::new(format!("unterminated {what}"), open_pos));
        }
        Ok(content.text)
    }

    fn next(&mut self) -> Result<Token, ParseError> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        };
        if token.kind == TokenKind::Error {
            return Err(ParseError::new(token.text, token.pos));
        }
        Ok(token)
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let lexer = &mut self.lexer;
        let token = self.lookahead.get_or_insert_with(|| lexer.next_token());
        if token.kind == TokenKind::Error {
            return Err(ParseError::new(token.text.clone(), token.pos));
        }
        Ok(token)
    }
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::new(format!("unexpected '{}'", token.text), token.pos)
}
