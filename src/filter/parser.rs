//! Recursive-descent parser producing a read-only expression tree.
//!
//! Bare names are resolved while parsing: attribute names of the item kind
//! become [`Expr::Attribute`] reads, `datetime` must be called, anything else
//! is rejected. Assignment and deletion are rejected before parsing starts.

use crate::filter::value::Value;
use crate::item::ItemKind;

use super::error::FilterError;
use super::lexer::{Token, TokenKind, tokenize};

/// Maximum nesting depth accepted for parentheses, unary chains and lists.
const MAX_DEPTH: usize = 64;

/// The only external symbol a filter may reference.
pub(crate) const DATETIME_SYMBOL: &str = "datetime";

/// Parameter names of `datetime`, in positional order.
const DATETIME_FIELDS: [&str; 6] = ["year", "month", "day", "hour", "minute", "second"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinaryOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Is => "is",
            Self::IsNot => "is not",
        }
    }
}

/// Members readable on datetime values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Member {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Member {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "year" => Some(Self::Year),
            "month" => Some(Self::Month),
            "day" => Some(Self::Day),
            "hour" => Some(Self::Hour),
            "minute" => Some(Self::Minute),
            "second" => Some(Self::Second),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    /// Read of a declared attribute of the item under evaluation
    Attribute(String),
    Datetime(Vec<Expr>),
    List(Vec<Expr>),
    Member(Box<Expr>, Member),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, Vec<(CompareOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Parses `source` into an expression tree valid for `kind`.
pub(crate) fn parse(source: &str, kind: ItemKind) -> Result<Expr, FilterError> {
    let tokens = tokenize(source)?;
    audit_mutations(&tokens)?;

    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
        kind,
    };
    if parser.peek() == &TokenKind::Eof {
        return Err(FilterError::syntax(source, 0, "empty expression"));
    }
    let expr = parser.expression()?;
    if parser.peek() != &TokenKind::Eof {
        return Err(parser.unexpected());
    }
    Ok(expr)
}

/// Rejects any binding, rebinding or deletion of a name.
///
/// `name=value` directly inside `datetime(...)` is a keyword argument and binds
/// nothing.
fn audit_mutations(tokens: &[Token]) -> Result<(), FilterError> {
    // One entry per open bracket: whether it opened a datetime call
    let mut brackets: Vec<bool> = Vec::new();
    for (index, token) in tokens.iter().enumerate() {
        match &token.kind {
            TokenKind::LParen => {
                let call = index
                    .checked_sub(1)
                    .and_then(|previous| tokens.get(previous))
                    .is_some_and(|previous| {
                        matches!(&previous.kind, TokenKind::Name(name) if name == DATETIME_SYMBOL)
                    });
                brackets.push(call);
            }
            TokenKind::LBracket => brackets.push(false),
            TokenKind::RParen | TokenKind::RBracket => {
                brackets.pop();
            }
            TokenKind::Assign("=")
                if brackets.last() == Some(&true) && is_keyword_position(tokens, index) => {}
            TokenKind::Assign(_) => {
                let name = tokens[..index]
                    .iter()
                    .rev()
                    .find_map(|previous| match &previous.kind {
                        TokenKind::Name(name) => Some(name.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| "<expression>".to_string());
                return Err(FilterError::Assignment { name });
            }
            TokenKind::Del => {
                let name = match tokens.get(index + 1).map(|next| &next.kind) {
                    Some(TokenKind::Name(name)) => name.clone(),
                    _ => "<expression>".to_string(),
                };
                return Err(FilterError::Assignment { name });
            }
            _ => {}
        }
    }
    Ok(())
}

/// `( name =` or `, name =`.
fn is_keyword_position(tokens: &[Token], index: usize) -> bool {
    let (Some(separator), Some(name)) = (
        index.checked_sub(2).and_then(|at| tokens.get(at)),
        index.checked_sub(1).and_then(|at| tokens.get(at)),
    ) else {
        return false;
    };
    matches!(name.kind, TokenKind::Name(_))
        && matches!(separator.kind, TokenKind::LParen | TokenKind::Comma)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    kind: ItemKind,
}

impl Parser<'_> {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn peek_next(&self) -> &TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |token| token.offset)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &TokenKind, what: &str) -> Result<(), FilterError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(FilterError::syntax(
                self.source,
                self.offset(),
                format!("expected {what}, found {}", self.peek().describe()),
            ))
        }
    }

    fn unexpected(&self) -> FilterError {
        FilterError::syntax(
            self.source,
            self.offset(),
            format!("unexpected {}", self.peek().describe()),
        )
    }

    fn enter(&mut self) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(FilterError::syntax(
                self.source,
                self.offset(),
                "expression nested too deeply",
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn expression(&mut self) -> Result<Expr, FilterError> {
        self.enter()?;
        let expr = self.or_expr();
        self.leave();
        expr
    }

    fn or_expr(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.and_expr()?;
        while self.eat(&TokenKind::Or) {
            let right = self.and_expr()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.not_expr()?;
        while self.eat(&TokenKind::And) {
            let right = self.not_expr()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn not_expr(&mut self) -> Result<Expr, FilterError> {
        if self.eat(&TokenKind::Not) {
            self.enter()?;
            let operand = self.not_expr();
            self.leave();
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(operand?)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, FilterError> {
        let first = self.sum()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            rest.push((op, self.sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::In => CompareOp::In,
            TokenKind::Not if self.peek_next() == &TokenKind::In => {
                self.pos += 2;
                return Some(CompareOp::NotIn);
            }
            TokenKind::Is if self.peek_next() == &TokenKind::Not => {
                self.pos += 2;
                return Some(CompareOp::IsNot);
            }
            TokenKind::Is => CompareOp::Is,
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn sum(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.term()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn term(&mut self) -> Result<Expr, FilterError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
    }

    fn unary(&mut self) -> Result<Expr, FilterError> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.postfix(),
        };
        self.pos += 1;
        self.enter()?;
        let operand = self.unary();
        self.leave();
        Ok(Expr::Unary(op, Box::new(operand?)))
    }

    fn postfix(&mut self) -> Result<Expr, FilterError> {
        let mut expr = self.atom()?;
        while self.eat(&TokenKind::Dot) {
            let offset = self.offset();
            let TokenKind::Name(name) = self.advance() else {
                return Err(FilterError::syntax(
                    self.source,
                    offset,
                    "expected member name after '.'",
                ));
            };
            let Some(member) = Member::from_name(&name) else {
                return Err(FilterError::syntax(
                    self.source,
                    offset,
                    format!("unsupported member '{name}'"),
                ));
            };
            expr = Expr::Member(Box::new(expr), member);
        }
        Ok(expr)
    }

    fn atom(&mut self) -> Result<Expr, FilterError> {
        let offset = self.offset();
        match self.advance() {
            TokenKind::Int(number) => Ok(Expr::Literal(Value::Int(number))),
            TokenKind::Float(number) => Ok(Expr::Literal(Value::Float(number))),
            TokenKind::Str(text) => Ok(Expr::Literal(Value::Str(text))),
            TokenKind::True => Ok(Expr::Literal(Value::Bool(true))),
            TokenKind::False => Ok(Expr::Literal(Value::Bool(false))),
            TokenKind::NoneLit => Ok(Expr::Literal(Value::None)),
            TokenKind::Name(name) => self.name(name, offset),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.enter()?;
                let items = self.arguments(&TokenKind::RBracket, "']'");
                self.leave();
                Ok(Expr::List(items?))
            }
            _ => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.unexpected())
            }
        }
    }

    fn name(&mut self, name: String, offset: usize) -> Result<Expr, FilterError> {
        if name == DATETIME_SYMBOL {
            if !self.eat(&TokenKind::LParen) {
                return Err(FilterError::syntax(
                    self.source,
                    offset,
                    "datetime must be called, e.g. datetime(2020, 1, 31)",
                ));
            }
            let args = self.datetime_arguments(offset)?;
            return Ok(Expr::Datetime(args));
        }

        if !self.kind.has_attribute(&name) {
            return Err(FilterError::UnknownName {
                name,
                kind: self.kind,
            });
        }

        if self.peek() == &TokenKind::LParen {
            return Err(FilterError::syntax(
                self.source,
                self.offset(),
                format!("attribute '{name}' is not callable"),
            ));
        }
        Ok(Expr::Attribute(name))
    }

    /// Parses `datetime` arguments after the opening parenthesis.
    ///
    /// Keyword arguments are placed in their positional slot; skipped optional
    /// slots are filled with `0`.
    fn datetime_arguments(&mut self, offset: usize) -> Result<Vec<Expr>, FilterError> {
        let mut slots: [Option<Expr>; DATETIME_FIELDS.len()] = Default::default();
        let mut positional = 0;
        let mut keywords_seen = false;
        let mut given = 0;

        while !self.eat(&TokenKind::RParen) {
            let arg_offset = self.offset();
            let slot = if let (TokenKind::Name(keyword), TokenKind::Assign("=")) =
                (self.peek(), self.peek_next())
            {
                let keyword = keyword.clone();
                self.pos += 2;
                keywords_seen = true;
                DATETIME_FIELDS
                    .iter()
                    .position(|field| *field == keyword)
                    .ok_or_else(|| {
                        FilterError::syntax(
                            self.source,
                            arg_offset,
                            format!("datetime got an unexpected keyword argument '{keyword}'"),
                        )
                    })?
            } else {
                if keywords_seen {
                    return Err(FilterError::syntax(
                        self.source,
                        arg_offset,
                        "positional argument follows keyword argument",
                    ));
                }
                positional += 1;
                positional - 1
            };

            let value = self.expression()?;
            given += 1;
            match slots.get_mut(slot) {
                Some(entry @ None) => *entry = Some(value),
                Some(Some(_)) => {
                    return Err(FilterError::syntax(
                        self.source,
                        arg_offset,
                        format!("datetime got multiple values for '{}'", DATETIME_FIELDS[slot]),
                    ));
                }
                None => {
                    return Err(FilterError::syntax(
                        self.source,
                        offset,
                        format!("datetime takes 3 to 6 arguments ({given} given)"),
                    ));
                }
            }

            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }

        if slots[..3].iter().any(Option::is_none) {
            return Err(FilterError::syntax(
                self.source,
                offset,
                format!("datetime takes 3 to 6 arguments ({given} given)"),
            ));
        }
        let used = slots.iter().rposition(Option::is_some).map_or(0, |last| last + 1);
        Ok(slots
            .into_iter()
            .take(used)
            .map(|slot| slot.unwrap_or(Expr::Literal(Value::Int(0))))
            .collect())
    }

    /// Parses a comma separated list up to `close`; a trailing comma is allowed.
    fn arguments(&mut self, close: &TokenKind, what: &str) -> Result<Vec<Expr>, FilterError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(&TokenKind::Comma, &format!("',' or {what}"))?;
            if self.eat(close) {
                return Ok(items);
            }
        }
    }
}
