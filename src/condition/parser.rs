//! Class expression parser
//!
//! Grammar, as accepted by the gateway backend for `CondStr` overrides:
//!
//! ```text
//! cond   := "ALL(" [cond ("," cond)*] ")"
//!         | "ANY(" [cond ("," cond)*] ")"
//!         | "NOT(" cond ")"
//!         | "src=" CIDR | "dst=" CIDR | "dscp=" 0xHEX
//!         | "cls=" INT | ("BOOL=" | "bool=") BOOL | BOOL
//! BOOL   := "true" | "false"
//! ```
//!
//! Keywords are case-sensitive and whitespace between tokens is ignored.

use crate::condition::ast::{ClassId, Condition, Ipv4Predicate};
use crate::condition::validate::{parse_cidr, parse_dscp};
use crate::error::{ClassError, Result};

/// Deepest combinator nesting accepted in an expression
pub const MAX_NESTING: usize = 64;

/// Parse a class expression into a condition tree
pub fn parse(expression: &str) -> Result<Condition> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(ClassError::Parse("Empty class expression".to_string()));
    }

    let tokens = tokenize(expression)?;
    let mut cursor = Cursor {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let cond = cursor.parse_cond()?;
    if let Some(token) = cursor.peek() {
        return Err(ClassError::Parse(format!(
            "Unexpected {:?} after complete expression",
            token
        )));
    }
    Ok(cond)
}

/// Check that an expression parses, discarding the tree
pub fn validate_expression(expression: &str) -> Result<()> {
    parse(expression).map(|_| ())
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    OpenParen,
    CloseParen,
    Comma,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut paren_depth: i32 = 0;

    for c in expression.chars() {
        let token = match c {
            '(' => Some(Token::OpenParen),
            ')' => Some(Token::CloseParen),
            ',' => Some(Token::Comma),
            c if c.is_whitespace() => None,
            _ => {
                current.push(c);
                continue;
            }
        };

        if !current.is_empty() {
            tokens.push(Token::Word(std::mem::take(&mut current)));
        }
        match token {
            Some(Token::OpenParen) => paren_depth += 1,
            Some(Token::CloseParen) => {
                paren_depth -= 1;
                if paren_depth < 0 {
                    return Err(ClassError::Parse("Unbalanced parentheses".to_string()));
                }
            }
            _ => {}
        }
        tokens.extend(token);
    }

    if !current.is_empty() {
        tokens.push(Token::Word(current));
    }

    if paren_depth != 0 {
        return Err(ClassError::Parse("Unbalanced parentheses".to_string()));
    }

    Ok(tokens)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Open combinators around the current position
    depth: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if *token == expected => Ok(()),
            Some(token) => Err(ClassError::Parse(format!(
                "Expected {:?}, found {:?}",
                expected, token
            ))),
            None => Err(ClassError::Parse(format!(
                "Expected {:?}, found end of input",
                expected
            ))),
        }
    }

    fn parse_cond(&mut self) -> Result<Condition> {
        let word = match self.next() {
            Some(Token::Word(word)) => word.as_str(),
            Some(token) => {
                return Err(ClassError::Parse(format!(
                    "Expected a condition, found {:?}",
                    token
                )))
            }
            None => {
                return Err(ClassError::Parse(
                    "Expected a condition, found end of input".to_string(),
                ))
            }
        };

        if self.peek() == Some(&Token::OpenParen) {
            self.pos += 1;
            self.depth += 1;
            if self.depth > MAX_NESTING {
                return Err(ClassError::Parse(format!(
                    "Expression nested deeper than {} levels",
                    MAX_NESTING
                )));
            }
            let cond = match word {
                "ALL" => Condition::AllOf(self.parse_list()?),
                "ANY" => Condition::AnyOf(self.parse_list()?),
                "NOT" => {
                    let operand = self.parse_cond()?;
                    self.expect(Token::CloseParen)?;
                    Condition::not(operand)
                }
                other => return Err(ClassError::Parse(format!("Unknown combinator: {}", other))),
            };
            self.depth -= 1;
            return Ok(cond);
        }

        parse_leaf(word)
    }

    /// Comma separated conditions up to and including the closing paren
    fn parse_list(&mut self) -> Result<Vec<Condition>> {
        let mut conds = Vec::new();
        if self.peek() == Some(&Token::CloseParen) {
            self.pos += 1;
            return Ok(conds);
        }
        loop {
            conds.push(self.parse_cond()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::CloseParen) => return Ok(conds),
                Some(token) => {
                    return Err(ClassError::Parse(format!(
                        "Expected ',' or ')', found {:?}",
                        token
                    )))
                }
                None => {
                    return Err(ClassError::Parse(
                        "Expected ',' or ')', found end of input".to_string(),
                    ))
                }
            }
        }
    }
}

fn parse_leaf(word: &str) -> Result<Condition> {
    let Some((key, value)) = word.split_once('=') else {
        return parse_bool(word);
    };

    match key {
        "src" => {
            parse_cidr(value)?;
            Ok(Condition::Ipv4Match(Ipv4Predicate::MatchSource(
                value.to_string(),
            )))
        }
        "dst" => {
            parse_cidr(value)?;
            Ok(Condition::Ipv4Match(Ipv4Predicate::MatchDestination(
                value.to_string(),
            )))
        }
        "dscp" => Ok(Condition::dscp(parse_dscp(value)?)),
        "cls" => value
            .parse::<ClassId>()
            .map(Condition::class)
            .map_err(|_| ClassError::Parse(format!("Invalid class id: {:?}", value))),
        "BOOL" | "bool" => parse_bool(value),
        other => Err(ClassError::Parse(format!("Unknown condition: {}", other))),
    }
}

fn parse_bool(word: &str) -> Result<Condition> {
    match word {
        "true" => Ok(Condition::Bool(true)),
        "false" => Ok(Condition::Bool(false)),
        other => Err(ClassError::Parse(format!("Unknown condition: {}", other))),
    }
}
