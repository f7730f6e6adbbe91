//! Recursive-descent parser over the token stream produced by [`crate::scanner`].
//!
//! Each precedence level is a loop that folds its operator in as the new root
//! over the already-built left-hand side; since the loop always re-reads the
//! most-recently-built tree as the next operator's LHS, the rightmost
//! top-level operator at a given precedence ends up at the root — the same
//! result the string-splitting description in the spec produces, reached
//! here by ordinary left-to-right accumulation instead of explicit splitting.

use crate::errors::{PuzzleError, Result};
use crate::expr::{ArithOp, Expr};
use crate::rule::{LogicOp, RelOp, Relation, RuleBody};
use crate::scanner::{self, Token};

pub(crate) fn parse_rule_body(input: &str) -> Result<RuleBody> {
    let toks = scanner::scan(input)?;
    let mut p = Parser { toks, pos: 0 };
    let body = p.rule_body(input)?;
    if p.pos != p.toks.len() {
        return Err(PuzzleError::Parse(input.to_string()));
    }
    Ok(body)
}

/// Parses a bare expression (no relation/logic wrapper). Used internally by
/// the polynomial module's tests; not part of the public rule grammar.
#[cfg(test)]
pub(crate) fn parse_expr_for_test(input: &str) -> Expr {
    let toks = scanner::scan(input).unwrap();
    let mut p = Parser { toks, pos: 0 };
    let e = p.expr(input).unwrap();
    assert_eq!(p.pos, p.toks.len());
    e
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.toks.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.peek();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn rule_body(&mut self, src: &str) -> Result<RuleBody> {
        let first = self.relation(src)?;
        match self.peek() {
            Some(Token::Implies) => {
                self.advance();
                let second = self.relation(src)?;
                Ok(RuleBody::Logic(LogicOp::Implies, first, second))
            }
            Some(Token::Iff) => {
                self.advance();
                let second = self.relation(src)?;
                Ok(RuleBody::Logic(LogicOp::Iff, first, second))
            }
            _ => Ok(RuleBody::Rel(first)),
        }
    }

    fn relation(&mut self, src: &str) -> Result<Relation> {
        let lhs = self.expr(src)?;
        let (op, swapped) = match self.advance() {
            Some(Token::Eq) => (RelOp::Eq, false),
            Some(Token::Ne) => (RelOp::Ne, false),
            Some(Token::Gt) => (RelOp::Gt, false),
            Some(Token::Ge) => (RelOp::Ge, false),
            Some(Token::Lt) => (RelOp::Gt, true),
            Some(Token::Le) => (RelOp::Ge, true),
            _ => return Err(PuzzleError::Parse(src.to_string())),
        };
        let rhs = self.expr(src)?;
        if swapped {
            Ok(Relation { op, lhs: rhs, rhs: lhs })
        } else {
            Ok(Relation { op, lhs, rhs })
        }
    }

    fn expr(&mut self, src: &str) -> Result<Expr> {
        let mut acc = self.term(src)?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    acc = Expr::bin(ArithOp::Add, acc, self.term(src)?);
                }
                Some(Token::Minus) => {
                    self.advance();
                    acc = Expr::bin(ArithOp::Sub, acc, self.term(src)?);
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    fn term(&mut self, src: &str) -> Result<Expr> {
        let mut acc = self.factor(src)?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    acc = Expr::bin(ArithOp::Mul, acc, self.factor(src)?);
                }
                Some(Token::Slash) => {
                    self.advance();
                    acc = Expr::bin(ArithOp::Div, acc, self.factor(src)?);
                }
                _ => break,
            }
        }
        Ok(acc)
    }

    /// Juxtaposition: adjacent primaries with no explicit operator multiply,
    /// left-associated (`2AB` is `(2*A)*B`).
    fn factor(&mut self, src: &str) -> Result<Expr> {
        let mut acc = self.unary(src)?;
        while matches!(self.peek(), Some(Token::Int(_)) | Some(Token::Var(_)) | Some(Token::LParen)) {
            acc = Expr::bin(ArithOp::Mul, acc, self.unary(src)?);
        }
        Ok(acc)
    }

    fn unary(&mut self, src: &str) -> Result<Expr> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.unary(src)?;
            return Ok(Expr::bin(ArithOp::Sub, Expr::int(0), inner));
        }
        self.primary(src)
    }

    fn primary(&mut self, src: &str) -> Result<Expr> {
        match self.advance() {
            Some(Token::Int(n)) => Ok(Expr::int(n)),
            Some(Token::Var(c)) => Ok(Expr::var(c)),
            Some(Token::LParen) => {
                let inner = self.expr(src)?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(PuzzleError::Parse(src.to_string())),
                }
            }
            _ => Err(PuzzleError::Parse(src.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_relation() {
        let body = parse_rule_body("A+B>4").unwrap();
        match body {
            RuleBody::Rel(rel) => {
                assert_eq!(rel.op, RelOp::Gt);
                assert_eq!(rel.lhs.to_string(), "A+B");
                assert_eq!(rel.rhs.to_string(), "4");
            }
            _ => panic!("expected a bare relation"),
        }
    }

    #[test]
    fn less_than_is_normalized_by_swap() {
        let lt = parse_rule_body("A<B").unwrap();
        let gt = parse_rule_body("B>A").unwrap();
        assert_eq!(lt, gt);
    }

    #[test]
    fn less_equal_is_normalized_by_swap() {
        let le = parse_rule_body("A<=B").unwrap();
        let ge = parse_rule_body("B>=A").unwrap();
        assert_eq!(le, ge);
    }

    #[test]
    fn juxtaposition_is_left_associated_multiplication() {
        let e = parse_expr_for_test("2AB");
        assert_eq!(e.to_string(), "2*A*B");
    }

    #[test]
    fn rightmost_additive_operator_becomes_root() {
        // A-B+C parses as (A-B)+C: '+' is rightmost at the additive level.
        let e = parse_expr_for_test("A-B+C");
        assert_eq!(e.to_string(), "A-B+C");
        let e = parse_expr_for_test("A+B-C");
        assert_eq!(e.to_string(), "A+B-C");
    }

    #[test]
    fn parses_implication() {
        let body = parse_rule_body("A=B=>C>D").unwrap();
        assert!(matches!(body, RuleBody::Logic(LogicOp::Implies, _, _)));
    }

    #[test]
    fn leading_minus_is_subtraction_from_zero() {
        let e = parse_expr_for_test("-A");
        assert_eq!(e.to_string(), "0-A");
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_rule_body("A=B C").is_err());
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(parse_rule_body("(A+B=C").is_err());
    }
}
