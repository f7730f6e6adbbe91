//! Integer polynomial normalization over named variables.
//!
//! This is the "clean re-implementation" the design notes call for in place
//! of a symbolic-math library: expressions here never admit transcendentals
//! or exponents, so all that's needed is expansion (distributing products
//! over sums) and collection of like terms. A monomial is a sorted multiset
//! of variable letters (`vec!['A', 'A']` is `A^2`, `vec!['A', 'B']` is `A*B`,
//! `vec![]` is the constant monomial); a polynomial maps monomials to
//! nonzero integer coefficients.

use std::collections::BTreeMap;

use crate::errors::{PuzzleError, Result};
use crate::expr::{ArithOp, Expr};

pub(crate) type Monomial = Vec<char>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Polynomial(pub(crate) BTreeMap<Monomial, i64>);

impl Polynomial {
    fn constant(v: i64) -> Polynomial {
        let mut m = BTreeMap::new();
        if v != 0 {
            m.insert(Vec::new(), v);
        }
        Polynomial(m)
    }

    fn var(c: char) -> Polynomial {
        let mut m = BTreeMap::new();
        m.insert(vec![c], 1);
        Polynomial(m)
    }

    fn add(mut self, other: &Polynomial) -> Polynomial {
        for (m, c) in &other.0 {
            let entry = self.0.entry(m.clone()).or_insert(0);
            *entry += c;
            if *entry == 0 {
                self.0.remove(m);
            }
        }
        self
    }

    fn neg(&self) -> Polynomial {
        Polynomial(self.0.iter().map(|(m, c)| (m.clone(), -c)).collect())
    }

    fn sub(self, other: &Polynomial) -> Polynomial {
        self.add(&other.neg())
    }

    fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut out: BTreeMap<Monomial, i64> = BTreeMap::new();
        for (ml, cl) in &self.0 {
            for (mr, cr) in &other.0 {
                let mut monomial = ml.clone();
                monomial.extend(mr.iter().copied());
                monomial.sort_unstable();
                let entry = out.entry(monomial).or_insert(0);
                *entry += cl * cr;
            }
        }
        out.retain(|_, c| *c != 0);
        Polynomial(out)
    }

    /// `Some(value)` if this polynomial is a bare constant (no variables).
    fn constant_value(&self) -> Option<i64> {
        if self.0.keys().all(|m| m.is_empty()) {
            Some(*self.0.get(&Vec::new()).unwrap_or(&0))
        } else {
            None
        }
    }
}

/// Expands an expression into a polynomial, distributing products over sums
/// and collecting like terms.
///
/// Division is rejected (`IllFormedRule`) unless the divisor is a constant
/// that evenly divides every coefficient of the dividend — this is the
/// canonicalization-time half of the `/` semantics in spec.md §9; the other
/// half (positive-dividend exactness) is enforced at evaluation time by
/// [`crate::expr::Expr::eval`].
pub(crate) fn expand(expr: &Expr) -> Result<Polynomial> {
    match expr {
        Expr::Int(n) => Ok(Polynomial::constant(*n)),
        Expr::Var(c) => Ok(Polynomial::var(*c)),
        Expr::Bin(ArithOp::Add, lhs, rhs) => Ok(expand(lhs)?.add(&expand(rhs)?)),
        Expr::Bin(ArithOp::Sub, lhs, rhs) => Ok(expand(lhs)?.sub(&expand(rhs)?)),
        Expr::Bin(ArithOp::Mul, lhs, rhs) => Ok(expand(lhs)?.mul(&expand(rhs)?)),
        Expr::Bin(ArithOp::Div, lhs, rhs) => {
            let numerator = expand(lhs)?;
            let denominator = expand(rhs)?;
            let d = denominator.constant_value().ok_or_else(|| {
                PuzzleError::IllFormedRule(format!("division by non-constant expression `{rhs}`"))
            })?;
            if d == 0 {
                return Err(PuzzleError::IllFormedRule("division by zero".into()));
            }
            let mut out = BTreeMap::new();
            for (m, c) in &numerator.0 {
                if c % d != 0 {
                    return Err(PuzzleError::IllFormedRule(format!(
                        "`{expr}` does not divide evenly"
                    )));
                }
                let q = c / d;
                if q != 0 {
                    out.insert(m.clone(), q);
                }
            }
            Ok(Polynomial(out))
        }
    }
}

/// Canonicalizes a relation's two sides: expands `lhs - rhs`, then splits the
/// resulting polynomial by coefficient sign so positive terms land on a new
/// LHS and the absolute values of negative terms land on a new RHS (in
/// ascending monomial order), placing a leftover constant on whichever side
/// that sign dictates, or `0` on a side that would otherwise be empty.
///
/// Fails with `IllFormedRule` if no variable survives expansion.
pub(crate) fn canonicalize_sides(lhs: &Expr, rhs: &Expr) -> Result<(Expr, Expr)> {
    let diff = expand(lhs)?.sub(&expand(rhs)?);

    let has_variable_term = diff.0.keys().any(|m| !m.is_empty());
    if !has_variable_term {
        return Err(PuzzleError::IllFormedRule(
            "no variable remains after expansion".into(),
        ));
    }

    let mut pos: Vec<(Monomial, i64)> = Vec::new();
    let mut neg: Vec<(Monomial, i64)> = Vec::new();
    for (m, c) in &diff.0 {
        if m.is_empty() {
            continue;
        }
        if *c > 0 {
            pos.push((m.clone(), *c));
        } else {
            neg.push((m.clone(), -c));
        }
    }
    if let Some(&c0) = diff.0.get(&Vec::new()) {
        if c0 > 0 {
            pos.push((Vec::new(), c0));
        } else if c0 < 0 {
            neg.push((Vec::new(), -c0));
        }
    }
    pos.sort();
    neg.sort();

    Ok((terms_to_expr(&pos), terms_to_expr(&neg)))
}

/// Renders a polynomial as a single flat expression without splitting sides
/// by sign — used for the right-hand side of a derived `var = expr` rule,
/// which (per the original's `is_variable_expression` handling) keeps its
/// left-hand side as the bare variable rather than running it through
/// [`canonicalize_sides`]. Terms are added/subtracted in ascending monomial
/// order; a leading negative term is rendered as subtraction from zero, per
/// the "literals are non-negative after normalisation" invariant.
pub(crate) fn render_natural(poly: &Polynomial) -> Expr {
    let mut terms: Vec<(&Monomial, i64)> = poly.0.iter().map(|(m, c)| (m, *c)).collect();
    terms.sort_by(|a, b| a.0.cmp(b.0));
    if terms.is_empty() {
        return Expr::Int(0);
    }
    let mut iter = terms.into_iter();
    let (m0, c0) = iter.next().unwrap();
    let mut acc = if c0 < 0 {
        Expr::bin(ArithOp::Sub, Expr::Int(0), term_to_expr(m0, -c0))
    } else {
        term_to_expr(m0, c0)
    };
    for (m, c) in iter {
        acc = if c < 0 {
            Expr::bin(ArithOp::Sub, acc, term_to_expr(m, -c))
        } else {
            Expr::bin(ArithOp::Add, acc, term_to_expr(m, c))
        };
    }
    acc
}

fn terms_to_expr(terms: &[(Monomial, i64)]) -> Expr {
    if terms.is_empty() {
        return Expr::Int(0);
    }
    let mut iter = terms.iter();
    let (m0, c0) = iter.next().unwrap();
    let mut acc = term_to_expr(m0, *c0);
    for (m, c) in iter {
        acc = Expr::bin(ArithOp::Add, acc, term_to_expr(m, *c));
    }
    acc
}

fn term_to_expr(monomial: &Monomial, coeff: i64) -> Expr {
    if monomial.is_empty() {
        return Expr::Int(coeff);
    }
    let mut vars = monomial.iter();
    let mut acc = if coeff == 1 {
        Expr::Var(*vars.next().unwrap())
    } else {
        let first = *vars.next().unwrap();
        Expr::bin(ArithOp::Mul, Expr::Int(coeff), Expr::Var(first))
    };
    for &v in vars {
        acc = Expr::bin(ArithOp::Mul, acc, Expr::Var(v));
    }
    acc
}
