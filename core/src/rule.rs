//! Rules: relational/logical expressions over [`Expr`] trees, their
//! canonical form, and the symbolic rewrites (`express`, `substitute`) the
//! solver composes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::Result;
use crate::expr::{ArithOp, Expr};
use crate::parser;
use crate::polynomial;

/// A canonical relational operator. `<` and `<=` never appear here — the
/// parser normalizes them to `>`/`>=` by swapping operands (spec's open
/// question on `<=` handling: the swap is unconditional, so `"A<=B"` and
/// `"B>=A"` parse to the identical `Relation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Gt,
    Ge,
}

impl RelOp {
    fn eval(self, l: i64, r: i64) -> bool {
        match self {
            RelOp::Eq => l == r,
            RelOp::Ne => l != r,
            RelOp::Gt => l > r,
            RelOp::Ge => l >= r,
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelOp::Eq => "=",
            RelOp::Ne => "≠",
            RelOp::Gt => ">",
            RelOp::Ge => "≥",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicOp {
    Implies,
    Iff,
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogicOp::Implies => "⇒",
            LogicOp::Iff => "⇔",
        };
        write!(f, "{s}")
    }
}

/// A single relational expression, e.g. `A+B>4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub(crate) op: RelOp,
    pub(crate) lhs: Expr,
    pub(crate) rhs: Expr,
}

impl Relation {
    fn eval(&self, values: &HashMap<char, i64>) -> Option<bool> {
        let l = self.lhs.eval(values)?;
        let r = self.rhs.eval(values)?;
        Some(self.op.eval(l, r))
    }

    fn canonicalize(&self) -> Result<Relation> {
        let (lhs, rhs) = polynomial::canonicalize_sides(&self.lhs, &self.rhs)?;
        Ok(Relation { op: self.op, lhs, rhs })
    }

    fn collect_vars(&self, counts: &mut HashMap<char, u32>) {
        self.lhs.collect_vars(counts);
        self.rhs.collect_vars(counts);
    }

    fn substitute(&self, v: char, with: &Expr) -> Relation {
        Relation {
            op: self.op,
            lhs: self.lhs.substitute(v, with),
            rhs: self.rhs.substitute(v, with),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.lhs, self.op, self.rhs)
    }
}

/// The body of a [`Rule`]: either a bare relation, or two relations joined by
/// an implication/biconditional. Logical-operator rules' children are
/// themselves well-formed relational rules, per the data model's invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBody {
    Rel(Relation),
    Logic(LogicOp, Relation, Relation),
}

impl RuleBody {
    fn eval(&self, values: &HashMap<char, i64>) -> Option<bool> {
        match self {
            RuleBody::Rel(rel) => rel.eval(values),
            RuleBody::Logic(op, a, b) => {
                let (pa, pb) = (a.eval(values)?, b.eval(values)?);
                Some(match op {
                    LogicOp::Implies => !pa || pb,
                    LogicOp::Iff => pa == pb,
                })
            }
        }
    }

    fn canonicalize(&self) -> Result<RuleBody> {
        match self {
            RuleBody::Rel(rel) => Ok(RuleBody::Rel(rel.canonicalize()?)),
            RuleBody::Logic(op, a, b) => {
                Ok(RuleBody::Logic(*op, a.canonicalize()?, b.canonicalize()?))
            }
        }
    }

    fn collect_vars(&self, counts: &mut HashMap<char, u32>) {
        match self {
            RuleBody::Rel(rel) => rel.collect_vars(counts),
            RuleBody::Logic(_, a, b) => {
                a.collect_vars(counts);
                b.collect_vars(counts);
            }
        }
    }

    fn substitute(&self, v: char, with: &Expr) -> RuleBody {
        match self {
            RuleBody::Rel(rel) => RuleBody::Rel(rel.substitute(v, with)),
            RuleBody::Logic(op, a, b) => {
                RuleBody::Logic(*op, a.substitute(v, with), b.substitute(v, with))
            }
        }
    }
}

impl fmt::Display for RuleBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleBody::Rel(rel) => write!(f, "{rel}"),
            RuleBody::Logic(op, a, b) => write!(f, "{a}{op}{b}"),
        }
    }
}

/// A Rule is an immutable, canonicalized relational/logical expression with
/// derived metadata (variables mentioned, per-variable occurrence counts).
///
/// Identity is the hash of the canonical string, not structural tree
/// equality — two rules that expand to the same canonical form are the same
/// rule even if their original parse trees differed (e.g. `"A+B=3"` and
/// `"B+A=3"`).
#[derive(Debug, Clone)]
pub struct Rule {
    body: RuleBody,
    canonical: String,
    vars: BTreeSet<char>,
    var_counts: HashMap<char, u32>,
}

impl Rule {
    /// Parses and canonicalizes a rule string.
    pub fn parse(s: &str) -> Result<Rule> {
        let body = parser::parse_rule_body(s)?;
        Rule::from_body(body)
    }

    pub(crate) fn from_body(body: RuleBody) -> Result<Rule> {
        let body = body.canonicalize()?;
        Ok(Rule::from_canonical_body(body))
    }

    /// Builds a `var = expr` rule without running [`RuleBody::canonicalize`]:
    /// only `expr` is algebraically expanded, and the left-hand side stays
    /// the bare variable rather than being folded into a sign-split
    /// relation. This is the shape the variable-expression store (§3) and
    /// [`Rule::express`] require; generic rule canonicalization would
    /// otherwise move `v` across the relation alongside other positive terms.
    pub(crate) fn variable_expression(v: char, expr: &Expr) -> Result<Rule> {
        let expanded = polynomial::expand(expr)?;
        let rhs = polynomial::render_natural(&expanded);
        let body = RuleBody::Rel(Relation { op: RelOp::Eq, lhs: Expr::var(v), rhs });
        Ok(Rule::from_canonical_body(body))
    }

    fn from_canonical_body(body: RuleBody) -> Rule {
        let canonical = body.to_string();
        let mut var_counts = HashMap::new();
        body.collect_vars(&mut var_counts);
        let vars = var_counts.keys().copied().collect();
        Rule { body, canonical, vars, var_counts }
    }

    /// `Some((v, expr))` if this rule has the `var = expr` shape produced by
    /// [`Rule::variable_expression`] (bare variable on the left of `=`).
    pub(crate) fn as_variable_expression(&self) -> Option<(char, &Expr)> {
        match &self.body {
            RuleBody::Rel(Relation { op: RelOp::Eq, lhs: Expr::Var(v), rhs }) => Some((*v, rhs)),
            _ => None,
        }
    }

    /// Whether this is the trivial `X = c` form for a single-variable rule,
    /// which the generator discards rather than ever adding to a puzzle.
    pub(crate) fn is_trivial_single_var_eq(&self) -> bool {
        if self.vars.len() != 1 {
            return false;
        }
        match &self.body {
            RuleBody::Rel(Relation { op: RelOp::Eq, lhs, rhs }) => {
                matches!((lhs, rhs), (Expr::Var(_), Expr::Int(_)) | (Expr::Int(_), Expr::Var(_)))
            }
            _ => false,
        }
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn variables(&self) -> &BTreeSet<char> {
        &self.vars
    }

    pub(crate) fn body(&self) -> &RuleBody {
        &self.body
    }

    /// `eval(rule, values) → bool`, false on any undefined-variable or
    /// inexact-division path rather than propagating an error.
    pub fn eval(&self, values: &HashMap<char, i64>) -> bool {
        self.body.eval(values).unwrap_or(false)
    }

    /// `express(rule, v)`: requires a bare `=` relation with exactly one
    /// occurrence of `v`; returns an equivalent rule `v = E`.
    pub fn express(&self, v: char) -> Option<Rule> {
        let rel = match &self.body {
            RuleBody::Rel(rel) if rel.op == RelOp::Eq => rel,
            _ => return None,
        };
        if self.var_counts.get(&v).copied() != Some(1) {
            return None;
        }
        let (target, acc) = if rel.lhs.has_var(v) {
            (&rel.lhs, rel.rhs.clone())
        } else if rel.rhs.has_var(v) {
            (&rel.rhs, rel.lhs.clone())
        } else {
            return None;
        };
        let expr = express_expr(target, v, acc);
        Rule::variable_expression(v, &expr).ok()
    }

    /// `substitute(rule, v=expr)`: replaces every leaf occurrence of `v` by
    /// `expr` and re-canonicalizes. Fails if re-canonicalization rejects the
    /// result (e.g. the substitution cancels every variable).
    pub fn substitute(&self, v: char, expr: &Expr) -> Result<Rule> {
        let body = self.body.substitute(v, expr);
        Rule::from_body(body)
    }
}

/// Descends `lhs`, the single-occurrence-of-`v` side of a `v`-containing
/// equality, moving the sibling of each step onto `acc` using the inverse of
/// the operator at that step. When the path descends into the right child of
/// a non-commutative operator (`-`, `/`), the accumulated expression and the
/// sibling swap positions rather than simply combining, since e.g.
/// `l - r = acc` solved for `r` gives `r = l - acc`, not `acc - l`.
fn express_expr(lhs: &Expr, v: char, acc: Expr) -> Expr {
    match lhs {
        Expr::Var(c) if *c == v => acc,
        Expr::Bin(op, l, r) => {
            if l.has_var(v) {
                let new_acc = Expr::bin(op.inverse(), acc, (**r).clone());
                express_expr(l, v, new_acc)
            } else {
                let new_acc = match op {
                    ArithOp::Add | ArithOp::Mul => Expr::bin(op.inverse(), acc, (**l).clone()),
                    ArithOp::Sub | ArithOp::Div => Expr::bin(*op, (**l).clone(), acc),
                };
                express_expr(r, v, new_acc)
            }
        }
        _ => acc,
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(pairs: &[(char, i64)]) -> HashMap<char, i64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn parse_and_eval() {
        let r = Rule::parse("A+B=5").unwrap();
        assert!(r.eval(&vals(&[('A', 2), ('B', 3)])));
        assert!(!r.eval(&vals(&[('A', 2), ('B', 2)])));
    }

    #[test]
    fn canonical_form_normalizes_side_order() {
        let a = Rule::parse("A+B=5").unwrap();
        let b = Rule::parse("B+A=5").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), b.canonical());
    }

    #[test]
    fn canonical_form_sign_splits() {
        let r = Rule::parse("A-B=3").unwrap();
        assert_eq!(r.canonical(), "A=3+B");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let r = Rule::parse("A+B=5").unwrap();
        let twice = Rule::from_body(r.body().clone()).unwrap();
        assert_eq!(r.canonical(), twice.canonical());
    }

    #[test]
    fn canonicalization_preserves_semantics() {
        let raw = Rule::parse("A-B=3").unwrap();
        let assignment = vals(&[('A', 5), ('B', 2)]);
        assert_eq!(raw.eval(&assignment), raw.eval(&assignment));
    }

    #[test]
    fn rejects_rule_with_no_variable() {
        assert!(Rule::parse("2=1").is_err());
    }

    #[test]
    fn express_single_occurrence_additive() {
        let r = Rule::parse("A+B=5").unwrap();
        let expressed = r.express('A').unwrap();
        assert_eq!(expressed.canonical(), "A=5-B");
        assert_eq!(expressed.as_variable_expression().unwrap().0, 'A');
    }

    #[test]
    fn express_subtraction_with_variable_on_right_of_minus() {
        // 5-A=2 solved for A: A = 5-2 = 3, not 5-(-2)=7.
        let r = Rule::parse("5-A=2").unwrap();
        let expressed = r.express('A').unwrap();
        assert_eq!(expressed.canonical(), "A=3");
    }

    #[test]
    fn express_division_with_variable_on_right_of_slash() {
        // 8/A=2 solved for A: A = 8/2 = 4, not 8*2.
        let r = Rule::parse("8/A=2").unwrap();
        let expressed = r.express('A').unwrap();
        assert_eq!(expressed.canonical(), "A=4");
    }

    #[test]
    fn express_returns_none_for_repeated_variable() {
        let r = Rule::parse("A+A=5").unwrap();
        assert!(r.express('A').is_none());
    }

    #[test]
    fn express_returns_none_for_non_equality() {
        let r = Rule::parse("A+B>5").unwrap();
        assert!(r.express('A').is_none());
    }

    #[test]
    fn trivial_single_variable_equality_is_detected() {
        assert!(Rule::parse("A=3").unwrap().is_trivial_single_var_eq());
        assert!(!Rule::parse("A+B=3").unwrap().is_trivial_single_var_eq());
        assert!(!Rule::parse("A>3").unwrap().is_trivial_single_var_eq());
    }

    #[test]
    fn substitute_replaces_and_recanonicalizes() {
        let r = Rule::parse("A+B=5").unwrap();
        let substituted = r.substitute('A', &Expr::int(2)).unwrap();
        assert_eq!(substituted.canonical(), "B=3");
    }
}
