//! Puzzle generator: reduce-until-unique, prune-redundant, then a
//! logic-solvability filter — restarting the whole attempt on any failure.
//!
//! Grounded in the original's `BasicGenerator`; weighted axis sampling
//! follows its `choice`/`ri`/`sample` helpers, reimplemented over a single
//! owned [`rand::rngs::StdRng`] instead of the process-global `random`
//! module the source shares with its algebra library (§9 "Global RNG
//! hazard").

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::expr::{ArithOp, Expr};
use crate::puzzle::Puzzle;
use crate::rule::{LogicOp, RelOp, Relation, Rule, RuleBody};
use crate::solver::brute;
use crate::solver::logic::{LogicSolver, SolveOutcome};

/// Weighted binary choices for each axis of random rule emission (spec
/// §4.4.1): `(w0, w1)` weights the 0/1 branch listed in that section's axis
/// table. Axes not mentioned by the original's presets (`add_mul`,
/// `eq_ineq`) default to a uniform 1:1 split, matching the uniform `sample()`
/// calls the source uses for the analogous choices.
#[derive(Debug, Clone, Copy)]
pub struct Weights {
    pub var_num: (u32, u32),
    pub val_exp: (u32, u32),
    pub add_mul: (u32, u32),
    pub eq_ineq: (u32, u32),
    pub logic_eq: (u32, u32),
}

impl Weights {
    const fn base() -> Weights {
        Weights {
            var_num: (5, 1),
            val_exp: (3, 1),
            add_mul: (1, 1),
            eq_ineq: (1, 1),
            logic_eq: (1, 10),
        }
    }

    /// Logical (`⇒`/`⇔`) rules never emitted.
    pub fn easy() -> Weights {
        Weights { logic_eq: (0, 1), ..Weights::base() }
    }

    /// The original's default weighting: logical rules occasional.
    pub fn medium() -> Weights {
        Weights::base()
    }

    /// Logical rules frequent.
    pub fn hard() -> Weights {
        Weights { logic_eq: (5, 1), ..Weights::base() }
    }
}

impl Default for Weights {
    fn default() -> Weights {
        Weights::medium()
    }
}

pub struct Generator {
    rng: StdRng,
    n: usize,
    weights: Weights,
}

impl Generator {
    pub fn new(n: usize, seed: Option<u64>, weights: Weights) -> Generator {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Generator { rng, n, weights }
    }

    /// `generate(N, seed?, weights?) → Puzzle`. Restarts the whole attempt
    /// from an empty puzzle on any non-success verdict; `cancel` is polled
    /// only between attempts, never mid-attempt, per §5.
    pub fn generate(&mut self, cancel: impl Fn() -> bool) -> Option<Puzzle> {
        loop {
            if cancel() {
                return None;
            }
            let mut puzzle = Puzzle::new(self.n);
            self.reduce_until_unique(&mut puzzle);
            prune_redundant(&mut puzzle);
            let solver = LogicSolver::new(&puzzle);
            if matches!(solver.solve(Some(4)), SolveOutcome::Solved(_)) {
                return Some(puzzle);
            }
        }
    }

    fn reduce_until_unique(&mut self, puzzle: &mut Puzzle) {
        let (mut count, _) = brute::count(puzzle, None);
        loop {
            let rule = loop {
                match self.random_rule() {
                    Some(r) if !r.is_trivial_single_var_eq() => break r,
                    _ => continue,
                }
            };
            puzzle.push_rule(rule);
            let (new_count, _) = brute::count(puzzle, None);
            if new_count == 1 {
                return;
            } else if new_count == 0 || new_count == count {
                puzzle.remove_rule_at(puzzle.len() - 1);
            } else {
                count = new_count;
            }
        }
    }

    fn sample_pair(&mut self, weight: (u32, u32)) -> usize {
        let total = weight.0 + weight.1;
        let x = self.rng.gen_range(1..=total);
        if x <= weight.0 {
            0
        } else {
            1
        }
    }

    fn random_variable(&mut self) -> char {
        let idx = self.rng.gen_range(0..self.n);
        (b'A' + idx as u8) as char
    }

    fn random_number(&mut self) -> i64 {
        self.rng.gen_range(1..=(self.n as i64 + 2))
    }

    /// `ops`, when given, restricts recursion to that operator set — used to
    /// keep a multiplicative subtree free of nested additive children.
    fn random_expr(&mut self, ops: Option<&[ArithOp]>) -> Expr {
        if self.sample_pair(self.weights.val_exp) == 0 {
            if self.sample_pair(self.weights.var_num) == 0 {
                Expr::var(self.random_variable())
            } else {
                Expr::int(self.random_number())
            }
        } else {
            let choices = ops.unwrap_or(&[ArithOp::Add, ArithOp::Sub, ArithOp::Mul]);
            let op = if ops.is_none() {
                let additive = self.sample_pair(self.weights.add_mul) == 0;
                if additive {
                    *[ArithOp::Add, ArithOp::Sub].choose(&mut self.rng).unwrap()
                } else {
                    ArithOp::Mul
                }
            } else {
                *choices.choose(&mut self.rng).unwrap()
            };
            let next_ops: Option<&[ArithOp]> = if op == ArithOp::Mul { Some(&[ArithOp::Mul]) } else { None };
            let lhs = self.random_expr(next_ops);
            let rhs = self.random_expr(next_ops);
            Expr::bin(op, lhs, rhs)
        }
    }

    fn random_relation(&mut self) -> Relation {
        let op = if self.sample_pair(self.weights.eq_ineq) == 0 {
            RelOp::Eq
        } else {
            *[RelOp::Gt, RelOp::Ge, RelOp::Ne].choose(&mut self.rng).unwrap()
        };
        Relation { op, lhs: self.random_expr(None), rhs: self.random_expr(None) }
    }

    fn random_rule_body(&mut self) -> RuleBody {
        if self.sample_pair(self.weights.logic_eq) == 0 {
            let op = *[LogicOp::Implies, LogicOp::Iff].choose(&mut self.rng).unwrap();
            RuleBody::Logic(op, self.random_relation(), self.random_relation())
        } else {
            RuleBody::Rel(self.random_relation())
        }
    }

    /// `None` if the sampled structure canonicalizes to an ill-formed rule
    /// (e.g. division that doesn't reduce) — the caller simply resamples.
    fn random_rule(&mut self) -> Option<Rule> {
        let body = self.random_rule_body();
        Rule::from_body(body).ok()
    }
}

/// §4.4 step 3: repeatedly drop the first rule whose removal still leaves a
/// unique solution, until a full scan finds none.
fn prune_redundant(puzzle: &mut Puzzle) {
    loop {
        let mut removed = false;
        for i in 0..puzzle.len() {
            let mut trial = puzzle.clone();
            trial.remove_rule_at(i);
            let (count, _) = brute::count(&trial, None);
            if count == 1 {
                puzzle.remove_rule_at(i);
                removed = true;
                break;
            }
        }
        if !removed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_is_deterministic_for_a_fixed_seed() {
        let mut g1 = Generator::new(4, Some(2018), Weights::easy());
        let mut g2 = Generator::new(4, Some(2018), Weights::easy());
        let p1 = g1.generate(|| false).unwrap();
        let p2 = g2.generate(|| false).unwrap();
        assert_eq!(p1.to_string(), p2.to_string());
    }

    #[test]
    fn generated_puzzle_has_exactly_one_solution() {
        let mut g = Generator::new(4, Some(7), Weights::easy());
        let puzzle = g.generate(|| false).unwrap();
        let (count, _) = brute::count(&puzzle, None);
        assert_eq!(count, 1);
    }

    #[test]
    fn generated_puzzle_is_minimal() {
        let mut g = Generator::new(4, Some(7), Weights::easy());
        let puzzle = g.generate(|| false).unwrap();
        for i in 0..puzzle.len() {
            let mut trial = puzzle.clone();
            trial.remove_rule_at(i);
            let (count, _) = brute::count(&trial, None);
            assert!(count >= 2, "rule {i} was redundant");
        }
    }

    #[test]
    fn cancellation_is_checked_between_attempts() {
        let mut g = Generator::new(4, Some(1), Weights::easy());
        assert!(g.generate(|| true).is_none());
    }

    #[test]
    fn easy_weights_never_emit_logical_rules() {
        let mut g = Generator::new(3, Some(42), Weights::easy());
        for _ in 0..200 {
            assert!(matches!(g.random_rule_body(), RuleBody::Rel(_)));
        }
    }
}
