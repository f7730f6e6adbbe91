//! Constraint-propagation solver: candidate-set reduction to a fixpoint
//! (R1 per-rule viability, R2 naked subsets, R3 hidden subsets), interleaved
//! with deriving `var = expr` rules from single-occurrence equalities and
//! substituting them back in to unlock further reduction.
//!
//! Grounded directly in the original's `LogicBasedSolver`: the outer
//! `solve`/`reduce_possible_values` control flow, and the three named
//! reduction strategies, are carried over structurally; only the candidate
//! maps are threaded as owned values instead of mutated through `self` (per
//! the "mutable candidate maps" design note), so each strategy is a pure
//! `(&state) -> (bool, new_state)` function.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, trace};

use crate::puzzle::Puzzle;
use crate::rule::Rule;

type Candidates = HashMap<char, BTreeSet<i64>>;

/// Outcome of [`LogicSolver::solve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// Every candidate set reduced to a singleton; carries the solution.
    Solved(HashMap<char, i64>),
    /// `maxSteps` was exhausted before every set became a singleton; a
    /// normal, non-error "not solvable by deduction alone" signal.
    NotSolvable(Candidates),
    /// Reduction emptied some variable's candidate set: a hard logical
    /// failure, not a retryable condition.
    Unsatisfiable,
}

pub struct LogicSolver {
    candidates: Candidates,
    rules: Vec<Rule>,
    expressions: HashMap<char, HashSet<Rule>>,
}

impl LogicSolver {
    pub fn new(puzzle: &Puzzle) -> LogicSolver {
        let full_range: BTreeSet<i64> = (1..=puzzle.n() as i64).collect();
        let candidates = puzzle.variables().into_iter().map(|v| (v, full_range.clone())).collect();
        let expressions = puzzle.variables().into_iter().map(|v| (v, HashSet::new())).collect();
        let mut solver = LogicSolver { candidates, rules: Vec::new(), expressions };
        for rule in puzzle.rules() {
            solver.add_rule(rule.clone());
        }
        solver
    }

    fn add_rule(&mut self, rule: Rule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    /// `solve(maxSteps?) → SolveOutcome`, per §4.3's top-level loop.
    pub fn solve(mut self, max_steps: Option<u32>) -> SolveOutcome {
        let mut step = 0u32;
        loop {
            step += 1;
            if !self.reduce_to_fixpoint() {
                return SolveOutcome::Unsatisfiable;
            }
            if self.candidates.values().all(|set| set.len() == 1) {
                let solution = self.candidates.iter().map(|(&v, set)| (v, *set.iter().next().unwrap())).collect();
                return SolveOutcome::Solved(solution);
            }
            if max_steps == Some(step) {
                return SolveOutcome::NotSolvable(self.candidates);
            }
            self.derive_expressions();
            self.apply_expressions();
        }
    }

    /// Returns `false` if reduction emptied a candidate set (unsatisfiable).
    fn reduce_to_fixpoint(&mut self) -> bool {
        loop {
            let mut changed = false;
            for rule in self.rules.clone() {
                let (updated, new_candidates) = reduce_by_rule(&rule, &self.candidates);
                if updated {
                    trace!("reduced by rule {rule}: {:?} => {:?}", self.candidates, new_candidates);
                    self.candidates = new_candidates;
                    changed = true;
                    break;
                }
            }
            let (updated, new_candidates) = naked_subsets(&self.candidates);
            if updated {
                trace!("reduced by naked subset strategy: {:?}", new_candidates);
                self.candidates = new_candidates;
                changed = true;
            }
            let (updated, new_candidates) = hidden_subsets(&self.candidates);
            if updated {
                trace!("reduced by hidden subset strategy: {:?}", new_candidates);
                self.candidates = new_candidates;
                changed = true;
            }
            if self.candidates.values().any(|set| set.is_empty()) {
                debug!("candidate set emptied during reduction: puzzle unsatisfiable");
                return false;
            }
            if !changed {
                return true;
            }
        }
    }

    /// §4.3.2: for each `=` rule with a single-occurrence variable, derive
    /// and store its `var = expr` form.
    fn derive_expressions(&mut self) {
        for rule in self.rules.clone() {
            for &v in rule.variables() {
                if let Some(expressed) = rule.express(v) {
                    debug!("new variable expression: {rule}, {v} => {expressed}");
                    self.expressions.entry(v).or_default().insert(expressed);
                }
            }
        }
    }

    /// §4.3.3: substitute every stored expression into every rule that
    /// mentions its variable, canonicalize, and keep newly-discovered rules.
    fn apply_expressions(&mut self) {
        let mut derived = Vec::new();
        for rule in &self.rules {
            for &v in rule.variables() {
                if let Some(exprs) = self.expressions.get(&v) {
                    for expr_rule in exprs {
                        let (_, expr) = expr_rule.as_variable_expression().expect("stored as var=expr");
                        if let Ok(new_rule) = rule.substitute(v, expr) {
                            derived.push(new_rule);
                        }
                    }
                }
            }
        }
        for rule in derived {
            self.add_rule(rule);
        }
    }
}

/// R1 — per-rule viability via DFS over the rule's own variables only.
fn reduce_by_rule(rule: &Rule, candidates: &Candidates) -> (bool, Candidates) {
    let mut updated = candidates.clone();
    let vars: Vec<char> = rule.variables().iter().copied().collect();
    loop {
        let mut changed_this_round = false;
        for &var_fixed in &vars {
            let mut viable_values = BTreeSet::new();
            for &val_fixed in &updated[&var_fixed] {
                let mut used = HashSet::from([val_fixed]);
                let mut chosen = HashMap::from([(var_fixed, val_fixed)]);
                if dfs_viable(rule, &vars, var_fixed, 0, &mut used, &mut chosen, &updated) {
                    viable_values.insert(val_fixed);
                }
            }
            if viable_values != updated[&var_fixed] {
                updated.insert(var_fixed, viable_values);
                changed_this_round = true;
                break;
            }
        }
        if !changed_this_round {
            break;
        }
    }
    let overall_changed = vars.iter().any(|v| candidates[v] != updated[v]);
    (overall_changed, updated)
}

#[allow(clippy::too_many_arguments)]
fn dfs_viable(
    rule: &Rule,
    vars: &[char],
    var_fixed: char,
    idx: usize,
    used: &mut HashSet<i64>,
    chosen: &mut HashMap<char, i64>,
    candidates: &Candidates,
) -> bool {
    if idx == vars.len() {
        return rule.eval(chosen);
    }
    let var = vars[idx];
    if var == var_fixed {
        return dfs_viable(rule, vars, var_fixed, idx + 1, used, chosen, candidates);
    }
    for &val in &candidates[&var] {
        if used.contains(&val) {
            continue;
        }
        used.insert(val);
        chosen.insert(var, val);
        if dfs_viable(rule, vars, var_fixed, idx + 1, used, chosen, candidates) {
            return true;
        }
        used.remove(&val);
        chosen.remove(&var);
    }
    false
}

/// R2 — naked subsets: K variables sharing an identical size-K candidate set
/// pin those values away from every other variable.
fn naked_subsets(candidates: &Candidates) -> (bool, Candidates) {
    let mut updated = candidates.clone();
    loop {
        let mut groups: BTreeMap<Vec<i64>, BTreeSet<char>> = BTreeMap::new();
        for (&var, set) in &updated {
            groups.entry(set.iter().copied().collect()).or_default().insert(var);
        }
        let mut changed_this_round = false;
        for (subset_vec, vars_with_subset) in &groups {
            if subset_vec.is_empty() || subset_vec.len() != vars_with_subset.len() {
                continue;
            }
            let subset: BTreeSet<i64> = subset_vec.iter().copied().collect();
            let mut any = false;
            for (var, set) in updated.iter_mut() {
                if !vars_with_subset.contains(var) && !set.is_disjoint(&subset) {
                    let before = set.len();
                    set.retain(|v| !subset.contains(v));
                    any |= set.len() != before;
                }
            }
            if any {
                changed_this_round = true;
                break;
            }
        }
        if !changed_this_round {
            break;
        }
    }
    let overall_changed = candidates.iter().any(|(v, s)| updated[v] != *s);
    (overall_changed, updated)
}

/// R3 — hidden subsets: K values collectively confined to exactly K
/// variables must be exactly those variables' remaining candidates.
fn hidden_subsets(candidates: &Candidates) -> (bool, Candidates) {
    let mut updated = candidates.clone();
    loop {
        let mut val_to_vars: BTreeMap<i64, BTreeSet<char>> = BTreeMap::new();
        for (&var, set) in &updated {
            for &val in set {
                val_to_vars.entry(val).or_default().insert(var);
            }
        }
        let mut vars_to_vals: BTreeMap<Vec<char>, BTreeSet<i64>> = BTreeMap::new();
        for (&val, vars) in &val_to_vars {
            vars_to_vals.entry(vars.iter().copied().collect()).or_default().insert(val);
        }
        let mut changed_this_round = false;
        for (vars_vec, vals) in &vars_to_vals {
            if vars_vec.is_empty() || vars_vec.len() != vals.len() {
                continue;
            }
            let mut any = false;
            for &var in vars_vec {
                let set = updated.get_mut(&var).unwrap();
                if set.iter().any(|v| !vals.contains(v)) {
                    *set = vals.clone();
                    any = true;
                }
            }
            if any {
                changed_this_round = true;
                break;
            }
        }
        if !changed_this_round {
            break;
        }
    }
    let overall_changed = candidates.iter().any(|(v, s)| updated[v] != *s);
    (overall_changed, updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzle(n: usize, rules: &[&str]) -> Puzzle {
        let mut p = Puzzle::new(n);
        for r in rules {
            p.add_rule(Rule::parse(r).unwrap()).unwrap();
        }
        p
    }

    #[test]
    fn solves_unique_five_variable_puzzle() {
        let p = puzzle(5, &["B+A=6", "E+B=C", "E+C+B=8"]);
        let solver = LogicSolver::new(&p);
        match solver.solve(Some(4)) {
            SolveOutcome::Solved(assignment) => {
                assert_eq!(assignment.len(), 5);
                let values: HashSet<i64> = assignment.values().copied().collect();
                assert_eq!(values.len(), 5);
            }
            other => panic!("expected Solved, got {other:?}"),
        }
    }

    #[test]
    fn reports_not_solvable_within_step_budget() {
        let p = puzzle(5, &["E+B=C", "E+C+B=8"]);
        let solver = LogicSolver::new(&p);
        match solver.solve(Some(4)) {
            SolveOutcome::NotSolvable(candidates) => {
                assert!(candidates.values().any(|set| set.len() > 1));
            }
            other => panic!("expected NotSolvable, got {other:?}"),
        }
    }

    #[test]
    fn detects_unsatisfiable_puzzle() {
        let p = puzzle(2, &["A=1", "A=2"]);
        let solver = LogicSolver::new(&p);
        assert_eq!(solver.solve(Some(10)), SolveOutcome::Unsatisfiable);
    }

    #[test]
    fn naked_subset_removes_pinned_values_from_others() {
        let mut candidates: Candidates = HashMap::new();
        candidates.insert('A', BTreeSet::from([1, 2]));
        candidates.insert('B', BTreeSet::from([1, 2]));
        candidates.insert('C', BTreeSet::from([1, 2, 3]));
        let (changed, updated) = naked_subsets(&candidates);
        assert!(changed);
        assert_eq!(updated[&'C'], BTreeSet::from([3]));
    }

    #[test]
    fn hidden_subset_trims_to_exclusive_values() {
        let mut candidates: Candidates = HashMap::new();
        candidates.insert('A', BTreeSet::from([1, 2, 3]));
        candidates.insert('B', BTreeSet::from([1, 2, 3]));
        candidates.insert('C', BTreeSet::from([3, 4]));
        // values 1,2 only ever appear in A and B's sets => hidden pair.
        let (changed, updated) = hidden_subsets(&candidates);
        assert!(changed);
        assert_eq!(updated[&'A'], BTreeSet::from([1, 2]));
        assert_eq!(updated[&'B'], BTreeSet::from([1, 2]));
    }
}
