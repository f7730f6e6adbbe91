//! Exhaustive backtracking counter.
//!
//! Grounded in the original's `BruteForceSolver`, generalized to accept an
//! optional candidate-set restriction so the generator can prime it with a
//! few steps of logic reduction (§4.4 step 2) for speed without changing its
//! semantics: with no restriction it is full permutation enumeration.

use std::collections::{BTreeSet, HashMap};

use crate::puzzle::Puzzle;

/// `count(puzzle, candidates?) → (count, witness)`. `witness` is the last
/// satisfying assignment found, or `None` if none exists.
pub fn count(
    puzzle: &Puzzle,
    candidates: Option<&HashMap<char, BTreeSet<i64>>>,
) -> (u64, Option<HashMap<char, i64>>) {
    let vars: Vec<char> = puzzle.variables().into_iter().collect();
    let n = puzzle.n() as i64;
    let full_range: BTreeSet<i64> = (1..=n).collect();

    let mut count = 0u64;
    let mut witness = None;
    let mut used = BTreeSet::new();
    let mut chosen = HashMap::new();

    search(
        &vars,
        0,
        puzzle,
        candidates,
        &full_range,
        &mut used,
        &mut chosen,
        &mut count,
        &mut witness,
    );

    (count, witness)
}

#[allow(clippy::too_many_arguments)]
fn search(
    vars: &[char],
    idx: usize,
    puzzle: &Puzzle,
    candidates: Option<&HashMap<char, BTreeSet<i64>>>,
    full_range: &BTreeSet<i64>,
    used: &mut BTreeSet<i64>,
    chosen: &mut HashMap<char, i64>,
    count: &mut u64,
    witness: &mut Option<HashMap<char, i64>>,
) {
    if idx == vars.len() {
        if puzzle.rules().iter().all(|r| r.eval(chosen)) {
            *count += 1;
            *witness = Some(chosen.clone());
        }
        return;
    }
    let var = vars[idx];
    let options = candidates.and_then(|c| c.get(&var)).unwrap_or(full_range);
    for &val in options {
        if used.contains(&val) {
            continue;
        }
        used.insert(val);
        chosen.insert(var, val);
        search(vars, idx + 1, puzzle, candidates, full_range, used, chosen, count, witness);
        used.remove(&val);
        chosen.remove(&var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn puzzle(n: usize, rules: &[&str]) -> Puzzle {
        let mut p = Puzzle::new(n);
        for r in rules {
            p.add_rule(Rule::parse(r).unwrap()).unwrap();
        }
        p
    }

    #[test]
    fn counts_trivial_two_rule_puzzle() {
        // N=3, distinct values from {1,2,3}: A+B=3 holds for (A,B) in
        // {(1,2),(2,1)}, both leaving C=3.
        let p = puzzle(3, &["A+B=3"]);
        let (n, witness) = count(&p, None);
        assert_eq!(n, 2);
        assert_eq!(witness.unwrap()[&'C'], 3);
    }

    #[test]
    fn counts_unique_five_variable_puzzle() {
        let p = puzzle(5, &["B+A=6", "E+B=C", "E+C+B=8"]);
        let (n, witness) = count(&p, None);
        assert_eq!(n, 1);
        let w = witness.unwrap();
        assert_eq!(w[&'B'] + w[&'A'], 6);
        assert_eq!(w[&'E'] + w[&'B'], w[&'C']);
    }

    #[test]
    fn empty_ruleset_counts_all_permutations() {
        let p = puzzle(3, &[]);
        let (n, _) = count(&p, None);
        assert_eq!(n, 6);
    }

    #[test]
    fn candidate_restriction_is_honored() {
        let p = puzzle(3, &[]);
        let mut candidates = HashMap::new();
        candidates.insert('A', BTreeSet::from([1]));
        candidates.insert('B', BTreeSet::from([2]));
        candidates.insert('C', BTreeSet::from([3]));
        let (n, witness) = count(&p, Some(&candidates));
        assert_eq!(n, 1);
        let w = witness.unwrap();
        assert_eq!((w[&'A'], w[&'B'], w[&'C']), (1, 2, 3));
    }
}
