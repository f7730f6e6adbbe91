//! End-to-end scenarios S1-S6: one puzzle or rule exercised through the
//! public API per scenario, checked against the behavior it's meant to pin.

use lognum_core::logic::{LogicSolver, SolveOutcome};
use lognum_core::{brute, Generator, Puzzle, Rule, Weights};

fn puzzle(n: usize, rules: &[&str]) -> Puzzle {
    let mut p = Puzzle::new(n);
    for r in rules {
        p.add_rule(Rule::parse(r).unwrap()).unwrap();
    }
    p
}

#[test]
fn s1_parse_additive_inequality() {
    let r = Rule::parse("A+B>4").unwrap();
    assert_eq!(r.canonical(), "A+B>4");
    assert_eq!(r.variables().len(), 2);
}

#[test]
fn s2_brute_force_on_small_puzzle() {
    // N=3, distinct values 1..3: A+B=3 holds for (A,B) in {(1,2),(2,1)}.
    let p = puzzle(3, &["A+B=3"]);
    let (count, witness) = brute::count(&p, None);
    assert_eq!(count, 2);
    assert_eq!(witness.unwrap()[&'C'], 3);
}

#[test]
fn s3_brute_force_unique_solution() {
    let p = puzzle(5, &["B+A=6", "E+B=C", "E+C+B=8"]);
    let (count, witness) = brute::count(&p, None);
    assert_eq!(count, 1);
    let w = witness.unwrap();
    assert_eq!(w[&'B'] + w[&'A'], 6);
    assert_eq!(w[&'E'] + w[&'B'], w[&'C']);
    assert_eq!(w[&'E'] + w[&'C'] + w[&'B'], 8);
}

#[test]
fn s4_logic_solver_succeeds_within_four_steps() {
    let p = puzzle(5, &["B+A=6", "E+B=C", "E+C+B=8"]);
    let solver = LogicSolver::new(&p);
    match solver.solve(Some(4)) {
        SolveOutcome::Solved(assignment) => assert_eq!(assignment.len(), 5),
        other => panic!("expected a solved puzzle, got {other:?}"),
    }
}

#[test]
fn s5_logic_solver_hits_step_budget() {
    let p = puzzle(5, &["E+B=C", "E+C+B=8"]);
    let solver = LogicSolver::new(&p);
    match solver.solve(Some(4)) {
        SolveOutcome::NotSolvable(candidates) => {
            assert!(candidates.values().any(|set| set.len() > 1));
        }
        other => panic!("expected a not-solvable-by-logic verdict, got {other:?}"),
    }
}

#[test]
fn s6_generator_is_deterministic_and_produces_unique_puzzles() {
    let mut first = Generator::new(5, Some(2018), Weights::easy());
    let mut second = Generator::new(5, Some(2018), Weights::easy());
    let p1 = first.generate(|| false).unwrap();
    let p2 = second.generate(|| false).unwrap();
    assert_eq!(p1.to_string(), p2.to_string());

    let (count, _) = brute::count(&p1, None);
    assert_eq!(count, 1);
}
