//! Argument surface and command implementations for the `lognum` binary.
//!
//! Grounded in the teacher's `slide` binary crate: a `clap`-derived `Cli`
//! plus a testable `run_*` entry point per subcommand in `lib.rs`, with
//! `main.rs` left as a thin wrapper that wires stdin/stdout/process-exit
//! around them. The teacher's diagnostic pretty-printer
//! (`annotate-snippets`) has no counterpart here — this domain's errors are
//! a single `Display`-able enum, not a source-span diagnostic system, so the
//! CLI just prints `PuzzleError` via `Display`.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use lognum_core::logic::{LogicSolver, SolveOutcome};
use lognum_core::{read_corpus, Generator, Puzzle, Rule, Weights};

#[derive(Parser)]
#[command(name = "lognum", version, about = "Generate and solve arithmetic-logic permutation puzzles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a puzzle of size N with a unique, logically-deducible solution.
    Generate {
        /// Number of variables (A, B, ...).
        n: usize,
        /// Seed the generator's PRNG for a deterministic puzzle.
        #[arg(long)]
        seed: Option<u64>,
        /// Rule-emission weighting preset.
        #[arg(long, value_enum, default_value = "medium")]
        weights: WeightsArg,
    },
    /// Solve every puzzle in a corpus file and report each outcome.
    Solve {
        /// Path to a puzzle corpus file (see the corpus file format).
        file: PathBuf,
        /// Logic solver step budget; omit for unlimited.
        #[arg(long = "max-steps")]
        max_steps: Option<u32>,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum WeightsArg {
    Easy,
    Medium,
    Hard,
}

impl From<WeightsArg> for Weights {
    fn from(preset: WeightsArg) -> Weights {
        match preset {
            WeightsArg::Easy => Weights::easy(),
            WeightsArg::Medium => Weights::medium(),
            WeightsArg::Hard => Weights::hard(),
        }
    }
}

/// Runs `generate`, writing the puzzle's corpus-file rendering to `out`.
/// Always exits 0: an unseeded cancellation flag that never returns `true`
/// cannot make [`Generator::generate`] give up.
pub fn run_generate(n: usize, seed: Option<u64>, weights: Weights, out: &mut impl Write) -> i32 {
    let mut generator = Generator::new(n, seed, weights);
    let puzzle = generator
        .generate(|| false)
        .expect("cancellation flag never fires, so generate() always produces a puzzle");
    let _ = write!(out, "{puzzle}");
    0
}

/// Runs `solve`: reads every puzzle out of `reader`, solves each by logic
/// alone, and reports the per-puzzle verdict to `out`.
///
/// Exit code 2 if the corpus or any rule string fails to parse (surfaced
/// immediately, per §7's "abort this rule/input" handling); 1 if any puzzle
/// in the file is unsatisfiable or not solvable within `max_steps`; 0 if
/// every puzzle solves.
pub fn run_solve(reader: impl BufRead, max_steps: Option<u32>, out: &mut impl Write) -> i32 {
    let puzzles = match read_corpus(reader) {
        Ok(puzzles) => puzzles,
        Err(e) => {
            let _ = writeln!(out, "error: {e}");
            return 2;
        }
    };

    let mut any_unsolved = false;
    for (index, (n, rule_strs)) in puzzles.into_iter().enumerate() {
        let mut puzzle = Puzzle::new(n);
        for rule_str in &rule_strs {
            match Rule::parse(rule_str) {
                Ok(rule) => {
                    if let Err(e) = puzzle.add_rule(rule) {
                        let _ = writeln!(out, "error: puzzle {index}: {e}");
                        return 2;
                    }
                }
                Err(e) => {
                    let _ = writeln!(out, "error: puzzle {index}: {e}");
                    return 2;
                }
            }
        }

        let solver = LogicSolver::new(&puzzle);
        match solver.solve(max_steps) {
            SolveOutcome::Solved(assignment) => {
                let mut vars: Vec<_> = assignment.into_iter().collect();
                vars.sort_by_key(|&(v, _)| v);
                let rendered: Vec<String> =
                    vars.iter().map(|(v, val)| format!("{v}={val}")).collect();
                let _ = writeln!(out, "puzzle {index}: solved ({})", rendered.join(", "));
            }
            SolveOutcome::NotSolvable(candidates) => {
                any_unsolved = true;
                let undetermined = candidates.values().filter(|set| set.len() > 1).count();
                let _ = writeln!(
                    out,
                    "puzzle {index}: not solvable by logic alone ({undetermined} variables undetermined)"
                );
            }
            SolveOutcome::Unsatisfiable => {
                any_unsolved = true;
                let _ = writeln!(out, "puzzle {index}: unsatisfiable");
            }
        }
    }

    if any_unsolved {
        1
    } else {
        0
    }
}
