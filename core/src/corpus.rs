//! Puzzle corpus file format: UTF-8, blank-line-tolerant. Each puzzle is a
//! header line `N K` followed by exactly `K` rule strings.

use std::io::BufRead;

use crate::errors::{PuzzleError, Result};

/// Reads every puzzle out of `reader`, returning `(N, ruleStrings)` pairs in
/// file order. This is a pure function over a `BufRead` — no file handle is
/// opened here; that's left to the CLI collaborator.
pub fn read_corpus(reader: impl BufRead) -> Result<Vec<(usize, Vec<String>)>> {
    let mut puzzles = Vec::new();
    let mut lines = reader.lines().filter_map(|l| l.ok()).filter(|l| !l.trim().is_empty());

    while let Some(header) = lines.next() {
        let mut parts = header.split_whitespace();
        let n: usize = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PuzzleError::Corpus(format!("bad header `{header}`")))?;
        let k: usize = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| PuzzleError::Corpus(format!("bad header `{header}`")))?;

        let mut rules = Vec::with_capacity(k);
        for _ in 0..k {
            let rule = lines
                .next()
                .ok_or_else(|| PuzzleError::Corpus(format!("expected {k} rules after header `{header}`")))?;
            rules.push(rule);
        }
        puzzles.push((n, rules));
    }
    Ok(puzzles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_single_puzzle() {
        let text = "3 2\nA+B=3\nC>A\n";
        let puzzles = read_corpus(text.as_bytes()).unwrap();
        assert_eq!(puzzles, vec![(3, vec!["A+B=3".to_string(), "C>A".to_string()])]);
    }

    #[test]
    fn tolerates_blank_lines() {
        let text = "\n3 1\n\nA+B=3\n\n5 0\n\n";
        let puzzles = read_corpus(text.as_bytes()).unwrap();
        assert_eq!(puzzles, vec![(3, vec!["A+B=3".to_string()]), (5, vec![])]);
    }

    #[test]
    fn rejects_truncated_rule_list() {
        let text = "3 2\nA+B=3\n";
        assert!(read_corpus(text.as_bytes()).is_err());
    }

    #[test]
    fn rejects_malformed_header() {
        let text = "notanumber 2\n";
        assert!(read_corpus(text.as_bytes()).is_err());
    }
}
