// ============================================================
// Layer 5 — Blocking Predicates
// ============================================================
// A predicate maps a title to a handful of keys; two titles are
// compared only when some predicate gives them a common key.
//
//   WholeToken  — every token of two or more characters
//   Prefix3     — the first three characters of every token
//   FirstToken  — the first token
//   Fingerprint — the sorted, deduplicated token set
//   Acronym     — initials of a multi-token title, or a single
//                 token as-is ("chief marketing officer" and
//                 "cmo" share the key "cmo")
//
// Learning keeps a small set of predicates that together cover
// the labeled matches while pulling in as few labeled distinct
// pairs as possible.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::domain::training_pairs::Label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Predicate {
    WholeToken,
    Prefix3,
    FirstToken,
    Fingerprint,
    Acronym,
}

impl Predicate {
    pub const ALL: [Predicate; 5] = [
        Predicate::WholeToken,
        Predicate::Prefix3,
        Predicate::FirstToken,
        Predicate::Fingerprint,
        Predicate::Acronym,
    ];

    pub fn keys(self, title: &str) -> BTreeSet<String> {
        let tokens: Vec<&str> = title.split_whitespace().collect();
        if tokens.is_empty() {
            return BTreeSet::new();
        }

        match self {
            Predicate::WholeToken => tokens
                .iter()
                .filter(|t| t.len() >= 2)
                .map(|t| t.to_string())
                .collect(),
            Predicate::Prefix3 => tokens
                .iter()
                .filter(|t| t.len() >= 3)
                .map(|t| t.chars().take(3).collect())
                .collect(),
            Predicate::FirstToken => BTreeSet::from([tokens[0].to_string()]),
            Predicate::Fingerprint => {
                let set: BTreeSet<&str> = tokens.iter().copied().collect();
                BTreeSet::from([set.into_iter().collect::<Vec<_>>().join(" ")])
            }
            Predicate::Acronym => {
                let key = if tokens.len() == 1 {
                    tokens[0].to_string()
                } else {
                    tokens.iter().filter_map(|t| t.chars().next()).collect()
                };
                BTreeSet::from([key])
            }
        }
    }

    /// True when the predicate puts both titles in a common block.
    pub fn covers(self, a: &str, b: &str) -> bool {
        let keys = self.keys(a);
        !keys.is_empty() && self.keys(b).iter().any(|k| keys.contains(k))
    }
}

/// (predicate, key) → positions of the records that produced it.
#[derive(Debug, Clone, Default)]
pub struct BlockIndex {
    blocks: HashMap<(Predicate, String), Vec<usize>>,
}

impl BlockIndex {
    pub fn build<'a, I>(predicates: &[Predicate], titles: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut blocks: HashMap<(Predicate, String), Vec<usize>> = HashMap::new();
        for (pos, title) in titles.into_iter().enumerate() {
            for &p in predicates {
                for key in p.keys(title) {
                    blocks.entry((p, key)).or_default().push(pos);
                }
            }
        }
        Self { blocks }
    }

    /// Every indexed position sharing a block with `title`.
    pub fn candidates(&self, predicates: &[Predicate], title: &str) -> BTreeSet<usize> {
        let mut out = BTreeSet::new();
        for &p in predicates {
            for key in p.keys(title) {
                if let Some(positions) = self.blocks.get(&(p, key)) {
                    out.extend(positions.iter().copied());
                }
            }
        }
        out
    }
}

/// Greedy cover of the labeled matches.
///
/// Each round picks the predicate with the best ratio of newly
/// covered matches to covered distinct pairs. Falls back to every
/// predicate when no match is covered at all.
pub fn learn_predicates(labeled: &[(&str, &str, Label)]) -> Vec<Predicate> {
    let matches: Vec<(&str, &str)> = labeled
        .iter()
        .filter(|(_, _, l)| *l == Label::Match)
        .map(|(a, b, _)| (*a, *b))
        .collect();
    let distinct: Vec<(&str, &str)> = labeled
        .iter()
        .filter(|(_, _, l)| *l == Label::Distinct)
        .map(|(a, b, _)| (*a, *b))
        .collect();

    let mut uncovered: Vec<usize> = (0..matches.len()).collect();
    let mut chosen: Vec<Predicate> = Vec::new();

    while !uncovered.is_empty() {
        let mut best: Option<(Predicate, f64, Vec<usize>)> = None;

        for p in Predicate::ALL.iter().copied().filter(|p| !chosen.contains(p)) {
            let newly: Vec<usize> = uncovered
                .iter()
                .copied()
                .filter(|&i| p.covers(matches[i].0, matches[i].1))
                .collect();
            if newly.is_empty() {
                continue;
            }
            let false_hits = distinct.iter().filter(|(a, b)| p.covers(a, b)).count();
            let score = newly.len() as f64 / (1.0 + false_hits as f64);

            if best.as_ref().map_or(true, |(_, s, _)| score > *s) {
                best = Some((p, score, newly));
            }
        }

        match best {
            Some((p, _, newly)) => {
                uncovered.retain(|i| !newly.contains(i));
                chosen.push(p);
            }
            None => break,
        }
    }

    if chosen.is_empty() {
        tracing::debug!("No predicate covers a labeled match; keeping all predicates");
        return Predicate::ALL.to_vec();
    }
    chosen.sort();
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acronym_links_abbreviation_and_title() {
        assert!(Predicate::Acronym.covers("cmo", "chief marketing officer"));
        assert!(!Predicate::Acronym.covers("cto", "chief marketing officer"));
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        assert!(Predicate::Fingerprint.covers("sales manager", "manager sales"));
        assert!(!Predicate::Fingerprint.covers("sales manager", "sales"));
    }

    #[test]
    fn test_empty_title_has_no_keys() {
        for p in Predicate::ALL {
            assert!(p.keys("").is_empty());
        }
    }

    #[test]
    fn test_block_index_candidates() {
        let titles = ["chief marketing officer", "sales manager", "marketing manager"];
        let index = BlockIndex::build(&[Predicate::WholeToken], titles);
        let hits = index.candidates(&[Predicate::WholeToken], "marketing lead");
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_learning_prefers_precise_predicates() {
        let labeled = [
            ("marketing director", "director of marketing", Label::Match),
            ("sales director", "director of marketing", Label::Distinct),
            ("sales director", "director of sales", Label::Match),
        ];
        let learned = learn_predicates(&labeled);
        // Fingerprint covers neither match; WholeToken covers both
        assert!(learned.contains(&Predicate::WholeToken));
        assert!(!learned.contains(&Predicate::Fingerprint));
    }

    #[test]
    fn test_learning_without_matches_keeps_everything() {
        let labeled = [("a", "b", Label::Distinct)];
        assert_eq!(learn_predicates(&labeled), Predicate::ALL.to_vec());
    }
}
