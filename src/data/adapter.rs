// ============================================================
// Layer 4 — Record Adapter
// ============================================================
// Converts raw inputs into the keyed record collections the
// matching engine expects: {key: {"title": ...}}.
//
//   messy     — dedupe raw rows, normalize, drop rejects, key 0..n-1
//   canonical — trim + lowercase only, key in taxonomy order,
//               never dropped (every entry stays addressable)
//   test set  — trim + lowercase entities and samples, key samples
//               by position
//
// A title the normalizer rejects is dropped on its own; it never
// fails the batch.

use std::collections::{BTreeMap, HashSet};

use crate::data::{loader::RawTestFile, normalizer::Normalizer, taxonomy::CategoryTaxonomy};
use crate::domain::error::GazetteerError;
use crate::domain::record::{records_from_titles, Records};

/// entity name → sample records
pub type TestSet = BTreeMap<String, Records>;

pub struct RecordAdapter {
    normalizer: Normalizer,
}

impl RecordAdapter {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    pub fn adapt_messy(&self, rows: &[String]) -> Records {
        let mut seen = HashSet::new();
        let unique = rows.iter().filter(|row| seen.insert(row.as_str()));

        let mut rejected = 0usize;
        let titles: Vec<String> = unique
            .filter_map(|row| {
                let title = self.normalizer.normalize(row);
                if title.is_none() {
                    rejected += 1;
                }
                title
            })
            .collect();

        tracing::debug!(
            "Adapted {} messy rows: {} unique, {} rejected by normalization",
            rows.len(),
            seen.len(),
            rejected
        );
        records_from_titles(titles)
    }

    pub fn adapt_canonical(
        &self,
        taxonomy: &CategoryTaxonomy,
        category: &str,
    ) -> Result<Records, GazetteerError> {
        let entries = taxonomy.entries(category)?;
        Ok(records_from_titles(entries.iter().map(|e| minimal_clean(e))))
    }

    pub fn adapt_test_set(
        &self,
        raw:      &RawTestFile,
        category: &str,
    ) -> Result<TestSet, GazetteerError> {
        let entities = raw.get(category).ok_or_else(|| {
            GazetteerError::data_format(category, "test set", "category has no test samples")
        })?;

        let mut test_set = TestSet::new();
        for (entity, samples) in entities {
            let name = minimal_clean(entity);
            let records = records_from_titles(samples.iter().map(|s| minimal_clean(s)));
            if test_set.insert(name.clone(), records).is_some() {
                tracing::warn!("Test entity '{}' appears twice after lowercasing; keeping the last", name);
            }
        }
        Ok(test_set)
    }
}

impl Default for RecordAdapter {
    fn default() -> Self {
        Self::new(Normalizer::default())
    }
}

/// The cleaning trusted inputs get: trim and lowercase.
pub fn minimal_clean(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_messy_keys_are_dense_after_drops() {
        let adapter = RecordAdapter::default();
        let messy = adapter.adapt_messy(&rows(&["CMO", " ", "!!!", "VP Sales", "CMO", "Director"]));

        assert_eq!(messy.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(messy[&0].title, "chief marketing officer");
        assert_eq!(messy[&1].title, "vice president sales");
        assert_eq!(messy[&2].title, "director");
    }

    #[test]
    fn test_messy_dedupe_is_on_raw_strings() {
        let adapter = RecordAdapter::default();
        // different raw strings, same normalized title: both survive
        let messy = adapter.adapt_messy(&rows(&["CMO", "cmo", "CMO"]));
        assert_eq!(messy.len(), 2);
    }

    #[test]
    fn test_canonical_keeps_collisions() {
        let tax = CategoryTaxonomy::from_yaml("M:\n  - ' Chief Marketing Officer'\n  - chief marketing officer\n").unwrap();
        let canon = RecordAdapter::default().adapt_canonical(&tax, "M").unwrap();

        assert_eq!(canon.len(), 2);
        assert_eq!(canon[&0].title, "chief marketing officer");
        assert_eq!(canon[&1].title, "chief marketing officer");
    }

    #[test]
    fn test_canonical_is_not_expanded() {
        let tax = CategoryTaxonomy::from_yaml("M:\n  - CMO\n").unwrap();
        let canon = RecordAdapter::default().adapt_canonical(&tax, "M").unwrap();
        assert_eq!(canon[&0].title, "cmo");
    }

    #[test]
    fn test_canonical_unknown_category() {
        let tax = CategoryTaxonomy::from_yaml("M:\n  - CMO\n").unwrap();
        let err = RecordAdapter::default().adapt_canonical(&tax, "X").unwrap_err();
        assert!(matches!(err, GazetteerError::DataFormat { .. }));
    }

    #[test]
    fn test_test_set_is_minimally_cleaned() {
        let raw: RawTestFile = serde_yaml::from_str(
            "M:\n  ' Chief Marketing Officer ':\n    - ' CMO '\n    - Chief Mktg. Officer\n",
        )
        .unwrap();
        let test = RecordAdapter::default().adapt_test_set(&raw, "M").unwrap();

        let samples = &test["chief marketing officer"];
        assert_eq!(samples[&0].title, "cmo");
        assert_eq!(samples[&1].title, "chief mktg. officer");
    }

    #[test]
    fn test_test_set_unknown_category() {
        let raw = RawTestFile::new();
        assert!(RecordAdapter::default().adapt_test_set(&raw, "M").is_err());
    }

    // ─── Properties over generated rows ──────────────────────────────────────
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_messy_keys_are_exactly_zero_to_n(
            raw in prop::collection::vec(
                prop_oneof!["[A-Za-z ]{0,12}", "[!?. ]{1,4}", Just("CMO".to_string())],
                0..40,
            )
        ) {
            let messy = RecordAdapter::default().adapt_messy(&raw);
            let keys: Vec<usize> = messy.keys().copied().collect();
            prop_assert_eq!(keys, (0..messy.len()).collect::<Vec<_>>());

            let unique: HashSet<&String> = raw.iter().collect();
            prop_assert!(messy.len() <= unique.len());
        }
    }
}
