// ============================================================
// Layer 4 — Category Taxonomy
// ============================================================
// The canonical titles for every category, e.g. input/cats.yaml:
//
//   Marketing:
//     - Chief Marketing Officer
//     - Marketing Manager
//   Engineering:
//     - Chief Technology Officer
//
// Loaded once per run and never modified. Its keys are the closed
// set of values accepted by --category.

use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::Path};

use crate::domain::error::GazetteerError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CategoryTaxonomy {
    categories: BTreeMap<String, Vec<String>>,
}

impl CategoryTaxonomy {
    /// Load the taxonomy for a session that will run `category`.
    /// The category is only used to label errors.
    pub fn load(path: &Path, category: &str) -> Result<Self, GazetteerError> {
        let yaml = fs::read_to_string(path)
            .map_err(|e| GazetteerError::io(category, path, e))?;
        Self::from_yaml(&yaml).map_err(|e| {
            GazetteerError::data_format(category, path.display().to_string(), e.to_string())
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// All category names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Canonical entries of one category, in file order.
    pub fn entries(&self, category: &str) -> Result<&[String], GazetteerError> {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                GazetteerError::data_format(
                    category,
                    "category taxonomy",
                    format!(
                        "unknown category; choose one of: {}",
                        self.names().collect::<Vec<_>>().join(", ")
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = "
Marketing:
  - Chief Marketing Officer
  - Marketing Manager
Engineering:
  - Chief Technology Officer
";

    #[test]
    fn test_entries_keep_file_order() {
        let tax = CategoryTaxonomy::from_yaml(YAML).unwrap();
        assert_eq!(
            tax.entries("Marketing").unwrap(),
            &["Chief Marketing Officer".to_string(), "Marketing Manager".to_string()]
        );
    }

    #[test]
    fn test_unknown_category_lists_choices() {
        let tax = CategoryTaxonomy::from_yaml(YAML).unwrap();
        let err = tax.entries("Sales").unwrap_err();
        assert!(matches!(err, GazetteerError::DataFormat { .. }));
        assert!(err.to_string().contains("Engineering, Marketing"));
    }

    #[test]
    fn test_names_are_the_choice_set() {
        let tax = CategoryTaxonomy::from_yaml(YAML).unwrap();
        assert_eq!(tax.names().collect::<Vec<_>>(), vec!["Engineering", "Marketing"]);
        assert!(tax.contains("Marketing"));
        assert!(!tax.contains("marketing"));
    }
}
