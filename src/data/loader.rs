// ============================================================
// Layer 4 — Input Loaders
// ============================================================
// Reads the two raw inputs a session needs besides the taxonomy:
//
//   messy titles — a CSV export with (at least) a `title` column;
//                  every other column is ignored
//   test set     — input/test.yaml, category → entity → samples:
//
//     Marketing:
//       Chief Marketing Officer:
//         - cmo
//         - Chief Mktg Officer
//
// Loaders only parse. Cleaning and keying happen in the adapter.

use std::{collections::BTreeMap, fs, io::Read, path::Path};

use crate::domain::error::GazetteerError;

/// Name of the required CSV column.
pub const TITLE_COLUMN: &str = "title";

/// category → entity → raw samples
pub type RawTestFile = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Read the `title` column of a messy CSV file, in row order.
pub fn read_messy_titles(path: &Path, category: &str) -> Result<Vec<String>, GazetteerError> {
    let file = fs::File::open(path).map_err(|e| GazetteerError::io(category, path, e))?;
    read_messy_titles_from(file, &path.display().to_string(), category)
}

/// Same as `read_messy_titles` over any reader; `input` names it in errors.
pub fn read_messy_titles_from<R: Read>(
    reader:   R,
    input:    &str,
    category: &str,
) -> Result<Vec<String>, GazetteerError> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| GazetteerError::data_format(category, input, e.to_string()))?;
    let column = headers
        .iter()
        .position(|h| h.trim() == TITLE_COLUMN)
        .ok_or_else(|| {
            GazetteerError::data_format(category, input, format!("no '{TITLE_COLUMN}' column"))
        })?;

    let mut titles = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record
            .map_err(|e| GazetteerError::data_format(category, input, e.to_string()))?;
        let title = record.get(column).ok_or_else(|| {
            GazetteerError::data_format(
                category,
                input,
                format!("row {} has no '{TITLE_COLUMN}' field", row + 1),
            )
        })?;
        titles.push(title.to_string());
    }

    tracing::debug!("Read {} messy rows from '{}'", titles.len(), input);
    Ok(titles)
}

/// Parse the whole test file; the adapter picks the category out of it.
pub fn read_test_file(path: &Path, category: &str) -> Result<RawTestFile, GazetteerError> {
    let yaml = fs::read_to_string(path).map_err(|e| GazetteerError::io(category, path, e))?;
    serde_yaml::from_str(&yaml).map_err(|e| {
        GazetteerError::data_format(category, path.display().to_string(), e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_title_column_only() {
        let csv = "id,title,company\n1,VP Sales,Acme\n2,\"Director, Ops\",Initech\n";
        let titles = read_messy_titles_from(csv.as_bytes(), "inline", "Sales").unwrap();
        assert_eq!(titles, vec!["VP Sales", "Director, Ops"]);
    }

    #[test]
    fn test_missing_title_column_is_data_format_error() {
        let csv = "id,name\n1,VP Sales\n";
        let err = read_messy_titles_from(csv.as_bytes(), "inline", "Sales").unwrap_err();
        assert!(matches!(err, GazetteerError::DataFormat { ref category, .. } if category == "Sales"));
    }

    #[test]
    fn test_short_row_is_data_format_error() {
        let csv = "id,title\n1,CMO\n2\n";
        let err = read_messy_titles_from(csv.as_bytes(), "inline", "Sales").unwrap_err();
        assert!(matches!(err, GazetteerError::DataFormat { .. }));
    }

    #[test]
    fn test_empty_cell_is_kept_for_the_adapter() {
        let csv = "title\n\nCMO\n";
        let titles = read_messy_titles_from(csv.as_bytes(), "inline", "Sales").unwrap();
        assert!(titles.contains(&"CMO".to_string()));
    }

    #[test]
    fn test_test_file_layout_parses() {
        let yaml = "Marketing:\n  Chief Marketing Officer:\n    - cmo\n    - Chief Mktg Officer\n";
        let parsed: RawTestFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed["Marketing"]["Chief Marketing Officer"].len(), 2);
    }
}
