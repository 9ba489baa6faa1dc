// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between raw input files and keyed records:
//
//   cats.yaml ──► CategoryTaxonomy ──┐
//   messy.csv ──► read_messy_titles ─┼──► RecordAdapter ──► Records
//   test.yaml ──► read_test_file ────┘         │
//                                          Normalizer
//
// Each module does exactly one step and is tested on its own.

/// Canonical titles per category (cats.yaml)
pub mod taxonomy;

/// CSV and YAML readers for messy titles and the test set
pub mod loader;

/// The ordered title-cleaning pipeline
pub mod normalizer;

/// Raw inputs → keyed records
pub mod adapter;
