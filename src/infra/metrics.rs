// ============================================================
// Layer 6 — Evaluation Metrics Logger
// ============================================================
// Summarises an evaluation run and appends it to a CSV file so the
// effect of each retrain can be compared later.
//
// A sample counts as a hit when its entity name equals the title of
// a returned canonical candidate:
//   top1_rate — the best candidate is the entity
//   topk_rate — the entity is anywhere in the returned candidates
//
// Output file: logs/<category>/evaluation.csv
//
//   entities,samples,top1_hits,topk_hits,top1_rate,topk_rate
//   4,17,12,15,0.705882,0.882353
//
// The file sits with the logs, never with the learned artifacts,
// so evaluating does not touch anything training produced.
//
// How to read the metrics:
//   - top1_rate close to topk_rate → the right title ranks first
//     when it is found at all
//   - topk_rate well above top1_rate → the title is found but
//     outranked; more labels near those titles usually help
//   - a drop after retraining → compare the new training.json
//     against the previous run's labels
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

const HEADER: &str = "entities,samples,top1_hits,topk_hits,top1_rate,topk_rate";

/// Hit counts of one evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationMetrics {
    /// Entities in the category's test set
    pub entities:  usize,
    /// Test samples searched, over all entities
    pub samples:   usize,
    /// Samples whose best candidate is their entity
    pub top1_hits: usize,
    /// Samples with their entity anywhere in the candidates
    pub topk_hits: usize,
}

impl EvaluationMetrics {
    /// Account one sample given its entity name and ranked candidate titles.
    pub fn record(&mut self, entity: &str, ranked_titles: &[&str]) {
        self.samples += 1;
        if ranked_titles.first() == Some(&entity) {
            self.top1_hits += 1;
        }
        if ranked_titles.contains(&entity) {
            self.topk_hits += 1;
        }
    }

    /// Share of samples with a top-1 hit; 0 when there are no samples
    pub fn top1_rate(&self) -> f64 {
        rate(self.top1_hits, self.samples)
    }

    /// Share of samples with a top-k hit; 0 when there are no samples
    pub fn topk_rate(&self) -> f64 {
        rate(self.topk_hits, self.samples)
    }
}

fn rate(hits: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

/// Appends evaluation summaries to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("evaluation.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EvaluationMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;
        writeln!(
            f,
            "{},{},{},{},{:.6},{:.6}",
            m.entities,
            m.samples,
            m.top1_hits,
            m.topk_hits,
            m.top1_rate(),
            m.topk_rate(),
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_are_counted() {
        let mut m = EvaluationMetrics::default();
        m.record("cmo", &["cmo", "marketing manager"]);
        m.record("cmo", &["marketing manager", "cmo"]);
        m.record("cmo", &["brand manager"]);
        m.record("cmo", &[]);

        assert_eq!(m.samples, 4);
        assert_eq!(m.top1_hits, 1);
        assert_eq!(m.topk_hits, 2);
        assert_eq!(m.topk_rate(), 0.5);
    }

    #[test]
    fn test_empty_run_has_zero_rates() {
        assert_eq!(EvaluationMetrics::default().top1_rate(), 0.0);
    }

    #[test]
    fn test_log_appends_rows() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let m = EvaluationMetrics { entities: 1, samples: 2, top1_hits: 1, topk_hits: 2 };
        logger.log(&m).unwrap();
        logger.log(&m).unwrap();

        let csv = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,2,1,2,0.500000,1.000000");
    }
}
