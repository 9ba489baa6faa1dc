// ============================================================
// Layer 1 — Evaluation Report Rendering
// ============================================================
//   entity: chief marketing officer
//   	test sample: cmo
//   		candidate: chief marketing officer, confidence: 97.31
//
// Confidences are percentages with two decimals.

use std::fmt::Write;

use crate::application::evaluate_use_case::EvaluationReport;

pub fn render(report: &EvaluationReport, top_k: usize) -> String {
    let mut out = String::new();
    for (entity, rankings) in &report.entities {
        let _ = writeln!(out, "entity: {entity}");
        for ranking in rankings.values() {
            let _ = writeln!(out, "\ttest sample: {}", ranking.sample);
            for candidate in &ranking.candidates {
                let _ = writeln!(
                    out,
                    "\t\tcandidate: {}, confidence: {:.2}",
                    candidate.title,
                    100.0 * candidate.score
                );
            }
        }
    }

    let m = &report.metrics;
    let _ = writeln!(
        out,
        "\n{} samples over {} entities: top-1 {:.2}%, top-{} {:.2}%",
        m.samples,
        m.entities,
        100.0 * m.top1_rate(),
        top_k,
        100.0 * m.topk_rate()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::evaluate_use_case::{RankedCandidate, SampleRanking};
    use crate::infra::metrics::EvaluationMetrics;
    use std::collections::BTreeMap;

    #[test]
    fn test_layout_and_percentages() {
        let ranking = SampleRanking {
            sample:     "cmo".to_string(),
            candidates: vec![
                RankedCandidate { title: "chief marketing officer".to_string(), score: 0.97314 },
                RankedCandidate { title: "marketing director".to_string(), score: 0.1 },
            ],
        };
        let mut entities = BTreeMap::new();
        entities.insert("chief marketing officer".to_string(), BTreeMap::from([(0, ranking)]));
        let report = EvaluationReport {
            category: "Marketing".to_string(),
            entities,
            metrics: EvaluationMetrics { entities: 1, samples: 1, top1_hits: 1, topk_hits: 1 },
        };

        let text = render(&report, 3);
        assert!(text.starts_with(
            "entity: chief marketing officer\n\
             \ttest sample: cmo\n\
             \t\tcandidate: chief marketing officer, confidence: 97.31\n\
             \t\tcandidate: marketing director, confidence: 10.00\n"
        ));
        assert!(text.contains("top-1 100.00%, top-3 100.00%"));
    }
}
