use super::worker::ScoreResult;
use std::cmp::Ordering;

/// Filters, orders and truncates the scores of one query.
///
/// Failures (the sentinel and NaN) are always dropped, as is anything below
/// `min_score`. The sort is stable, so equal scores keep their input order.
pub fn rank(results: &[ScoreResult], min_score: f64, top_n: Option<usize>) -> Vec<ScoreResult> {
    let mut ranked: Vec<ScoreResult> = results
        .iter()
        .filter(|r| !r.is_failure() && r.score >= min_score)
        .cloned()
        .collect();

    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    if let Some(n) = top_n {
        ranked.truncate(n);
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::worker::FAILED_SCORE;
    use std::path::PathBuf;

    fn results(scores: &[f64]) -> Vec<ScoreResult> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoreResult {
                query_name: "Query".to_string(),
                model_path: PathBuf::from(format!("db/m{i}.pm")),
                score,
            })
            .collect()
    }

    fn paths(ranked: &[ScoreResult]) -> Vec<String> {
        ranked
            .iter()
            .map(|r| r.model_path.display().to_string())
            .collect()
    }

    #[test]
    fn output_is_sorted_descending() {
        let ranked = rank(&results(&[0.5, 4.0, 2.0, 3.5, 1.0]), 0.0, None);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let ranked = rank(&results(&[2.0, 5.0, 2.0, 5.0, 2.0]), 0.0, None);
        assert_eq!(
            paths(&ranked),
            vec!["db/m1.pm", "db/m3.pm", "db/m0.pm", "db/m2.pm", "db/m4.pm"]
        );
    }

    #[test]
    fn threshold_keeps_exactly_scores_at_or_above_it() {
        let input = results(&[0.0, 1.0, 2.0, 3.0, 2.5]);
        let all = rank(&input, 0.0, None);
        let filtered = rank(&input, 2.0, None);
        assert!(filtered.iter().all(|r| r.score >= 2.0));
        assert_eq!(filtered.len(), input.iter().filter(|r| r.score >= 2.0).count());
        assert!(filtered.iter().all(|r| all.contains(r)));
    }

    #[test]
    fn threshold_below_minimum_is_a_no_op() {
        let input = results(&[1.0, 3.0, 2.0]);
        assert_eq!(rank(&input, 0.5, None), rank(&input, 1.0, None));
        assert_eq!(rank(&input, 1.0, None).len(), 3);
    }

    #[test]
    fn top_n_truncates_to_available_results() {
        let input = results(&[1.0, 3.0, 2.0, 0.5]);
        for k in 0..6 {
            let ranked = rank(&input, 1.0, Some(k));
            assert_eq!(ranked.len(), k.min(3));
        }
    }

    #[test]
    fn failures_never_survive_ranking() {
        let input = results(&[FAILED_SCORE, 2.0, f64::NAN, 0.0]);
        let ranked = rank(&input, -5.0, None);
        assert_eq!(paths(&ranked), vec!["db/m1.pm", "db/m3.pm"]);
    }

    #[test]
    fn ranking_is_idempotent() {
        let input = results(&[1.0, 3.0, 3.0, 2.0, 0.0]);
        let once = rank(&input, 0.5, Some(3));
        let twice = rank(&input, 0.5, Some(3));
        assert_eq!(once, twice);
        assert_eq!(rank(&once, 0.5, Some(3)), once);
    }
}
