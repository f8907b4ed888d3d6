/// Summary of a set of scores. `None` is returned for an empty set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStatistics {
    pub count: usize,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

impl ScoreStatistics {
    pub fn from_scores<I: IntoIterator<Item = f64>>(scores: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for score in scores {
            count += 1;
            sum += score;
            max = max.max(score);
            min = min.min(score);
        }
        (count > 0).then(|| Self {
            count,
            max,
            min,
            mean: sum / count as f64,
        })
    }
}

pub fn median(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn sample_std_dev(scores: &[f64]) -> Option<f64> {
    if scores.len() < 2 {
        return None;
    }
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}
