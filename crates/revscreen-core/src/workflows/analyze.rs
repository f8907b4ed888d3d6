use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::stats::{ScoreStatistics, median, sample_std_dev};
use crate::engine::worker::ScoreResult;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const DEFAULT_SCORE_THRESHOLD: f64 = 30.0;
pub const DEFAULT_ANALYSIS_DIR: &str = "results/analysis";
pub const REPORT_FILE_NAME: &str = "analysis_report.txt";

/// Targets per query shown in console summaries.
pub const CONSOLE_TOP_TARGETS: usize = 5;
const REPORT_TOP_TARGETS: usize = 10;
const PROMISCUOUS_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub results_path: PathBuf,
    pub output_dir: PathBuf,
    pub score_threshold: f64,
}

impl AnalysisConfig {
    pub fn new(results_path: PathBuf) -> Self {
        Self {
            results_path,
            output_dir: PathBuf::from(DEFAULT_ANALYSIS_DIR),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    query_name: String,
    pharmacophore_model: PathBuf,
    score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatistics {
    pub query_name: String,
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    /// Best targets by score, at most ten, ties in file order.
    pub top_targets: Vec<ScoreResult>,
}

/// A model that appears in the top-ten list of more than one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromiscuousTarget {
    pub model_path: PathBuf,
    pub query_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub results_path: PathBuf,
    pub score_threshold: f64,
    pub total_rows: usize,
    pub unique_queries: usize,
    pub unique_targets: usize,
    pub statistics: ScoreStatistics,
    pub median: f64,
    pub std_dev: Option<f64>,
    pub strong_hits: usize,
    /// Per query, in order of first appearance in the results file.
    pub per_query: Vec<QueryStatistics>,
    pub promiscuous: Vec<PromiscuousTarget>,
    pub report_path: PathBuf,
}

impl AnalysisReport {
    /// Renders the plain-text report written to [`REPORT_FILE_NAME`].
    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let mut out = String::new();
        let _ = writeln!(out, "Reverse Screening Analysis Report");
        let _ = writeln!(out, "{rule}\n");
        let _ = writeln!(out, "Input file: {}", self.results_path.display());
        let _ = writeln!(out, "Score threshold: {}\n", self.score_threshold);

        let _ = writeln!(out, "SUMMARY STATISTICS");
        let _ = writeln!(out, "{thin}");
        let _ = writeln!(out, "Total results: {}", self.total_rows);
        let _ = writeln!(out, "Unique queries: {}", self.unique_queries);
        let _ = writeln!(out, "Unique targets: {}", self.unique_targets);
        let _ = writeln!(
            out,
            "Strong hits (>= {}): {}\n",
            self.score_threshold, self.strong_hits
        );

        let _ = writeln!(
            out,
            "{:<30} {:>10} {:>12} {:>12}",
            "query_name", "Total_Hits", "Mean_Score", "Max_Score"
        );
        for query in &self.per_query {
            let _ = writeln!(
                out,
                "{:<30} {:>10} {:>12.4} {:>12.4}",
                query.query_name, query.count, query.mean, query.max
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "TOP {REPORT_TOP_TARGETS} TARGETS PER QUERY");
        let _ = writeln!(out, "{thin}");
        for query in &self.per_query {
            let _ = writeln!(out, "\n{}:", query.query_name);
            for (rank, hit) in query.top_targets.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {:2}. {:<50} {:8.4}",
                    rank + 1,
                    model_stem(&hit.model_path),
                    hit.score
                );
            }
        }
        out
    }
}

pub fn model_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Summarizes a results table and writes the text report to the output directory.
#[instrument(skip_all, name = "analysis_workflow")]
pub fn run(config: &AnalysisConfig, reporter: &ProgressReporter) -> Result<AnalysisReport, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Loading Results",
    });
    let rows = read_results(&config.results_path)?;
    info!("Loaded {} results", rows.len());
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Analyzing" });
    let report_path = config.output_dir.join(REPORT_FILE_NAME);
    let report = summarize(&rows, config, report_path)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Writing Report",
    });
    fs::create_dir_all(&config.output_dir).map_err(|source| EngineError::Io {
        path: config.output_dir.clone(),
        source,
    })?;
    fs::write(&report.report_path, report.render()).map_err(|source| EngineError::Io {
        path: report.report_path.clone(),
        source,
    })?;
    info!("Analysis report saved: {}", report.report_path.display());
    reporter.report(Progress::PhaseFinish);

    Ok(report)
}

fn read_results(path: &Path) -> Result<Vec<ScoreResult>, EngineError> {
    if !path.is_file() {
        return Err(EngineError::ResultsNotFound {
            path: path.to_path_buf(),
        });
    }
    let csv_error = |source| EngineError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<ResultRow>() {
        let row = record.map_err(csv_error)?;
        rows.push(ScoreResult {
            query_name: row.query_name,
            model_path: row.pharmacophore_model,
            score: row.score,
        });
    }
    if rows.is_empty() {
        return Err(EngineError::EmptyResults {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

fn summarize(
    rows: &[ScoreResult],
    config: &AnalysisConfig,
    report_path: PathBuf,
) -> Result<AnalysisReport, EngineError> {
    let scores: Vec<f64> = rows.iter().map(|r| r.score).collect();
    let statistics = ScoreStatistics::from_scores(scores.iter().copied())
        .ok_or_else(|| EngineError::Internal("no scores to summarize".to_string()))?;
    let median = median(&scores).unwrap_or(statistics.mean);

    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&ScoreResult>> = HashMap::new();
    for row in rows {
        let group = groups.entry(row.query_name.as_str()).or_insert_with(|| {
            order.push(row.query_name.as_str());
            Vec::new()
        });
        group.push(row);
    }

    let per_query: Vec<QueryStatistics> = order
        .iter()
        .map(|name| {
            let group = &groups[name];
            let mut ranked: Vec<&ScoreResult> = group.clone();
            ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            let sum: f64 = group.iter().map(|r| r.score).sum();
            QueryStatistics {
                query_name: name.to_string(),
                count: group.len(),
                mean: sum / group.len() as f64,
                max: group.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max),
                top_targets: ranked
                    .into_iter()
                    .take(REPORT_TOP_TARGETS)
                    .cloned()
                    .collect(),
            }
        })
        .collect();

    let mut target_counts: HashMap<&Path, usize> = HashMap::new();
    for query in &per_query {
        for hit in &query.top_targets {
            *target_counts.entry(hit.model_path.as_path()).or_default() += 1;
        }
    }
    let mut promiscuous: Vec<PromiscuousTarget> = target_counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(path, count)| PromiscuousTarget {
            model_path: path.to_path_buf(),
            query_count: count,
        })
        .collect();
    promiscuous.sort_by(|a, b| {
        b.query_count
            .cmp(&a.query_count)
            .then_with(|| a.model_path.cmp(&b.model_path))
    });
    promiscuous.truncate(PROMISCUOUS_LIMIT);

    let unique_targets = rows
        .iter()
        .map(|r| r.model_path.as_path())
        .collect::<std::collections::HashSet<_>>()
        .len();

    Ok(AnalysisReport {
        results_path: config.results_path.clone(),
        score_threshold: config.score_threshold,
        total_rows: rows.len(),
        unique_queries: order.len(),
        unique_targets,
        statistics,
        median,
        std_dev: sample_std_dev(&scores),
        strong_hits: scores.iter().filter(|&&s| s >= config.score_threshold).count(),
        per_query,
        promiscuous,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RESULTS: &str = "\
query_name,pharmacophore_model,score
aspirin,db/cox1.pm,42.0
aspirin,db/cox2.pm,35.5
aspirin,db/hsa.pm,12.0
ibuprofen,db/cox2.pm,40.0
ibuprofen,db/cox1.pm,31.0
ibuprofen,db/ppar.pm,8.5
";

    fn analyze(dir: &Path, text: &str) -> AnalysisReport {
        let input = dir.join("results.csv");
        fs::write(&input, text).unwrap();
        let config = AnalysisConfig {
            results_path: input,
            output_dir: dir.join("analysis"),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        };
        run(&config, &ProgressReporter::new()).unwrap()
    }

    #[test]
    fn summary_statistics_match_the_table() {
        let dir = tempdir().unwrap();
        let report = analyze(dir.path(), RESULTS);
        assert_eq!(report.total_rows, 6);
        assert_eq!(report.unique_queries, 2);
        assert_eq!(report.unique_targets, 4);
        assert_eq!(report.statistics.max, 42.0);
        assert_eq!(report.statistics.min, 8.5);
        assert!((report.median - 33.25).abs() < 1e-12);
        assert_eq!(report.strong_hits, 4);
        assert!(report.std_dev.unwrap() > 0.0);
    }

    #[test]
    fn per_query_statistics_follow_first_appearance() {
        let dir = tempdir().unwrap();
        let report = analyze(dir.path(), RESULTS);
        let names: Vec<&str> = report.per_query.iter().map(|q| q.query_name.as_str()).collect();
        assert_eq!(names, vec!["aspirin", "ibuprofen"]);
        let ibuprofen = &report.per_query[1];
        assert_eq!(ibuprofen.count, 3);
        assert_eq!(ibuprofen.max, 40.0);
        assert!((ibuprofen.mean - 26.5).abs() < 1e-12);
        assert_eq!(ibuprofen.top_targets[0].model_path, PathBuf::from("db/cox2.pm"));
    }

    #[test]
    fn shared_top_targets_are_promiscuous() {
        let dir = tempdir().unwrap();
        let report = analyze(dir.path(), RESULTS);
        assert_eq!(
            report.promiscuous,
            vec![
                PromiscuousTarget {
                    model_path: PathBuf::from("db/cox1.pm"),
                    query_count: 2
                },
                PromiscuousTarget {
                    model_path: PathBuf::from("db/cox2.pm"),
                    query_count: 2
                },
            ]
        );
    }

    #[test]
    fn report_file_is_written() {
        let dir = tempdir().unwrap();
        let report = analyze(dir.path(), RESULTS);
        let text = fs::read_to_string(&report.report_path).unwrap();
        assert!(text.contains("Total results: 6"));
        assert!(text.contains("Strong hits (>= 30): 4"));
        assert!(text.contains("cox1"));
        assert!(report.report_path.ends_with("analysis/analysis_report.txt"));
    }

    #[test]
    fn missing_and_empty_inputs_are_errors() {
        let dir = tempdir().unwrap();
        let config = AnalysisConfig::new(dir.path().join("missing.csv"));
        assert!(matches!(
            run(&config, &ProgressReporter::new()),
            Err(EngineError::ResultsNotFound { .. })
        ));

        let empty = dir.path().join("empty.csv");
        fs::write(&empty, "query_name,pharmacophore_model,score\n").unwrap();
        let config = AnalysisConfig {
            output_dir: dir.path().join("out"),
            ..AnalysisConfig::new(empty)
        };
        assert!(matches!(
            run(&config, &ProgressReporter::new()),
            Err(EngineError::EmptyResults { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }
}
