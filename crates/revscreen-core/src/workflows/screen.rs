use crate::core::scoring::model::ModelLoader;
use crate::core::scoring::weights::WeightConfig;
use crate::engine::config::ScreeningConfig;
use crate::engine::dispatcher::Dispatcher;
use crate::engine::error::EngineError;
use crate::engine::loader::{SkippedRow, load_queries};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::rank;
use crate::engine::scanner::{ScanOutcome, scan_models};
use crate::engine::sink::ResultTable;
use crate::engine::stats::ScoreStatistics;
use crate::engine::worker::{ScoreResult, TaskParams};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of screening one query against the database.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySummary {
    pub query_name: String,
    pub models_screened: usize,
    pub failed: usize,
    pub timed_out: usize,
    /// Ranked results that passed the filters.
    pub hits: Vec<ScoreResult>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningReport {
    pub weights: WeightConfig,
    pub model_count: usize,
    pub queries: Vec<QuerySummary>,
    pub skipped_rows: Vec<SkippedRow>,
    pub output_path: PathBuf,
    pub statistics: Option<ScoreStatistics>,
}

impl ScreeningReport {
    pub fn failed_tasks(&self) -> usize {
        self.queries.iter().map(|q| q.failed).sum()
    }

    pub fn timed_out_tasks(&self) -> usize {
        self.queries.iter().map(|q| q.timed_out).sum()
    }

    pub fn total_hits(&self) -> usize {
        self.queries.iter().map(|q| q.hits.len()).sum()
    }
}

/// Runs a full screening: scan, load queries, score, rank, write.
///
/// Configuration and emptiness problems abort before any scoring and before the
/// output file is created. Failed (query, model) pairs are counted, never fatal.
#[instrument(skip_all, name = "screening_workflow")]
pub fn run<L: ModelLoader + 'static>(
    config: &ScreeningConfig,
    loader: L,
    reporter: &ProgressReporter,
) -> Result<ScreeningReport, EngineError> {
    // === Phase 1: Discover models ===
    reporter.report(Progress::PhaseStart {
        name: "Scanning Models",
    });
    let models = match scan_models(&config.database_dir)? {
        ScanOutcome::Models(models) => models,
        ScanOutcome::Empty => {
            return Err(EngineError::EmptyDatabase {
                path: config.database_dir.clone(),
            });
        }
    };
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Load queries ===
    reporter.report(Progress::PhaseStart {
        name: "Loading Queries",
    });
    let loaded = load_queries(&config.query_source)?;
    if !loaded.skipped.is_empty() {
        warn!("Skipped {} invalid query row(s).", loaded.skipped.len());
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Score each query, one at a time ===
    let params = TaskParams {
        num_conformers: config.num_conformers,
        weights: config.weights,
        timeout: config.task_timeout,
    };
    let mut dispatcher = Dispatcher::new(Arc::new(loader), &models, params, config.concurrency);
    let mut table = ResultTable::new();
    let mut summaries = Vec::with_capacity(loaded.queries.len());

    let total = loaded.queries.len();
    for (index, query) in loaded.queries.iter().enumerate() {
        reporter.report(Progress::Message(format!(
            "Processing query {}/{}: {}",
            index + 1,
            total,
            query.name()
        )));
        reporter.report(Progress::PhaseStart { name: "Scoring" });
        let batch = dispatcher.dispatch(query, reporter)?;
        reporter.report(Progress::PhaseFinish);

        let hits = rank(&batch.results, config.min_score, config.top_n);
        info!(
            "Query '{}': {} hit(s), {} failed, {} timed out.",
            batch.query_name,
            hits.len(),
            batch.failed,
            batch.timed_out
        );
        table.extend(hits.iter().cloned());
        summaries.push(QuerySummary {
            query_name: batch.query_name,
            models_screened: models.len(),
            failed: batch.failed,
            timed_out: batch.timed_out,
            hits,
        });
    }
    dispatcher.finish();

    // === Phase 4: Persist ===
    reporter.report(Progress::PhaseStart {
        name: "Writing Results",
    });
    table.write_csv(&config.output_path)?;
    reporter.report(Progress::PhaseFinish);

    let report = ScreeningReport {
        weights: config.weights,
        model_count: models.len(),
        queries: summaries,
        skipped_rows: loaded.skipped,
        output_path: config.output_path.clone(),
        statistics: table.statistics(),
    };
    info!(
        "Screening complete: {} result row(s), {} failed pair(s).",
        report.total_hits(),
        report.failed_tasks() + report.timed_out_tasks()
    );
    Ok(report)
}
