use crate::cli::ScreenArgs;
use crate::config::builder::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use revscreen::core::scoring::model::HotspotModelLoader;
use revscreen::core::scoring::weights::WeightConfig;
use revscreen::engine::progress::ProgressReporter;
use revscreen::workflows::analyze::model_stem;
use revscreen::workflows::screen::{QuerySummary, ScreeningReport};
use revscreen::workflows;
use std::fmt::Write as _;
use tracing::info;

const CONSOLE_TOP_HITS: usize = 10;

pub async fn run(args: ScreenArgs) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;

    println!("{}", render_weights(&config.weights));

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let loader = HotspotModelLoader::new(config.seed);

    info!("Invoking the core screening workflow...");
    let report =
        tokio::task::block_in_place(|| workflows::screen::run(&config, loader, &reporter))?;

    for query in &report.queries {
        println!("{}", render_query(query));
    }
    println!("{}", render_summary(&report));
    Ok(())
}

pub fn render_weights(weights: &WeightConfig) -> String {
    let mut out = String::from("Feature weights:");
    for (kind, weight) in weights.iter() {
        let _ = write!(out, "\n  {:20}: {}", kind.key(), weight);
    }
    out
}

pub fn render_query(query: &QuerySummary) -> String {
    let rule = "-".repeat(80);
    let mut out = format!("\nTOP {CONSOLE_TOP_HITS} MATCHING PROTEINS for {}:\n{rule}", query.query_name);
    if query.hits.is_empty() {
        out.push_str("\n  No matches found (all scores below threshold)");
    }
    for (rank, hit) in query.hits.iter().take(CONSOLE_TOP_HITS).enumerate() {
        let _ = write!(
            out,
            "\n{:3}. {:50} Score: {:8.4}",
            rank + 1,
            model_stem(&hit.model_path),
            hit.score
        );
    }
    let failed = query.failed + query.timed_out;
    if failed > 0 {
        let _ = write!(
            out,
            "\n  ({} of {} models could not be scored)",
            failed, query.models_screened
        );
    }
    out
}

pub fn render_summary(report: &ScreeningReport) -> String {
    let rule = "=".repeat(80);
    let mut out = format!(
        "\n{rule}\nSaved {} total results to {}\n{rule}",
        report.total_hits(),
        report.output_path.display()
    );
    let _ = write!(out, "\nQueries screened: {}", report.queries.len());
    let _ = write!(out, "\nModels in database: {}", report.model_count);
    let _ = write!(out, "\nSkipped query rows: {}", report.skipped_rows.len());
    for row in &report.skipped_rows {
        let _ = write!(
            out,
            "\n  line {}{}: {}",
            row.line,
            row.name
                .as_deref()
                .map(|n| format!(" ({n})"))
                .unwrap_or_default(),
            row.reason
        );
    }
    let _ = write!(
        out,
        "\nFailed (query, model) pairs: {}",
        report.failed_tasks() + report.timed_out_tasks()
    );
    if report.timed_out_tasks() > 0 {
        let _ = write!(out, " ({} timed out)", report.timed_out_tasks());
    }

    if let Some(stats) = report.statistics {
        let _ = write!(out, "\n\nScore Statistics:");
        let _ = write!(out, "\n  Total matches: {}", stats.count);
        let _ = write!(out, "\n  Max score: {:.4}", stats.max);
        let _ = write!(out, "\n  Min score: {:.4}", stats.min);
        let _ = write!(out, "\n  Average score: {:.4}", stats.mean);
    }
    out
}
