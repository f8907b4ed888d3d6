use crate::cli::AnalyzeArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use revscreen::engine::progress::ProgressReporter;
use revscreen::workflows;
use revscreen::workflows::analyze::{
    AnalysisConfig, AnalysisReport, CONSOLE_TOP_TARGETS, model_stem,
};
use std::fmt::Write as _;
use tracing::info;

pub async fn run(args: AnalyzeArgs) -> Result<()> {
    let config = AnalysisConfig {
        results_path: args.results_csv,
        output_dir: args.output_dir,
        score_threshold: args.score_threshold,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Analyzing results from {}", config.results_path.display());
    let report = tokio::task::block_in_place(|| workflows::analyze::run(&config, &reporter))?;

    println!("{}", render_console(&report));
    println!("\nAnalysis report saved: {}", report.report_path.display());
    Ok(())
}

pub fn render_console(report: &AnalysisReport) -> String {
    let rule = "=".repeat(80);
    let stats = &report.statistics;
    let mut out = format!("{rule}\nSUMMARY STATISTICS\n{rule}");
    let _ = write!(out, "\n\nTotal number of query-target pairs: {}", report.total_rows);
    let _ = write!(out, "\nNumber of unique queries: {}", report.unique_queries);
    let _ = write!(out, "\nNumber of unique targets: {}", report.unique_targets);
    let _ = write!(out, "\n\nScore statistics:");
    let _ = write!(out, "\n  Min:    {:.4}", stats.min);
    let _ = write!(out, "\n  Max:    {:.4}", stats.max);
    let _ = write!(out, "\n  Mean:   {:.4}", stats.mean);
    let _ = write!(out, "\n  Median: {:.4}", report.median);
    match report.std_dev {
        Some(sd) => {
            let _ = write!(out, "\n  Std:    {sd:.4}");
        }
        None => out.push_str("\n  Std:    n/a"),
    }
    let _ = write!(
        out,
        "\n\nStrong hits (score >= {}): {}",
        report.score_threshold, report.strong_hits
    );

    let _ = write!(out, "\n\n{rule}\nPER-QUERY STATISTICS\n{rule}");
    let _ = write!(
        out,
        "\n{:<30} {:>10} {:>12} {:>12}",
        "query_name", "Total_Hits", "Mean_Score", "Max_Score"
    );
    for query in &report.per_query {
        let _ = write!(
            out,
            "\n{:<30} {:>10} {:>12.4} {:>12.4}",
            query.query_name, query.count, query.mean, query.max
        );
    }

    let _ = write!(out, "\n\n{rule}\nTOP {CONSOLE_TOP_TARGETS} TARGETS PER QUERY\n{rule}");
    for query in &report.per_query {
        let _ = write!(out, "\n\n{}:", query.query_name);
        for (rank, hit) in query.top_targets.iter().take(CONSOLE_TOP_TARGETS).enumerate() {
            let _ = write!(
                out,
                "\n  {}. {:50} Score: {:8.4}",
                rank + 1,
                model_stem(&hit.model_path),
                hit.score
            );
        }
    }

    let _ = write!(
        out,
        "\n\n{rule}\nPROMISCUOUS TARGETS (appear in top 10 for multiple queries)\n{rule}"
    );
    if report.promiscuous.is_empty() {
        out.push_str("\n\nNo promiscuous targets found (each target matches only one query)");
    } else {
        out.push_str("\n\nTargets appearing in multiple query top-10 lists:");
        for target in &report.promiscuous {
            let _ = write!(
                out,
                "\n  {:50} Appears in {} queries",
                model_stem(&target.model_path),
                target.query_count
            );
        }
    }
    out
}
