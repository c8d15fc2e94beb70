use std::path::Path;

use shopmetrics_core::config::EngineConfig;
use shopmetrics_core::engine::compute_tables;
use shopmetrics_io::load_dataset;

use crate::commands::CommandResult;

/// Validate the inputs end to end without exporting anything. Row-level findings are
/// reported, not fatal; the command only fails when the inputs cannot be computed at
/// all.
pub fn run(config: &EngineConfig, input: &Path) -> CommandResult {
    let dataset = match load_dataset(input) {
        Ok(dataset) => dataset,
        Err(error) => {
            return CommandResult::failure("check", "input_load", error.to_string(), 2);
        }
    };

    let tables = match compute_tables(&dataset, config) {
        Ok(tables) => tables,
        Err(error) => {
            return CommandResult::failure("check", "empty_input", error.to_string(), 3);
        }
    };

    let report = &tables.report;
    let mut findings: Vec<String> = report
        .integrity_violations
        .iter()
        .map(|violation| format!("integrity: {violation}"))
        .collect();
    findings.extend(report.quality_issues.iter().map(|issue| format!("quality: {issue}")));

    let detail = if findings.is_empty() {
        "no findings".to_string()
    } else {
        findings.join("; ")
    };
    CommandResult::success(
        "check",
        format!(
            "{} fact rows, {} customers, {} products, {} regions, {} categories; {} skipped, {} flagged; {detail}",
            report.rows_emitted,
            tables.customer_clv.len(),
            tables.product_performance.len(),
            tables.regional_performance.len(),
            tables.category_share.len(),
            report.rows_skipped(),
            report.quality_issues.len(),
        ),
    )
}
