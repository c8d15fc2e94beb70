use std::path::Path;

use shopmetrics_core::config::EngineConfig;
use shopmetrics_core::engine::compute_tables;
use shopmetrics_io::{export_tables, load_dataset};

use crate::commands::CommandResult;

pub fn run(config: &EngineConfig, input: &Path, output: &Path) -> CommandResult {
    let dataset = match load_dataset(input) {
        Ok(dataset) => dataset,
        Err(error) => {
            return CommandResult::failure("run", "input_load", error.to_string(), 2);
        }
    };

    let tables = match compute_tables(&dataset, config) {
        Ok(tables) => tables,
        Err(error) => {
            return CommandResult::failure("run", "empty_input", error.to_string(), 3);
        }
    };

    match export_tables(&tables, output) {
        Ok(written) => CommandResult::success(
            "run",
            format!(
                "exported {} tables to {} ({} fact rows, {} skipped, {} duplicates removed, {} quality flags)",
                written.len(),
                output.display(),
                tables.report.rows_emitted,
                tables.report.rows_skipped(),
                tables.report.duplicates_removed,
                tables.report.quality_issues.len(),
            ),
        ),
        Err(error) => CommandResult::failure("run", "export", error.to_string(), 4),
    }
}
