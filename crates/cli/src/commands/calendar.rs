use std::path::Path;

use shopmetrics_core::calendar::build_date_dimension;
use shopmetrics_core::config::EngineConfig;
use shopmetrics_io::write_date_dimension;

use crate::commands::CommandResult;

pub fn run(config: &EngineConfig, output: &Path) -> CommandResult {
    let rows = build_date_dimension(&config.calendar);
    match write_date_dimension(&rows, output) {
        Ok(path) => CommandResult::success(
            "calendar",
            format!(
                "wrote {} calendar days ({} to {}) to {}",
                rows.len(),
                config.calendar.start,
                config.calendar.end,
                path.display()
            ),
        ),
        Err(error) => CommandResult::failure("calendar", "export", error.to_string(), 4),
    }
}
