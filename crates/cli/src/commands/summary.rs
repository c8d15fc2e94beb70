use std::fmt::Write as _;
use std::path::Path;

use shopmetrics_core::config::EngineConfig;
use shopmetrics_core::engine::compute_tables;
use shopmetrics_core::report::summarize;
use shopmetrics_io::load_dataset;

use crate::commands::CommandResult;

pub fn run(config: &EngineConfig, input: &Path) -> CommandResult {
    let dataset = match load_dataset(input) {
        Ok(dataset) => dataset,
        Err(error) => {
            return CommandResult::failure("summary", "input_load", error.to_string(), 2);
        }
    };
    let tables = match compute_tables(&dataset, config) {
        Ok(tables) => tables,
        Err(error) => {
            return CommandResult::failure("summary", "empty_input", error.to_string(), 3);
        }
    };

    let summary = summarize(&tables.sales_fact, &tables.customer_clv);
    let mut output = summary.to_string();
    let _ = write!(output, "\n\nCategory revenue share:");
    for share in &tables.category_share {
        let _ = write!(
            output,
            "\n  {} : {:.2} ({:.2}%)",
            share.category, share.total_revenue, share.revenue_share_pct
        );
    }
    let _ = write!(output, "\n\nRegional performance:");
    for region in &tables.regional_performance {
        let _ = write!(
            output,
            "\n  {} / {} : {} orders, revenue {:.2}, profit {:.2}",
            region.region, region.state, region.total_orders, region.total_revenue,
            region.total_profit
        );
    }
    CommandResult { exit_code: 0, output }
}
