use std::env;

use shopmetrics_core::config::EngineConfig;

/// Render effective configuration values. Environment overrides win over the config
/// file, which wins over defaults; active env overrides are called out at the end.
pub fn run(config: &EngineConfig) -> String {
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(format!("calendar.start = {}", config.calendar.start));
    lines.push(format!("calendar.end = {}", config.calendar.end));
    lines.push(format!("cleaning.normalize_text = {}", config.cleaning.normalize_text));
    lines.push(format!(
        "cleaning.margin_cap_percentile = {}",
        config
            .cleaning
            .margin_cap_percentile
            .map_or("disabled".to_string(), |cap| cap.to_string())
    ));
    lines.push(format!("segmentation.version = {}", config.segmentation.version));
    lines.push(format!("segmentation.analysis_date = {}", config.segmentation.analysis_date));
    lines.push(format!("segmentation.bands = {}", config.segmentation.bands));
    lines.push(format!(
        "segmentation.clv_tier_labels = [{}]",
        config.segmentation.clv_tier_labels.join(", ")
    ));
    for rule in &config.segmentation.segment_rules {
        lines.push(format!("segmentation.segment_rules.{} >= {}", rule.label, rule.min_score));
    }
    lines.push(format!("logging.level = {}", config.logging.level));
    lines.push(format!("logging.format = {:?}", config.logging.format).to_lowercase());

    let overrides: Vec<&str> =
        ["SHOPMETRICS_CONFIG", "SHOPMETRICS_LOG_LEVEL", "SHOPMETRICS_LOG_FORMAT", "SHOPMETRICS_ANALYSIS_DATE"]
            .into_iter()
            .filter(|key| env::var(key).is_ok())
            .collect();
    if overrides.is_empty() {
        lines.push("env overrides: none".to_string());
    } else {
        lines.push(format!("env overrides: {}", overrides.join(", ")));
    }

    lines.join("\n")
}
