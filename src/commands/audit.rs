//! Audit command handler

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use ocitools::cli::{AuditArgs, GlobalArgs};
use ocitools::extract::aggregate::split_patterns;
use ocitools::extract::{ConsoleProgress, FetchProgress, QuietProgress};
use ocitools::{
    Config, ExtractionRequest, ExtractionSummary, Extractor, ExtractorSettings, HttpAuditSource,
};

use super::{load_profile, request_timeout, require_endpoint};

/// Event names listed in the run summary.
const TOP_EVENTS: usize = 5;

/// Handle the audit command.
///
/// Everything that can be wrong with the input is checked before the first
/// request goes out. Skipped windows do not fail the command.
#[cfg(not(tarpaulin_include))]
pub fn handle(global: &GlobalArgs, args: &AuditArgs) -> Result<()> {
    let (config, profile) = load_profile(global)?;
    let settings = settings_for(&config, args);
    let request = build_request(&config, &settings, args, &profile.tenancy)?;

    let endpoint = require_endpoint(profile.audit_endpoint(), "audit")?;
    let source = HttpAuditSource::new(endpoint, request_timeout(&profile), config.audit.page_limit)
        .context("Failed to set up audit client")?;

    let console = ConsoleProgress::new();
    let progress: &dyn FetchProgress = if global.quiet {
        &QuietProgress
    } else {
        &console
    };

    let summary = Extractor::new(&source, settings)
        .with_fields(config.record_fields()?)
        .with_progress(progress)
        .run(&request)?;

    if !global.quiet {
        let size = fs::metadata(&summary.output_path).ok().map(|m| m.len());
        println!("{}", format_summary(&summary, size));
    }
    Ok(())
}

/// Effective settings: CLI preset and window override win over the config.
pub fn settings_for(config: &Config, args: &AuditArgs) -> ExtractorSettings {
    let preset = args.preset.unwrap_or(config.audit.preset);
    let mut settings = preset.settings();
    if let Some(days) = args.window_days.or(config.audit.window_days) {
        settings.max_window_days = days;
    }
    settings
}

/// Turn CLI arguments into an extraction request.
pub fn build_request(
    config: &Config,
    settings: &ExtractorSettings,
    args: &AuditArgs,
    tenancy: &str,
) -> Result<ExtractionRequest> {
    let (start, end) = settings.date_range(&args.start_date, &args.end_date)?;
    let separator = config.filter_separator()?;
    let patterns = args
        .event_filter
        .as_deref()
        .map(|spec| split_patterns(spec, separator))
        .unwrap_or_default();
    let compartment = args.compartment_id.as_deref().unwrap_or(tenancy);
    let tally_path = args
        .tally_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.audit.tally_file));

    Ok(
        ExtractionRequest::new(compartment, start, end, &args.output_file)
            .with_filters(patterns)
            .with_tally_path(tally_path),
    )
}

/// Final report printed after a run.
pub fn format_summary(summary: &ExtractionSummary, output_size: Option<u64>) -> String {
    let report = &summary.report;
    let mut lines = vec![format!(
        "Windows: {} processed, {} failed",
        report.succeeded(),
        report.failed()
    )];
    for outcome in report.failures() {
        if let Some(failure) = &outcome.failure {
            lines.push(format!(
                "  window {} ({}) skipped: {}: {}",
                outcome.index + 1,
                outcome.window,
                failure.kind,
                failure.message
            ));
        }
    }
    lines.push(format!(
        "Records: {} observed, {} written, {} filtered out",
        summary.stats.observed,
        summary.stats.written,
        summary.stats.filtered_out()
    ));
    let size = output_size
        .map(|bytes| format!(" ({})", humansize::format_size(bytes, humansize::BINARY)))
        .unwrap_or_default();
    lines.push(format!("Output: {}{}", summary.output_path.display(), size));
    lines.push(format!(
        "Tally: {} ({} event name{})",
        summary.tally_path.display(),
        summary.tally.len(),
        if summary.tally.len() == 1 { "" } else { "s" }
    ));
    let top: Vec<String> = summary
        .tally
        .most_common()
        .into_iter()
        .take(TOP_EVENTS)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect();
    if !top.is_empty() {
        lines.push(format!("Most frequent: {}", top.join(", ")));
    }
    lines.join("\n")
}
