use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{info, warn};

use logsift::{
    AnalyzeOptions, CancelToken, JsonFieldMatcher, PatternMatcher, RecordExtractor, analyze_file,
    cli, config, logging,
};

fn main() -> Result<()> {
    logging::init_logging();

    let cli_opts = cli::parse();
    let cfg = config::load_config(cli_opts.config_path.as_deref())?;

    if cli_opts.field.is_some() != cli_opts.value.is_some() {
        bail!("--field and --value must be given together");
    }

    let extractor: Arc<dyn RecordExtractor> = if let Some(pattern) = &cli_opts.pattern {
        Arc::new(PatternMatcher::new(pattern)?)
    } else {
        let field = cli_opts.field.clone().unwrap_or(cfg.match_field);
        let value = cli_opts.value.clone().unwrap_or(cfg.match_value);
        info!("matching entries where {field} == {value}");
        Arc::new(JsonFieldMatcher::new(field, value))
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        warn!("interrupt received; cancelling pending ranges");
        handler_token.cancel();
    })?;

    let timeout_secs = cli_opts.timeout_secs.unwrap_or(cfg.timeout_secs);
    let options = AnalyzeOptions {
        workers: cli_opts.workers,
        per_range_timeout: Duration::from_secs(timeout_secs),
        cancel,
    };

    let report = analyze_file(&cli_opts.input, extractor, &options)?;
    if !report.is_complete() {
        warn!("report is incomplete; totals are lower bounds");
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
