use clap::Parser;
use rowmerge::utils::error::ErrorSeverity;
use rowmerge::utils::{logger, validation::Validate};
use rowmerge::{CancellationToken, CliConfig, DelimitedReader, MergeError, MergeJob};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();
    let dry_run = cli.dry_run;
    let report_json = cli.report_json.clone();
    let log_json = cli.log_json;

    let code = match run(cli, dry_run, log_json, report_json).await {
        Ok(code) => code,
        Err(e) => {
            print_error_chain(&e);
            match e.downcast_ref::<MergeError>() {
                Some(merge_error) => exit_code(merge_error.severity()),
                None => 1,
            }
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
}

async fn run(
    cli: CliConfig,
    dry_run: bool,
    log_json: bool,
    report_json: Option<PathBuf>,
) -> anyhow::Result<i32> {
    let config = cli.into_job_config()?;
    if log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.log_level.as_deref());
    }

    match &config.name {
        Some(name) => tracing::info!("Starting rowmerge job '{}'", name),
        None => tracing::info!("Starting rowmerge"),
    }
    tracing::debug!("Job config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        return Err(e.into());
    }

    let mut reader = DelimitedReader::new(&config.dataset);
    if let Some(delimiter) = config.delimiter_byte()? {
        reader = reader.with_delimiter(delimiter);
    }
    let job = MergeJob::new(reader, config);

    if dry_run {
        tracing::info!("Dry run, no files will be written");
        let plans = job.plan().await?;
        for plan in &plans {
            match &plan.destination {
                Ok(path) => println!("row {}: {}", plan.index, path.display()),
                Err(e) => println!("row {}: error: {}", plan.index, e),
            }
        }
        return Ok(0);
    }

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current line");
            ctrl_c_token.cancel();
        }
    });

    let report = job.run(cancel).await?;

    if let Some(path) = &report_json {
        report.write_json(path)?;
        tracing::info!("Report written to {}", path.display());
    }

    println!("Generated {} file(s):", report.generated_count());
    for path in report.generated_paths() {
        println!("  {}", path.display());
    }

    let mut worst: Option<ErrorSeverity> = None;
    for outcome in &report.outcomes {
        if let Some(error) = outcome.error() {
            eprintln!("row {}: {}", outcome.index, error.user_friendly_message());
            eprintln!("  suggestion: {}", error.recovery_suggestion());
            worst = worst.max(Some(error.severity()));
        }
    }
    if report.cancelled {
        eprintln!("{}", MergeError::Cancelled.user_friendly_message());
        return Ok(130);
    }

    Ok(worst.map(exit_code).unwrap_or(0))
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn print_error_chain(error: &anyhow::Error) {
    tracing::error!("rowmerge failed: {:#}", error);
    eprintln!("Error: {}", error);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {}", cause);
    }
    if let Some(merge_error) = error.downcast_ref::<MergeError>() {
        eprintln!("Suggestion: {}", merge_error.recovery_suggestion());
    }
}
