mod config;
mod logging;
mod report;
mod viewer;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use callsweep_api::{ClientConfig, ConnectionSupervisor, PasswordAuthenticator, ServiceClient};
use callsweep_core::{
    subject_source, ProgressCallback, RunContext, RunSummary, ScanRunner, SubjectResolver,
};
use callsweep_records::{Predicates, TimeWindow};

use config::Settings;
use report::CsvReport;

#[derive(Parser, Debug)]
#[command(
    name = "callsweep",
    about = "Sweep call and session history out of a communications service",
    version,
    author
)]
struct Cli {
    /// Days of history to scan, counting back from the end bound
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=3650))]
    days: u32,

    /// Session category to keep
    #[arg(short, long, value_enum)]
    category: CategoryChoice,

    /// End bound of the scan window as RFC 3339 (default: now)
    #[arg(long)]
    end: Option<DateTime<Utc>>,

    /// Where the matched sessions go
    #[arg(short, long, value_enum)]
    output: OutputChoice,

    /// Report file path (required with --output file)
    #[arg(long = "out", required_if_eq("output", "file"))]
    out_path: Option<PathBuf>,

    /// Keep every extra service field and add a detail column
    #[arg(long)]
    full_detail: bool,

    /// Keep sessions that never closed cleanly
    #[arg(long)]
    include_incomplete: bool,

    /// Scan a single user URI
    #[arg(short, long)]
    subject: Option<String>,

    /// CSV file with a User column naming the users to scan (ignored when
    /// --subject is given)
    #[arg(long)]
    subjects_file: Option<PathBuf>,

    /// Keep sessions where either endpoint URI contains this text
    #[arg(long)]
    uri_contains: Option<String>,

    /// Keep sessions where either endpoint's client version contains this text
    #[arg(long)]
    client_version_contains: Option<String>,

    /// Service account user
    #[arg(short, long)]
    user: Option<String>,

    /// Service account password
    #[arg(short, long)]
    password: Option<String>,

    /// Base URL of the service API
    #[arg(long)]
    service_url: Option<String>,

    /// Path to a config file (default: ./callsweep.toml, then the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryChoice {
    All,
    Audio,
    Conference,
    Im,
    Video,
}

impl From<CategoryChoice> for callsweep_records::MediaCategory {
    fn from(choice: CategoryChoice) -> Self {
        use callsweep_records::MediaCategory;
        match choice {
            CategoryChoice::All => MediaCategory::All,
            CategoryChoice::Audio => MediaCategory::Audio,
            CategoryChoice::Conference => MediaCategory::Conference,
            CategoryChoice::Im => MediaCategory::Im,
            CategoryChoice::Video => MediaCategory::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
enum OutputChoice {
    Viewer,
    File,
}

/// A run that must stop, with the exit code to stop with. Code 1 is for
/// problems found before scanning; code 2 is for failures after the scan
/// started.
struct RunFailure {
    exit_code: i32,
    source: anyhow::Error,
}

impl RunFailure {
    fn preflight(source: impl Into<anyhow::Error>) -> Self {
        Self {
            exit_code: 1,
            source: source.into(),
        }
    }

    fn fatal(source: impl Into<anyhow::Error>) -> Self {
        Self {
            exit_code: 2,
            source: source.into(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    if let Err(failure) = run(cli).await {
        eprintln!("{} {:#}", "error:".bright_red(), failure.source);
        std::process::exit(failure.exit_code);
    }
}

async fn run(cli: Cli) -> Result<(), RunFailure> {
    let file_config = config::load(cli.config.as_deref()).map_err(RunFailure::preflight)?;
    let settings = Settings::resolve(
        cli.service_url.clone(),
        cli.user.clone(),
        cli.password.clone(),
        file_config,
    )
    .map_err(RunFailure::preflight)?;

    let reference = cli.end.unwrap_or_else(Utc::now);
    let window = TimeWindow::ending_at(reference, i64::from(cli.days));
    let predicates = Predicates {
        category: cli.category.into(),
        uri_contains: cli.uri_contains.clone(),
        client_version_contains: cli.client_version_contains.clone(),
        include_incomplete: cli.include_incomplete,
    };

    // Open the report file before any network work.
    let report = match (cli.output, cli.out_path.as_deref()) {
        (OutputChoice::File, Some(path)) => {
            Some(CsvReport::create(path, cli.full_detail).map_err(RunFailure::preflight)?)
        }
        (OutputChoice::File, None) => {
            return Err(RunFailure::preflight(anyhow!(
                "--out is required with --output file"
            )))
        }
        _ => None,
    };

    let mut client_config = ClientConfig::new(settings.base_url.clone());
    if let Some(timeout) = settings.timeout {
        client_config = client_config.with_timeout(timeout);
    }
    let client =
        ServiceClient::new(client_config.clone(), cli.full_detail).map_err(RunFailure::preflight)?;
    let authenticator = PasswordAuthenticator::new(&client_config, settings.credential)
        .map_err(RunFailure::preflight)?;
    let mut supervisor = ConnectionSupervisor::new(Box::new(authenticator));

    let result = scan_and_report(&cli, &client, &mut supervisor, window, predicates, report).await;

    // Best-effort release, even after a failed scan.
    supervisor.sign_out().await;
    result
}

async fn scan_and_report(
    cli: &Cli,
    client: &ServiceClient,
    supervisor: &mut ConnectionSupervisor,
    window: TimeWindow,
    predicates: Predicates,
    report: Option<CsvReport>,
) -> Result<(), RunFailure> {
    let source = subject_source(cli.subject.as_deref(), cli.subjects_file.as_deref());
    let roster = SubjectResolver::new(client, supervisor)
        .resolve(&source)
        .await
        .map_err(RunFailure::preflight)?;

    info!(
        subjects = roster.len(),
        from = %window.start.to_rfc3339(),
        to = %window.end.to_rfc3339(),
        "Starting scan"
    );

    let bar = ProgressBar::new(roster.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("[{bar:30.cyan/blue}] {pos}/{len} {wide_msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    let progress: ProgressCallback = {
        let bar = bar.clone();
        Box::new(move |index, subject| {
            bar.set_position(index as u64);
            bar.set_message(subject.uri.clone());
        })
    };

    let mut context = RunContext::new(window, predicates);
    let mut runner = ScanRunner::new(client, supervisor).with_progress(progress);
    let outcome = runner.run(&roster, &mut context).await;
    bar.finish_and_clear();
    let scan = outcome.map_err(RunFailure::fatal)?;

    for subject in &scan.truncated_subjects {
        warn!(subject = %subject, "Results may be truncated for this subject");
    }

    match report {
        Some(mut sink) => {
            sink.write_records(&scan.records)
                .map_err(RunFailure::fatal)?;
            let path = sink.finish().map_err(RunFailure::fatal)?;
            info!(
                records = scan.records.len(),
                path = %path.display(),
                "Report written"
            );
        }
        None => viewer::show(&scan.records, cli.full_detail).map_err(RunFailure::fatal)?,
    }

    print_summary(&scan.summary, &scan.truncated_subjects);
    Ok(())
}

fn print_summary(summary: &RunSummary, truncated: &[String]) {
    eprintln!();
    eprintln!("{}", "=== Scan complete ===".bright_blue().bold());
    eprintln!("{}  {}", "Subjects scanned:".dimmed(), summary.subjects);
    eprintln!("{}  {}", "Sessions fetched:".dimmed(), summary.raw_sessions);
    eprintln!("{}  {}", "Sessions matched:".dimmed(), summary.matched);
    if !truncated.is_empty() {
        eprintln!(
            "{}  {}",
            "Possibly truncated:".dimmed(),
            truncated.len().to_string().bright_yellow()
        );
    }
    eprintln!(
        "{}  {}",
        "Elapsed:".dimmed(),
        format_duration(summary.elapsed)
    );
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsweep_records::MediaCategory;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_file_output_requires_a_path() {
        let result = Cli::try_parse_from([
            "callsweep", "--days", "7", "--category", "audio", "--output", "file",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_viewer_output_needs_no_path() {
        let cli = Cli::try_parse_from([
            "callsweep", "--days", "7", "--category", "audio", "--output", "viewer",
        ])
        .unwrap();
        assert!(matches!(cli.output, OutputChoice::Viewer));
        assert!(cli.out_path.is_none());
    }

    #[test]
    fn test_output_mode_must_be_chosen() {
        let result = Cli::try_parse_from(["callsweep", "--days", "7", "--category", "audio"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_day_count_is_bounded() {
        let absurd = Cli::try_parse_from([
            "callsweep",
            "--days",
            "4294967295",
            "--category",
            "audio",
            "--output",
            "viewer",
        ]);
        assert!(absurd.is_err());

        let zero = Cli::try_parse_from([
            "callsweep",
            "--days",
            "0",
            "--category",
            "audio",
            "--output",
            "viewer",
        ]);
        assert!(zero.is_err());
    }

    #[test]
    fn test_end_bound_parses_rfc3339() {
        let cli = Cli::try_parse_from([
            "callsweep",
            "--days",
            "30",
            "--category",
            "all",
            "--output",
            "viewer",
            "--end",
            "2026-06-01T00:00:00Z",
        ])
        .unwrap();
        assert_eq!(
            cli.end,
            Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_window_counts_back_from_the_end_bound() {
        let end = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let window = TimeWindow::ending_at(end, 30);
        assert_eq!(window.end, end);
        assert_eq!(window.start, Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_category_choice_maps_across() {
        assert_eq!(MediaCategory::from(CategoryChoice::Im), MediaCategory::Im);
        assert_eq!(MediaCategory::from(CategoryChoice::All), MediaCategory::All);
        assert_eq!(
            MediaCategory::from(CategoryChoice::Conference),
            MediaCategory::Conference
        );
    }

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(133)), "2m 13s");
    }
}
