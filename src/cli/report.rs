//! Report command implementation

use crate::cli::audit::{build_analyzer, load_config_with_overrides};
use crate::cli::ReportArgs;
use crate::report::{Report, SlackPoster};

/// Handle `cloudsweep report` command
pub async fn run_report(args: ReportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.run)?;
    crate::logging::init(&config.logging)?;

    // Fail on missing Slack credentials before spending time on the analysis
    let poster = if args.dry_run {
        None
    } else {
        Some(SlackPoster::from_config(&config.report.slack)?)
    };

    let report_config = config.report.clone();
    let analyzer = build_analyzer(config)?;
    let global = analyzer.analyse().await?;
    let report = Report::build(&global, &report_config);

    let Some(poster) = poster else {
        println!("{}", report.to_text());
        return Ok(());
    };

    let summary = poster.post(&report).await?;
    tracing::info!(
        run_id = %report.run_id,
        parents = summary.parents,
        replies_sent = summary.replies_sent,
        replies_failed = summary.replies_failed,
        "Report delivered"
    );
    println!(
        "✓ Report posted: {} sections, {} entries ({} failed)",
        report.sections.len(),
        summary.replies_sent,
        summary.replies_failed
    );

    Ok(())
}
