use crate::config::{AppConfig, SourceKind};
use crate::mailer::{Notifier, SmtpSubmission};
use crate::pipeline::Pipeline;
use crate::scheduler::{run_weekly, WeeklySchedule};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod domain;
mod errors;
mod mailer;
mod pipeline;
mod scheduler;
mod sources;
mod spreadsheets;

#[cfg(test)]
mod tests;

/// Weekly property listing report: fetch, flatten, write .xlsx, email.
#[derive(Debug, Parser)]
#[command(name = "listing_report", version)]
struct Cli {
    /// Run the pipeline once and exit (also implied by CI / GITHUB_ACTIONS)
    #[arg(long)]
    once: bool,

    /// Run immediately on start, then follow the schedule
    #[arg(long)]
    run_now: bool,

    /// Listing backend: realtor, url, zpid or scrape
    #[arg(long)]
    source: Option<SourceKind>,

    /// Spreadsheet path [default: zillow_report.xlsx]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Weekly tick, e.g. "mon 08:00"
    #[arg(long)]
    schedule: Option<WeeklySchedule>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if self.once {
            config.one_shot = true;
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if let Some(output) = &self.output {
            config.report_path = output.clone();
        }
        if let Some(schedule) = self.schedule {
            config.schedule = schedule;
        }
    }
}

fn main() -> ExitCode {
    // 1️⃣ Local .env, then logging
    let _ = dotenvy::dotenv();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env).init();

    // 2️⃣ Settings, read once
    let cli = Cli::parse();
    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    let notifier = Notifier::from_config(&config.mail);
    let pipeline = Pipeline::new(&config, &notifier);

    // 3️⃣ One shot under CI, otherwise weekly forever
    if config.one_shot {
        info!("One-shot run");
        run_tick(&pipeline);
        return ExitCode::SUCCESS;
    }

    run_weekly(&config.schedule, cli.run_now, || run_tick(&pipeline));

    ExitCode::SUCCESS
}

fn run_tick(pipeline: &Pipeline<'_, SmtpSubmission>) {
    if let Some(summary) = pipeline.run_configured() {
        info!(
            rows = summary.rows,
            report = ?summary.report,
            emailed = summary.notified,
            "Run complete"
        );
    }
}
