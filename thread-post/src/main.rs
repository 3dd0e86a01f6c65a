//! thread-post - Generate and publish scheduled Bluesky threads
//!
//! Unix-style tool that runs the slots of a posting schedule.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use libthreadcast::config::{resolve_config_path, Config};
use libthreadcast::schedule::normalize_time;
use libthreadcast::{
    DaySummary, Result, Schedule, SlotReport, SlotStatus, ThreadService, ThreadcastError,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "thread-post")]
#[command(version)]
#[command(about = "Generate and publish scheduled Bluesky threads")]
#[command(long_about = "\
thread-post - Generate and publish scheduled Bluesky threads

DESCRIPTION:
    thread-post looks up a slot in the posting schedule, asks the configured
    language-model providers for a 5-7 post thread about the slot's topic and
    publishes it to Bluesky as a reply chain. The slot's image, if any, is
    attached to the first post.

COMMANDS:
    slot <HH:MM>  Publish the thread scheduled at a time of day
    all           Publish every thread scheduled for the day
    preview       Print the schedule (default)

USAGE EXAMPLES:
    # Publish today's 09:00 thread
    thread-post slot 09:00

    # Publish every thread scheduled for a given date
    thread-post all --date 2025-12-09

    # Check the schedule without posting
    thread-post preview

    # JSON output for scripting
    thread-post --format json slot 14:00 | jq '.uri'

CONFIGURATION:
    Configuration file: ~/.config/threadcast/config.toml

    Override with environment variables:
        THREADCAST_CONFIG                - Path to config file
        THREADCAST_BLUESKY_HANDLE        - Bluesky handle
        THREADCAST_BLUESKY_APP_PASSWORD  - Bluesky app password
        THREADCAST_SCHEDULE              - Path to schedule file
        THREADCAST_LOG_FORMAT            - Log format (text, json, pretty)
        THREADCAST_LOG_LEVEL             - Log level (error, warn, info, debug)

EXIT CODES:
    0 - Success (including nothing scheduled)
    1 - Generation or posting failed, or a thread was only partly posted
    2 - Authentication failed
    3 - Invalid input or configuration
")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    #[arg(value_parser = ["text", "json"])]
    format: String,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish the thread scheduled at a time of day
    Slot {
        /// Slot time, HH:MM
        time: String,

        /// Schedule date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Publish every thread scheduled for a day
    All {
        /// Schedule date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Print the schedule without posting
    Preview,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libthreadcast::logging::init_default(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Run the command and return the process exit code
async fn run(cli: Cli) -> Result<i32> {
    let json = cli.format == "json";

    match cli.command.unwrap_or(Commands::Preview) {
        Commands::Slot { time, date } => {
            let time = normalize_time(&time)?;
            let date = parse_date(date.as_deref())?;
            let config = load_config(cli.config, true)?;
            let service = ThreadService::from_config(&config).await?;

            match service.run_slot(date, &time).await? {
                Some(report) => {
                    output_report(&report, json);
                    Ok(if report.is_success() { 0 } else { 1 })
                }
                None => {
                    if json {
                        println!("null");
                    } else {
                        println!("No thread scheduled for {} at {}", date, time);
                    }
                    Ok(0)
                }
            }
        }
        Commands::All { date } => {
            let date = parse_date(date.as_deref())?;
            let config = load_config(cli.config, true)?;
            let service = ThreadService::from_config(&config).await?;

            let reports = service.run_day(date).await;
            let summary = DaySummary::from_reports(&reports);
            output_day(date, &reports, &summary, json);
            Ok(if summary.all_succeeded() { 0 } else { 1 })
        }
        Commands::Preview => {
            let config = load_config(cli.config, false)?;
            let schedule = Schedule::load(&config.paths.schedule_path())?;
            output_preview(&schedule, json)?;
            Ok(0)
        }
    }
}

/// Load configuration, validating credentials only when they will be used
fn load_config(path: Option<PathBuf>, validate: bool) -> Result<Config> {
    let path = match path {
        Some(path) => path,
        None => resolve_config_path()?,
    };

    if validate {
        Config::load_from_path(&path)
    } else {
        Config::read_from_path(&path)
    }
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            ThreadcastError::InvalidInput(format!("Invalid date '{}' (expected YYYY-MM-DD)", s))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

fn output_report(report: &SlotReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: failed to encode report: {}", e),
        }
        return;
    }

    let time = report.time.as_deref().unwrap_or("--:--");
    match report.status {
        SlotStatus::Success => {
            println!("{} posted: {} ({} posts)", time, report.topic, report.posted);
        }
        SlotStatus::Partial => {
            println!(
                "{} partial: {} ({}/{} posts)",
                time, report.topic, report.posted, report.requested
            );
        }
        SlotStatus::Failed => {
            let reason = report
                .reason
                .map(|r| r.to_string())
                .unwrap_or_else(|| "failed".to_string());
            println!("{} failed: {} ({})", time, report.topic, reason);
        }
    }
    if let Some(uri) = &report.uri {
        println!("  {}", uri);
    }
    if let Some(url) = &report.url {
        println!("  View: {}", url);
    }
    if let Some(error) = &report.error {
        println!("  error: {}", error);
    }
}

fn output_day(date: NaiveDate, reports: &[SlotReport], summary: &DaySummary, json: bool) {
    if json {
        let value = serde_json::json!({
            "date": date,
            "summary": summary,
            "reports": reports,
        });
        match serde_json::to_string_pretty(&value) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("Error: failed to encode summary: {}", e),
        }
        return;
    }

    if reports.is_empty() {
        println!("No threads scheduled for {}", date);
        return;
    }

    for report in reports {
        output_report(report, false);
    }
    println!();
    println!(
        "{}: {} threads, {} posted, {} partial, {} failed",
        date, summary.total, summary.succeeded, summary.partial, summary.failed
    );
}

fn output_preview(schedule: &Schedule, json: bool) -> Result<()> {
    if json {
        println!("{}", schedule.to_json_pretty()?);
        return Ok(());
    }

    if schedule.is_empty() {
        println!("Schedule is empty");
        return Ok(());
    }

    for day in schedule.days() {
        println!("Day {} ({}):", day.day, day.date);
        for slot in &day.threads {
            println!("  {}: {}", slot.time, slot.topic);
            if let Some(image) = &slot.image {
                println!("         image: {}", image);
            }
        }
        println!();
    }
    println!(
        "{} days, {} threads",
        schedule.days().len(),
        schedule.total_threads()
    );
    Ok(())
}
