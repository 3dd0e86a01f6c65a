//! thread-setup - Write a starter schedule and configuration for Threadcast

use chrono::{Local, NaiveDate};
use clap::Parser;
use libthreadcast::config::{expand_path, Config};
use libthreadcast::{ConfigError, Result, Schedule, ScheduleError, ThreadcastError};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "thread-setup")]
#[command(version)]
#[command(about = "Write a starter schedule and configuration for Threadcast")]
#[command(long_about = "\
thread-setup - Write a starter schedule and configuration for Threadcast

DESCRIPTION:
    Creates schedule.json with three threads a day (09:00, 14:00, 19:00) on
    sample topics, and a config.toml pointing at it with placeholder
    credentials. Edit both before running thread-post.

USAGE EXAMPLES:
    # Seven days starting today, in ~/.config/threadcast
    thread-setup

    # Two weeks from a given date into the current directory
    thread-setup --start-date 2025-12-09 --days 14 --dir .

    # Replace existing files
    thread-setup --force

EXIT CODES:
    0 - Success
    1 - Files could not be written
    2 - Invalid arguments (e.g. --days outside 1-3650)
    3 - Invalid input, or files exist and --force was not given
")]
struct Cli {
    /// First day of the schedule (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE")]
    start_date: Option<String>,

    /// Number of days to schedule (1-3650)
    #[arg(long, default_value = "7", value_name = "N")]
    #[arg(value_parser = clap::value_parser!(u32).range(1..=3650))]
    days: u32,

    /// Directory for schedule.json and config.toml
    #[arg(long, value_name = "PATH")]
    dir: Option<String>,

    /// Overwrite existing files
    #[arg(long)]
    force: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    libthreadcast::logging::init_default(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(match &e {
            ThreadcastError::Config(ConfigError::WriteError(_))
            | ThreadcastError::Schedule(ScheduleError::WriteError(_)) => 1,
            _ => e.exit_code(),
        });
    }
}

fn run(cli: &Cli) -> Result<()> {
    let start = parse_start_date(cli.start_date.as_deref())?;
    let dir = output_dir(cli.dir.as_deref())?;
    let schedule = Schedule::sample(start, cli.days)?;

    let schedule_path = dir.join("schedule.json");
    let config_path = dir.join("config.toml");
    if !cli.force {
        refuse_overwrite(&schedule_path)?;
        refuse_overwrite(&config_path)?;
    }

    schedule.save(&schedule_path)?;
    tracing::info!("Wrote {}", schedule_path.display());

    let config = Config::sample(&schedule_path.to_string_lossy());
    config.save_to_path(&config_path)?;
    tracing::info!("Wrote {}", config_path.display());

    print_summary(&schedule, &schedule_path, &config_path);
    Ok(())
}

fn parse_start_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            ThreadcastError::InvalidInput(format!("Invalid date '{}' (expected YYYY-MM-DD)", s))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

fn output_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(expand_path(dir)),
        None => dirs::config_dir()
            .map(|d| d.join("threadcast"))
            .ok_or_else(|| {
                ThreadcastError::InvalidInput(
                    "Could not determine config directory, pass --dir".to_string(),
                )
            }),
    }
}

fn refuse_overwrite(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ThreadcastError::InvalidInput(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    Ok(())
}

fn print_summary(schedule: &Schedule, schedule_path: &Path, config_path: &Path) {
    let days = schedule.days();

    println!("Schedule saved: {}", schedule_path.display());
    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        println!(
            "  {} days, {} threads, {} to {}",
            days.len(),
            schedule.total_threads(),
            first.date,
            last.date
        );
    }
    println!();

    for day in days.iter().take(2) {
        println!("Day {} ({}):", day.day, day.date);
        for slot in &day.threads {
            println!("  {}: {}", slot.time, slot.topic);
        }
    }
    if days.len() > 2 {
        println!("  ... ({} more days)", days.len() - 2);
    }
    println!();

    println!("Config saved: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Add your Bluesky handle and app password to {}", config_path.display());
    println!("  2. Add your Groq and/or Gemini API keys");
    println!("  3. Adjust topics in {} if you like", schedule_path.display());
    println!("  4. Check the schedule: thread-post --config {} preview", config_path.display());
}
