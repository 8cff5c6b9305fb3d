//! Insights CLI - Command-line interface for Synheart Insights
//!
//! Commands:
//! - report: Build a full insight report (streaks, goals, top impacts)
//! - streak: Streak and goal state of one habit
//! - impacts: Ranked habit/metric impacts
//! - project: Linear goal projection from raw counts
//! - validate: Validate activity records
//! - schema: Print input formats, habit keys and the metric catalog
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use synheart_insights::calendar::parse_day;
use synheart_insights::input::{InputAdapter, RawActivityRecord, RawMetricSample};
use synheart_insights::metrics::default_catalog;
use synheart_insights::provider::MetricSnapshot;
use synheart_insights::types::{CalendarDay, GoalProjection};
use synheart_insights::{
    ActivityRecord, HabitKey, InsightConfig, InsightEngine, InsightError, Period,
    INSIGHTS_VERSION, PRODUCER_NAME,
};

/// Insights - On-device habit impact and streak analytics
#[derive(Parser)]
#[command(name = "insights")]
#[command(author = "Synheart AI Inc")]
#[command(version = INSIGHTS_VERSION)]
#[command(about = "Correlate wellness habits with biometric data", long_about = None)]
struct Cli {
    /// Enable debug logging (otherwise RUST_LOG is used)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a full insight report
    Report {
        /// Activity records file (use - for stdin)
        #[arg(short, long)]
        records: PathBuf,

        /// Metric samples file
        #[arg(short, long)]
        samples: Option<PathBuf>,

        /// Engine configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Reference day (YYYY-MM-DD), defaults to today in the configured calendar
        #[arg(long)]
        today: Option<String>,

        /// Period used for streak counts and goals
        #[arg(long, default_value = "week")]
        period: PeriodArg,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Streak and goal state of one habit
    Streak {
        /// Activity records file (use - for stdin)
        #[arg(short, long)]
        records: PathBuf,

        /// Habit key (e.g. sauna, cold_plunge, custom_2)
        #[arg(long)]
        habit: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        today: Option<String>,

        #[arg(long, default_value = "week")]
        period: PeriodArg,

        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Ranked habit/metric impacts
    Impacts {
        #[arg(short, long)]
        records: PathBuf,

        #[arg(short, long)]
        samples: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long)]
        today: Option<String>,

        /// Keep only the first N results
        #[arg(long)]
        top: Option<usize>,

        /// Only report improvements
        #[arg(long)]
        improvements_only: bool,

        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Linear goal projection from raw counts
    Project {
        /// Completions so far in the period
        #[arg(long)]
        completed: u32,

        /// Days elapsed in the period (including today)
        #[arg(long)]
        elapsed: u32,

        /// Total days in the period
        #[arg(long)]
        total: u32,

        /// Goal for the period
        #[arg(long)]
        goal: u32,
    },

    /// Validate activity records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print input formats, habit keys and the metric catalog
    Schema,

    /// Diagnose configuration
    Doctor {
        /// Configuration file to check
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Json,
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    Week,
    Month,
    Year,
}

impl From<PeriodArg> for Period {
    fn from(p: PeriodArg) -> Self {
        match p {
            PeriodArg::Week => Period::Week,
            PeriodArg::Month => Period::Month,
            PeriodArg::Year => Period::Year,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), InsightsCliError> {
    match command {
        Commands::Report {
            records,
            samples,
            config,
            today,
            period,
            input_format,
            output_format,
        } => {
            let engine = load_engine(config.as_deref())?;
            let today = resolve_today(&engine, today.as_deref())?;
            let records = load_records(&records, &input_format)?;
            let snapshot = match samples {
                Some(path) => load_snapshot(&path, &input_format)?,
                None => MetricSnapshot::new(),
            };

            let report = engine.report(&records, &snapshot, period.into(), today);
            print_output(&report, &output_format)
        }

        Commands::Streak {
            records,
            habit,
            config,
            today,
            period,
            input_format,
            output_format,
        } => {
            let habit: HabitKey = habit.parse().map_err(InsightsCliError::UnknownHabit)?;
            let engine = load_engine(config.as_deref())?;
            let today = resolve_today(&engine, today.as_deref())?;
            let records = load_records(&records, &input_format)?;

            let summary = engine.habit_summary(&records, &habit, period.into(), today);
            print_output(&summary, &output_format)
        }

        Commands::Impacts {
            records,
            samples,
            config,
            today,
            top,
            improvements_only,
            input_format,
            output_format,
        } => {
            let engine = load_engine(config.as_deref())?;
            let today = resolve_today(&engine, today.as_deref())?;
            let records = load_records(&records, &input_format)?;
            let snapshot = load_snapshot(&samples, &input_format)?;

            let mut habits: Vec<HabitKey> = HabitKey::builtin().to_vec();
            let custom: BTreeSet<HabitKey> = records
                .iter()
                .map(|r| r.habit)
                .filter(HabitKey::is_custom)
                .collect();
            habits.extend(custom);

            let mut ranked = engine.rank_impacts(&habits, &records, &snapshot, today);
            if improvements_only {
                ranked.retain(|r| r.is_improvement);
            }
            if let Some(n) = top {
                ranked.truncate(n);
            }
            print_output(&ranked, &output_format)
        }

        Commands::Project {
            completed,
            elapsed,
            total,
            goal,
        } => {
            let projection = GoalProjection::evaluate(completed, elapsed, total, goal);
            print_output(&projection, &OutputFormat::JsonPretty)
        }

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, &input_format, json),

        Commands::Schema => {
            cmd_schema();
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_validate(input: &Path, input_format: &InputFormat, json: bool) -> Result<(), InsightsCliError> {
    let raw = parse_raw_records(&read_input(input)?, input_format)?;
    let issues = InputAdapter::validate_records(&raw);

    let report = ValidationReport {
        total_records: raw.len(),
        valid_records: raw.len() - issues.len(),
        invalid_records: issues.len(),
        errors: issues
            .into_iter()
            .map(|i| ValidationErrorDetail {
                index: i.index,
                id: i.id.map(|id| id.to_string()),
                error: i.error,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                let id = err.id.as_deref().unwrap_or("(no id)");
                println!("  [{}] {}: {}", err.index, id, err.error);
            }
        }
    }

    if report.invalid_records > 0 {
        Err(InsightsCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema() {
    println!("Activity record (JSON object per record):");
    println!("  - habit: habit key (required)");
    println!("  - timestamp: RFC 3339 date-time (required)");
    println!("  - id: UUID (optional, generated when absent)");
    println!("  - duration_seconds: number (optional)");
    println!("  - source: manual | wearable (optional, default manual)");
    println!();
    println!("Metric sample (JSON object per sample):");
    println!("  - metric: metric key");
    println!("  - date: YYYY-MM-DD");
    println!("  - value: number");
    println!();
    println!("Habit keys:");
    for habit in HabitKey::builtin() {
        println!("  - {}", habit);
    }
    println!("  - custom_0 .. custom_9");
    println!();
    println!("Metrics:");
    for def in default_catalog() {
        println!(
            "  - {} ({}), {:?}, {}-day window",
            def.key.as_str(),
            def.key.unit(),
            def.direction,
            def.window.days()
        );
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), InsightsCliError> {
    let mut checks = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("{} {}", PRODUCER_NAME, INSIGHTS_VERSION),
    });

    match config {
        Some(path) if path.exists() => match fs::read_to_string(path) {
            Ok(content) => match InsightConfig::from_json(&content) {
                Ok(cfg) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Valid configuration: {} metrics, week starts {}, offset {} min",
                        cfg.metrics.len(),
                        cfg.first_weekday,
                        cfg.utc_offset_minutes
                    ),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid configuration: {}", e),
                }),
            },
            Err(e) => checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read configuration file: {}", e),
            }),
        },
        Some(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Configuration file does not exist".to_string(),
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (ready for '-' inputs)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    if json {
        println!("{}", serde_json::to_string_pretty(&checks)?);
    } else {
        println!("Insights Doctor Report");
        println!("======================");
        for check in &checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(InsightsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, InsightsCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_engine(config: Option<&Path>) -> Result<InsightEngine, InsightsCliError> {
    let config = match config {
        Some(path) => InsightConfig::from_json(&fs::read_to_string(path)?)?,
        None => InsightConfig::default(),
    };
    tracing::debug!(?config, "loaded configuration");
    Ok(InsightEngine::new(config)?)
}

fn resolve_today(engine: &InsightEngine, today: Option<&str>) -> Result<CalendarDay, InsightsCliError> {
    match today {
        Some(s) => Ok(parse_day(s)?),
        None => Ok(engine.calendar().today(&Utc::now())),
    }
}

fn parse_raw_records(data: &str, format: &InputFormat) -> Result<Vec<RawActivityRecord>, InsightsCliError> {
    Ok(match format {
        InputFormat::Ndjson => InputAdapter::parse_records_ndjson(data)?,
        InputFormat::Json => InputAdapter::parse_records_array(data)?,
    })
}

fn load_records(path: &Path, format: &InputFormat) -> Result<Vec<ActivityRecord>, InsightsCliError> {
    let raw = parse_raw_records(&read_input(path)?, format)?;
    Ok(InputAdapter::to_records(raw))
}

fn load_snapshot(path: &Path, format: &InputFormat) -> Result<MetricSnapshot, InsightsCliError> {
    let data = read_input(path)?;
    let samples: Vec<RawMetricSample> = match format {
        InputFormat::Ndjson => InputAdapter::parse_samples_ndjson(&data)?,
        InputFormat::Json => InputAdapter::parse_samples_array(&data)?,
    };
    Ok(InputAdapter::to_snapshot(&samples))
}

fn print_output<T: serde::Serialize>(value: &T, format: &OutputFormat) -> Result<(), InsightsCliError> {
    let out = match format {
        OutputFormat::Json => serde_json::to_string(value)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
    };
    println!("{}", out);
    Ok(())
}

// Error types

#[derive(Debug)]
enum InsightsCliError {
    Io(io::Error),
    Insight(InsightError),
    Json(serde_json::Error),
    UnknownHabit(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for InsightsCliError {
    fn from(e: io::Error) -> Self {
        InsightsCliError::Io(e)
    }
}

impl From<InsightError> for InsightsCliError {
    fn from(e: InsightError) -> Self {
        InsightsCliError::Insight(e)
    }
}

impl From<serde_json::Error> for InsightsCliError {
    fn from(e: serde_json::Error) -> Self {
        InsightsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<InsightsCliError> for CliError {
    fn from(e: InsightsCliError) -> Self {
        match e {
            InsightsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            InsightsCliError::Insight(e) => CliError {
                code: "INPUT_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'insights schema' for the expected formats".to_string()),
            },
            InsightsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            InsightsCliError::UnknownHabit(msg) => CliError {
                code: "UNKNOWN_HABIT".to_string(),
                message: msg,
                hint: Some("Run 'insights schema' for the list of habit keys".to_string()),
            },
            InsightsCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            InsightsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    id: Option<String>,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
