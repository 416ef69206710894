//! Wellness CLI - Command-line interface for the wellness engine
//!
//! Commands:
//! - baseline: Compute a mood baseline from a history file
//! - scan: Scan text for crisis language
//! - select: Pick the next micro-intervention
//! - catalog: Print the built-in intervention catalog
//! - doctor: Diagnose configuration and catalog health

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use wellness_engine::baseline::{BaselineTracker, Window};
use wellness_engine::catalog::{default_catalog, validate_catalog, CATALOG_VERSION};
use wellness_engine::config::EngineConfig;
use wellness_engine::pipeline::parse_history;
use wellness_engine::resources::{escalation_resources, CrisisResource};
use wellness_engine::types::{
    CrisisSignal, InterventionHistory, InterventionModule, MoodEntry, MoodScore,
};
use wellness_engine::{logging, EngineError, ENGINE_VERSION, PRODUCER_NAME};

/// Wellness - mood baselines, crisis scanning and intervention selection
#[derive(Parser)]
#[command(name = "wellness")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Mood baseline and crisis triage engine", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a mood baseline
    Baseline {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Newest entries to include (defaults to the configured window)
        #[arg(long)]
        window: Option<usize>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Scan text for crisis language
    Scan {
        /// Text to scan (reads stdin when omitted)
        text: Option<String>,

        /// Include the crisis resources to display
        #[arg(long)]
        resources: bool,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Select the next micro-intervention
    Select {
        /// Current mood (1-5)
        #[arg(short, long)]
        mood: i64,

        /// Mood history file used for the baseline (JSON array)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Recently used intervention ids, newest first
        #[arg(long, value_delimiter = ',')]
        recent: Vec<String>,

        /// Output format
        #[arg(long, default_value = "json")]
        output_format: OutputFormat,
    },

    /// Print the built-in intervention catalog
    Catalog {
        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Diagnose configuration and catalog health
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one entry per line)
    Ndjson,
    /// JSON array of entries
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_with_level(&cli.log_level);

    match run(cli) {
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

fn run(cli: Cli) -> Result<(), WellnessCliError> {
    let config_path = cli.config;

    match cli.command {
        Commands::Baseline {
            input,
            input_format,
            window,
            output_format,
        } => {
            let config = load_config(config_path.as_deref())?;
            cmd_baseline(&config, &input, input_format, window, output_format)
        }

        Commands::Scan {
            text,
            resources,
            output_format,
        } => {
            let config = load_config(config_path.as_deref())?;
            cmd_scan(&config, text, resources, output_format)
        }

        Commands::Select {
            mood,
            history,
            recent,
            output_format,
        } => {
            let config = load_config(config_path.as_deref())?;
            cmd_select(&config, mood, history.as_deref(), recent, output_format)
        }

        Commands::Catalog { output_format } => cmd_catalog(output_format),

        // Doctor reports a broken config instead of failing on it
        Commands::Doctor { json } => cmd_doctor(config_path.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, WellnessCliError> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_baseline(
    config: &EngineConfig,
    input: &Path,
    input_format: InputFormat,
    window: Option<usize>,
    output_format: OutputFormat,
) -> Result<(), WellnessCliError> {
    let input_data = read_input(input)?;
    let history = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => parse_history(&input_data)?,
    };

    let window = match window {
        Some(n) => Window::last(n)?,
        None => config.window()?,
    };
    let tracker =
        BaselineTracker::new(window).with_trend_sensitivity(config.baseline.trend_sensitivity);

    let baseline = tracker.compute(&history);
    println!("{}", format_output(&baseline, &output_format)?);
    Ok(())
}

#[derive(Serialize)]
struct ScanReport {
    #[serde(flatten)]
    signal: CrisisSignal,
    resources: Vec<&'static CrisisResource>,
}

fn cmd_scan(
    config: &EngineConfig,
    text: Option<String>,
    resources: bool,
    output_format: OutputFormat,
) -> Result<(), WellnessCliError> {
    let text = match text {
        Some(text) => text,
        None => {
            if atty::is(atty::Stream::Stdin) {
                return Err(WellnessCliError::NoInput);
            }
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let signal = config.crisis_scanner().scan(&text);

    let output = if resources {
        let report = ScanReport {
            resources: escalation_resources(&signal),
            signal,
        };
        format_output(&report, &output_format)?
    } else {
        format_output(&signal, &output_format)?
    };

    println!("{}", output);
    Ok(())
}

fn cmd_select(
    config: &EngineConfig,
    mood: i64,
    history: Option<&Path>,
    recent: Vec<String>,
    output_format: OutputFormat,
) -> Result<(), WellnessCliError> {
    let current_mood = MoodScore::new(mood)?;

    let entries = match history {
        Some(path) => parse_history(&read_input(path)?)?,
        None => Vec::new(),
    };
    let baseline = config.baseline_tracker()?.compute(&entries);

    // Only the newest entries count as recent
    let recent = InterventionHistory::from(recent);

    let chosen = config.intervention_selector()?.select(
        default_catalog(),
        current_mood,
        &baseline,
        recent.ids(),
    )?;

    println!("{}", format_output(chosen, &output_format)?);
    Ok(())
}

#[derive(Serialize)]
struct CatalogReport<'a> {
    version: &'static str,
    modules: &'a [InterventionModule],
}

fn cmd_catalog(output_format: OutputFormat) -> Result<(), WellnessCliError> {
    let report = CatalogReport {
        version: CATALOG_VERSION,
        modules: default_catalog(),
    };
    println!("{}", format_output(&report, &output_format)?);
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), WellnessCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    checks.push(match validate_catalog(default_catalog()) {
        Ok(()) => DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Catalog {} ({} modules)",
                CATALOG_VERSION,
                default_catalog().len()
            ),
        },
        Err(e) => DoctorCheck {
            name: "catalog".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    });

    match config_path {
        Some(path) if !path.exists() => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        Some(path) => checks.push(match EngineConfig::load(path) {
            Ok(config) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Config valid ({} extra lexicon terms)",
                    config.lexicon.extra_high_terms.len() + config.lexicon.extra_watch_terms.len()
                ),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using built-in defaults".to_string(),
        }),
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass input as arguments or files)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for piped input)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Wellness Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WellnessCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, WellnessCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_ndjson(input: &str) -> Result<Vec<MoodEntry>, WellnessCliError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line.trim()).map_err(|e| {
                WellnessCliError::ParseError(format!("line {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn format_output<T: Serialize + ?Sized>(
    value: &T,
    format: &OutputFormat,
) -> Result<String, WellnessCliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(value)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
    }
}

// Error handling

#[derive(Debug)]
enum WellnessCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoInput,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for WellnessCliError {
    fn from(e: io::Error) -> Self {
        WellnessCliError::Io(e)
    }
}

impl From<EngineError> for WellnessCliError {
    fn from(e: EngineError) -> Self {
        WellnessCliError::Engine(e)
    }
}

impl From<serde_json::Error> for WellnessCliError {
    fn from(e: serde_json::Error) -> Self {
        WellnessCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<WellnessCliError> for CliError {
    fn from(e: WellnessCliError) -> Self {
        match e {
            WellnessCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            WellnessCliError::Engine(e) => engine_error(e),
            WellnessCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            WellnessCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No text to scan".to_string(),
                hint: Some("Pass the text as an argument or pipe it on stdin".to_string()),
            },
            WellnessCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            WellnessCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be one mood entry object".to_string()),
            },
        }
    }
}

fn engine_error(e: EngineError) -> CliError {
    let (code, hint) = match &e {
        EngineError::InvalidMood(_) => ("INVALID_MOOD", "Mood scores run from 1 to 5"),
        EngineError::InvalidWindow(_) => ("INVALID_WINDOW", "Use a window of at least 1 entry"),
        EngineError::EmptyCatalog | EngineError::InvalidCatalog(_) => {
            ("CATALOG_ERROR", "Run 'wellness doctor' to check the catalog")
        }
        EngineError::ParseError(_) | EngineError::JsonError(_) => {
            ("PARSE_ERROR", "Entries need a mood (1-5) and an RFC 3339 timestamp")
        }
        EngineError::ConfigError(_) => ("CONFIG_ERROR", "Run 'wellness doctor --config <file>'"),
        EngineError::EncodingError(_) => ("ENCODING_ERROR", "Report this as a bug"),
    };
    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
