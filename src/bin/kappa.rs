//! Kappa CLI - Command-line interface for annotator agreement
//!
//! Commands:
//! - compare: Pairwise Cohen's kappa between annotators
//! - normalize: Print one annotator's normalized labels as CSV
//! - dimensions: Print the active dimension set

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use annotator_agreement::{
    render, AgreementConfig, AgreementError, AgreementPipeline, CsvDirectory, DimensionSet,
    NormalizationPolicy, ReportEncoder, AGREEMENT_VERSION,
};
use tracing_subscriber::EnvFilter;

/// Kappa - inter-annotator agreement for emotion ratings
#[derive(Parser)]
#[command(name = "kappa")]
#[command(author = "Synheart AI Inc")]
#[command(version = AGREEMENT_VERSION)]
#[command(about = "Measure pairwise agreement between emotion annotators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare every pair of annotators
    Compare {
        /// Annotator names (defaults to the config list, then every CSV in the data directory)
        annotators: Vec<String>,

        #[command(flatten)]
        common: CommonArgs,

        /// Compare raw ratings instead of normalized labels
        #[arg(long)]
        raw: bool,

        /// Output format (text on a terminal, json otherwise)
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Print one annotator's normalized labels as CSV
    Normalize {
        /// Annotator name
        annotator: String,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print the active dimension set
    Dimensions {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding one <annotator>.csv per annotator
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Comma-separated dimension names, in column order
    #[arg(long, value_delimiter = ',')]
    dimensions: Option<Vec<String>>,

    /// Normalization policy (binary or intensity)
    #[arg(short, long)]
    policy: Option<NormalizationPolicy>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One summary line per annotator pair
    Text,
    /// Compact JSON document
    Json,
    /// Pretty-printed JSON document
    JsonPretty,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), KappaCliError> {
    match cli.command {
        Commands::Compare {
            annotators,
            common,
            raw,
            format,
        } => cmd_compare(annotators, &common, raw, format),
        Commands::Normalize { annotator, common } => cmd_normalize(&annotator, &common),
        Commands::Dimensions { common } => cmd_dimensions(&common),
    }
}

/// File config first, then command-line overrides
fn resolve_config(common: &CommonArgs) -> Result<AgreementConfig, KappaCliError> {
    let mut config = match &common.config {
        Some(path) => AgreementConfig::from_file(path)?,
        None => AgreementConfig::default(),
    };

    if let Some(data_dir) = &common.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(dimensions) = &common.dimensions {
        config.dimensions = DimensionSet::new(dimensions.iter().map(|d| d.trim()))?;
    }
    if let Some(policy) = common.policy {
        config.policy = policy;
    }

    Ok(config)
}

fn cmd_compare(
    annotators: Vec<String>,
    common: &CommonArgs,
    raw: bool,
    format: Option<OutputFormat>,
) -> Result<(), KappaCliError> {
    let mut config = resolve_config(common)?;
    if raw {
        config.use_normalized = false;
    }
    if !annotators.is_empty() {
        config.annotators = annotators;
    }
    config.validate()?;

    let pipeline = AgreementPipeline::from_config(&config);

    let annotators = if config.annotators.is_empty() {
        let found = discover_annotators(&config)?;
        tracing::info!(count = found.len(), dir = %config.data_dir.display(), "discovered annotators");
        found
    } else {
        config.annotators.clone()
    };

    if annotators.len() < 2 {
        return Err(KappaCliError::NotEnoughAnnotators(annotators.len()));
    }

    let reports = pipeline.run(&annotators)?;
    let policy = config.use_normalized.then_some(config.policy);

    let format = format.unwrap_or_else(|| {
        if atty::is(atty::Stream::Stdout) {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    });

    let mut stdout = io::stdout();
    match format {
        OutputFormat::Text => {
            let mut first_error = None;
            for report in &reports {
                match render(report) {
                    Ok(line) => writeln!(stdout, "{}", line)?,
                    Err(e) => {
                        tracing::warn!(left = %report.left, right = %report.right, "{}", e);
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e.into());
            }
        }
        OutputFormat::Json => {
            let encoder = ReportEncoder::new();
            writeln!(stdout, "{}", encoder.encode_to_json(&reports, policy)?)?;
        }
        OutputFormat::JsonPretty => {
            let encoder = ReportEncoder::new();
            writeln!(stdout, "{}", encoder.encode_to_json_pretty(&reports, policy)?)?;
        }
    }

    Ok(())
}

fn discover_annotators(config: &AgreementConfig) -> Result<Vec<String>, KappaCliError> {
    Ok(CsvDirectory::new(&config.data_dir).annotators()?)
}

fn cmd_normalize(annotator: &str, common: &CommonArgs) -> Result<(), KappaCliError> {
    let config = resolve_config(common)?;
    let pipeline = AgreementPipeline::from_config(&config);
    let source = pipeline.load(annotator)?;
    let table = source
        .normalized()
        .ok_or_else(|| AgreementError::NotNormalized(annotator.to_string()))?;

    let mut stdout = io::stdout();
    for i in 0..table.rows() {
        if let Some(row) = table.row(i) {
            let line = row
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            writeln!(stdout, "{}", line)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn cmd_dimensions(common: &CommonArgs) -> Result<(), KappaCliError> {
    let config = resolve_config(common)?;
    let mut stdout = io::stdout();
    for name in config.dimensions.iter() {
        writeln!(stdout, "{}", name)?;
    }
    Ok(())
}

// Error types

#[derive(Debug)]
enum KappaCliError {
    Io(io::Error),
    Agreement(AgreementError),
    NotEnoughAnnotators(usize),
}

impl From<io::Error> for KappaCliError {
    fn from(e: io::Error) -> Self {
        KappaCliError::Io(e)
    }
}

impl From<AgreementError> for KappaCliError {
    fn from(e: AgreementError) -> Self {
        KappaCliError::Agreement(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<KappaCliError> for CliError {
    fn from(e: KappaCliError) -> Self {
        match e {
            KappaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            KappaCliError::NotEnoughAnnotators(count) => CliError {
                code: "NOT_ENOUGH_ANNOTATORS".to_string(),
                message: format!("{} annotator(s) found, at least 2 are required", count),
                hint: Some("Pass annotator names or point --data-dir at the rating files".to_string()),
            },
            KappaCliError::Agreement(e) => {
                let (code, hint) = match &e {
                    AgreementError::Load { .. } => (
                        "LOAD_ERROR",
                        Some("Ratings must be headerless CSV with one column per dimension"),
                    ),
                    AgreementError::Io(_) => ("IO_ERROR", Some("Check file paths and permissions")),
                    AgreementError::Json(_) => ("JSON_ERROR", Some("Check config JSON syntax")),
                    AgreementError::UnknownDimension(_) => {
                        ("UNKNOWN_DIMENSION", Some("Run 'kappa dimensions' to list dimensions"))
                    }
                    AgreementError::InvalidPolicy(_) => {
                        ("INVALID_POLICY", Some("Use 'binary' or 'intensity'"))
                    }
                    AgreementError::NotNormalized(_) => ("NOT_NORMALIZED", None),
                    AgreementError::NoValidDimensions(_, _) => (
                        "NO_VALID_DIMENSIONS",
                        Some("Every dimension was degenerate or below chance; try --format json"),
                    ),
                    AgreementError::RowCountMismatch { .. } => (
                        "ROW_COUNT_MISMATCH",
                        Some("All annotators must rate the same items"),
                    ),
                    AgreementError::DimensionMismatch(_, _) => ("DIMENSION_MISMATCH", None),
                    AgreementError::InvalidConfig(_) => ("INVALID_CONFIG", None),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
        }
    }
}
