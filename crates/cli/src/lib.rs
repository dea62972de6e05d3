use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use response::CommandResponse;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use wtsplit_matrix::threshold_serde::{self, parse_threshold};
use wtsplit_matrix::{
    is_valid_ascending_list, parse_breakpoint_list, split_value_list, BreakpointMatrix, ListStatus,
};
use wtsplit_protocol::{serialize_json, serialize_json_pretty, SuggestRequest};
use wtsplit_session::{
    compute_bounds, BoundDirection, ConfirmedBreakpoints, Effect, NodeMeta, SessionEvent,
    SuggestionSession,
};
use wtsplit_workflow::{
    split_locally, ComputationService, FixedDirectory, HttpComputationService, ServiceConfig,
    SplitContext, Workflow,
};

mod response;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "wtsplit")]
#[command(about = "Split weather-type breakpoint matrices", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print the JSON response
    #[arg(long, global = true)]
    pretty: bool,

    /// Computation service base URL (overrides WTSPLIT_SERVICE_URL)
    #[arg(long, global = true)]
    service_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Split one row of a matrix at manually chosen breakpoints
    Split(SplitArgs),

    /// Ask the computation service for breakpoint candidates
    Suggest(SuggestArgs),

    /// Report the validation status of a comma-separated breakpoint list
    #[command(name = "check-values")]
    CheckValues(CheckValuesArgs),

    /// Search bounds around a confirmed breakpoint
    Bounds(BoundsArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Matrix JSON file (array of `{code, bounds}` rows)
    #[arg(long)]
    matrix: PathBuf,

    /// Row to split
    #[arg(long)]
    row: usize,

    /// Level (predictor index) to split on
    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Comma-separated breakpoints, any order
    #[arg(long)]
    values: String,

    /// Derive codes for the new matrix through the computation service
    #[arg(long, requires = "context")]
    derive_codes: bool,

    /// TOML job file (labels, fields, field ranges, data path)
    #[arg(long)]
    context: Option<PathBuf>,

    /// Write the resulting matrix here as well
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SuggestArgs {
    /// TOML job file (labels, fields, field ranges, data path)
    #[arg(long)]
    context: PathBuf,

    /// Matrix JSON file
    #[arg(long)]
    matrix: PathBuf,

    #[arg(long)]
    row: usize,

    #[arg(long, default_value_t = 0)]
    level: usize,

    /// Number of breakpoints to ask for
    #[arg(long, default_value = "1")]
    count: String,

    /// Lower search bound (`-inf` allowed)
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<String>,

    /// Upper search bound (`inf` allowed)
    #[arg(long, allow_hyphen_values = true)]
    upper: Option<String>,
}

#[derive(Args)]
struct CheckValuesArgs {
    /// Raw list as typed, e.g. "0.5, 1, 2"
    #[arg(allow_hyphen_values = true)]
    values: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Between the previous confirmed value and this one
    Below,
    /// Between this value and the next confirmed one
    Above,
}

impl From<Direction> for BoundDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Below => Self::Below,
            Direction::Above => Self::Above,
        }
    }
}

#[derive(Args)]
struct BoundsArgs {
    /// Confirmed breakpoints, comma-separated
    #[arg(long, allow_hyphen_values = true)]
    confirmed: String,

    /// Position in the ascending confirmed list
    #[arg(long)]
    index: usize,

    #[arg(long, value_enum)]
    direction: Direction,

    /// Predictor name used in the label
    #[arg(long, default_value = "x")]
    field: String,
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let service_config = match &cli.service_url {
        Some(url) => ServiceConfig::with_base_url(url.clone()),
        None => ServiceConfig::from_env(),
    };

    let result = match cli.command {
        Commands::Split(args) => run_split(args, &service_config).await,
        Commands::Suggest(args) => run_suggest(args, &service_config).await,
        Commands::CheckValues(args) => run_check_values(&args),
        Commands::Bounds(args) => run_bounds(&args),
    };

    let response = match result {
        Ok(data) => CommandResponse::ok(data),
        Err(err) => {
            log::error!("{err:#}");
            CommandResponse::from_error(&err)
        }
    };

    let output = if cli.pretty {
        serialize_json_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    print_stdout(&output)?;

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn load_matrix(path: &Path) -> Result<BreakpointMatrix> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read matrix from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid matrix in {}", path.display()))
}

fn load_context(path: &Path) -> Result<SplitContext> {
    SplitContext::load(path).with_context(|| format!("Failed to load job file {}", path.display()))
}

fn http_service(config: &ServiceConfig) -> Result<HttpComputationService> {
    config.validate()?;
    Ok(HttpComputationService::new(config)?)
}

fn node_for(matrix: &BreakpointMatrix, row: usize, level: usize) -> NodeMeta {
    let code = matrix
        .row(row)
        .and_then(|r| r.code.clone())
        .unwrap_or_default();
    NodeMeta::new(row, level, code)
}

async fn run_split(args: SplitArgs, service_config: &ServiceConfig) -> Result<Value> {
    let matrix = load_matrix(&args.matrix)?;
    let node = node_for(&matrix, args.row, args.level);

    let (split, affected) = if args.derive_codes {
        let context_path = args
            .context
            .as_deref()
            .context("--derive-codes needs --context")?;
        let context = load_context(context_path)?;
        context.check_matrix(&matrix)?;

        let mut workflow = Workflow::new(
            http_service(service_config)?,
            FixedDirectory::default(),
            context,
        );
        workflow.open(node)?;
        workflow.set_manual_values(&args.values)?;
        let outcome = workflow.commit(&matrix).await?;
        (outcome.matrix, outcome.affected)
    } else {
        let level_count = matrix.level_count();
        let session = SuggestionSession::default()
            .reduce(SessionEvent::Open { node, level_count })?
            .session
            .reduce(SessionEvent::SetManualValues(args.values.clone()))?
            .session;
        let Effect::Commit(plan) = session.reduce(SessionEvent::Commit)?.effect else {
            anyhow::bail!("Manual values did not produce a split");
        };
        let pending = split_locally(&matrix, &plan)?;
        (pending.matrix, pending.affected)
    };

    if let Some(path) = &args.output {
        fs::write(path, serialize_json_pretty(&split)?)
            .with_context(|| format!("Failed to write matrix to {}", path.display()))?;
        log::info!("Wrote {} rows to {}", split.len(), path.display());
    }

    Ok(json!({
        "matrix": split,
        "affected": [affected.start(), affected.end()],
        "inserted": affected.end() - affected.start(),
    }))
}

fn parse_bound(raw: Option<&str>, name: &str) -> Result<Option<f64>> {
    raw.map(|text| parse_threshold(text).with_context(|| format!("Invalid {name} bound '{text}'")))
        .transpose()
}

async fn run_suggest(args: SuggestArgs, service_config: &ServiceConfig) -> Result<Value> {
    let context = load_context(&args.context)?;
    let matrix = load_matrix(&args.matrix)?;
    context.check_matrix(&matrix)?;

    let row = matrix
        .row(args.row)
        .ok_or(wtsplit_matrix::MatrixError::RowOutOfRange {
            row: args.row,
            rows: matrix.len(),
        })?;
    let predictor = context
        .field(args.level)
        .with_context(|| format!("No field configured for level {}", args.level))?;

    let request = SuggestRequest {
        labels: context.labels.clone(),
        thresholds: row.flat_thresholds(),
        path: context.path.clone(),
        predictor: predictor.to_string(),
        num_breakpoints: wtsplit_matrix::parse_count(&args.count)?,
        cheaper: context.cheaper,
        lower_bound: parse_bound(args.lower.as_deref(), "lower")?,
        upper_bound: parse_bound(args.upper.as_deref(), "upper")?,
    };

    let service = http_service(service_config)?;
    let response = service
        .suggest_breakpoints(&request)
        .await
        .context("Suggestion request failed")?;
    log::info!("Received {} candidate(s)", response.records.len());
    Ok(serde_json::to_value(response)?)
}

#[derive(Serialize)]
struct CheckValuesOutput {
    values: Vec<String>,
    status: ListStatus,
    shows_error: bool,
    ascending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    problem: Option<String>,
}

fn run_check_values(args: &CheckValuesArgs) -> Result<Value> {
    let values = split_value_list(&args.values);
    let status = ListStatus::of(&values);
    let (parsed, problem) = match parse_breakpoint_list(&values) {
        Ok(parsed) => (Some(parsed), None),
        Err(err) => (None, Some(err.to_string())),
    };
    let output = CheckValuesOutput {
        ascending: is_valid_ascending_list(&values),
        shows_error: status.shows_error(),
        values,
        status,
        parsed,
        problem,
    };
    Ok(serde_json::to_value(output)?)
}

#[derive(Serialize)]
struct BoundsOutput {
    #[serde(with = "threshold_serde")]
    lower: f64,
    #[serde(with = "threshold_serde")]
    upper: f64,
    label: String,
    confirmed: ConfirmedBreakpoints,
}

fn run_bounds(args: &BoundsArgs) -> Result<Value> {
    let values = parse_breakpoint_list(&split_value_list(&args.confirmed))?;
    let confirmed: ConfirmedBreakpoints = values.into_iter().collect();
    let bounds = compute_bounds(confirmed.as_slice(), args.index, args.direction.into())?;
    let output = BoundsOutput {
        lower: bounds.lower,
        upper: bounds.upper,
        label: bounds.describe(&args.field),
        confirmed,
    };
    Ok(serde_json::to_value(output)?)
}
