// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use qfa_cli::{augment_series, scan_series, ScanOutcome};
use qfa_core::{QfaError, ScanConfig, ScanDiagnostics, SelectorConfig};
use qfa_engine::AugmentedPoint;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use rayon::prelude::*;

struct Cli {
    command: Command,
}

enum Command {
    Scan(ScanArgs),
    Augment(AugmentArgs),
}

#[derive(Debug)]
struct ScanArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    sensitivity: Option<f64>,
    no_bidirectional: bool,
    no_autoscale: bool,
}

impl Default for ScanArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            config: None,
            sensitivity: None,
            no_bidirectional: false,
            no_autoscale: false,
        }
    }
}

#[derive(Debug)]
struct AugmentArgs {
    input_dir: PathBuf,
    output_dir: PathBuf,
    config: Option<PathBuf>,
    anomaly_pct: Option<f64>,
    baseline_pct: Option<f64>,
    sensitivity: Option<f64>,
    workers: Option<usize>,
    no_bidirectional: bool,
    no_autoscale: bool,
}

impl Default for AugmentArgs {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::from("./qfa_augmented_results"),
            config: None,
            anomaly_pct: None,
            baseline_pct: None,
            sensitivity: None,
            workers: None,
            no_bidirectional: false,
            no_autoscale: false,
        }
    }
}

#[derive(Debug)]
enum CliError {
    Qfa(QfaError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Json {
        context: String,
        source: serde_json::Error,
    },
    InvalidInput(String),
}

impl CliError {
    fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Qfa(QfaError::InvalidInput(_)) | Self::InvalidInput(_) => "invalid_input",
            Self::Qfa(QfaError::NumericalIssue(_)) => "numerical_issue",
            Self::Io { .. } => "io_error",
            Self::Json { .. } => "json_error",
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qfa(err) => write!(f, "{err}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Json { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidInput(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Qfa(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<QfaError> for CliError {
    fn from(value: QfaError) -> Self {
        Self::Qfa(value)
    }
}

/// Optional JSON config file: both sections default independently.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct FileConfig {
    scan: ScanConfig,
    selector: SelectorConfig,
}

#[derive(Clone, Debug)]
struct LoadedSeries {
    path: PathBuf,
    time: Vec<f64>,
    flux: Vec<f64>,
    n_nan: usize,
}

impl LoadedSeries {
    fn summary(&self) -> InputSummary {
        InputSummary {
            path: self.path.display().to_string(),
            n: self.time.len(),
            n_nan: self.n_nan,
        }
    }
}

#[derive(Serialize)]
struct InputSummary {
    path: String,
    n: usize,
    n_nan: usize,
}

#[derive(Serialize)]
struct TraceSummary {
    fidelity_min: f64,
    fidelity_min_index: usize,
    fidelity_median: f64,
    coherence_max: f64,
}

#[derive(Serialize)]
struct ScanOutput {
    command: &'static str,
    input: InputSummary,
    config: ScanConfig,
    summary: TraceSummary,
    fidelity: Vec<f64>,
    coherence: Vec<f64>,
    diagnostics: ScanDiagnostics,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: String,
    message: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        emit_structured_error(&err);
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let Some(cli) = parse_cli_from_env()? else {
        return Ok(());
    };

    match cli.command {
        Command::Scan(args) => handle_scan(args),
        Command::Augment(args) => handle_augment(args),
    }
}

fn parse_cli_from_env() -> Result<Option<Cli>, CliError> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        print_root_help();
        return Ok(None);
    }

    if matches!(args[0].as_str(), "-h" | "--help") {
        print_root_help();
        return Ok(None);
    }
    if matches!(args[0].as_str(), "-V" | "--version") {
        print_version();
        return Ok(None);
    }

    let command_name = args[0].clone();
    let rest = &args[1..];

    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-h" | "--help"))
    {
        print_command_help(command_name.as_str())?;
        return Ok(None);
    }
    if rest
        .iter()
        .any(|arg| matches!(arg.as_str(), "-V" | "--version"))
    {
        print_version();
        return Ok(None);
    }

    let command = match command_name.as_str() {
        "scan" => Command::Scan(parse_scan_args(rest)?),
        "augment" => Command::Augment(parse_augment_args(rest)?),
        _ => {
            return Err(CliError::invalid_input(format!(
                "unknown command '{command_name}'; expected one of: scan, augment"
            )));
        }
    };

    Ok(Some(Cli { command }))
}

fn parse_scan_args(tokens: &[String]) -> Result<ScanArgs, CliError> {
    let mut args = ScanArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input = PathBuf::from(raw);
            }
            "--output" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output = Some(PathBuf::from(raw));
            }
            "--config" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.config = Some(PathBuf::from(raw));
            }
            "--sensitivity" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.sensitivity = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--no-bidirectional" => {
                ensure_no_inline_value(flag, inline_value)?;
                args.no_bidirectional = true;
            }
            "--no-autoscale" => {
                ensure_no_inline_value(flag, inline_value)?;
                args.no_autoscale = true;
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown scan option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input.as_os_str().is_empty() {
        return Err(CliError::invalid_input("scan requires --input <path>"));
    }
    Ok(args)
}

fn parse_augment_args(tokens: &[String]) -> Result<AugmentArgs, CliError> {
    let mut args = AugmentArgs::default();
    let mut idx = 0usize;
    while idx < tokens.len() {
        let (flag, inline_value) = split_flag(tokens[idx].as_str())?;
        match flag {
            "--input-dir" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.input_dir = PathBuf::from(raw);
            }
            "--output-dir" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.output_dir = PathBuf::from(raw);
            }
            "--config" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.config = Some(PathBuf::from(raw));
            }
            "--anomaly-pct" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.anomaly_pct = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--baseline-pct" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.baseline_pct = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--sensitivity" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.sensitivity = Some(parse_f64_arg(raw.as_str(), flag)?);
            }
            "--workers" => {
                let raw = take_flag_value(flag, inline_value, tokens, &mut idx)?;
                args.workers = Some(parse_usize_arg(raw.as_str(), flag)?);
            }
            "--no-bidirectional" => {
                ensure_no_inline_value(flag, inline_value)?;
                args.no_bidirectional = true;
            }
            "--no-autoscale" => {
                ensure_no_inline_value(flag, inline_value)?;
                args.no_autoscale = true;
            }
            other => {
                return Err(CliError::invalid_input(format!(
                    "unknown augment option '{other}'"
                )));
            }
        }
        idx += 1;
    }

    if args.input_dir.as_os_str().is_empty() {
        return Err(CliError::invalid_input(
            "augment requires --input-dir <path>",
        ));
    }
    Ok(args)
}

fn split_flag(token: &str) -> Result<(&str, Option<String>), CliError> {
    if !token.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "unexpected positional argument '{token}'; expected --flag value"
        )));
    }
    if let Some((flag, value)) = token.split_once('=') {
        return Ok((flag, Some(value.to_string())));
    }
    Ok((token, None))
}

fn take_flag_value(
    flag: &str,
    inline_value: Option<String>,
    tokens: &[String],
    idx: &mut usize,
) -> Result<String, CliError> {
    if let Some(value) = inline_value {
        return Ok(value);
    }

    *idx += 1;
    let value = tokens
        .get(*idx)
        .ok_or_else(|| CliError::invalid_input(format!("{flag} requires a value")))?;
    if value.starts_with("--") {
        return Err(CliError::invalid_input(format!(
            "{flag} requires a value, but got option '{value}'"
        )));
    }
    Ok(value.clone())
}

fn ensure_no_inline_value(flag: &str, inline_value: Option<String>) -> Result<(), CliError> {
    if inline_value.is_some() {
        return Err(CliError::invalid_input(format!(
            "{flag} does not accept a value"
        )));
    }
    Ok(())
}

fn parse_usize_arg(raw: &str, flag: &str) -> Result<usize, CliError> {
    raw.parse::<usize>().map_err(|_| {
        CliError::invalid_input(format!(
            "{flag} expects a non-negative integer, got '{raw}'"
        ))
    })
}

fn parse_f64_arg(raw: &str, flag: &str) -> Result<f64, CliError> {
    raw.parse::<f64>()
        .map_err(|_| CliError::invalid_input(format!("{flag} expects a number, got '{raw}'")))
}

fn print_version() {
    println!("qfa {}", env!("CARGO_PKG_VERSION"));
}

fn print_root_help() {
    println!(
        "qfa {}\n\nUSAGE:\n  qfa <COMMAND> [OPTIONS]\n\nCOMMANDS:\n  scan      Run the fidelity scan over one flux CSV and emit JSON traces\n  augment   Batch augmented-binning over a directory of flux CSV files\n\nGLOBAL OPTIONS:\n  -h, --help      Show help\n  -V, --version   Show version\n\nRun 'qfa <COMMAND> --help' for subcommand options.",
        env!("CARGO_PKG_VERSION")
    );
}

fn print_command_help(command: &str) -> Result<(), CliError> {
    match command {
        "scan" => {
            println!(
                "USAGE:\n  qfa scan --input <path> [OPTIONS]\n\nOPTIONS:\n  --input <path>          Required flux CSV (columns: time, flux)\n  --output <path>         Write JSON output to file instead of stdout\n  --config <path>         JSON config file overriding scan defaults\n  --sensitivity <float>   Base gain override (default: 0.03)\n  --no-bidirectional      Forward pass only\n  --no-autoscale          Disable the saturating gain map"
            );
            Ok(())
        }
        "augment" => {
            println!(
                "USAGE:\n  qfa augment --input-dir <dir> [OPTIONS]\n\nOPTIONS:\n  --input-dir <dir>       Required directory of flux CSV files\n  --output-dir <dir>      Default: ./qfa_augmented_results\n  --config <path>         JSON config file overriding defaults\n  --anomaly-pct <float>   Detail-point density in percent (default: 5)\n  --baseline-pct <float>  Baseline bin density in percent (default: 15)\n  --sensitivity <float>   Base gain override (default: 0.03)\n  --workers <usize>       Worker threads (default: all cores)\n  --no-bidirectional      Forward pass only\n  --no-autoscale          Disable the saturating gain map"
            );
            Ok(())
        }
        _ => Err(CliError::invalid_input(format!(
            "unknown command '{command}'; expected one of: scan, augment"
        ))),
    }
}

fn load_file_config(path: Option<&Path>) -> Result<FileConfig, CliError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    serde_json::from_str(&raw)
        .map_err(|source| CliError::json(format!("invalid config JSON '{}'", path.display()), source))
}

fn apply_scan_overrides(
    config: &mut ScanConfig,
    sensitivity: Option<f64>,
    no_bidirectional: bool,
    no_autoscale: bool,
) {
    if let Some(sensitivity) = sensitivity {
        config.sensitivity = sensitivity;
    }
    if no_bidirectional {
        config.bidirectional = false;
    }
    if no_autoscale {
        config.gain_autoscaling = false;
    }
}

fn handle_scan(args: ScanArgs) -> Result<(), CliError> {
    let mut config = load_file_config(args.config.as_deref())?.scan;
    apply_scan_overrides(
        &mut config,
        args.sensitivity,
        args.no_bidirectional,
        args.no_autoscale,
    );

    let input = load_series(args.input.as_path())?;
    let outcome = scan_series(&input.time, &input.flux, &config)?;
    let summary = trace_summary(&outcome);

    write_json_output(
        &ScanOutput {
            command: "scan",
            input: input.summary(),
            config,
            summary,
            fidelity: outcome.fidelity,
            coherence: outcome.coherence,
            diagnostics: outcome.diagnostics,
        },
        args.output.as_deref(),
    )
}

fn trace_summary(outcome: &ScanOutcome) -> TraceSummary {
    let (fidelity_min_index, fidelity_min) = outcome
        .fidelity
        .iter()
        .copied()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, f64::NAN));
    let fidelity_median = median(&outcome.fidelity);
    let coherence_max = outcome
        .coherence
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    TraceSummary {
        fidelity_min,
        fidelity_min_index,
        fidelity_median,
        coherence_max,
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) * 0.5
    }
}

fn handle_augment(args: AugmentArgs) -> Result<(), CliError> {
    let file_config = load_file_config(args.config.as_deref())?;
    let mut scan_config = file_config.scan;
    let mut selector_config = file_config.selector;
    apply_scan_overrides(
        &mut scan_config,
        args.sensitivity,
        args.no_bidirectional,
        args.no_autoscale,
    );
    if let Some(pct) = args.anomaly_pct {
        selector_config.anomaly_pct = pct;
    }
    if let Some(pct) = args.baseline_pct {
        selector_config.baseline_pct = pct;
    }
    scan_config.validate().map_err(CliError::from)?;
    selector_config.validate().map_err(CliError::from)?;

    let files = discover_csv_files(args.input_dir.as_path())?;
    if files.is_empty() {
        return Err(CliError::invalid_input(format!(
            "no .csv files found in '{}'",
            args.input_dir.display()
        )));
    }

    fs::create_dir_all(args.output_dir.as_path()).map_err(|source| {
        CliError::io(
            format!("failed to create '{}'", args.output_dir.display()),
            source,
        )
    })?;

    let workers = args.workers.filter(|w| *w > 0);
    let pool = {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = workers {
            builder = builder.num_threads(workers);
        }
        builder
            .build()
            .map_err(|err| CliError::invalid_input(format!("failed to build worker pool: {err}")))?
    };

    log::info!(
        "augmenting {} files from '{}' with {} workers",
        files.len(),
        args.input_dir.display(),
        workers.unwrap_or_else(num_cpus_in_pool),
    );
    let started_at = Instant::now();

    // files are independent; per-file failures are logged, not fatal
    let failures: usize = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                match process_file(path, args.output_dir.as_path(), &scan_config, &selector_config)
                {
                    Ok((n_in, n_out)) => {
                        log::info!(
                            "{}: {} -> {} points",
                            path.display(),
                            n_in,
                            n_out
                        );
                        0usize
                    }
                    Err(err) => {
                        log::error!("failed to process '{}': {err}", path.display());
                        1usize
                    }
                }
            })
            .sum()
    });

    let elapsed = started_at.elapsed();
    log::info!(
        "complete: {} files in {:.2}s ({} failed)",
        files.len(),
        elapsed.as_secs_f64(),
        failures
    );

    if failures == files.len() {
        return Err(CliError::invalid_input(format!(
            "all {} input files failed to process",
            files.len()
        )));
    }
    Ok(())
}

fn num_cpus_in_pool() -> usize {
    rayon::current_num_threads()
}

fn discover_csv_files(dir: &Path) -> Result<Vec<PathBuf>, CliError> {
    let entries = fs::read_dir(dir)
        .map_err(|source| CliError::io(format!("failed to read '{}'", dir.display()), source))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|source| CliError::io(format!("failed to read '{}'", dir.display()), source))?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(path);
        }
    }
    // deterministic processing order regardless of directory iteration
    files.sort();
    Ok(files)
}

fn process_file(
    path: &Path,
    output_dir: &Path,
    scan_config: &ScanConfig,
    selector_config: &SelectorConfig,
) -> Result<(usize, usize), CliError> {
    let input = load_series(path)?;
    let outcome = augment_series(&input.time, &input.flux, scan_config, selector_config)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| CliError::invalid_input(format!("'{}' has no file name", path.display())))?;
    let mut output_name = std::ffi::OsString::from("augmented_");
    output_name.push(file_name);
    let output_path = output_dir.join(output_name);

    write_augmented_csv(&outcome.points, output_path.as_path())?;
    Ok((input.time.len(), outcome.points.len()))
}

fn write_augmented_csv(points: &[AugmentedPoint], path: &Path) -> Result<(), CliError> {
    let mut encoded = String::with_capacity(points.len() * 32 + 17);
    encoded.push_str("time,flux,source\n");
    for point in points {
        encoded.push_str(&format!(
            "{},{},{}\n",
            point.time,
            point.flux,
            point.source.as_u8()
        ));
    }
    fs::write(path, encoded)
        .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
}

fn load_series(path: &Path) -> Result<LoadedSeries, CliError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| CliError::io(format!("failed to read '{}'", path.display()), source))?;
    let (time, flux) = parse_flux_csv(raw.as_str())
        .map_err(|err| CliError::invalid_input(format!("'{}': {err}", path.display())))?;
    let n_nan = flux.iter().filter(|v| v.is_nan()).count();
    Ok(LoadedSeries {
        path: path.to_path_buf(),
        time,
        flux,
        n_nan,
    })
}

/// Parses a two-column (time, flux) CSV.
///
/// A header row is detected by its first cell failing to parse as a number;
/// named `time`/`flux` columns are honored in any order, extra columns are
/// ignored. Without a header exactly two columns are expected. Empty flux
/// cells and literal `nan` parse to NaN (imputed later); empty or
/// non-numeric time cells are an error.
fn parse_flux_csv(raw: &str) -> Result<(Vec<f64>, Vec<f64>), String> {
    let rows: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if rows.is_empty() {
        return Err("file contains no data rows".to_string());
    }

    let first_cells: Vec<&str> = rows[0].split(',').map(str::trim).collect();
    let has_header = first_cells
        .first()
        .map(|cell| cell.parse::<f64>().is_err())
        .unwrap_or(false);

    let (time_col, flux_col, data_rows) = if has_header {
        let lowered: Vec<String> = first_cells.iter().map(|c| c.to_ascii_lowercase()).collect();
        let time_col = lowered
            .iter()
            .position(|c| c == "time")
            .ok_or_else(|| "header row has no 'time' column".to_string())?;
        let flux_col = lowered
            .iter()
            .position(|c| c == "flux")
            .ok_or_else(|| "header row has no 'flux' column".to_string())?;
        (time_col, flux_col, &rows[1..])
    } else {
        if first_cells.len() != 2 {
            return Err(format!(
                "headerless input must have exactly 2 columns, got {}",
                first_cells.len()
            ));
        }
        (0, 1, &rows[..])
    };

    let mut time = Vec::with_capacity(data_rows.len());
    let mut flux = Vec::with_capacity(data_rows.len());
    for (row_idx, row) in data_rows.iter().enumerate() {
        let cells: Vec<&str> = row.split(',').map(str::trim).collect();
        let needed = time_col.max(flux_col);
        if cells.len() <= needed {
            return Err(format!(
                "row {} has {} columns, expected at least {}",
                row_idx + 1,
                cells.len(),
                needed + 1
            ));
        }

        let time_value = cells[time_col]
            .parse::<f64>()
            .map_err(|_| format!("row {}: invalid time '{}'", row_idx + 1, cells[time_col]))?;

        let flux_cell = cells[flux_col];
        let flux_value = if flux_cell.is_empty() {
            f64::NAN
        } else {
            flux_cell
                .parse::<f64>()
                .map_err(|_| format!("row {}: invalid flux '{flux_cell}'", row_idx + 1))?
        };

        time.push(time_value);
        flux.push(flux_value);
    }

    if time.is_empty() {
        return Err("file contains no data rows".to_string());
    }
    Ok((time, flux))
}

fn write_json_output<T: Serialize>(payload: &T, output_path: Option<&Path>) -> Result<(), CliError> {
    let encoded = serde_json::to_string_pretty(payload)
        .map_err(|source| CliError::json("failed to serialize JSON output", source))?;

    if let Some(path) = output_path {
        fs::write(path, format!("{encoded}\n"))
            .map_err(|source| CliError::io(format!("failed to write '{}'", path.display()), source))
    } else {
        println!("{encoded}");
        Ok(())
    }
}

fn emit_structured_error(err: &CliError) {
    let envelope = ErrorEnvelope {
        error: ErrorPayload {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };

    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => eprintln!("{json}"),
        Err(_) => eprintln!(
            "{{\"error\":{{\"code\":\"{}\",\"message\":\"{}\"}}}}",
            err.code(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        parse_augment_args, parse_flux_csv, parse_scan_args, split_flag, CliError, FileConfig,
    };
    use std::path::PathBuf;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_scan_args_accepts_inline_and_separate_values() {
        let args = parse_scan_args(&tokens(&[
            "--input=lightcurve.csv",
            "--sensitivity",
            "0.05",
            "--no-bidirectional",
        ]))
        .expect("scan args should parse");

        assert_eq!(args.input, PathBuf::from("lightcurve.csv"));
        assert_eq!(args.sensitivity, Some(0.05));
        assert!(args.no_bidirectional);
        assert!(!args.no_autoscale);
    }

    #[test]
    fn parse_scan_args_requires_input() {
        let err = parse_scan_args(&tokens(&["--no-autoscale"])).expect_err("must fail");
        assert!(err.to_string().contains("requires --input"));
    }

    #[test]
    fn parse_augment_args_applies_defaults_and_overrides() {
        let args = parse_augment_args(&tokens(&[
            "--input-dir",
            "./curves",
            "--anomaly-pct=7.5",
            "--workers",
            "4",
        ]))
        .expect("augment args should parse");

        assert_eq!(args.input_dir, PathBuf::from("./curves"));
        assert_eq!(args.output_dir, PathBuf::from("./qfa_augmented_results"));
        assert_eq!(args.anomaly_pct, Some(7.5));
        assert_eq!(args.workers, Some(4));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(parse_scan_args(&tokens(&["--frobnicate", "1"])).is_err());
        assert!(parse_augment_args(&tokens(&["--input-dir", "x", "--bogus"])).is_err());
    }

    #[test]
    fn split_flag_rejects_positional_arguments() {
        let err = split_flag("lightcurve.csv").expect_err("positional must fail");
        assert!(matches!(err, CliError::InvalidInput(_)));
    }

    #[test]
    fn parse_flux_csv_with_header_in_any_column_order() {
        let raw = "flux,quality,time\n1.0,0,0.0\n0.5,0,1.0\n";
        let (time, flux) = parse_flux_csv(raw).expect("csv should parse");
        assert_eq!(time, vec![0.0, 1.0]);
        assert_eq!(flux, vec![1.0, 0.5]);
    }

    #[test]
    fn parse_flux_csv_without_header() {
        let raw = "0.0,1.0\n1.0,0.5\n2.0,0.9\n";
        let (time, flux) = parse_flux_csv(raw).expect("csv should parse");
        assert_eq!(time.len(), 3);
        assert_eq!(flux, vec![1.0, 0.5, 0.9]);
    }

    #[test]
    fn parse_flux_csv_tolerates_nan_flux_cells() {
        let raw = "time,flux\n0.0,\n1.0,nan\n2.0,0.9\n";
        let (time, flux) = parse_flux_csv(raw).expect("csv should parse");
        assert_eq!(time.len(), 3);
        assert!(flux[0].is_nan());
        assert!(flux[1].is_nan());
        assert_eq!(flux[2], 0.9);
    }

    #[test]
    fn parse_flux_csv_rejects_missing_columns_and_bad_rows() {
        assert!(parse_flux_csv("time,brightness\n0.0,1.0\n").is_err());
        assert!(parse_flux_csv("").is_err());
        assert!(parse_flux_csv("time,flux\n0.0\n").is_err());
        assert!(parse_flux_csv("0.0,1.0,2.0\n").is_err());
        assert!(parse_flux_csv("time,flux\nabc,1.0\n").is_err());
    }

    #[test]
    fn file_config_defaults_fill_missing_sections() {
        let config: FileConfig =
            serde_json::from_str("{\"selector\":{\"anomaly_pct\":2.5}}").expect("should parse");
        assert_eq!(config.selector.anomaly_pct, 2.5);
        assert_eq!(config.selector.baseline_pct, 15.0);
        assert_eq!(config.scan.sensitivity, 0.03);
    }
}
