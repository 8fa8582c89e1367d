//! ptrequality CLI: runs the check over a set of Go files forming one package.

mod config;

use clap::Parser as ClapParser;
use ptrequality::analysis::Analyzer;
use ptrequality::diagnostics::{format_compile_error, format_finding, Diagnostic};
use ptrequality::{load_package, CompileError, ConfigError};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Findings were reported, as `go vet` does.
const EXIT_FINDINGS: u8 = 3;
const EXIT_ERROR: u8 = 1;

#[derive(ClapParser)]
#[command(name = "ptrequality", version, about = "Check for comparisons against the address of a newly allocated variable", long_about = ptrequality::DOC)]
struct Cli {
    /// Go source files, all of one package
    #[arg(required_unless_present = "write_config")]
    files: Vec<PathBuf>,

    /// Consider Is and Unwrap methods that may intercept errors.Is [default: config or true]
    #[arg(long, value_name = "BOOL")]
    check_is: Option<bool>,

    /// Read options from this TOML file instead of searching for ptrequality.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Display offending line with N lines of context
    #[arg(short = 'c', value_name = "N", default_value_t = -1, allow_negative_numbers = true)]
    context: i64,

    /// Print findings as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a default ptrequality.toml in the current directory and exit
    #[arg(long)]
    write_config: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read file '{path}': {source}")]
    Read { path: String, source: std::io::Error },
    #[error("{0} already exists, not overwriting")]
    Exists(String),
    #[error("writing {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("{error}")]
    Compile { error: CompileError, source_text: Option<String> },
    #[error("serializing findings: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let color = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    match run(&cli, color) {
        Ok(code) => code,
        Err(CliError::Compile { error, source_text }) => {
            let diag = format_compile_error(&error, source_text.as_deref());
            eprint!("{}", render(&diag, color));
            ExitCode::from(EXIT_ERROR)
        }
        Err(e) => {
            eprintln!("{} {}", paint(RED, "error:", color), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("ptrequality=debug,ptrequality_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

const RED: &str = "31";
const GREEN: &str = "32";
const GREEN_BOLD: &str = "1;32";

/// Wrap `s` in an ANSI SGR sequence when `color` is set.
fn paint(code: &str, s: &str, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    } else {
        s.to_string()
    }
}

fn render(diag: &Diagnostic, color: bool) -> String {
    if color {
        diag.render_ansi()
    } else {
        diag.render_plain()
    }
}

fn run(cli: &Cli, color: bool) -> Result<ExitCode, CliError> {
    if cli.write_config {
        return write_config(color);
    }

    let overrides = config::Overrides { check_is: cli.check_is };
    let (config, config_path) = config::resolve(cli.config.as_deref(), overrides)?;
    if let Some(p) = &config_path {
        info!(path = %p.display(), "using config file");
    }

    let mut sources: Vec<(String, String)> = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let name = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: name.clone(), source })?;
        sources.push((name, text));
    }
    let pairs: Vec<(&str, &str)> = sources.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    let pkg = load_package(&pairs).map_err(|error| {
        let source_text = error
            .file()
            .and_then(|f| sources.iter().find(|(n, _)| n == f))
            .map(|(_, t)| t.clone());
        CliError::Compile { error, source_text }
    })?;

    let findings = Analyzer::new(config).run(&pkg);
    debug!(findings = findings.len(), "analysis done");

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        for finding in &findings {
            let source = sources.iter().find(|(n, _)| *n == finding.file).map(|(_, t)| t.as_str());
            eprint!("{}", render(&format_finding(finding, source, cli.context), color));
        }
        if cli.verbose && findings.is_empty() {
            eprintln!("{} file(s) checked, no findings", paint(GREEN, &sources.len().to_string(), color));
        }
    }

    Ok(if findings.is_empty() { ExitCode::SUCCESS } else { ExitCode::from(EXIT_FINDINGS) })
}

fn write_config(color: bool) -> Result<ExitCode, CliError> {
    let path = PathBuf::from(config::FILE_NAME);
    if path.exists() {
        return Err(CliError::Exists(config::FILE_NAME.to_string()));
    }
    std::fs::write(&path, config::default_template())
        .map_err(|source| CliError::Write { path: config::FILE_NAME.to_string(), source })?;
    println!("{} {}", paint(GREEN_BOLD, "Created", color), config::FILE_NAME);
    Ok(ExitCode::SUCCESS)
}
