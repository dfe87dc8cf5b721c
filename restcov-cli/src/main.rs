#![deny(missing_docs)]
//! REST API coverage command-line interface.
//!
//! Generates coverage reports from a Swagger document and a Kubernetes audit log.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use restcov_core::{
    Diagnostics, Report, Severity, StdFileSystem, generate_from_files, render_json,
    render_markdown, render_text, report_openapi,
};
use std::path::PathBuf;
use std::time::Instant;

pub(crate) type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser)]
#[command(name = "restcov", version, about = "REST API coverage from audit logs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SourceArgs {
    /// Path to the Swagger (OpenAPI 2.0) JSON document.
    #[arg(long, env = "RESTCOV_SWAGGER_PATH")]
    swagger_path: PathBuf,
    /// Path to the Kubernetes audit log (one JSON event per line).
    #[arg(long, env = "RESTCOV_AUDIT_LOG_PATH")]
    audit_log_path: PathBuf,
    /// Only cover paths starting with this prefix, e.g. /apis/kubevirt.io/v1alpha3/.
    #[arg(long, env = "RESTCOV_FILTER", default_value = "")]
    filter: String,
}

#[derive(Args, Clone)]
struct OutputArgs {
    /// Output format for report data.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Write the report to a file instead of stdout.
    #[arg(long = "output-path")]
    output_path: Option<PathBuf>,
    /// Show coverage for each endpoint in text output.
    #[arg(long)]
    detailed: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a coverage report.
    Report {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the OpenAPI document describing the JSON report.
    Schema {
        /// Write the document to a file instead of stdout.
        #[arg(long = "output-path")]
        output_path: Option<PathBuf>,
    },
}

#[cfg(not(test))]
#[tokio::main]
async fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report { source, output } => run_report(source, output).await?,
        Commands::Schema { output_path } => {
            let contents = report_openapi().to_pretty_json()?;
            emit_output(output_path.as_ref(), contents).await?
        }
    }

    Ok(())
}

#[cfg(test)]
fn main() {}

async fn run_report(source: SourceArgs, output: OutputArgs) -> CliResult<()> {
    let start = Instant::now();
    let (report, diagnostics) = tokio::task::spawn_blocking(move || build_report(source)).await??;

    log_diagnostics(&diagnostics);
    info!(
        "REST API coverage execution time: {:?} ({} diagnostics)",
        start.elapsed(),
        diagnostics.len()
    );

    let contents = render_report(&report, &output)?;
    emit_output(output.output_path.as_ref(), contents).await
}

fn build_report(source: SourceArgs) -> CliResult<(Report, Diagnostics)> {
    let mut diagnostics = Diagnostics::new();
    let report = generate_from_files(
        &StdFileSystem::new(),
        &source.audit_log_path,
        &source.swagger_path,
        &source.filter,
        &mut diagnostics,
    )?;
    Ok((report, diagnostics))
}

fn log_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics.iter() {
        match diagnostic.severity {
            Severity::Error => error!("{diagnostic}"),
            Severity::Warning => warn!("{diagnostic}"),
        }
    }
}

fn render_report(report: &Report, output: &OutputArgs) -> CliResult<String> {
    Ok(match output.format {
        OutputFormat::Text => render_text(report, output.detailed),
        OutputFormat::Json => render_json(report)?,
        OutputFormat::Markdown => render_markdown(report),
    })
}

async fn emit_output(path: Option<&PathBuf>, contents: String) -> CliResult<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, contents).await?;
        }
        None => {
            print!("{contents}");
            if !contents.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
