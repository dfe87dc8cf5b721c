//! Report formatting utilities.

use std::fmt::Write;

use serde::Serialize;
use utoipa::OpenApi;

use crate::domain::{Endpoint, ParamsHitsDetails, Report};

/// OpenAPI description of the JSON coverage report.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "REST API coverage report",
        description = "Persisted format of coverage reports produced by restcov"
    ),
    components(schemas(Report, Endpoint, ParamsHitsDetails))
)]
pub struct ReportApiDoc;

/// Build the OpenAPI document describing the JSON report.
pub fn report_openapi() -> utoipa::openapi::OpenApi {
    ReportApiDoc::openapi()
}

/// Render a report as a plain-text summary.
///
/// When `detailed`, every path is listed with the coverage of each method.
pub fn render_text(report: &Report, detailed: bool) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "\nREST API coverage report:\n");
    if detailed {
        for (path, methods) in &report.endpoints {
            let _ = writeln!(output, "{path}");
            let line: Vec<String> = methods
                .values()
                .map(|endpoint| {
                    format!("{}:{:.2}%", endpoint.method.to_uppercase(), endpoint.percent)
                })
                .collect();
            let _ = writeln!(output, "{}\n", line.join("\t"));
        }
    }
    let _ = writeln!(output, "Total coverage: {:.2}%", report.percent);
    output
}

/// Render a report as Markdown.
pub fn render_markdown(report: &Report) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# REST API Coverage Report\n");
    let _ = writeln!(
        output,
        "- Total coverage: {:.2}% ({}/{})\n",
        report.percent, report.unique_hits, report.expected_unique_hits
    );

    if report.endpoints.is_empty() {
        let _ = writeln!(output, "No endpoints analyzed.");
        return output;
    }

    for (path, methods) in &report.endpoints {
        let _ = writeln!(output, "## `{path}`\n");
        for endpoint in methods.values() {
            append_endpoint(&mut output, endpoint);
        }
        let _ = writeln!(output);
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_endpoint(output: &mut String, endpoint: &Endpoint) {
    let called = if endpoint.method_called { "" } else { " (never called)" };
    let _ = writeln!(
        output,
        "- {}: {:.2}% ({}/{}){called}",
        endpoint.method.to_uppercase(),
        endpoint.percent,
        endpoint.unique_hits,
        endpoint.expected_unique_hits
    );
    let missing: Vec<&str> = endpoint
        .params_hits_details
        .query
        .iter()
        .chain(&endpoint.params_hits_details.body)
        .filter(|(_, hits)| **hits == 0)
        .map(|(name, _)| name.as_str())
        .collect();
    if !missing.is_empty() {
        let _ = writeln!(output, "  - Missing: {}", missing.join(", "));
    }
}
