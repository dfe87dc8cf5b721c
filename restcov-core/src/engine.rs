//! End-to-end coverage generation.

use std::io::BufRead;
use std::path::Path;

use crate::analysis::analyze_swagger;
use crate::audit::AuditLog;
use crate::coverage::calculate_coverage;
use crate::diagnostics::Diagnostics;
use crate::domain::Report;
use crate::error::Result;
use crate::fs::FileSystem;
use crate::matcher::match_event;
use crate::swagger::SwaggerDocument;

/// Build a coverage report from a Swagger document and an audit log stream.
///
/// `filter` limits the report to paths starting with it, for example
/// `/apis/kubevirt.io/v1alpha3/`; an empty filter keeps everything. Events are
/// matched one at a time in a single pass.
pub fn generate<R: BufRead>(
    document: &SwaggerDocument,
    audit_log: R,
    filter: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Report> {
    let mut report = analyze_swagger(document, filter);
    for event in AuditLog::new(audit_log) {
        match_event(&mut report, &event?, diagnostics)?;
    }
    calculate_coverage(&mut report, diagnostics);
    Ok(report)
}

/// Build a coverage report from files on disk.
pub fn generate_from_files<F: FileSystem>(
    fs: &F,
    audit_log_path: &Path,
    swagger_path: &Path,
    filter: &str,
    diagnostics: &mut Diagnostics,
) -> Result<Report> {
    let audit_log = fs.open_reader(audit_log_path)?;
    let document = SwaggerDocument::from_json(&fs.read_to_string(swagger_path)?)?;
    generate(&document, audit_log, filter, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::error::CoverageError;
    use crate::fs::MockFileSystem;
    use std::io::Cursor;

    const SCHEMA: &str = r#"{
        "paths": {
            "/healthz": {"get": {}},
            "/apis/v1/things": {"get": {"parameters": [{"name": "limit", "in": "query"}]}}
        }
    }"#;

    #[test]
    fn generates_from_mocked_files() {
        let mut fs = MockFileSystem::new();
        fs.expect_open_reader()
            .withf(|path| path.ends_with("audit.log"))
            .times(1)
            .returning(|_| {
                Ok(Box::new(Cursor::new(
                    "{\"verb\":\"get\",\"requestURI\":\"/healthz\"}\n",
                )) as Box<dyn BufRead>)
            });
        fs.expect_read_to_string()
            .withf(|path| path.ends_with("swagger.json"))
            .times(1)
            .returning(|_| Ok(SCHEMA.to_string()));

        let mut diagnostics = Diagnostics::new();
        let report = generate_from_files(
            &fs,
            Path::new("audit.log"),
            Path::new("swagger.json"),
            "",
            &mut diagnostics,
        )
        .expect("report");

        assert_eq!(report.unique_hits, 1);
        assert_eq!(report.expected_unique_hits, 3);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn filter_limits_report_and_reports_unknown_paths() {
        let document = SwaggerDocument::from_json(SCHEMA).expect("schema");
        let log = "{\"verb\":\"get\",\"requestURI\":\"/healthz\"}\n\
                   {\"verb\":\"list\",\"requestURI\":\"/apis/v1/things?limit=1\"}\n";
        let mut diagnostics = Diagnostics::new();

        let report = generate(&document, Cursor::new(log), "/apis/", &mut diagnostics)
            .expect("report");

        assert_eq!(report.endpoints.len(), 1);
        assert_eq!(report.percent, 100.0);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn undecodable_request_paths_are_reported_not_fatal() {
        let document = SwaggerDocument::from_json(SCHEMA).expect("schema");
        let log = "{\"verb\":\"list\",\"requestURI\":\"/apis/v1/things?limit=1\"}\n\
                   {\"verb\":\"get\",\"requestURI\":\"/weird/%FF\"}\n";
        let mut diagnostics = Diagnostics::new();

        let report = generate(&document, Cursor::new(log), "", &mut diagnostics)
            .expect("report");

        let things = report.endpoint("/apis/v1/things", "get").expect("endpoint");
        assert_eq!(things.percent, 100.0);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::PathNotFound), 1);
    }

    #[test]
    fn malformed_records_abort_the_run() {
        let document = SwaggerDocument::from_json(SCHEMA).expect("schema");
        let mut diagnostics = Diagnostics::new();
        let error = generate(&document, Cursor::new("{\"verb\":"), "", &mut diagnostics)
            .expect_err("malformed record");
        assert!(matches!(error, CoverageError::AuditEvent { line: 1, .. }));
    }

    #[test]
    fn missing_schema_file_is_an_error() {
        let mut fs = MockFileSystem::new();
        fs.expect_open_reader()
            .returning(|_| Ok(Box::new(Cursor::new(String::new())) as Box<dyn BufRead>));
        fs.expect_read_to_string().returning(|_| {
            Err(CoverageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "missing",
            )))
        });

        let result = generate_from_files(
            &fs,
            Path::new("audit.log"),
            Path::new("swagger.json"),
            "",
            &mut Diagnostics::new(),
        );
        assert!(matches!(result, Err(CoverageError::Io(_))));
    }
}
