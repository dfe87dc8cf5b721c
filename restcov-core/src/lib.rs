#![deny(missing_docs)]
//! REST API coverage core library.
//!
//! Measures how thoroughly a Kubernetes audit log exercises the operations and
//! parameters declared in a Swagger document: [`analyze_swagger`] builds the
//! expected model, [`match_event`] folds requests into it, and
//! [`calculate_coverage`] derives percentages.

pub mod analysis;
pub mod audit;
pub mod coverage;
pub mod diagnostics;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fs;
pub mod matcher;
pub mod report;
pub mod swagger;

pub use analysis::{analyze_swagger, flatten_schema};
pub use audit::{AuditEvent, AuditLog, ObjectReference, RequestTarget, http_method, swagger_path};
pub use coverage::calculate_coverage;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use domain::{Endpoint, ParamsHitsDetails, Report};
pub use engine::{generate, generate_from_files};
pub use error::{CoverageError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use matcher::{BodyField, BodyNode, flatten_body, match_event};
pub use report::{ReportApiDoc, render_json, render_markdown, render_text, report_openapi};
pub use swagger::SwaggerDocument;
