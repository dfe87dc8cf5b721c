//! Non-fatal findings collected while matching requests against a schema.

use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Something looks off but coverage is still meaningful.
    Warning,
    /// A request or parameter could not be counted.
    Error,
}

/// What a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    /// The audit verb has no HTTP method equivalent.
    UnknownVerb,
    /// No schema path matches the request path.
    PathNotFound,
    /// The schema path exists but not with this method.
    MethodNotFound,
    /// A query parameter is not declared for the endpoint.
    InvalidQueryParam,
    /// A body field is not declared for the endpoint.
    InvalidBodyParam,
    /// A request carried a body the endpoint does not declare.
    UnexpectedBody,
    /// Observed unique hits exceeded the expected count and were clamped.
    CoverageClamped,
}

impl DiagnosticKind {
    /// Default severity for this kind.
    pub fn severity(self) -> Severity {
        match self {
            Self::UnexpectedBody | Self::CoverageClamped => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// A single non-fatal finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the finding.
    pub severity: Severity,
    /// Category of the finding.
    pub kind: DiagnosticKind,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collects diagnostics so callers decide whether to surface or drop them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding with the kind's default severity.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: kind.severity(),
            kind,
            message: message.into(),
        });
    }

    /// Iterate over findings in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of findings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of findings of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
