//! Folds audit events into a report's hit counters.

use serde_json::Value;

use crate::audit::{AuditEvent, http_method};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::domain::{Endpoint, Report};
use crate::error::{CoverageError, Result};

/// Generic shape of a deserialized request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyNode {
    /// A JSON object with its fields.
    Object(Vec<(String, BodyNode)>),
    /// A JSON array.
    Array(Vec<BodyNode>),
    /// Any JSON scalar, including `null`.
    Scalar,
}

impl From<Value> for BodyNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            _ => Self::Scalar,
        }
    }
}

/// A dotted body path observed in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyField {
    /// The path is declared by the schema.
    Declared(String),
    /// The path is not declared by the schema.
    Undeclared(String),
}

/// Flatten an observed body into dotted paths rooted at `prefix`.
///
/// A path that is itself a declared leaf is reported once and not descended
/// into. Arrays are walked element by element under their own path.
pub fn flatten_body(node: &BodyNode, prefix: &str, endpoint: &Endpoint) -> Vec<BodyField> {
    let mut fields = Vec::new();
    collect_body_fields(node, prefix, endpoint, &mut fields);
    fields
}

fn collect_body_fields(
    node: &BodyNode,
    path: &str,
    endpoint: &Endpoint,
    fields: &mut Vec<BodyField>,
) {
    if endpoint.params_hits_details.body.contains_key(path) {
        fields.push(BodyField::Declared(path.to_string()));
        return;
    }
    match node {
        BodyNode::Object(children) => {
            for (key, child) in children {
                collect_body_fields(child, &format!("{path}.{key}"), endpoint, fields);
            }
        }
        BodyNode::Array(items) => {
            for item in items {
                collect_body_fields(item, path, endpoint, fields);
            }
        }
        BodyNode::Scalar => fields.push(BodyField::Undeclared(path.to_string())),
    }
}

/// Match one audit event against the report.
///
/// Unknown verbs, paths, methods and parameters are recorded as diagnostics
/// and never abort the run. Malformed request bodies are errors.
pub fn match_event(
    report: &mut Report,
    event: &AuditEvent,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let target = event.request_target();
    let path = event.template_path(&target);

    let Some(method) = http_method(&event.verb) else {
        diagnostics.push(
            DiagnosticKind::UnknownVerb,
            format!("Method not found for verb '{}' on '{path}' path", event.verb),
        );
        return Ok(());
    };

    let Some(methods) = report.endpoints.get_mut(&path) else {
        diagnostics.push(
            DiagnosticKind::PathNotFound,
            format!("Path '{path}' not found in swagger"),
        );
        return Ok(());
    };
    let Some(endpoint) = methods.get_mut(method) else {
        diagnostics.push(
            DiagnosticKind::MethodNotFound,
            format!("Method '{method}' not found for '{path}' path"),
        );
        return Ok(());
    };

    endpoint.method_called = true;
    match_query_params(target.query.iter().map(String::as_str), endpoint, diagnostics);
    if let Some(body) = &event.request_object {
        match_body_params(body.get(), endpoint, diagnostics)?;
    }
    Ok(())
}

/// Count observed query parameters, crediting each declared one on first sight.
pub fn match_query_params<'a>(
    names: impl IntoIterator<Item = &'a str>,
    endpoint: &mut Endpoint,
    diagnostics: &mut Diagnostics,
) {
    for name in names {
        if !endpoint.record_query_hit(name) {
            diagnostics.push(
                DiagnosticKind::InvalidQueryParam,
                format!(
                    "Invalid query param: '{name}' for '{} {}'",
                    endpoint.method, endpoint.path
                ),
            );
        }
    }
}

/// Count observed body fields, crediting each declared leaf on first sight.
pub fn match_body_params(
    raw: &str,
    endpoint: &mut Endpoint,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let root = match endpoint.body_root() {
        Some(root) if !endpoint.params_hits_details.body.is_empty() => root.to_string(),
        _ => {
            diagnostics.push(
                DiagnosticKind::UnexpectedBody,
                format!(
                    "Request '{} {}' should not contain body params",
                    endpoint.method, endpoint.path
                ),
            );
            return Ok(());
        }
    };

    let value: Value = serde_json::from_str(raw).map_err(|source| CoverageError::RequestBody {
        method: endpoint.method.clone(),
        path: endpoint.path.clone(),
        source,
    })?;
    let body = BodyNode::from(value);

    for field in flatten_body(&body, &root, endpoint) {
        match field {
            BodyField::Declared(path) => {
                endpoint.record_body_hit(&path);
            }
            BodyField::Undeclared(path) => diagnostics.push(
                DiagnosticKind::InvalidBodyParam,
                format!(
                    "Invalid body param: '{path}' for '{} {}'",
                    endpoint.method, endpoint.path
                ),
            ),
        }
    }
    Ok(())
}
