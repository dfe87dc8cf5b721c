//! Kubernetes audit log records and their translation into endpoint keys.

use std::collections::BTreeSet;
use std::io::BufRead;

use serde::Deserialize;
use serde_json::value::RawValue;

use crate::error::{CoverageError, Result};

/// The resource an audited request addressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    /// Plural resource type, for example `pods`.
    #[serde(default)]
    pub resource: String,
    /// Namespace of the object, empty for cluster-scoped resources.
    #[serde(default)]
    pub namespace: String,
    /// Object name, empty for collection requests.
    #[serde(default)]
    pub name: String,
    /// Subresource, for example `status`.
    #[serde(default)]
    pub subresource: String,
    /// API group of the resource.
    #[serde(default)]
    pub api_group: String,
    /// API version of the resource.
    #[serde(default)]
    pub api_version: String,
}

/// A single audit log record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Kubernetes verb such as `list` or `create`.
    #[serde(default)]
    pub verb: String,
    /// Request path plus query string.
    #[serde(rename = "requestURI")]
    pub request_uri: String,
    /// Addressed object, if the request targeted a resource.
    pub object_ref: Option<ObjectReference>,
    /// Raw request body.
    pub request_object: Option<Box<RawValue>>,
}

impl AuditEvent {
    /// Parse one JSON record.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    /// Decoded path and query of this request.
    pub fn request_target(&self) -> RequestTarget {
        RequestTarget::parse(&self.request_uri)
    }

    /// Schema-shaped path template of a decoded target of this request.
    pub fn template_path(&self, target: &RequestTarget) -> String {
        match &self.object_ref {
            Some(object_ref) => swagger_path(&target.path, object_ref),
            None => target.path.clone(),
        }
    }
}

/// Streams audit events from a line-oriented reader.
///
/// Blank lines are skipped; the first malformed record ends the stream with an
/// error naming its line.
pub struct AuditLog<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> AuditLog<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }
}

impl<R: BufRead> Iterator for AuditLog<R> {
    type Item = Result<AuditEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(err) => return Some(Err(err.into())),
            }
            let record = self.buffer.trim();
            if record.is_empty() {
                continue;
            }
            return Some(
                AuditEvent::from_json(record).map_err(|source| CoverageError::AuditEvent {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}

/// Decoded path and distinct query parameter names of a request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    /// Percent-decoded path.
    pub path: String,
    /// Distinct, percent-decoded query parameter names.
    pub query: BTreeSet<String>,
}

impl RequestTarget {
    /// Split and decode a request URI.
    ///
    /// Escapes that do not decode to UTF-8 are replaced rather than rejected;
    /// such a path cannot name a schema path and is reported when matched.
    pub fn parse(uri: &str) -> Self {
        let without_fragment = uri.split_once('#').map_or(uri, |(head, _)| head);
        let (raw_path, raw_query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));

        let path = decode_lossy(raw_path);

        let query = raw_query
            .split('&')
            .filter_map(|pair| {
                let key = pair.split_once('=').map_or(pair, |(key, _)| key);
                if key.is_empty() {
                    return None;
                }
                Some(decode_lossy(&key.replace('+', " ")))
            })
            .collect();

        Self { path, query }
    }
}

fn decode_lossy(component: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(component.as_bytes())).into_owned()
}

/// Translate a request path into its schema path template.
///
/// For example
/// `/apis/kubevirt.io/v1alpha3/namespaces/kubevirt-test-default/virtualmachineinstances/vm-name`
/// becomes
/// `/apis/kubevirt.io/v1alpha3/namespaces/{namespace}/virtualmachineinstances/{name}`.
pub fn swagger_path(path: &str, object_ref: &ObjectReference) -> String {
    let mut path = path.to_string();
    if !object_ref.namespace.is_empty() {
        path = replace_segments(
            &path,
            &format!("namespaces/{}", object_ref.namespace),
            "namespaces/{namespace}",
        );
    }
    if !object_ref.name.is_empty() {
        path = replace_segments(
            &path,
            &format!("{}/{}", object_ref.resource, object_ref.name),
            &format!("{}/{{name}}", object_ref.resource),
        );
    }
    path
}

/// Replace the first occurrence of `from` that spans whole path segments.
fn replace_segments(path: &str, from: &str, to: &str) -> String {
    for (start, _) in path.match_indices(from) {
        let end = start + from.len();
        let starts_segment = from.starts_with('/') || start == 0 || path[..start].ends_with('/');
        let ends_segment = end == path.len() || path[end..].starts_with('/');
        if starts_segment && ends_segment {
            return format!("{}{}{}", &path[..start], to, &path[end..]);
        }
    }
    path.to_string()
}

/// Translate an audit verb into the HTTP method it was issued with.
///
/// Audit records do not carry HTTP methods, so unknown verbs yield `None`.
pub fn http_method(verb: &str) -> Option<&'static str> {
    match verb {
        "get" | "list" | "watch" | "watchList" => Some("get"),
        "create" => Some("post"),
        "delete" | "deletecollection" => Some("delete"),
        "update" => Some("put"),
        "patch" => Some("patch"),
        _ => None,
    }
}
