//! In-memory model of a Swagger 2.0 document.
//!
//! Only the parts needed to build expected-parameter models are kept:
//! operations per path, their parameters, and local definitions. Everything
//! else in the document is ignored during deserialization.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{CoverageError, Result};

/// HTTP methods a Swagger path item may declare, in enumeration order.
pub const OPERATION_METHODS: [&str; 7] =
    ["get", "put", "post", "delete", "options", "head", "patch"];

/// A parsed Swagger 2.0 document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SwaggerDocument {
    /// Path templates mapped to their operations.
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Named schema definitions addressable by `#/definitions/<name>`.
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,
    /// Shared parameters addressable by `#/parameters/<name>`.
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
}

/// Operations declared for a single path template.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PathItem {
    /// Parameters shared by every operation of the path.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// `GET` operation.
    pub get: Option<Operation>,
    /// `PUT` operation.
    pub put: Option<Operation>,
    /// `POST` operation.
    pub post: Option<Operation>,
    /// `DELETE` operation.
    pub delete: Option<Operation>,
    /// `OPTIONS` operation.
    pub options: Option<Operation>,
    /// `HEAD` operation.
    pub head: Option<Operation>,
    /// `PATCH` operation.
    pub patch: Option<Operation>,
}

impl PathItem {
    /// Look up the operation for a lower-case method name.
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method {
            "get" => self.get.as_ref(),
            "put" => self.put.as_ref(),
            "post" => self.post.as_ref(),
            "delete" => self.delete.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "patch" => self.patch.as_ref(),
            _ => None,
        }
    }
}

/// A single API operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Operation {
    /// Operation-level parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Where a parameter is carried in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    /// Query string parameter.
    Query,
    /// Request body parameter.
    Body,
    /// Templated path segment.
    Path,
    /// Request header.
    Header,
    /// Form field.
    FormData,
    /// Any location this tool does not know about.
    #[serde(other)]
    Other,
}

/// A declared operation parameter, or a reference to a shared one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Parameter {
    /// `$ref` to a shared parameter.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Parameter name.
    #[serde(default)]
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: Option<ParameterLocation>,
    /// Body schema, only meaningful for body parameters.
    pub schema: Option<Schema>,
}

/// A (subset of a) JSON schema object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Schema {
    /// `$ref` to another schema.
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Object properties.
    #[serde(default)]
    pub properties: BTreeMap<String, Schema>,
}

impl Schema {
    /// Whether this schema points elsewhere instead of describing a value.
    pub fn is_reference(&self) -> bool {
        self.reference.as_deref().is_some_and(|value| !value.is_empty())
    }
}

/// A reference that resolves inside the document it appears in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRef {
    /// Top-level section, for example `definitions`.
    pub section: String,
    /// Entry name within the section.
    pub name: String,
}

impl LocalRef {
    /// Parse a `$ref` string such as `#/definitions/Pet`.
    ///
    /// References into other documents return `None`.
    pub fn parse(reference: &str) -> Option<Self> {
        let pointer = reference.strip_prefix('#')?;
        let mut tokens = pointer
            .split('/')
            .skip(1)
            .map(|token| token.replace("~1", "/").replace("~0", "~"));
        let section = tokens.next()?;
        let name = tokens.next()?;
        Some(Self { section, name })
    }
}

impl SwaggerDocument {
    /// Parse a JSON Swagger document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| CoverageError::Schema(err.to_string()))
    }

    /// Enumerate every declared `(method, path)` operation pair.
    pub fn operation_method_paths(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        for (path, item) in &self.paths {
            for method in OPERATION_METHODS {
                if item.operation(method).is_some() {
                    pairs.push((method, path.as_str()));
                }
            }
        }
        pairs
    }

    /// Effective parameters of an operation.
    ///
    /// Path-level parameters are merged with operation parameters; an
    /// operation parameter overrides a path-level one with the same location
    /// and name. Shared parameter references are resolved and unresolvable
    /// ones are dropped.
    pub fn params_for(&self, method: &str, path: &str) -> Vec<&Parameter> {
        let Some(item) = self.paths.get(path) else {
            return Vec::new();
        };
        let operation = item.operation(method);

        let mut merged: BTreeMap<(Option<ParameterLocation>, &str), &Parameter> = BTreeMap::new();
        let declared = item
            .parameters
            .iter()
            .chain(operation.into_iter().flat_map(|op| op.parameters.iter()));
        for param in declared {
            let Some(param) = self.resolve_parameter(param) else {
                continue;
            };
            merged.insert((param.location, param.name.as_str()), param);
        }
        merged.into_values().collect()
    }

    fn resolve_parameter<'a>(&'a self, param: &'a Parameter) -> Option<&'a Parameter> {
        let Some(reference) = param.reference.as_deref().filter(|r| !r.is_empty()) else {
            return Some(param);
        };
        let local = LocalRef::parse(reference)?;
        if local.section != "parameters" {
            return None;
        }
        self.parameters.get(&local.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r##"{
        "swagger": "2.0",
        "info": {"title": "pets", "version": "1.0"},
        "paths": {
            "/pets/{name}": {
                "parameters": [
                    {"name": "name", "in": "path", "required": true, "type": "string"},
                    {"name": "pretty", "in": "query", "type": "string"}
                ],
                "get": {
                    "parameters": [
                        {"name": "pretty", "in": "query", "type": "boolean"},
                        {"$ref": "#/parameters/exact"}
                    ]
                },
                "delete": {}
            },
            "/pets": {
                "post": {
                    "parameters": [
                        {"name": "body", "in": "body", "schema": {"$ref": "#/definitions/Pet"}},
                        {"$ref": "#/parameters/missing"}
                    ]
                }
            }
        },
        "parameters": {
            "exact": {"name": "exact", "in": "query", "type": "boolean"}
        },
        "definitions": {
            "Pet": {"properties": {"name": {"type": "string"}}}
        }
    }"##;

    #[test]
    fn enumerates_operations_in_method_order() {
        let document = SwaggerDocument::from_json(DOCUMENT).expect("parse");
        let pairs = document.operation_method_paths();
        assert_eq!(
            pairs,
            vec![
                ("post", "/pets"),
                ("get", "/pets/{name}"),
                ("delete", "/pets/{name}"),
            ]
        );
    }

    #[test]
    fn merges_path_and_operation_parameters() {
        let document = SwaggerDocument::from_json(DOCUMENT).expect("parse");
        let params = document.params_for("get", "/pets/{name}");
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["exact", "pretty", "name"]);

        let inherited = document.params_for("delete", "/pets/{name}");
        assert_eq!(inherited.len(), 2);
    }

    #[test]
    fn drops_unresolvable_parameter_references() {
        let document = SwaggerDocument::from_json(DOCUMENT).expect("parse");
        let params = document.params_for("post", "/pets");
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].location, Some(ParameterLocation::Body));
        assert!(params[0].schema.as_ref().is_some_and(Schema::is_reference));
    }

    #[test]
    fn unknown_locations_deserialize_as_other() {
        let param: Parameter =
            serde_json::from_str(r#"{"name": "x", "in": "cookie"}"#).expect("parse");
        assert_eq!(param.location, Some(ParameterLocation::Other));
    }

    #[test]
    fn parses_local_references_only() {
        assert_eq!(
            LocalRef::parse("#/definitions/io.k8s~1Pod"),
            Some(LocalRef {
                section: "definitions".to_string(),
                name: "io.k8s/Pod".to_string(),
            })
        );
        assert_eq!(LocalRef::parse("other.json#/definitions/Pet"), None);
        assert_eq!(LocalRef::parse("#/definitions"), None);
    }

    #[test]
    fn rejects_malformed_documents() {
        let error = SwaggerDocument::from_json("{\"paths\": []}").expect_err("invalid");
        assert!(matches!(error, CoverageError::Schema(_)));
    }
}
