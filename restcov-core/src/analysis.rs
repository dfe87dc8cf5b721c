//! Builds the expected-parameter model of every endpoint from a Swagger document.

use crate::domain::{Endpoint, Report};
use crate::swagger::{LocalRef, Parameter, ParameterLocation, Schema, SwaggerDocument};

/// Initialize a report with the expected parameters of every operation whose
/// lower-cased path starts with `filter`.
///
/// An empty filter keeps every endpoint. No hits are recorded.
pub fn analyze_swagger(document: &SwaggerDocument, filter: &str) -> Report {
    let mut report = Report::default();

    for (method, path) in document.operation_method_paths() {
        let normalized_path = path.to_lowercase();
        let normalized_method = method.to_lowercase();
        if !normalized_path.starts_with(filter) {
            continue;
        }

        // Paths differing only in case share one endpoint and each declares its
        // parameters into it, so a repeated name is expected more than once.
        let endpoint = report
            .endpoints
            .entry(normalized_path.clone())
            .or_default()
            .entry(normalized_method.clone())
            .or_insert_with(|| Endpoint::new(normalized_path, normalized_method));

        add_swagger_params(endpoint, &document.params_for(method, path), document);
    }

    report
}

fn add_swagger_params(endpoint: &mut Endpoint, params: &[&Parameter], document: &SwaggerDocument) {
    for param in params {
        match param.location {
            Some(ParameterLocation::Query) => endpoint.declare_query(&param.name),
            Some(ParameterLocation::Body) => {
                let leaves = match &param.schema {
                    Some(schema) => flatten_schema(schema, document, &param.name),
                    None => vec![param.name.clone()],
                };
                endpoint.declare_body(&param.name, leaves);
            }
            _ => continue,
        }
    }
}

/// Resolve a body schema into the dotted leaf paths reachable under `prefix`.
///
/// References resolve against the document's own definitions only; anything
/// else contributes no leaves. The number of leaves is the number of
/// expected body hits the schema adds.
pub fn flatten_schema(schema: &Schema, document: &SwaggerDocument, prefix: &str) -> Vec<String> {
    let mut expanding = Vec::new();
    let mut leaves = Vec::new();
    flatten_into(schema, document, prefix, &mut expanding, &mut leaves);
    leaves
}

fn flatten_into<'a>(
    schema: &'a Schema,
    document: &'a SwaggerDocument,
    prefix: &str,
    expanding: &mut Vec<&'a str>,
    leaves: &mut Vec<String>,
) {
    if !schema.is_reference() {
        flatten_definition(schema, document, prefix, expanding, leaves);
        return;
    }

    let Some(local) = schema.reference.as_deref().and_then(LocalRef::parse) else {
        return;
    };
    if local.section != "definitions" {
        return;
    }
    let Some((name, definition)) = document.definitions.get_key_value(&local.name) else {
        return;
    };
    if expanding.contains(&name.as_str()) {
        // Cycle: stop expanding and count the field itself.
        leaves.push(prefix.to_string());
        return;
    }

    expanding.push(name);
    flatten_definition(definition, document, prefix, expanding, leaves);
    expanding.pop();
}

fn flatten_definition<'a>(
    definition: &'a Schema,
    document: &'a SwaggerDocument,
    prefix: &str,
    expanding: &mut Vec<&'a str>,
    leaves: &mut Vec<String>,
) {
    if definition.properties.is_empty() {
        leaves.push(prefix.to_string());
        return;
    }

    for (field, property) in &definition.properties {
        let child = format!("{prefix}.{field}");
        if property.is_reference() {
            flatten_into(property, document, &child, expanding, leaves);
        } else {
            leaves.push(child);
        }
    }
}
