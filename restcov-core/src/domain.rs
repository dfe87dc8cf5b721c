//! Coverage report entities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-location hit counts for an endpoint's declared parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParamsHitsDetails {
    /// Declared query parameters.
    pub query: BTreeMap<String, u64>,
    /// Declared leaf body-field paths.
    pub body: BTreeMap<String, u64>,
}

/// Expected and observed coverage of one `(path, method)` pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Hit counts of every addressable parameter.
    pub params_hits_details: ParamsHitsDetails,
    /// Distinct parameters observed, plus the invocation once aggregated.
    pub unique_hits: u64,
    /// Addressable parameters plus one for the invocation.
    pub expected_unique_hits: u64,
    /// `unique_hits` as a percentage of `expected_unique_hits`.
    pub percent: f64,
    /// Whether any request reached this endpoint.
    pub method_called: bool,
    /// Lower-case path template.
    pub path: String,
    /// Lower-case HTTP method.
    pub method: String,
    #[serde(skip)]
    pub(crate) body_root: Option<String>,
}

impl Endpoint {
    /// Create an endpoint expecting only the bare invocation.
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            expected_unique_hits: 1,
            ..Self::default()
        }
    }

    /// Name under which request bodies for this endpoint are flattened.
    pub fn body_root(&self) -> Option<&str> {
        self.body_root.as_deref()
    }

    /// Declare a query parameter.
    pub fn declare_query(&mut self, name: &str) {
        self.params_hits_details.query.insert(name.to_string(), 0);
        self.expected_unique_hits += 1;
    }

    /// Declare the leaf paths resolved from a body parameter named `root`.
    pub fn declare_body(&mut self, root: &str, leaves: Vec<String>) {
        self.body_root = Some(root.to_string());
        self.expected_unique_hits += leaves.len() as u64;
        for leaf in leaves {
            self.params_hits_details.body.insert(leaf, 0);
        }
    }

    /// Record an observed query parameter, returning false if it is not declared.
    pub fn record_query_hit(&mut self, name: &str) -> bool {
        record_hit(
            &mut self.params_hits_details.query,
            &mut self.unique_hits,
            name,
        )
    }

    /// Record an observed body leaf, returning false if it is not declared.
    pub fn record_body_hit(&mut self, path: &str) -> bool {
        record_hit(
            &mut self.params_hits_details.body,
            &mut self.unique_hits,
            path,
        )
    }
}

fn record_hit(counts: &mut BTreeMap<String, u64>, unique_hits: &mut u64, key: &str) -> bool {
    let Some(hits) = counts.get_mut(key) else {
        return false;
    };
    if *hits == 0 {
        *unique_hits += 1;
    }
    *hits += 1;
    true
}

/// REST API coverage report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Sum of endpoint unique hits.
    pub unique_hits: u64,
    /// Sum of endpoint expected unique hits.
    pub expected_unique_hits: u64,
    /// Whole-report coverage percentage.
    pub percent: f64,
    /// Endpoint coverage keyed by path template, then method.
    pub endpoints: BTreeMap<String, BTreeMap<String, Endpoint>>,
}

impl Report {
    /// Look up an endpoint.
    pub fn endpoint(&self, path: &str, method: &str) -> Option<&Endpoint> {
        self.endpoints.get(path)?.get(method)
    }

    /// Look up an endpoint for mutation.
    pub fn endpoint_mut(&mut self, path: &str, method: &str) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(path)?.get_mut(method)
    }

    /// Iterate over every endpoint in path, then method order.
    pub fn iter_endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values().flat_map(|methods| methods.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_hits_credit_first_observation_only() {
        let mut endpoint = Endpoint::new("/pets", "get");
        endpoint.declare_query("limit");
        assert_eq!(endpoint.expected_unique_hits, 2);
        assert_eq!(endpoint.unique_hits, 0);

        assert!(endpoint.record_query_hit("limit"));
        assert!(endpoint.record_query_hit("limit"));
        assert!(endpoint.record_query_hit("limit"));

        assert_eq!(endpoint.unique_hits, 1);
        assert_eq!(endpoint.params_hits_details.query["limit"], 3);
    }

    #[test]
    fn undeclared_hits_do_not_mutate_keys() {
        let mut endpoint = Endpoint::new("/pets", "post");
        endpoint.declare_body("body", vec!["body.name".to_string()]);

        assert!(!endpoint.record_body_hit("body.color"));
        assert!(!endpoint.record_query_hit("watch"));

        assert_eq!(endpoint.unique_hits, 0);
        assert_eq!(endpoint.params_hits_details.body.len(), 1);
        assert!(endpoint.params_hits_details.query.is_empty());
        assert_eq!(endpoint.body_root(), Some("body"));
    }

    #[test]
    fn serializes_persisted_field_names() {
        let mut report = Report::default();
        report
            .endpoints
            .entry("/pets".to_string())
            .or_default()
            .insert("get".to_string(), Endpoint::new("/pets", "get"));

        let value = serde_json::to_value(&report).expect("serialize");
        assert!(value.get("uniqueHits").is_some());
        assert!(value.get("expectedUniqueHits").is_some());
        assert!(value.get("percent").is_some());

        let endpoint = &value["endpoints"]["/pets"]["get"];
        assert!(endpoint["paramsHitsDetails"]["query"].is_object());
        assert!(endpoint["paramsHitsDetails"]["body"].is_object());
        assert_eq!(endpoint["expectedUniqueHits"], 1);
        assert_eq!(endpoint["methodCalled"], false);
        assert_eq!(endpoint["path"], "/pets");
        assert_eq!(endpoint["method"], "get");
        assert!(endpoint.get("bodyRoot").is_none());
    }

    #[test]
    fn report_looks_up_endpoints() {
        let mut report = Report::default();
        report
            .endpoints
            .entry("/pets".to_string())
            .or_default()
            .insert("post".to_string(), Endpoint::new("/pets", "post"));

        assert!(report.endpoint("/pets", "post").is_some());
        assert!(report.endpoint("/pets", "get").is_none());
        assert!(report.endpoint("/owners", "post").is_none());
        report
            .endpoint_mut("/pets", "post")
            .expect("endpoint")
            .method_called = true;
        assert_eq!(report.iter_endpoints().filter(|e| e.method_called).count(), 1);
    }
}
