//! Turns accumulated hit counts into coverage percentages.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::domain::{Endpoint, Report};

/// Populate endpoint and report percentages.
///
/// Unique hits are recounted from the hit details plus one for a called
/// endpoint, so calling this again on the same report, or on one reloaded
/// from JSON, changes nothing. Unique hits above the expected count are
/// clamped and reported; the report's expected counts are then inconsistent
/// with its hit details.
pub fn calculate_coverage(report: &mut Report, diagnostics: &mut Diagnostics) {
    let mut unique_hits = 0;
    let mut expected_unique_hits = 0;

    for endpoint in report.endpoints.values_mut().flat_map(|methods| methods.values_mut()) {
        finalize_endpoint(endpoint, diagnostics);
        if endpoint.expected_unique_hits > 0 {
            unique_hits += endpoint.unique_hits;
            expected_unique_hits += endpoint.expected_unique_hits;
        }
    }

    report.unique_hits = unique_hits;
    report.expected_unique_hits = expected_unique_hits;
    report.percent = percent(unique_hits, expected_unique_hits);
}

fn finalize_endpoint(endpoint: &mut Endpoint, diagnostics: &mut Diagnostics) {
    let details = &endpoint.params_hits_details;
    let observed = details
        .query
        .values()
        .chain(details.body.values())
        .filter(|hits| **hits > 0)
        .count() as u64;
    endpoint.unique_hits = observed + u64::from(endpoint.method_called);

    if endpoint.unique_hits > endpoint.expected_unique_hits {
        diagnostics.push(
            DiagnosticKind::CoverageClamped,
            format!(
                "Unique hits {} exceed expected {} for '{} {}'",
                endpoint.unique_hits, endpoint.expected_unique_hits, endpoint.method, endpoint.path
            ),
        );
        endpoint.unique_hits = endpoint.expected_unique_hits;
    }

    endpoint.percent = percent(endpoint.unique_hits, endpoint.expected_unique_hits);
}

fn percent(hits: u64, expected: u64) -> f64 {
    if expected == 0 {
        return 0.0;
    }
    hits as f64 * 100.0 / expected as f64
}
