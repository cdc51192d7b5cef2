//! Sanitization of type names into store-safe labels and edge types
//!
//! Type names flow into Cypher as node labels and relationship types,
//! where they cannot be parameterized. Sanitization restricts them to
//! identifier-safe character sets so interpolating them is safe.

/// Placeholder label for an empty entity type.
pub const MISSING_LABEL: &str = "_MISSING_LABEL_";

/// Placeholder edge type for an empty relationship type.
pub const MISSING_REL_TYPE: &str = "_MISSING_REL_TYPE_";

/// Sanitize an entity type for use as a node label.
///
/// Keeps `[A-Za-z0-9_]`, drops everything else, and forces a leading
/// letter or underscore. Empty or fully-invalid input maps to a
/// placeholder rather than failing.
pub fn sanitize_entity_label(label: &str) -> String {
    if label.is_empty() {
        return MISSING_LABEL.to_string();
    }
    let mut out: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if out.is_empty() {
        return MISSING_LABEL.to_string();
    }
    if !out.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        out.insert(0, '_');
    }
    out
}

/// Sanitize a relationship type for use as an edge type.
///
/// Upper-cases, replaces anything outside `[A-Z0-9_]` with `_`, and
/// forces a leading letter or underscore. Empty input maps to a
/// placeholder rather than failing.
pub fn sanitize_relationship_type(rel_type: &str) -> String {
    if rel_type.is_empty() {
        return MISSING_REL_TYPE.to_string();
    }
    let upper = rel_type.to_uppercase();
    let mut out: String = upper
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !out.starts_with(|c: char| c.is_ascii_uppercase() || c == '_') {
        out.insert(0, '_');
    }
    out
}
