//! Splitting of an `<issue>` label into issue number and supplement.

use crate::consts;
use crate::tree::normalize_space;

/// Splits an issue label into `(number, suppl)`.
///
/// A bare supplement marker (`"suppl"`) yields supplement `"0"`, matching how
/// SciELO PS labels unnumbered supplements.
pub(crate) fn split_issue(label: &str) -> (String, String) {
    let label = normalize_space(label);
    match consts::SUPPLEMENT_REGEX.captures(&label) {
        Some(captures) => (
            captures.name("number").map(|m| m.as_str().to_string()).unwrap_or_default(),
            captures.name("suppl").map(|m| m.as_str().to_string()).unwrap_or_else(|| "0".to_string()),
        ),
        None => (label, String::new()),
    }
}
