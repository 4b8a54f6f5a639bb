//! Character allowlist for filter templates.

use crate::error::FilterError;
use crate::types::AllowedFields;
use regex::Regex;

/// The allowlist pattern for one set of field names, built once per set.
fn allowlist(allowed: &AllowedFields) -> Result<&Regex, regex::Error> {
    if let Some(pattern) = allowed.template_pattern.get() {
        return Ok(pattern);
    }
    let pattern = build_allowlist(allowed)?;
    Ok(allowed.template_pattern.get_or_init(|| pattern))
}

/// Field names go first so they win over the single-character classes.
fn build_allowlist(allowed: &AllowedFields) -> Result<Regex, regex::Error> {
    let mut names: Vec<&str> = allowed.iter().collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));

    let mut alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();
    alternatives.push("and".to_string());
    alternatives.push("or".to_string());
    alternatives.push(r"[(){}#0-9\s]".to_string());

    Regex::new(&format!("^(?:{})*$", alternatives.join("|")))
}

/// Reject a template containing anything but allowed field names, `and`,
/// `or`, parentheses, braces, `#`, digits and whitespace.
pub(crate) fn check_template(template: &str, allowed: &AllowedFields) -> Result<(), FilterError> {
    let pattern = allowlist(allowed).map_err(|e| {
        tracing::debug!(error = %e, "template allowlist failed to build");
        FilterError::IllegalTemplate
    })?;

    if pattern.is_match(template) {
        Ok(())
    } else {
        Err(FilterError::IllegalTemplate)
    }
}

/// Whether `{key}` sits right after a column name, as in `tags {tags}`.
///
/// `column` and the suffixed `key` itself both count as the column.
pub(crate) fn placeholder_follows_column(template: &str, key: &str, column: &str) -> bool {
    let placeholder = format!("{{{key}}}");
    template.match_indices(&placeholder).any(|(at, _)| {
        let before = template[..at].trim_end();
        [key, column].into_iter().any(|name| {
            before
                .strip_suffix(name)
                .is_some_and(|rest| !rest.ends_with(|c: char| c.is_ascii_alphanumeric() || c == '_'))
        })
    })
}
