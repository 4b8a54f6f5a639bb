//! Column name checks.

/// Longest identifier accepted (the `PostgreSQL` limit).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Whether `s` can be spliced into SQL as a bare column or table name.
///
/// ASCII letter or underscore first, then ASCII letters, digits and
/// underscores, at most 63 bytes.
///
/// ```
/// use crud_filter::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("created_at"));
/// assert!(is_valid_sql_identifier("_rev2"));
/// assert!(!is_valid_sql_identifier("2fa"));
/// assert!(!is_valid_sql_identifier("name desc"));
/// assert!(!is_valid_sql_identifier("id;--"));
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) if bytes.len() <= MAX_IDENTIFIER_LENGTH => {
            (first.is_ascii_alphabetic() || *first == b'_')
                && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'_')
        },
        _ => false,
    }
}

/// Panic unless `s` is a valid identifier.
///
/// For names written in code (tables, fixed column lists), never for
/// client input: validators report bad client names as errors instead.
///
/// ```should_panic
/// use crud_filter::assert_valid_sql_identifier;
///
/// assert_valid_sql_identifier("users; DROP TABLE users", "table");
/// ```
#[inline]
pub fn assert_valid_sql_identifier(s: &str, context: &str) {
    assert!(
        is_valid_sql_identifier(s),
        "Invalid SQL {context} name '{s}': must start with letter/underscore, \
         contain only ASCII alphanumeric/underscore, and be 1-63 chars"
    );
}
