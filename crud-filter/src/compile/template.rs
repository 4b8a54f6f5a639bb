//! Placeholder substitution for templated filters.

use std::collections::HashMap;

use crate::error::CompileError;

/// Replace every `{key}` in `template` with its fragment.
///
/// Text outside braces is copied verbatim. A key with no fragment, a `{`
/// without its `}` and a stray `}` all fail.
pub(super) fn substitute(
    template: &str,
    fragments: &HashMap<&str, String>,
) -> Result<String, CompileError> {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;
    let mut offset = 0usize;

    while let Some(pos) = rest.find(['{', '}']) {
        let (before, tail) = rest.split_at(pos);
        out.push_str(before);
        let brace_at = offset + pos;

        if tail.starts_with('}') {
            return Err(CompileError::UnbalancedBrace { position: brace_at });
        }

        let body = &tail[1..];
        let close = body
            .find(['{', '}'])
            .filter(|i| body[*i..].starts_with('}'))
            .ok_or(CompileError::UnbalancedBrace { position: brace_at })?;
        let key = &body[..close];

        let fragment = fragments
            .get(key)
            .ok_or_else(|| CompileError::UnresolvedPlaceholder {
                placeholder: key.to_string(),
            })?;
        out.push_str(fragment);

        let consumed = pos + 1 + close + 1;
        rest = &rest[consumed..];
        offset += consumed;
    }

    out.push_str(rest);
    Ok(out)
}
