//! Page descriptor validation.

use miniserde::json::Value as JsonValue;

use crate::builder::QueryBuilder;
use crate::error::{Coded, PageError};
use crate::limits::Limits;
use crate::types::{PageDescriptor, Scalar};

/// Parse a `[page_number, page_size]` descriptor under the process limits.
///
/// ```
/// use crud_filter::{json, parse_page, validate_page};
///
/// let page = parse_page(&json::from_str(r#"[3, "20"]"#).unwrap()).unwrap();
/// assert_eq!(page.offset(), 40);
///
/// assert!(validate_page(&json::from_str("[1, 1000]").unwrap()).is_ok());
/// assert!(validate_page(&json::from_str("[1, 1001]").unwrap()).is_err());
/// ```
pub fn parse_page(raw: &JsonValue) -> Result<PageDescriptor, PageError> {
    PageDescriptor::from_json(raw, &Limits::from_env())
}

/// Validate a page descriptor under the process limits.
pub fn validate_page(raw: &JsonValue) -> Result<(), PageError> {
    parse_page(raw).map(drop)
}

/// Hand the page window to the builder.
pub fn apply_page<B: QueryBuilder + ?Sized>(page: PageDescriptor, builder: &mut B) {
    builder.limit_offset(page.size, page.offset());
}

impl PageDescriptor {
    /// Parse a page descriptor under explicit limits.
    ///
    /// Both members must be positive integers; numeric strings count.
    pub fn from_json(raw: &JsonValue, limits: &Limits) -> Result<Self, PageError> {
        let page = match raw {
            JsonValue::Array(items) => match items.as_slice() {
                [number, size] => positive(number).zip(positive(size)),
                _ => None,
            },
            _ => None,
        }
        .ok_or(PageError::Malformed);

        page.and_then(|(number, size)| {
            let max = limits.page_size_limit();
            if size > u64::from(max) {
                return Err(PageError::PageSizeTooLarge { max });
            }
            Ok(Self {
                number: u32::try_from(number).map_err(|_| PageError::Malformed)?,
                size: u32::try_from(size).map_err(|_| PageError::Malformed)?,
            })
        })
        .inspect_err(|err| tracing::debug!(code = %err.code(), error = %err, "page rejected"))
    }
}

/// A positive integer, from a JSON number or numeric string.
fn positive(raw: &JsonValue) -> Option<u64> {
    match Scalar::from_json(raw)?.to_number()? {
        Scalar::Int(i) => u64::try_from(i).ok().filter(|n| *n > 0),
        Scalar::Float(f) if f.fract() == 0.0 && f >= 1.0 && f < u64::MAX as f64 => Some(f as u64),
        Scalar::Float(_) | Scalar::String(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::QueryPlan;

    fn json(s: &str) -> JsonValue {
        miniserde::json::from_str(s).unwrap()
    }

    fn page(s: &str) -> Result<PageDescriptor, PageError> {
        PageDescriptor::from_json(&json(s), &Limits::new())
    }

    #[test]
    fn test_page_size_bound() {
        assert_eq!(page("[1, 1000]"), Ok(PageDescriptor { number: 1, size: 1000 }));
        assert_eq!(
            page("[1, 1001]"),
            Err(PageError::PageSizeTooLarge { max: 1000 })
        );
    }

    #[test]
    fn test_numeric_strings_accepted() {
        assert_eq!(page(r#"["2", "50"]"#), Ok(PageDescriptor { number: 2, size: 50 }));
        assert_eq!(page("[2.0, 10]"), Ok(PageDescriptor { number: 2, size: 10 }));
    }

    #[test]
    fn test_malformed_pages() {
        for raw in [
            "[]",
            "[1]",
            "[1, 2, 3]",
            r#"{"page": 1, "size": 10}"#,
            r#"["a", 10]"#,
            "[0, 10]",
            "[1, 0]",
            "[-1, 10]",
            "[1.5, 10]",
            "[1, null]",
            "null",
        ] {
            assert_eq!(page(raw), Err(PageError::Malformed), "{raw}");
        }
    }

    #[test]
    fn test_huge_page_size_reports_limit() {
        assert_eq!(
            page("[1, 5000000000]"),
            Err(PageError::PageSizeTooLarge { max: 1000 })
        );
    }

    #[test]
    fn test_custom_limit() {
        let limits = Limits::new().max_page_size(50);
        assert_eq!(
            PageDescriptor::from_json(&json("[1, 51]"), &limits),
            Err(PageError::PageSizeTooLarge { max: 50 })
        );
    }

    #[test]
    fn test_apply_page() {
        let mut plan = QueryPlan::default();
        apply_page(PageDescriptor { number: 3, size: 25 }, &mut plan);
        assert_eq!(plan.limit, Some(25));
        assert_eq!(plan.offset, Some(50));
    }

    #[test]
    fn test_last_page_number_offset() {
        let page = page(&format!("[{}, 1000]", u32::MAX)).unwrap();
        let mut plan = QueryPlan::default();
        apply_page(page, &mut plan);
        assert_eq!(plan.offset, Some(4_294_967_294_000));
    }
}
