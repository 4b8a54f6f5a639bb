// =============================================================================
// CRATE-LEVEL QUALITY LINTS
// =============================================================================
#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
// =============================================================================
// CLIPPY CONFIGURATION
// =============================================================================
#![allow(clippy::doc_markdown)] // Code items in docs
#![allow(clippy::missing_errors_doc)] // Every fallible operation returns its own error enum
#![allow(clippy::missing_panics_doc)] // Identifier asserts are documented on the builder
#![allow(clippy::module_name_repetitions)] // Type names matching module - acceptable
#![allow(clippy::return_self_not_must_use)] // Builder pattern methods return Self
#![allow(clippy::must_use_candidate)] // Fluent API doesn't need must_use
#![allow(clippy::match_same_arms)] // Operator tables read clearer one arm per variant
#![allow(clippy::format_push_string)] // String building style preference
#![allow(clippy::cast_possible_truncation)] // Page windows are bounded by Limits
#![allow(clippy::cast_sign_loss)] // Page windows are bounded by Limits
#![allow(clippy::cast_possible_wrap)] // Page windows are bounded by Limits
#![allow(clippy::indexing_slicing)] // Slicing at offsets returned by str::find

//! # crud-filter - Filter, Order and Page Descriptors for CRUD Services
//!
//! Validates client-supplied filter, order and page descriptors against a
//! strict grammar and compiles them onto a query builder. Also provides
//! existence and uniqueness checks through a pluggable record store.
//!
//! ## Quick Start
//!
//! ```
//! use crud_filter::prelude::*;
//!
//! let raw: json::Value = json::from_str(r#"{"age": ["gt", 18], "status": ["in", "1,2"]}"#).unwrap();
//! let filter = parse_filter(&raw, FilterMode::Structured, &AllowedFields::default()).unwrap();
//!
//! let mut query = SelectBuilder::new(Postgres, "users");
//! compile_filter(&filter, &mut query).unwrap();
//!
//! let result = query.build();
//! assert_eq!(result.sql, "SELECT * FROM users WHERE (age > $1 AND status = ANY($2))");
//! assert_eq!(result.params.len(), 2);
//! ```
//!
//! ## Templated Filters
//!
//! A templated filter pairs keyed conditions with a boolean expression over
//! their placeholders. The template may only contain the allowed field
//! names, `and`, `or`, parentheses, braces, `#`, digits and whitespace.
//! Most fragments are a suffix (`> 18`) written after their column, while a
//! `find_in_set` fragment is a complete test and stands alone (`{tags}`).
//!
//! ```
//! use crud_filter::prelude::*;
//!
//! let raw: json::Value = json::from_str(
//!     r#"{"fields": {"age": ["gt", 18], "age#2": ["lt", 65]}, "template": "age {age} and age {age#2}"}"#,
//! )
//! .unwrap();
//! let allowed = AllowedFields::new(&["age"]);
//! let filter = parse_filter(&raw, FilterMode::Templated, &allowed).unwrap();
//!
//! let mut query = SelectBuilder::new(Sqlite, "users");
//! compile_filter(&filter, &mut query).unwrap();
//! assert_eq!(query.build().sql, "SELECT * FROM users WHERE (age > 18 and age < 65)");
//!
//! let raw: json::Value = json::from_str(
//!     r#"{"fields": {"tags": ["find_in_set", "rust"], "age": ["gt", 18]}, "template": "{tags} and age {age}"}"#,
//! )
//! .unwrap();
//! let allowed = AllowedFields::new(&["age", "tags"]);
//! let filter = parse_filter(&raw, FilterMode::Templated, &allowed).unwrap();
//!
//! let mut query = SelectBuilder::new(MySql, "users");
//! compile_filter(&filter, &mut query).unwrap();
//! assert_eq!(
//!     query.build().sql,
//!     "SELECT * FROM users WHERE (FIND_IN_SET('rust', tags) and age > 18)"
//! );
//! ```
//!
//! ## Supported Operators
//!
//! | Token | SQL | Operand |
//! |-------|-----|---------|
//! | `eq` / `neq` | `=` / `<>` | number or string |
//! | `gt` / `gte` | `>` / `>=` | number |
//! | `lt` / `lte` | `<` / `<=` | number |
//! | `like` / `not_like` | `LIKE '%v%'` / `NOT LIKE '%v%'` | number or string |
//! | `in` / `not_in` | `IN` / `NOT IN` | list or comma-separated string |
//! | `between` / `not_between` | `BETWEEN a AND b` | pair |
//! | `find_in_set` | set membership over a comma-separated column | number or string |
//!
//! Tokens may carry a leading `-` and a few short aliases (`-egt`, `-bw`).
//!
//! ## Errors
//!
//! Every error implements [`Coded`] and renders to the client envelope:
//!
//! ```
//! use crud_filter::prelude::*;
//!
//! let raw: json::Value = json::from_str(r#"{"age": ["approx", 18]}"#).unwrap();
//! let err = parse_filter(&raw, FilterMode::Structured, &AllowedFields::default()).unwrap_err();
//! assert_eq!(err.code(), ErrorCode::IllegalQuery);
//! assert_eq!(err.to_envelope().data, vec!["age".to_string()]);
//! ```

mod builder;
mod checker;
mod compile;
mod dialect;
mod error;
mod limits;
mod list;
mod operator;
mod types;
mod validate;

pub use builder::{QueryBuilder, QueryPlan, QueryResult, SelectBuilder};
pub use checker::{RecordChecker, RecordStore};
pub use compile::compile_filter;
pub use dialect::{Dialect, MySql, Postgres, Sqlite};
pub use error::{
    Coded, CompileError, ErrorCode, ErrorEnvelope, ErrorKind, ExistenceError, FilterError,
    OrderError, PageError, PayloadError, RequestError,
};
pub use limits::{DEFAULT_MAX_ORDER_FIELDS, DEFAULT_MAX_PAGE_SIZE, Limits};
pub use list::ListQuery;
pub use operator::{OperandKind, Operator};
pub use types::{
    AllowedFields, Condition, FilterDescriptor, FilterMode, Logic, Operand, OrderDescriptor,
    PageDescriptor, Predicate, Record, Scalar, SortDir, SortField, StructuredFilter,
    TemplatedFilter, Value,
};
pub use validate::{
    LOGIC_KEY, apply_order, apply_page, assert_valid_sql_identifier, ensure_update_fields,
    is_valid_sql_identifier, parse_filter, parse_order, parse_page, validate_filter,
    validate_order, validate_page,
};

/// Re-export miniserde's json module; raw descriptors are `json::Value`.
///
/// ```
/// use crud_filter::{json, validate_page};
///
/// let raw: json::Value = json::from_str("[2, 50]").unwrap();
/// assert!(validate_page(&raw).is_ok());
/// ```
pub use miniserde::json;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        AllowedFields, Coded, CompileError, ErrorCode, ExistenceError, FilterDescriptor,
        FilterError, FilterMode, Limits, ListQuery, Logic, MySql, Operand, Operator,
        OrderDescriptor, OrderError, PageDescriptor, PageError, Postgres, QueryBuilder, QueryPlan,
        QueryResult, Record, RecordChecker, RecordStore, SelectBuilder, SortDir, Sqlite,
        StructuredFilter, TemplatedFilter, Value, apply_order, apply_page, compile_filter,
        ensure_update_fields, json, parse_filter, parse_order, parse_page, validate_filter,
        validate_order, validate_page,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> json::Value {
        json::from_str(s).unwrap()
    }

    #[test]
    fn test_filter_order_page_end_to_end() {
        let filter = parse_filter(
            &raw(r#"{"name": ["like", "Al"], "age": ["between", [18, 30]]}"#),
            FilterMode::Structured,
            &AllowedFields::new(&["name", "age"]),
        )
        .unwrap();
        let order = parse_order(&raw(r#"[{"field": "age", "order": "desc"}]"#)).unwrap();
        let page = parse_page(&raw("[3, 20]")).unwrap();

        let mut query = SelectBuilder::new(Sqlite, "users");
        compile_filter(&filter, &mut query).unwrap();
        apply_order(&order, &mut query);
        apply_page(page, &mut query);

        let result = query.build();
        assert_eq!(
            result.sql,
            "SELECT * FROM users WHERE (age BETWEEN ?1 AND ?2 AND name LIKE ?3) \
             ORDER BY age DESC LIMIT 20 OFFSET 40"
        );
        assert_eq!(
            result.params,
            vec![Value::Int(18), Value::Int(30), Value::String("%Al%".into())]
        );
    }

    #[test]
    fn test_validation_is_idempotent() {
        let input = raw(r#"{"a": ["eq", 5], "b": ["in", [1, 2]], "_logic": "or"}"#);
        let allowed = AllowedFields::default();
        let first = parse_filter(&input, FilterMode::Structured, &allowed).unwrap();
        let second = parse_filter(&input, FilterMode::Structured, &allowed).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.validate(&allowed), Ok(()));
    }

    #[test]
    fn test_envelope_json_shape() {
        let err = validate_page(&raw("[1, 1001]")).unwrap_err();
        let envelope = err.to_envelope();
        assert_eq!(envelope.code, -20_110_005);
        assert!(envelope.to_json().starts_with(r#"{"code":-20110005,"msg":"#));
    }
}

// ============================================================================
// API Contract Tests (compile-time assertions)
// ============================================================================
