//! Validation of client-supplied descriptors.
//!
//! Every validator fails fast on the first violation and reports it as a
//! [`Coded`](crate::Coded) error naming the offending field where there is
//! one. Column names reaching SQL must be plain identifiers; template text
//! must pass a character allowlist built from the caller's allowed fields.

mod column;
mod filter;
mod order;
mod page;
mod payload;
mod template;

pub use column::{assert_valid_sql_identifier, is_valid_sql_identifier};
pub use filter::{LOGIC_KEY, parse_filter, validate_filter};
pub use order::{apply_order, parse_order, validate_order};
pub use page::{apply_page, parse_page, validate_page};
pub use payload::ensure_update_fields;
