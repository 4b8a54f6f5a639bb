//! Error taxonomy shared by every validator, the compiler and the checker.
//!
//! Each public operation has its own error enum. All of them implement
//! [`Coded`], which maps the error to an [`ErrorKind`], a stable numeric
//! [`ErrorCode`] and the `{"code", "msg", "data"}` envelope returned to
//! clients by the transport layer.

use crate::operator::Operator;
use miniserde::Serialize;
use std::fmt;
use thiserror::Error;

/// Stable numeric codes reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ErrorCode {
    /// Generic malformed request.
    BadRequest = -400_000,
    /// Failure inside an external collaborator.
    Internal = -500_000,
    /// A record matching the filter already exists.
    DataExists = -20_110_002,
    /// No record matches the filter.
    NoRecordsExist = -20_110_003,
    /// A unique field combination is already taken.
    CodeAlreadyExists = -20_110_004,
    /// Filter, order or page descriptor failed validation.
    IllegalQuery = -20_110_005,
}

impl ErrorCode {
    /// Numeric value of the code.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// What went wrong, independent of which operation reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Filter descriptor failed structural or grammar validation.
    IllegalFilter,
    /// Order descriptor failed validation.
    IllegalOrder,
    /// Page descriptor failed validation.
    IllegalPage,
    /// Update payload carries no column besides the id.
    IllegalUpdate,
    /// An operator reached the compiler with an operand it cannot render.
    UnsupportedOperator,
    /// A template placeholder has no matching condition.
    UnresolvedPlaceholder,
    /// A matching record exists.
    DataExists,
    /// No matching record exists.
    NoRecordsExist,
    /// A unique field combination is taken by another record.
    FieldAlreadyExists,
    /// The record store failed.
    Store,
}

impl ErrorKind {
    /// Numeric code reported for this kind.
    #[must_use]
    pub const fn code(self) -> ErrorCode {
        match self {
            Self::IllegalFilter
            | Self::IllegalOrder
            | Self::IllegalPage
            | Self::UnresolvedPlaceholder => ErrorCode::IllegalQuery,
            Self::IllegalUpdate => ErrorCode::BadRequest,
            Self::UnsupportedOperator | Self::Store => ErrorCode::Internal,
            Self::DataExists => ErrorCode::DataExists,
            Self::NoRecordsExist => ErrorCode::NoRecordsExist,
            Self::FieldAlreadyExists => ErrorCode::CodeAlreadyExists,
        }
    }
}

/// JSON error body handed back to the transport layer.
///
/// Serializes as `{"code":-20110005,"msg":"...","data":["age"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub msg: String,
    /// Offending field names, if any.
    pub data: Vec<String>,
}

impl ErrorEnvelope {
    /// Render the envelope as a JSON string.
    #[must_use]
    pub fn to_json(&self) -> String {
        miniserde::json::to_string(self)
    }
}

/// Errors that carry a stable code and a client-facing message.
pub trait Coded: std::error::Error {
    /// The error kind.
    fn kind(&self) -> ErrorKind;

    /// The offending field, when the error concerns one.
    fn field(&self) -> Option<&str> {
        None
    }

    /// Numeric code for the kind.
    fn code(&self) -> ErrorCode {
        self.kind().code()
    }

    /// Client-facing message.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Build the `{code, msg, data}` envelope.
    fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.code().as_i64(),
            msg: self.message(),
            data: self.field().map(|f| vec![f.to_string()]).unwrap_or_default(),
        }
    }
}

/// Filter descriptor validation error (`IllegalFilter`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FilterError {
    /// The descriptor is not a JSON object.
    #[error("The filter parameter format is incorrect.")]
    NotAnObject,
    /// `_logic` is something other than `and`/`or`.
    #[error("The filtering condition query logic can only be or or and.")]
    InvalidLogic,
    /// The condition is not a `[operator, operand]` pair.
    #[error("The format of {field} field query criteria is incorrect.")]
    MalformedCondition {
        /// The offending field.
        field: String,
    },
    /// The operator token is outside the supported set.
    #[error(
        "The {field} field query condition `{token}` is not supported, supported: {}.",
        Operator::TOKENS.join(",")
    )]
    UnknownOperator {
        /// The offending field.
        field: String,
        /// The rejected token.
        token: String,
    },
    /// `gt/gte/lt/lte` need a numeric operand.
    #[error("The {field} field query value must be a number.")]
    ExpectedNumber {
        /// The offending field.
        field: String,
    },
    /// `eq/neq/like/not_like/find_in_set` need a number or string.
    #[error("The {field} field query value must be a number or string.")]
    ExpectedNumberOrString {
        /// The offending field.
        field: String,
    },
    /// `between/not_between` need exactly two values.
    #[error("The {field} field query parameter must be an array with a length equal to 2.")]
    ExpectedPair {
        /// The offending field.
        field: String,
    },
    /// `in/not_in` need a comma-separated string or a non-empty list.
    #[error("The {field} field query parameters must be strings separated by commas.")]
    ExpectedList {
        /// The offending field.
        field: String,
    },
    /// The field is not a usable column name.
    #[error("The {field} field is not a valid column name.")]
    InvalidFieldName {
        /// The offending field.
        field: String,
    },
    /// The field is not in the caller's allowed set.
    #[error("The {field} field is not allowed in the filter.")]
    FieldNotAllowed {
        /// The offending field.
        field: String,
    },
    /// The same field appears twice in a structured filter.
    #[error("The {field} field appears more than once in the filter.")]
    DuplicateField {
        /// The offending field.
        field: String,
    },
    /// Templated filter used without an allowed field set.
    #[error("Filter fields must be specified.")]
    FieldsNotSpecified,
    /// Templated filter lacks `fields` or `template`.
    #[error("The filter must contain non-empty fields and template.")]
    MissingTemplateParts,
    /// `template` is not a string.
    #[error("The filter template must be a string.")]
    TemplateNotString,
    /// `template` contains characters outside the allowlist.
    #[error("The filter template contains illegal characters.")]
    IllegalTemplate,
    /// A `find_in_set` placeholder follows its column name. The fragment
    /// names the column itself, so the template must use `{tags}` alone.
    #[error("The {field} placeholder already names its column and must stand alone.")]
    SetColumnRepeated {
        /// The offending key.
        field: String,
    },
}

impl Coded for FilterError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::IllegalFilter
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::MalformedCondition { field }
            | Self::UnknownOperator { field, .. }
            | Self::ExpectedNumber { field }
            | Self::ExpectedNumberOrString { field }
            | Self::ExpectedPair { field }
            | Self::ExpectedList { field }
            | Self::InvalidFieldName { field }
            | Self::FieldNotAllowed { field }
            | Self::DuplicateField { field }
            | Self::SetColumnRepeated { field } => Some(field),
            Self::NotAnObject
            | Self::InvalidLogic
            | Self::FieldsNotSpecified
            | Self::MissingTemplateParts
            | Self::TemplateNotString
            | Self::IllegalTemplate => None,
        }
    }
}

/// Filter compilation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// An operator reached the compiler with an operand shape it cannot
    /// render. Validation rules this out; seeing it is a bug.
    #[error("Operator `{operator}` cannot be rendered for the {field} field.")]
    UnsupportedOperator {
        /// The field of the condition.
        field: String,
        /// The operator that could not be rendered.
        operator: Operator,
    },
    /// A `{placeholder}` in the template has no matching condition.
    #[error("The filter template placeholder `{placeholder}` has no matching field.")]
    UnresolvedPlaceholder {
        /// The placeholder name.
        placeholder: String,
    },
    /// Braces in the template do not pair up.
    #[error("The filter template has an unbalanced brace at position {position}.")]
    UnbalancedBrace {
        /// Byte offset of the offending brace.
        position: usize,
    },
}

impl Coded for CompileError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedOperator { .. } => ErrorKind::UnsupportedOperator,
            Self::UnresolvedPlaceholder { .. } | Self::UnbalancedBrace { .. } => {
                ErrorKind::UnresolvedPlaceholder
            },
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::UnsupportedOperator { field, .. } => Some(field),
            Self::UnresolvedPlaceholder { placeholder } => Some(placeholder),
            Self::UnbalancedBrace { .. } => None,
        }
    }
}

const ORDER_FORMAT: &str = "The sorting parameter format must be [{\"field\": \"xxx\", \"order\": \"asc\"}], and the order parameter can only be asc or desc.";

/// Order descriptor validation error (`IllegalOrder`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum OrderError {
    /// The descriptor is not an array.
    #[error("{}", ORDER_FORMAT)]
    NotAnArray,
    /// More sort keys than allowed.
    #[error("The single sorting rule cannot exceed {max} fields.")]
    TooManyFields {
        /// The configured maximum.
        max: usize,
    },
    /// An entry lacks a field or has a direction other than asc/desc.
    #[error("{}", ORDER_FORMAT)]
    MalformedEntry {
        /// Position of the entry in the list.
        index: usize,
    },
    /// The sort field is not a usable column name.
    #[error("The sorting field {field} is not a valid column name.")]
    InvalidFieldName {
        /// The offending field.
        field: String,
    },
    /// The sort field is not in the caller's allowed set.
    #[error("The sorting field {field} is not allowed.")]
    FieldNotAllowed {
        /// The offending field.
        field: String,
    },
}

impl Coded for OrderError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::IllegalOrder
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidFieldName { field } | Self::FieldNotAllowed { field } => Some(field),
            Self::NotAnArray | Self::TooManyFields { .. } | Self::MalformedEntry { .. } => None,
        }
    }
}

/// Page descriptor validation error (`IllegalPage`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PageError {
    /// Not a `[page_number, page_size]` pair of positive integers.
    #[error("The page parameter format must be [page_number,page_size].")]
    Malformed,
    /// Page size above the limit.
    #[error("Single page data cannot exceed {max} entries.")]
    PageSizeTooLarge {
        /// The configured maximum.
        max: u32,
    },
}

impl Coded for PageError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::IllegalPage
    }
}

/// Update payload validation error (`IllegalUpdate`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PayloadError {
    /// Fewer than two fields (the id plus at least one column).
    #[error("Update data must contain at least one field besides the id.")]
    NothingToUpdate,
}

impl Coded for PayloadError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::IllegalUpdate
    }
}

/// Outcome of an existence or uniqueness check.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExistenceError {
    /// A record matching the filter exists.
    #[error("Data exists")]
    DataExists,
    /// No record matches the filter.
    #[error("No records exist")]
    NoRecordsExist,
    /// Another record already holds the unique field values.
    #[error("The {fields} already exists")]
    FieldAlreadyExists {
        /// The comma-separated unique field list.
        fields: String,
    },
    /// The filter could not be compiled.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// The record store failed.
    #[error("query execution failed")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Coded for ExistenceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::DataExists => ErrorKind::DataExists,
            Self::NoRecordsExist => ErrorKind::NoRecordsExist,
            Self::FieldAlreadyExists { .. } => ErrorKind::FieldAlreadyExists,
            Self::Compile(e) => e.kind(),
            Self::Store(_) => ErrorKind::Store,
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::FieldAlreadyExists { fields } => Some(fields),
            Self::Compile(e) => e.field(),
            Self::DataExists | Self::NoRecordsExist | Self::Store(_) => None,
        }
    }
}

/// Error for a combined list request (`fields`, `filter`, `order`, `page`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RequestError {
    /// The request body is not a JSON object.
    #[error("The query parameter format is incorrect.")]
    NotAnObject,
    /// A selected field is unusable or not allowed.
    #[error("The {field} field cannot be selected.")]
    IllegalField {
        /// The offending field.
        field: String,
    },
    /// The filter part failed validation.
    #[error(transparent)]
    Filter(#[from] FilterError),
    /// The order part failed validation.
    #[error(transparent)]
    Order(#[from] OrderError),
    /// The page part failed validation.
    #[error(transparent)]
    Page(#[from] PageError),
}

impl Coded for RequestError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAnObject | Self::IllegalField { .. } => ErrorKind::IllegalFilter,
            Self::Filter(e) => e.kind(),
            Self::Order(e) => e.kind(),
            Self::Page(e) => e.kind(),
        }
    }

    fn field(&self) -> Option<&str> {
        match self {
            Self::IllegalField { field } => Some(field),
            Self::Filter(e) => e.field(),
            Self::Order(e) => e.field(),
            Self::NotAnObject | Self::Page(_) => None,
        }
    }
}
