//! Combined list request: selected fields, filter, order and page.

use miniserde::json::Value as JsonValue;

use crate::builder::QueryBuilder;
use crate::compile::compile_filter;
use crate::error::{Coded, CompileError, RequestError};
use crate::limits::Limits;
use crate::types::{
    AllowedFields, FilterDescriptor, FilterMode, OrderDescriptor, PageDescriptor,
    StructuredFilter, TemplatedFilter,
};
use crate::validate::{apply_order, apply_page, is_valid_sql_identifier, parse_filter};

/// A validated list request, ready to be written onto a builder.
///
/// ```
/// use crud_filter::{
///     AllowedFields, FilterMode, Limits, ListQuery, QueryBuilder, SelectBuilder, Sqlite, json,
/// };
///
/// let raw: json::Value = json::from_str(
///     r#"{
///         "fields": "id,name",
///         "filter": {"age": ["gte", 18]},
///         "order": [{"field": "name", "order": "asc"}],
///         "page": [2, 10]
///     }"#,
/// )
/// .unwrap();
/// let allowed = AllowedFields::new(&["id", "name", "age"]);
/// let list = ListQuery::from_json(&raw, FilterMode::Structured, &allowed, &Limits::new()).unwrap();
///
/// let mut query = SelectBuilder::new(Sqlite, "users");
/// list.apply(&mut query).unwrap();
/// assert_eq!(
///     query.build().sql,
///     "SELECT id, name FROM users WHERE age >= ?1 ORDER BY name ASC LIMIT 10 OFFSET 10"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    /// Selected columns; empty selects all.
    pub fields: Vec<String>,
    pub filter: FilterDescriptor,
    pub order: OrderDescriptor,
    /// Absent means no window.
    pub page: Option<PageDescriptor>,
}

impl ListQuery {
    /// Validate a `{fields?, filter?, order?, page?}` request.
    ///
    /// `fields` is a comma-separated string or an array of names. Selected
    /// fields and sort keys must be in `allowed` when it is non-empty.
    pub fn from_json(
        raw: &JsonValue,
        mode: FilterMode,
        allowed: &AllowedFields,
        limits: &Limits,
    ) -> Result<Self, RequestError> {
        Self::parse(raw, mode, allowed, limits).inspect_err(|err| {
            tracing::debug!(code = %err.code(), field = err.field(), error = %err, "list request rejected");
        })
    }

    fn parse(
        raw: &JsonValue,
        mode: FilterMode,
        allowed: &AllowedFields,
        limits: &Limits,
    ) -> Result<Self, RequestError> {
        let JsonValue::Object(obj) = raw else {
            return Err(RequestError::NotAnObject);
        };
        let part = |key: &str| obj.get(key).unwrap_or(&JsonValue::Null);

        let fields = parse_fields(part("fields"), allowed)?;

        let filter = match part("filter") {
            JsonValue::Null => match mode {
                FilterMode::Structured => StructuredFilter::new().into(),
                FilterMode::Templated => TemplatedFilter::default().into(),
            },
            raw => parse_filter(raw, mode, allowed)?,
        };

        let order = OrderDescriptor::from_json(part("order"), limits)?;
        order.check_allowed(allowed)?;

        let page = match part("page") {
            JsonValue::Null => None,
            raw => Some(PageDescriptor::from_json(raw, limits)?),
        };

        Ok(Self {
            fields,
            filter,
            order,
            page,
        })
    }

    /// Write selection, filter, order and page onto `builder`, in that order.
    pub fn apply<B: QueryBuilder + ?Sized>(&self, builder: &mut B) -> Result<(), CompileError> {
        if !self.fields.is_empty() {
            let columns: Vec<&str> = self.fields.iter().map(String::as_str).collect();
            builder.select(&columns);
        }
        compile_filter(&self.filter, builder)?;
        apply_order(&self.order, builder);
        if let Some(page) = self.page {
            apply_page(page, builder);
        }
        Ok(())
    }
}

fn parse_fields(raw: &JsonValue, allowed: &AllowedFields) -> Result<Vec<String>, RequestError> {
    let names: Vec<&str> = match raw {
        JsonValue::Null => return Ok(Vec::new()),
        JsonValue::String(csv) => csv.split(',').map(str::trim).filter(|f| !f.is_empty()).collect(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(name) => Ok(name.as_str()),
                _ => Err(RequestError::IllegalField {
                    field: String::new(),
                }),
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(RequestError::IllegalField {
                field: String::new(),
            });
        },
    };

    names
        .into_iter()
        .map(|name| {
            if is_valid_sql_identifier(name) && (allowed.is_empty() || allowed.contains(name)) {
                Ok(name.to_string())
            } else {
                Err(RequestError::IllegalField {
                    field: name.to_string(),
                })
            }
        })
        .collect()
}
