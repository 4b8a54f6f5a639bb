//! Core descriptor and value types.

use crate::operator::Operator;
use miniserde::json::{Number, Value as JsonValue};
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// A filter operand value: number or string.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Whether the scalar is a finite number or a string holding one.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        match self {
            Self::Int(_) => true,
            Self::Float(f) => f.is_finite(),
            Self::String(s) => parse_number(s).is_some(),
        }
    }

    /// Numeric form of the scalar; numeric strings become numbers.
    #[must_use]
    pub fn to_number(&self) -> Option<Self> {
        match self {
            Self::Int(i) => Some(Self::Int(*i)),
            Self::Float(f) if f.is_finite() => Some(Self::Float(*f)),
            Self::Float(_) => None,
            Self::String(s) => parse_number(s),
        }
    }

    /// Text form, as interpolated into a `LIKE` pattern.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Int(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::String(s) => Cow::Borrowed(s),
        }
    }

    /// Numeric literal safe to emit unquoted. Strings never qualify, so
    /// `"007"` stays text exactly as it does when bound as a parameter.
    #[must_use]
    pub fn as_plain_number(&self) -> Option<String> {
        match self {
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) if f.is_finite() => Some(f.to_string()),
            Self::Float(_) | Self::String(_) => None,
        }
    }

    pub(crate) fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Number(Number::I64(i)) => Some(Self::Int(*i)),
            JsonValue::Number(Number::U64(u)) => Some(
                i64::try_from(*u).map_or_else(|_| Self::Float(*u as f64), Self::Int),
            ),
            JsonValue::Number(Number::F64(f)) => Some(Self::Float(*f)),
            JsonValue::String(s) => Some(Self::String(s.clone())),
            JsonValue::Null | JsonValue::Bool(_) | JsonValue::Array(_) | JsonValue::Object(_) => {
                None
            },
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Parse a number the way loosely-typed request payloads spell them.
fn parse_number(s: &str) -> Option<Scalar> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Scalar::Int(i));
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        // `inf`/`nan` spellings parse as f64 but are not request numbers
        .filter(|_| s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)))
        .map(Scalar::Float)
}

/// Operand of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Scalar(Scalar),
    /// Two values (range bounds).
    Pair(Scalar, Scalar),
    /// Set members.
    List(Vec<Scalar>),
}

impl Operand {
    /// A single-value operand.
    pub fn scalar(v: impl Into<Scalar>) -> Self {
        Self::Scalar(v.into())
    }

    /// A range operand.
    pub fn pair(low: impl Into<Scalar>, high: impl Into<Scalar>) -> Self {
        Self::Pair(low.into(), high.into())
    }

    /// A list operand.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// A list operand from a comma-separated string.
    ///
    /// Members are trimmed and empty members dropped: `"1, 2,,3"` has three.
    #[must_use]
    pub fn csv(s: &str) -> Self {
        Self::List(
            s.split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(Scalar::from)
                .collect(),
        )
    }
}

impl From<Scalar> for Operand {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

/// One `(field, operator, operand)` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Field name; in templated filters the placeholder key, which may carry
    /// a `#n` suffix.
    pub field: String,
    pub op: Operator,
    pub operand: Operand,
}

impl Condition {
    /// Create a condition.
    pub fn new(field: impl Into<String>, op: Operator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            op,
            operand,
        }
    }

    /// Column name with any `#n` suffix removed.
    #[must_use]
    pub fn column(&self) -> &str {
        strip_suffix(&self.field)
    }
}

/// Remove a `#n` disambiguation suffix from a placeholder key.
pub(crate) fn strip_suffix(key: &str) -> &str {
    key.split_once('#').map_or(key, |(column, _)| column)
}

/// Global combinator of a structured filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    /// Every condition must hold: `AND`
    #[default]
    And,
    /// At least one condition must hold: `OR`
    Or,
}

impl Logic {
    /// Parse `and`/`or`, tolerating a leading `-`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token.strip_prefix('-').unwrap_or(token) {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            _ => None,
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A flat list of conditions joined by one global AND/OR.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuredFilter {
    pub conditions: Vec<Condition>,
    pub logic: Logic,
}

impl StructuredFilter {
    /// An empty AND filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn with(mut self, field: impl Into<String>, op: Operator, operand: Operand) -> Self {
        self.conditions.push(Condition::new(field, op, operand));
        self
    }

    /// Set the combinator.
    pub const fn logic(mut self, logic: Logic) -> Self {
        self.logic = logic;
        self
    }

    /// Whether the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Conditions substituted into a caller-authored boolean template.
///
/// The template names each condition by its key in braces, e.g.
/// `age {age} and (name {name} or name {name#2})`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplatedFilter {
    pub fields: Vec<Condition>,
    pub template: String,
}

impl TemplatedFilter {
    /// A filter with the given template and no conditions yet.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            template: template.into(),
        }
    }

    /// Add a condition under `key` (a field name, optionally `#n`-suffixed).
    pub fn with(mut self, key: impl Into<String>, op: Operator, operand: Operand) -> Self {
        self.fields.push(Condition::new(key, op, operand));
        self
    }

    /// Whether the filter is the empty no-op filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.template.trim().is_empty()
    }
}

/// A filter descriptor in one of the two grammars.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDescriptor {
    Structured(StructuredFilter),
    Templated(TemplatedFilter),
}

impl From<StructuredFilter> for FilterDescriptor {
    fn from(f: StructuredFilter) -> Self {
        Self::Structured(f)
    }
}

impl From<TemplatedFilter> for FilterDescriptor {
    fn from(f: TemplatedFilter) -> Self {
        Self::Templated(f)
    }
}

/// Which grammar a raw filter is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// `{"field": ["op", operand], "_logic": "or"}`
    Structured,
    /// `{"fields": {"key": ["op", operand]}, "template": "..."}`
    Templated,
}

/// Field names a call site permits in filters and selections.
///
/// An empty set places no restriction on structured filters and forbids
/// templated ones. The template allowlist built from the names is cached,
/// so reuse one set per endpoint.
#[derive(Debug, Clone, Default)]
pub struct AllowedFields {
    names: Vec<String>,
    pub(crate) template_pattern: OnceLock<Regex>,
}

impl AllowedFields {
    /// Build from field names.
    #[must_use]
    pub fn new(fields: &[&str]) -> Self {
        fields.iter().copied().collect()
    }

    /// Whether `field` is allowed.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.names.iter().any(|f| f == field)
    }

    /// Whether no fields were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate the declared names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl PartialEq for AllowedFields {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl Eq for AllowedFields {}

impl<S: Into<String>> FromIterator<S> for AllowedFields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
            template_pattern: OnceLock::new(),
        }
    }
}

/// Parameter values handed to a query builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    /// Convert from a JSON value; objects have no parameter form.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        match json {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(_) | JsonValue::String(_) => Scalar::from_json(json).map(Self::from),
            JsonValue::Array(arr) => {
                let values: Option<Vec<Self>> = arr.iter().map(Self::from_json).collect();
                values.map(Self::Array)
            },
            JsonValue::Object(_) => None,
        }
    }

    /// Whether the value counts as "not provided": null, `false`, `0`,
    /// `""`, `"0"` or an empty array.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty() || s == "0",
            Self::Array(a) => a.is_empty(),
        }
    }

    /// Loose equality used for ids: `5 == "5"`, `5 == 5.0`.
    #[must_use]
    pub fn loosely_eq(&self, other: &Self) -> bool {
        if self == other {
            return true;
        }
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::String(s) => match parse_number(s)? {
                Scalar::Int(i) => Some(i as f64),
                Scalar::Float(f) => Some(f),
                Scalar::String(_) => None,
            },
            Self::Null | Self::Bool(_) | Self::Array(_) => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Int(i) => Self::Int(i),
            Scalar::Float(f) => Self::Float(f),
            Scalar::String(s) => Self::String(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A compiled structured predicate: `field op value`.
///
/// `Between` carries a two-element array, `In`/`NotIn` an array of members.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Predicate {
    /// Whether the value has the shape its operator renders: two bounds for
    /// `Between`, at least one member for `In`. Scalar operators take any
    /// value.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match (self.op, &self.value) {
            (Operator::Between | Operator::NotBetween, Value::Array(bounds)) => bounds.len() == 2,
            (Operator::In | Operator::NotIn, Value::Array(members)) => !members.is_empty(),
            (Operator::Between | Operator::NotBetween | Operator::In | Operator::NotIn, _) => false,
            _ => true,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Parse `asc`/`desc`, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    /// SQL keyword.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort field with direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub dir: SortDir,
}

impl SortField {
    /// Create a new sort field.
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }
}

/// Ordered sort keys; later entries break ties of earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OrderDescriptor(pub Vec<SortField>);

impl OrderDescriptor {
    /// Whether no sort keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The sort keys in order.
    #[must_use]
    pub fn fields(&self) -> &[SortField] {
        &self.0
    }
}

/// One-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageDescriptor {
    pub number: u32,
    pub size: u32,
}

impl PageDescriptor {
    /// Row offset of the first record on the page.
    ///
    /// Wide enough that `(number - 1) * size` never wraps.
    #[must_use]
    pub fn offset(self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }
}

/// One row returned by a record store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(column.into(), value.into());
        self
    }

    /// Set a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    /// Value of a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// The `id` column.
    #[must_use]
    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a JSON object; `None` for non-objects or nested objects.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Option<Self> {
        let JsonValue::Object(obj) = json else {
            return None;
        };
        obj.iter()
            .map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
