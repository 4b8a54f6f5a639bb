//! The operator table.
//!
//! A closed set of comparison and membership operators. Every operator knows
//! its wire token, the operand shape it accepts and its SQL keyword; both
//! renderers (structured predicates and templated fragments) dispatch on it
//! with exhaustive matches, so adding an operator is a single-point change.

use crate::builder::QueryBuilder;
use crate::error::CompileError;
use crate::types::{Operand, Predicate, Scalar, Value};
use std::fmt;

/// Filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equal: `=`
    Eq,
    /// Not equal: `<>`
    Neq,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Gte,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Lte,
    /// Substring match: `LIKE '%v%'`
    Like,
    /// Negated substring match: `NOT LIKE '%v%'`
    NotLike,
    /// Inclusive range: `BETWEEN a AND b`
    Between,
    /// Outside an inclusive range: `NOT BETWEEN a AND b`
    NotBetween,
    /// Membership: `IN (a, b, c)`
    In,
    /// Non-membership: `NOT IN (a, b, c)`
    NotIn,
    /// Membership in a comma-separated set column: `FIND_IN_SET(v, field)`
    FindInSet,
}

/// Operand shape accepted by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A single number (numeric strings accepted).
    Numeric,
    /// A single number or string.
    Text,
    /// Exactly two scalars.
    Pair,
    /// One or more scalars.
    List,
}

impl Operator {
    /// Every operator, in table order.
    pub const ALL: [Self; 13] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Like,
        Self::NotLike,
        Self::Between,
        Self::NotBetween,
        Self::In,
        Self::NotIn,
        Self::FindInSet,
    ];

    /// Canonical wire tokens, in table order.
    pub const TOKENS: [&'static str; 13] = [
        "eq",
        "neq",
        "gt",
        "gte",
        "lt",
        "lte",
        "like",
        "not_like",
        "between",
        "not_between",
        "in",
        "not_in",
        "find_in_set",
    ];

    /// Parse an operator token.
    ///
    /// Accepts the canonical tokens with or without a leading `-`, plus the
    /// legacy aliases `egt`, `elt`, `lk`, `not-lk`, `bw`, `not-bw`, `not-in`.
    ///
    /// # Example
    ///
    /// ```
    /// use crud_filter::Operator;
    ///
    /// assert_eq!(Operator::from_token("gte"), Some(Operator::Gte));
    /// assert_eq!(Operator::from_token("-egt"), Some(Operator::Gte));
    /// assert_eq!(Operator::from_token("-not-bw"), Some(Operator::NotBetween));
    /// assert_eq!(Operator::from_token("regex"), None);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.strip_prefix('-').unwrap_or(token);

        match token {
            "eq" => Some(Self::Eq),
            "neq" => Some(Self::Neq),
            "gt" => Some(Self::Gt),
            "gte" | "egt" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" | "elt" => Some(Self::Lte),
            "like" | "lk" => Some(Self::Like),
            "not_like" | "not-lk" | "not_lk" => Some(Self::NotLike),
            "between" | "bw" => Some(Self::Between),
            "not_between" | "not-bw" => Some(Self::NotBetween),
            "in" => Some(Self::In),
            "not_in" | "not-in" => Some(Self::NotIn),
            "find_in_set" => Some(Self::FindInSet),
            _ => None,
        }
    }

    /// Canonical wire token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Like => "like",
            Self::NotLike => "not_like",
            Self::Between => "between",
            Self::NotBetween => "not_between",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::FindInSet => "find_in_set",
        }
    }

    /// Operand shape this operator accepts.
    #[must_use]
    pub const fn operand_kind(self) -> OperandKind {
        match self {
            Self::Gt | Self::Gte | Self::Lt | Self::Lte => OperandKind::Numeric,
            Self::Eq | Self::Neq | Self::Like | Self::NotLike | Self::FindInSet => {
                OperandKind::Text
            },
            Self::Between | Self::NotBetween => OperandKind::Pair,
            Self::In | Self::NotIn => OperandKind::List,
        }
    }

    /// SQL keyword for the comparison.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::FindInSet => "FIND_IN_SET",
        }
    }

    /// Render a structured predicate for `field`.
    ///
    /// `like`/`not_like` wrap the operand in `%…%`, `between` carries its two
    /// bounds and `in` its members as an array value.
    pub fn predicate(self, field: &str, operand: &Operand) -> Result<Predicate, CompileError> {
        let value = match (self.operand_kind(), operand) {
            (OperandKind::Numeric | OperandKind::Text, Operand::Scalar(s)) => match self {
                Self::Like | Self::NotLike => Value::String(format!("%{}%", s.as_text())),
                _ => Value::from(s.clone()),
            },
            (OperandKind::Pair, Operand::Pair(low, high)) => {
                Value::Array(vec![low.clone().into(), high.clone().into()])
            },
            (OperandKind::List, Operand::List(items)) if !items.is_empty() => {
                Value::Array(items.iter().cloned().map(Value::from).collect())
            },
            _ => return Err(self.unsupported(field)),
        };

        Ok(Predicate {
            field: field.to_string(),
            op: self,
            value,
        })
    }

    /// Render a literal SQL fragment for a templated filter.
    ///
    /// The fragment replaces a `{placeholder}` verbatim, so it carries no
    /// column name (`= 5`, `BETWEEN 1 AND 9`, `IN (1,2,3)`) and templates
    /// read `age {age}`. `find_in_set` is the exception: the set function
    /// needs the column, so the builder renders the whole call and the
    /// template reads `{tags}`. Numbers are emitted as-is; strings, numeric
    /// or not, are quoted through the builder.
    pub fn fragment<B: QueryBuilder + ?Sized>(
        self,
        column: &str,
        operand: &Operand,
        builder: &B,
    ) -> Result<String, CompileError> {
        let literal = |s: &Scalar| {
            s.as_plain_number()
                .unwrap_or_else(|| builder.quote_literal(&s.as_text()))
        };

        let fragment = match (self, operand) {
            (Self::FindInSet, Operand::Scalar(s)) => builder.find_in_set_sql(&literal(s), column),
            (Self::Like | Self::NotLike, Operand::Scalar(s)) => format!(
                "{} {}",
                self.sql(),
                builder.quote_literal(&format!("%{}%", s.as_text()))
            ),
            (
                Self::Eq | Self::Neq | Self::Gt | Self::Gte | Self::Lt | Self::Lte,
                Operand::Scalar(s),
            ) => format!("{} {}", self.sql(), literal(s)),
            (Self::Between | Self::NotBetween, Operand::Pair(low, high)) => {
                format!("{} {} AND {}", self.sql(), literal(low), literal(high))
            },
            (Self::In | Self::NotIn, Operand::List(items)) if !items.is_empty() => {
                let members: Vec<String> = items.iter().map(literal).collect();
                format!("{} ({})", self.sql(), members.join(","))
            },
            _ => return Err(self.unsupported(column)),
        };

        Ok(fragment)
    }

    fn unsupported(self, field: &str) -> CompileError {
        tracing::warn!(
            field,
            operator = self.token(),
            "operator reached the compiler with an operand it cannot render"
        );
        CompileError::UnsupportedOperator {
            field: field.to_string(),
            operator: self,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
