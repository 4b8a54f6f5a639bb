//! Existence and uniqueness checks against a record store.
//!
//! The checker never resolves tables itself: the [`RecordStore`] hands out a
//! query builder for a table name and executes it, returning at most one
//! row.

use crate::builder::QueryBuilder;
use crate::compile::compile_structured;
use crate::error::ExistenceError;
use crate::operator::Operator;
use crate::types::{Logic, Predicate, Record, StructuredFilter, Value};

/// Query execution capability consumed by [`RecordChecker`].
pub trait RecordStore {
    /// Builder for one query against one table.
    type Query: QueryBuilder;
    /// Store failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start a query against `table`.
    fn query(&self, table: &str) -> Result<Self::Query, Self::Error>;

    /// Execute `query` and return the first row, if any.
    fn find_one(&self, query: Self::Query) -> Result<Option<Record>, Self::Error>;
}

/// Runs existence and uniqueness checks through a [`RecordStore`].
#[derive(Debug, Clone, Copy)]
pub struct RecordChecker<'a, S> {
    store: &'a S,
}

impl<'a, S: RecordStore> RecordChecker<'a, S> {
    /// Wrap a store.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Fail with `DataExists` if any record matches `filter`.
    pub fn verify_not_exists(
        &self,
        table: &str,
        filter: &StructuredFilter,
    ) -> Result<(), ExistenceError> {
        if self.find_matching(table, filter)?.is_some() {
            tracing::debug!(table, "matching record exists");
            return Err(ExistenceError::DataExists);
        }
        Ok(())
    }

    /// Fail with `NoRecordsExist` if no record matches `filter`.
    pub fn verify_exists(
        &self,
        table: &str,
        filter: &StructuredFilter,
    ) -> Result<(), ExistenceError> {
        if self.find_matching(table, filter)?.is_none() {
            tracing::debug!(table, "no matching record");
            return Err(ExistenceError::NoRecordsExist);
        }
        Ok(())
    }

    /// Fail with `FieldAlreadyExists` if a record other than `exclude_id`
    /// holds the same values for the comma-separated `unique_fields`.
    ///
    /// Fields that are blank in `data` (null, `""`, `"0"`, `0`, `false`, empty
    /// array) are left out; when every field is blank no query runs. Ids
    /// compare loosely, so `5` and `"5"` are the same record.
    pub fn verify_unique(
        &self,
        table: &str,
        exclude_id: &Value,
        unique_fields: &str,
        data: &Record,
    ) -> Result<(), ExistenceError> {
        let predicates: Vec<Predicate> = unique_fields
            .split(',')
            .map(str::trim)
            .filter_map(|field| {
                let value = data.get(field).filter(|v| !v.is_blank())?;
                Some(Predicate {
                    field: field.to_string(),
                    op: Operator::Eq,
                    value: value.clone(),
                })
            })
            .collect();

        if predicates.is_empty() {
            tracing::debug!(table, unique_fields, "no unique values provided, skipping check");
            return Ok(());
        }

        let mut query = self.store.query(table).map_err(store_error)?;
        query.select(&["id"]);
        query.where_predicates(predicates, Logic::And);
        query.limit_offset(1, 0);

        let row = self.store.find_one(query).map_err(store_error)?;
        match row {
            Some(row) if row.id().is_none_or(|id| !id.loosely_eq(exclude_id)) => {
                tracing::debug!(table, unique_fields, "unique values already taken");
                Err(ExistenceError::FieldAlreadyExists {
                    fields: unique_fields.to_string(),
                })
            },
            _ => Ok(()),
        }
    }

    fn find_matching(
        &self,
        table: &str,
        filter: &StructuredFilter,
    ) -> Result<Option<Record>, ExistenceError> {
        let mut query = self.store.query(table).map_err(store_error)?;
        compile_structured(filter, &mut query)?;
        query.limit_offset(1, 0);

        tracing::debug!(table, conditions = filter.conditions.len(), "checking for record");
        self.store.find_one(query).map_err(store_error)
    }
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> ExistenceError {
    tracing::debug!(error = %err, "record store failed");
    ExistenceError::Store(Box::new(err))
}
