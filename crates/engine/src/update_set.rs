//! Explicit partial updates.
//!
//! An [`UpdateSet`] is the full list of `(column, value)` pairs a statement
//! will write. Values are always bound as parameters, and the set can be
//! inspected before it is applied, so the columns an operation touches are
//! visible at the call site.

use sea_orm::{EntityTrait, IdenStatic, UpdateMany, Value, sea_query::Expr};

use crate::{EngineError, ResultEngine};

pub(crate) struct UpdateSet<E: EntityTrait> {
    assignments: Vec<(E::Column, Value)>,
}

impl<E: EntityTrait> UpdateSet<E> {
    pub(crate) fn new() -> Self {
        Self {
            assignments: Vec::new(),
        }
    }

    /// Adds an assignment. Setting the same column twice keeps the last value.
    #[must_use]
    pub(crate) fn set(mut self, column: E::Column, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self
            .assignments
            .iter_mut()
            .find(|(existing, _)| existing.as_str() == column.as_str())
        {
            Some((_, slot)) => *slot = value,
            None => self.assignments.push((column, value)),
        }
        self
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub(crate) fn columns(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|(column, _)| column.as_str().to_string())
            .collect()
    }

    /// Fails on an empty set, which would render as `UPDATE .. SET WHERE`.
    pub(crate) fn apply(self, mut update: UpdateMany<E>) -> ResultEngine<UpdateMany<E>> {
        if self.is_empty() {
            return Err(EngineError::Validation("nothing to update".to_string()));
        }
        for (column, value) in self.assignments {
            update = update.col_expr(column, Expr::value(value));
        }
        Ok(update)
    }
}
