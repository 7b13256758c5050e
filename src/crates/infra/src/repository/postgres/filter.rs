use sea_orm::sea_query::IntoCondition;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Select};

/// Builds a select from optional predicates.
///
/// Starts unconditional; each step adds a predicate only when its input is
/// present, and present predicates are joined with AND. No predicates means
/// no WHERE clause at all.
pub struct FilterBuilder<E: EntityTrait> {
    select: Select<E>,
}

impl<E: EntityTrait> FilterBuilder<E> {
    pub fn new(select: Select<E>) -> Self {
        Self { select }
    }

    pub fn find() -> Self {
        Self::new(E::find())
    }

    pub fn when<C: IntoCondition>(self, predicate: Option<C>) -> Self {
        match predicate {
            Some(predicate) => Self::new(self.select.filter(predicate)),
            None => self,
        }
    }

    /// `column IN (...)`, skipped for an empty set.
    pub fn id_in<I>(self, column: E::Column, ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let ids: Vec<i64> = ids.into_iter().collect();
        self.when((!ids.is_empty()).then(|| column.is_in(ids)))
    }

    /// `column = value`, skipped for `None` and for the empty string.
    pub fn text_eq(self, column: E::Column, value: Option<&str>) -> Self {
        self.when(value.filter(|v| !v.is_empty()).map(|v| column.eq(v)))
    }

    /// Pagination cursor: `column > cursor`.
    pub fn after(self, column: E::Column, cursor: Option<i64>) -> Self {
        self.when(cursor.map(|c| column.gt(c)))
    }

    pub fn build(self) -> Select<E> {
        self.select
    }
}
