use diesel::{prelude::*, sql_types, sqlite::Sqlite};

pub type BoxedDieselExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, Sqlite, SqlType = sql_types::Bool> + 'a>;

/// Folds optional conditions into a single `AND`-ed filter.
pub struct DieselExpressionBuilder<'a, Table>(Option<BoxedDieselExpression<'a, Table>>);

impl<Table> Default for DieselExpressionBuilder<'_, Table> {
    fn default() -> Self {
        Self(None)
    }
}

impl<'a, Table: 'a> DieselExpressionBuilder<'a, Table> {
    #[must_use]
    pub fn and<Q>(self, other: Q) -> Self
    where
        Q: BoxableExpression<Table, Sqlite, SqlType = sql_types::Bool> + 'a,
    {
        let other: BoxedDieselExpression<Table> = Box::new(other);

        let Self(Some(current)) = self else {
            return Self(Some(other));
        };

        let current = Box::new(current.and(other));

        Self(Some(current))
    }

    #[must_use]
    pub fn and_if<Q>(self, condition: Option<Q>) -> Self
    where
        Q: BoxableExpression<Table, Sqlite, SqlType = sql_types::Bool> + 'a,
    {
        match condition {
            Some(condition) => self.and(condition),
            None => self,
        }
    }

    #[must_use]
    pub fn build(self) -> Option<BoxedDieselExpression<'a, Table>> {
        let Self(query) = self;

        query
    }
}
