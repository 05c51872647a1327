use camino::Utf8Path;
use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::{
    connection::{AnsiTransactionManager, SimpleConnection, TransactionManager},
    prelude::*,
    r2d2::{self, ConnectionManager, CustomizeConnection, PooledConnection},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use project_tracking_core::model::entity::{
    Entity, EntityKind, Experiment, File, Id, Job, Location, Metric, Operation, OperationConfig,
    Project, Readset, Row, Run, Sample, SoftFlag, SoftState, Specimen,
};
use project_tracking_schema as schema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub mod cascade;
pub mod digest;
pub mod error;
pub mod ingest;
pub mod modification;
pub mod resolve;
pub mod route;
#[cfg(test)]
pub(crate) mod test_util;
mod util;

use error::{Error, Result};
pub use util::{BoxedDieselExpression, DieselExpressionBuilder};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../db/migrations");

/// The bookkeeping columns shared by every entity table.
type Meta = (
    Id,
    bool,
    bool,
    NaiveDateTime,
    Option<NaiveDateTime>,
    Option<String>,
);

fn into_row<T>(
    (id, deprecated, deleted, creation, modification, extra_metadata): Meta,
    data: T,
) -> Result<Row<T>> {
    Ok(Row {
        id,
        state: SoftState {
            deprecated,
            deleted,
        },
        creation: creation.and_utc(),
        modification: modification.map(|m| m.and_utc()),
        extra_metadata: extra_metadata
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?,
        data,
    })
}

fn metadata_text(extra_metadata: Option<&Value>) -> Result<Option<String>> {
    Ok(extra_metadata.map(serde_json::to_string).transpose()?)
}

/// An entity type with its own table.
pub trait Stored: Entity + Clone + Serialize + DeserializeOwned + Send + 'static {
    type Table: 'static;

    /// Rows matching `filter`, in id order.
    /// # Errors
    fn load(
        conn: &mut SqliteConnection,
        filter: Option<BoxedDieselExpression<'_, Self::Table>>,
    ) -> Result<Vec<Row<Self>>>;

    /// # Errors
    fn get(conn: &mut SqliteConnection, id: Id) -> Result<Option<Row<Self>>>;

    /// # Errors
    fn exists(conn: &mut SqliteConnection, id: Id) -> Result<bool>;

    /// # Errors
    fn insert(
        conn: &mut SqliteConnection,
        data: &Self,
        extra_metadata: Option<&Value>,
        now: NaiveDateTime,
    ) -> Result<Id>;

    /// Overwrites every column of an existing row.
    /// # Errors
    fn replace(conn: &mut SqliteConnection, row: &Row<Self>, now: NaiveDateTime) -> Result<()>;

    /// # Errors
    fn set_flag(
        conn: &mut SqliteConnection,
        id: Id,
        flag: SoftFlag,
        value: bool,
        now: NaiveDateTime,
    ) -> Result<bool>;

    /// # Errors
    fn remove(conn: &mut SqliteConnection, id: Id) -> Result<bool>;
}

macro_rules! stored {
    ($($entity:ty => $table:ident),+ $(,)?) => {
        $(
            impl Stored for $entity {
                type Table = schema::$table::table;

                fn load(
                    conn: &mut SqliteConnection,
                    filter: Option<BoxedDieselExpression<'_, Self::Table>>,
                ) -> Result<Vec<Row<Self>>> {
                    use schema::$table::{
                        creation, deleted, deprecated, extra_metadata, id, modification, table,
                    };

                    let mut statement = table
                        .select((
                            (id, deprecated, deleted, creation, modification, extra_metadata),
                            Self::as_select(),
                        ))
                        .order(id)
                        .into_boxed();

                    if let Some(filter) = filter {
                        statement = statement.filter(filter);
                    }

                    statement
                        .load::<(Meta, Self)>(conn)?
                        .into_iter()
                        .map(|(meta, data)| into_row(meta, data))
                        .collect()
                }

                fn get(conn: &mut SqliteConnection, row_id: Id) -> Result<Option<Row<Self>>> {
                    use schema::$table::{
                        creation, deleted, deprecated, extra_metadata, id, modification, table,
                    };

                    table
                        .find(row_id)
                        .select((
                            (id, deprecated, deleted, creation, modification, extra_metadata),
                            Self::as_select(),
                        ))
                        .first::<(Meta, Self)>(conn)
                        .optional()?
                        .map(|(meta, data)| into_row(meta, data))
                        .transpose()
                }

                fn exists(conn: &mut SqliteConnection, row_id: Id) -> Result<bool> {
                    use schema::$table::table;

                    Ok(diesel::select(diesel::dsl::exists(table.find(row_id)))
                        .get_result(conn)?)
                }

                fn insert(
                    conn: &mut SqliteConnection,
                    data: &Self,
                    metadata: Option<&Value>,
                    now: NaiveDateTime,
                ) -> Result<Id> {
                    use schema::$table::{creation, extra_metadata, id, table};

                    Ok(diesel::insert_into(table)
                        .values((
                            data,
                            creation.eq(now),
                            extra_metadata.eq(metadata_text(metadata)?),
                        ))
                        .returning(id)
                        .get_result(conn)?)
                }

                fn replace(
                    conn: &mut SqliteConnection,
                    row: &Row<Self>,
                    now: NaiveDateTime,
                ) -> Result<()> {
                    use schema::$table::{
                        deleted, deprecated, extra_metadata, modification, table,
                    };

                    let updated = diesel::update(table.find(row.id))
                        .set((
                            &row.data,
                            deprecated.eq(row.state.deprecated),
                            deleted.eq(row.state.deleted),
                            modification.eq(Some(now)),
                            extra_metadata.eq(metadata_text(row.extra_metadata.as_ref())?),
                        ))
                        .execute(conn)?;

                    if updated == 0 {
                        return Err(Error::did_not_find(Self::KIND, "id", row.id));
                    }

                    Ok(())
                }

                fn set_flag(
                    conn: &mut SqliteConnection,
                    row_id: Id,
                    flag: SoftFlag,
                    value: bool,
                    now: NaiveDateTime,
                ) -> Result<bool> {
                    use schema::$table::{deleted, deprecated, modification, table};

                    let target = diesel::update(table.find(row_id));
                    let updated = match flag {
                        SoftFlag::Deleted => target
                            .set((deleted.eq(value), modification.eq(Some(now))))
                            .execute(conn)?,
                        SoftFlag::Deprecated => target
                            .set((deprecated.eq(value), modification.eq(Some(now))))
                            .execute(conn)?,
                    };

                    Ok(updated > 0)
                }

                fn remove(conn: &mut SqliteConnection, row_id: Id) -> Result<bool> {
                    use schema::$table::table;

                    Ok(diesel::delete(table.find(row_id)).execute(conn)? > 0)
                }
            }
        )+
    };
}

stored!(
    Project => project,
    Specimen => specimen,
    Sample => sample,
    Experiment => experiment,
    Run => run,
    Readset => readset,
    Operation => operation,
    OperationConfig => operation_config,
    Job => job,
    Metric => metric,
    File => file,
    Location => location,
);

/// Binds `$entity` to the [`Stored`] type of `$kind` and evaluates `$body`.
macro_rules! with_kind {
    ($kind:expr, $entity:ident => $body:expr) => {{
        use project_tracking_core::model::entity::EntityKind as K;

        match $kind {
            K::Project => {
                type $entity = Project;
                $body
            }
            K::Specimen => {
                type $entity = Specimen;
                $body
            }
            K::Sample => {
                type $entity = Sample;
                $body
            }
            K::Experiment => {
                type $entity = Experiment;
                $body
            }
            K::Run => {
                type $entity = Run;
                $body
            }
            K::Readset => {
                type $entity = Readset;
                $body
            }
            K::Operation => {
                type $entity = Operation;
                $body
            }
            K::OperationConfig => {
                type $entity = OperationConfig;
                $body
            }
            K::Job => {
                type $entity = Job;
                $body
            }
            K::Metric => {
                type $entity = Metric;
                $body
            }
            K::File => {
                type $entity = File;
                $body
            }
            K::Location => {
                type $entity = Location;
                $body
            }
        }
    }};
}

/// A many-to-many link table, read as `(left, right)` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Link {
    ReadsetFile,
    ReadsetJob,
    ReadsetOperation,
    ReadsetMetric,
    JobFile,
}

/// Binds the table and both columns of `$link` and evaluates `$body`.
macro_rules! with_link {
    ($link:expr, ($table:ident, $left:ident, $right:ident) => $body:expr) => {{
        match $link {
            Link::ReadsetFile => {
                use schema::readset_file::{file_id as $right, readset_id as $left, table as $table};
                $body
            }
            Link::ReadsetJob => {
                use schema::readset_job::{job_id as $right, readset_id as $left, table as $table};
                $body
            }
            Link::ReadsetOperation => {
                use schema::readset_operation::{
                    operation_id as $right, readset_id as $left, table as $table,
                };
                $body
            }
            Link::ReadsetMetric => {
                use schema::readset_metric::{
                    metric_id as $right, readset_id as $left, table as $table,
                };
                $body
            }
            Link::JobFile => {
                use schema::job_file::{file_id as $right, job_id as $left, table as $table};
                $body
            }
        }
    }};
}

/// An explicit handle on an open database transaction. Every mutation made
/// through it is committed or discarded as a whole by [`Store`].
pub struct Transaction<'a> {
    conn: &'a mut SqliteConnection,
    now: DateTime<Utc>,
}

impl<'a> Transaction<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self {
            conn,
            now: Utc::now(),
        }
    }

    pub fn conn(&mut self) -> &mut SqliteConnection {
        self.conn
    }

    /// The timestamp stamped on every row created or modified in this
    /// transaction.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn stamp(&self) -> NaiveDateTime {
        self.now.naive_utc()
    }

    /// # Errors
    pub fn get<T: Stored>(&mut self, id: Id) -> Result<Option<Row<T>>> {
        T::get(self.conn, id)
    }

    /// # Errors
    pub fn fetch<T: Stored>(&mut self, id: Id) -> Result<Row<T>> {
        self.get(id)?
            .ok_or_else(|| Error::did_not_find(T::KIND, "id", id))
    }

    /// # Errors
    pub fn rows<T: Stored>(&mut self) -> Result<Vec<Row<T>>> {
        T::load(self.conn, None)
    }

    /// # Errors
    pub fn load<T: Stored>(
        &mut self,
        filter: BoxedDieselExpression<'_, T::Table>,
    ) -> Result<Vec<Row<T>>> {
        T::load(self.conn, Some(filter))
    }

    /// Rows matching `filter`, or every row when there is none.
    /// # Errors
    pub fn filtered<T: Stored>(
        &mut self,
        filter: Option<BoxedDieselExpression<'_, T::Table>>,
    ) -> Result<Vec<Row<T>>> {
        T::load(self.conn, filter)
    }

    /// The first row, by id, matching `filter`.
    /// # Errors
    pub fn find<T: Stored>(
        &mut self,
        filter: BoxedDieselExpression<'_, T::Table>,
    ) -> Result<Option<Row<T>>> {
        Ok(self.load(filter)?.into_iter().next())
    }

    /// # Errors
    pub fn insert<T: Stored>(&mut self, data: T) -> Result<Id> {
        self.insert_with_metadata(data, None)
    }

    /// # Errors
    pub fn insert_with_metadata<T: Stored>(
        &mut self,
        data: T,
        extra_metadata: Option<Value>,
    ) -> Result<Id> {
        let now = self.stamp();

        T::insert(self.conn, &data, extra_metadata.as_ref(), now).map_err(|err| {
            match (&err, data.unique_key()) {
                (Error::UniqueConstraint { .. }, Some((column, value))) => {
                    Error::unique(T::KIND, column, value)
                }
                _ => err,
            }
        })
    }

    /// # Errors
    pub fn update<T: Stored>(&mut self, id: Id, f: impl FnOnce(&mut Row<T>)) -> Result<()> {
        let mut row = self.fetch::<T>(id)?;
        f(&mut row);

        let now = self.stamp();
        T::replace(self.conn, &row, now)
    }

    /// # Errors
    pub fn set_flag(&mut self, kind: EntityKind, id: Id, flag: SoftFlag, value: bool) -> Result<bool> {
        let now = self.stamp();
        with_kind!(kind, T => T::set_flag(self.conn, id, flag, value, now))
    }

    /// # Errors
    pub fn exists(&mut self, kind: EntityKind, id: Id) -> Result<bool> {
        with_kind!(kind, T => T::exists(self.conn, id))
    }

    /// # Errors
    pub fn soft_state(&mut self, kind: EntityKind, id: Id) -> Result<Option<SoftState>> {
        with_kind!(kind, T => Ok(T::get(self.conn, id)?.map(|row| row.state)))
    }

    /// # Errors
    pub fn is_flagged(&mut self, kind: EntityKind, id: Id, flag: SoftFlag) -> Result<bool> {
        Ok(self
            .soft_state(kind, id)?
            .is_some_and(|state| state.get(flag)))
    }

    /// # Errors
    pub fn remove(&mut self, kind: EntityKind, id: Id) -> Result<bool> {
        with_kind!(kind, T => T::remove(self.conn, id))
    }

    /// A row as JSON.
    /// # Errors
    pub fn to_json(&mut self, kind: EntityKind, id: Id) -> Result<Option<Value>> {
        with_kind!(kind, T => {
            T::get(self.conn, id)?
                .map(|row| serde_json::to_value(row).map_err(Error::from))
                .transpose()
        })
    }

    /// A row as JSON, tagged with its table name.
    /// # Errors
    pub fn flat_json(&mut self, kind: EntityKind, id: Id) -> Result<Option<Value>> {
        let mut value = self.to_json(kind, id)?;
        if let Some(Value::Object(map)) = &mut value {
            map.insert("tablename".to_string(), Value::String(kind.to_string()));
        }

        Ok(value)
    }

    /// Overwrites row `id` with the columns in `value`.
    /// # Errors
    pub fn replace_json(&mut self, kind: EntityKind, id: Id, value: Value) -> Result<()> {
        let now = self.stamp();

        with_kind!(kind, T => {
            let mut row: Row<T> =
                serde_json::from_value(value).map_err(|err| Error::invalid_value(&err))?;
            row.id = id;
            T::replace(self.conn, &row, now)
        })
    }

    /// Adds a pair to `link`, returning whether it was new.
    /// # Errors
    pub fn link(&mut self, link: Link, left: Id, right: Id) -> Result<bool> {
        let inserted = with_link!(link, (table, left_col, right_col) => {
            diesel::insert_or_ignore_into(table)
                .values((left_col.eq(left), right_col.eq(right)))
                .execute(self.conn)?
        });

        Ok(inserted > 0)
    }

    /// # Errors
    pub fn linked(&mut self, link: Link, left: Id, right: Id) -> Result<bool> {
        Ok(with_link!(link, (table, left_col, right_col) => {
            diesel::select(diesel::dsl::exists(
                table.filter(left_col.eq(left)).filter(right_col.eq(right)),
            ))
            .get_result(self.conn)?
        }))
    }

    /// # Errors
    pub fn rights_of(&mut self, link: Link, left: Id) -> Result<Vec<Id>> {
        Ok(with_link!(link, (table, left_col, right_col) => {
            table
                .filter(left_col.eq(left))
                .select(right_col)
                .order(right_col)
                .load(self.conn)?
        }))
    }

    /// # Errors
    pub fn lefts_of(&mut self, link: Link, right: Id) -> Result<Vec<Id>> {
        Ok(with_link!(link, (table, left_col, right_col) => {
            table
                .filter(right_col.eq(right))
                .select(left_col)
                .order(left_col)
                .load(self.conn)?
        }))
    }
}

type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionSetup;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionSetup {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(r2d2::Error::QueryError)
    }
}

/// The transactional entity store, backed by a pool of sqlite connections.
/// Migrations are applied when the store is opened.
#[derive(Clone)]
pub struct Store {
    pool: Pool,
}

impl Store {
    /// A private in-memory database. The pool holds a single connection that
    /// never expires, since the data lives only as long as it does.
    /// # Errors
    pub fn in_memory() -> Result<Self> {
        let pool = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_customizer(Box::new(ConnectionSetup))
            .build(ConnectionManager::new(":memory:"))?;

        Self::migrated(pool)
    }

    /// Opens the database file at `path`, creating it if it does not exist
    /// yet.
    /// # Errors
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let pool = Pool::builder()
            .connection_customizer(Box::new(ConnectionSetup))
            .build(ConnectionManager::new(path.as_str()))?;

        Self::migrated(pool)
    }

    fn migrated(pool: Pool) -> Result<Self> {
        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Other {
                message: format!("failed to run migrations: {err}"),
            })?;
        tracing::info!("ran database migrations");

        Ok(Self { pool })
    }

    fn connection(&self) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>> {
        Ok(self.pool.get()?)
    }

    /// Runs `f` in a write transaction, committing its changes if it returns
    /// `Ok`.
    /// # Errors
    pub fn transaction<T>(&self, f: impl FnOnce(&mut Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self.connection()?;

        conn.immediate_transaction(|conn| f(&mut Transaction::new(conn)))
    }

    /// Runs `f` in a transaction that is always rolled back.
    /// # Errors
    pub fn dry_run<T>(&self, f: impl FnOnce(&mut Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self.connection()?;
        let conn: &mut SqliteConnection = &mut conn;

        AnsiTransactionManager::begin_transaction(conn)?;
        let result = f(&mut Transaction::new(conn));
        AnsiTransactionManager::rollback_transaction(conn)?;

        result
    }

    /// Runs a read-only `f` in its own transaction.
    /// # Errors
    pub fn read<T>(&self, f: impl FnOnce(&mut Transaction) -> Result<T>) -> Result<T> {
        let mut conn = self.connection()?;

        conn.transaction(|conn| f(&mut Transaction::new(conn)))
    }

    /// Runs `f` on the blocking thread pool, so request handlers never hold
    /// a runtime worker while they wait on the database.
    /// # Errors
    pub async fn spawn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> Result<T> + Send + 'static,
    {
        let store = self.clone();

        tokio::task::spawn_blocking(move || f(&store)).await?
    }
}
