//! Storage client and sessions.
//!
//! A [`Client`] owns a connection pool for one backend and knows whether that
//! backend tolerates concurrent access from a single process. Backends that do
//! not ([`Concurrency::Serialized`]) get a single-permit guard owned by the
//! client; each [`Session`] holds the permit for its lifetime, so sessions on
//! such a client never overlap. Dropping a session releases its connection and
//! permit.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow, PgSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Connection, FromRow, Postgres, Sqlite};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use search_types::{Document, DOCUMENT_ENTITY};

use crate::error::StorageError;
use crate::iterator::DocumentIterator;
use crate::key::Key;
use crate::query::{Query, Value, MAX_RESULTS};
use crate::schema::{
    DOCUMENT_COLUMNS, POSTGRES_SCHEMA, POSTGRES_UPSERT, SQLITE_FTS_DELETE, SQLITE_FTS_INSERT,
    SQLITE_SCHEMA, SQLITE_UPSERT,
};

/// SQL flavor spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Positional placeholder for the `n`th (1-based) bound argument.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", n),
            Dialect::Sqlite => format!("?{}", n),
        }
    }
}

/// Whether a backend handles concurrent access on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Concurrency {
    /// The backend serializes internally; sessions may overlap.
    Concurrent,
    /// Sessions must be serialized by the client.
    Serialized,
}

#[derive(Clone)]
enum Pool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// Handle to a storage backend. Cheap to clone; clones share the pool and guard.
#[derive(Clone)]
pub struct Client {
    pool: Pool,
    concurrency: Concurrency,
    guard: Option<Arc<Semaphore>>,
}

impl Client {
    /// Connect using a driver name and a backend-specific connection string,
    /// creating the documents schema if needed.
    ///
    /// Drivers: `postgres` (alias `cloudsqlpostgres`) takes a `postgres://` URL
    /// or a keyword/value string (`host=localhost dbname=registry`); `sqlite`
    /// takes a `sqlite:` URL such as `sqlite://search.db` or `sqlite::memory:`.
    pub async fn open(driver: &str, dsn: &str) -> Result<Self, StorageError> {
        let client = match driver {
            "postgres" | "cloudsqlpostgres" => {
                let options = postgres_options(dsn)?;
                let pool = PgPoolOptions::new().connect_with(options).await?;
                Self::from_postgres_pool(pool)
            }
            "sqlite" => {
                let options = SqliteConnectOptions::from_str(dsn)?.create_if_missing(true);
                // One long-lived connection: an in-memory database lives only
                // as long as its connection.
                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(options)
                    .await?;
                Self::from_sqlite_pool(pool)
            }
            other => return Err(StorageError::UnsupportedDriver(other.to_string())),
        };

        client.ensure_schema().await?;
        info!(driver, concurrency = ?client.concurrency, "Opened storage client");
        Ok(client)
    }

    /// Wrap an existing PostgreSQL pool. Does not create the schema.
    pub fn from_postgres_pool(pool: PgPool) -> Self {
        Self {
            pool: Pool::Postgres(pool),
            concurrency: Concurrency::Concurrent,
            guard: None,
        }
    }

    /// Wrap an existing SQLite pool. Does not create the schema.
    pub fn from_sqlite_pool(pool: SqlitePool) -> Self {
        Self {
            pool: Pool::Sqlite(pool),
            concurrency: Concurrency::Serialized,
            guard: Some(Arc::new(Semaphore::new(1))),
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self.pool {
            Pool::Postgres(_) => Dialect::Postgres,
            Pool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Open a session. Blocks while another session holds a serialized
    /// client's guard.
    pub async fn session(&self) -> Result<Session, StorageError> {
        let permit = match &self.guard {
            Some(guard) => Some(
                guard
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| StorageError::Closed)?,
            ),
            None => None,
        };

        let conn = match &self.pool {
            Pool::Postgres(pool) => Conn::Postgres(pool.acquire().await?),
            Pool::Sqlite(pool) => Conn::Sqlite(pool.acquire().await?),
        };

        debug!(dialect = ?self.dialect(), "Opened storage session");
        Ok(Session {
            conn,
            _permit: permit,
        })
    }

    /// Create the documents schema if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let mut session = self.session().await?;
        session.ensure_schema().await
    }

    /// Close the pool. Sessions opened afterwards fail.
    pub async fn close(&self) {
        if let Some(guard) = &self.guard {
            guard.close();
        }
        match &self.pool {
            Pool::Postgres(pool) => pool.close().await,
            Pool::Sqlite(pool) => pool.close().await,
        }
        info!("Closed storage client");
    }
}

/// Read a PostgreSQL connection string in URL form (`postgres://...`) or
/// keyword/value form (`host=/cloudsql/p:r:i user=app dbname=registry`).
///
/// Keyword values may be single-quoted. A `host` starting with `/` names a
/// Unix socket directory.
pub fn postgres_options(dsn: &str) -> Result<PgConnectOptions, StorageError> {
    let dsn = dsn.trim();
    if dsn.starts_with("postgres://") || dsn.starts_with("postgresql://") {
        return Ok(PgConnectOptions::from_str(dsn)?);
    }

    let mut options = PgConnectOptions::new();
    for (keyword, value) in keyword_pairs(dsn)? {
        options = match keyword.as_str() {
            "host" | "hostaddr" if value.starts_with('/') => options.socket(&value),
            "host" | "hostaddr" => options.host(&value),
            "port" => options.port(value.parse().map_err(|_| {
                StorageError::InvalidConnectionString(format!("invalid port {:?}", value))
            })?),
            "user" => options.username(&value),
            "password" => options.password(&value),
            "dbname" => options.database(&value),
            "sslmode" => options.ssl_mode(PgSslMode::from_str(&value)?),
            "sslrootcert" => options.ssl_root_cert(&value),
            "application_name" => options.application_name(&value),
            other => {
                return Err(StorageError::InvalidConnectionString(format!(
                    "unsupported keyword {:?}",
                    other
                )))
            }
        };
    }
    Ok(options)
}

/// Split `key=value key='quoted value'` into pairs.
fn keyword_pairs(dsn: &str) -> Result<Vec<(String, String)>, StorageError> {
    let mut pairs = Vec::new();
    let mut chars = dsn.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(pairs);
        }

        let mut keyword = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            keyword.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(StorageError::InvalidConnectionString(format!(
                "missing \"=\" after {:?}",
                keyword
            )));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some('\\') => value.extend(chars.next()),
                    Some(c) => value.push(c),
                    None => {
                        return Err(StorageError::InvalidConnectionString(format!(
                            "unterminated quote in value of {:?}",
                            keyword
                        )))
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        pairs.push((keyword, value));
    }
}

enum Conn {
    Postgres(PoolConnection<Postgres>),
    Sqlite(PoolConnection<Sqlite>),
}

/// Bind each filter value, in order, to a query built with numbered placeholders.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for value in $values {
            query = match value {
                Value::Text(s) => query.bind(s.clone()),
                Value::Bool(b) => query.bind(*b),
            };
        }
        query
    }};
}

#[derive(Debug, FromRow)]
struct DocumentRecord {
    key: String,
    name: String,
    fragment: String,
    kind: String,
    field: String,
    project_id: String,
    raw: String,
    escaped: bool,
}

impl From<DocumentRecord> for Document {
    fn from(record: DocumentRecord) -> Self {
        Document {
            key: record.key,
            name: record.name,
            fragment: record.fragment,
            kind: record.kind,
            field: record.field.parse().ok(),
            project_id: record.project_id,
            vector: Default::default(),
            raw: record.raw,
            escaped: record.escaped,
        }
    }
}

fn check_kind(query: &Query) -> Result<(), StorageError> {
    if query.kind == DOCUMENT_ENTITY {
        Ok(())
    } else {
        Err(StorageError::UnsupportedKind(query.kind.clone()))
    }
}

/// Exclusive use of one backend connection.
pub struct Session {
    conn: Conn,
    _permit: Option<OwnedSemaphorePermit>,
}

impl Session {
    pub fn dialect(&self) -> Dialect {
        match self.conn {
            Conn::Postgres(_) => Dialect::Postgres,
            Conn::Sqlite(_) => Dialect::Sqlite,
        }
    }

    async fn ensure_schema(&mut self) -> Result<(), StorageError> {
        match &mut self.conn {
            Conn::Postgres(conn) => {
                for statement in POSTGRES_SCHEMA.iter().copied() {
                    sqlx::query(statement).execute(&mut **conn).await?;
                }
            }
            Conn::Sqlite(conn) => {
                for statement in SQLITE_SCHEMA.iter().copied() {
                    sqlx::query(statement).execute(&mut **conn).await?;
                }
            }
        }
        Ok(())
    }

    /// Upsert a document: insert it, or overwrite every column of the row
    /// stored under the same key. Runs in one transaction; writers racing on
    /// the same key resolve last-writer-wins.
    #[tracing::instrument(skip(self, document), fields(key = %document.key))]
    pub async fn put_document(&mut self, document: &Document) -> Result<(), StorageError> {
        match &mut self.conn {
            Conn::Postgres(conn) => {
                sqlx::query(POSTGRES_UPSERT)
                    .bind(&document.key)
                    .bind(&document.name)
                    .bind(&document.fragment)
                    .bind(&document.kind)
                    .bind(document.field_str())
                    .bind(&document.project_id)
                    .bind(&document.vector.raw_text)
                    .bind(document.vector.weight.as_str())
                    .bind(&document.raw)
                    .bind(document.escaped)
                    .execute(&mut **conn)
                    .await?;
            }
            Conn::Sqlite(conn) => {
                let mut tx = conn.begin().await?;
                sqlx::query(SQLITE_UPSERT)
                    .bind(&document.key)
                    .bind(&document.name)
                    .bind(&document.fragment)
                    .bind(&document.kind)
                    .bind(document.field_str())
                    .bind(&document.project_id)
                    .bind(document.vector.weight.as_str())
                    .bind(&document.raw)
                    .bind(document.escaped)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(SQLITE_FTS_DELETE)
                    .bind(&document.key)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query(SQLITE_FTS_INSERT)
                    .bind(&document.key)
                    .bind(&document.vector.raw_text)
                    .bind(document.vector.weight.as_str())
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
            }
        }
        debug!("Stored document");
        Ok(())
    }

    /// Delete every document matching the query's requirements.
    ///
    /// Returns the number of rows removed. A query without requirements is
    /// rejected rather than clearing the table.
    #[tracing::instrument(skip(self), fields(kind = %query.kind))]
    pub async fn delete(&mut self, query: &Query) -> Result<u64, StorageError> {
        check_kind(query)?;
        if query.requirements.is_empty() {
            return Err(StorageError::InvalidQuery(
                "delete requires at least one requirement".to_string(),
            ));
        }
        let (where_sql, values) = query.where_clause(self.dialect(), 1)?;

        let deleted = match &mut self.conn {
            Conn::Postgres(conn) => {
                let sql = format!("DELETE FROM documents{}", where_sql);
                bind_values!(sqlx::query(&sql), &values)
                    .execute(&mut **conn)
                    .await?
                    .rows_affected()
            }
            Conn::Sqlite(conn) => {
                let fts_sql = format!(
                    "DELETE FROM documents_fts WHERE key IN (SELECT key FROM documents{})",
                    where_sql
                );
                let sql = format!("DELETE FROM documents{}", where_sql);
                let mut tx = conn.begin().await?;
                bind_values!(sqlx::query(&fts_sql), &values)
                    .execute(&mut *tx)
                    .await?;
                let deleted = bind_values!(sqlx::query(&sql), &values)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                tx.commit().await?;
                deleted
            }
        };

        debug!(deleted, "Deleted documents");
        Ok(deleted)
    }

    /// Run a query, reading all matches (up to `MAX_RESULTS`) into an iterator.
    #[tracing::instrument(skip(self), fields(kind = %query.kind))]
    pub async fn run(&mut self, query: &Query) -> Result<DocumentIterator, StorageError> {
        check_kind(query)?;
        let (where_sql, values) = query.where_clause(self.dialect(), 1)?;
        let sql = format!(
            "SELECT {} FROM documents{}{} LIMIT {} OFFSET {}",
            DOCUMENT_COLUMNS,
            where_sql,
            query.order_clause()?,
            MAX_RESULTS,
            query.offset
        );

        let records: Vec<DocumentRecord> = match &mut self.conn {
            Conn::Postgres(conn) => {
                bind_values!(sqlx::query_as::<_, DocumentRecord>(&sql), &values)
                    .fetch_all(&mut **conn)
                    .await?
            }
            Conn::Sqlite(conn) => {
                bind_values!(sqlx::query_as::<_, DocumentRecord>(&sql), &values)
                    .fetch_all(&mut **conn)
                    .await?
            }
        };

        debug!(count = records.len(), "Query returned documents");
        Ok(DocumentIterator::new(
            records.into_iter().map(Document::from).collect(),
        ))
    }

    /// Load the document stored under `key`.
    ///
    /// A missing document is an error for which `is_not_found()` holds.
    pub async fn get(&mut self, key: &Key) -> Result<Document, StorageError> {
        let query = Query::new(key.kind.clone()).require("key", key.name.as_str());
        self.run(&query)
            .await?
            .next()
            .map(|(_, document)| document)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    /// Execute backend-native SQL with positional text arguments, scanning
    /// each row into `T`.
    ///
    /// The SQL must use this session's [`Dialect`] placeholders.
    pub async fn raw<T>(&mut self, sql: &str, args: &[&str]) -> Result<Vec<T>, StorageError>
    where
        T: for<'r> FromRow<'r, PgRow> + for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let rows = match &mut self.conn {
            Conn::Postgres(conn) => {
                let mut query = sqlx::query_as::<_, T>(sql);
                for arg in args {
                    query = query.bind(*arg);
                }
                query.fetch_all(&mut **conn).await?
            }
            Conn::Sqlite(conn) => {
                let mut query = sqlx::query_as::<_, T>(sql);
                for arg in args {
                    query = query.bind(*arg);
                }
                query.fetch_all(&mut **conn).await?
            }
        };
        Ok(rows)
    }
}
