//! Table definitions and statements for each backend.
//!
//! PostgreSQL keeps the weighted `tsvector` in the `documents` row. SQLite has
//! no native vector type, so the indexed text and its weight live in an FTS5
//! table kept in step with `documents` inside the same transaction.

/// Columns read back into a `Document`, in `DocumentRecord` order.
pub const DOCUMENT_COLUMNS: &str = "key, name, fragment, kind, field, project_id, raw, escaped";

pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        key TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        fragment TEXT NOT NULL DEFAULT '',
        kind TEXT NOT NULL DEFAULT '',
        field TEXT NOT NULL DEFAULT '',
        project_id TEXT NOT NULL DEFAULT '',
        vector TSVECTOR,
        raw TEXT NOT NULL DEFAULT '',
        escaped BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_vector_idx ON documents USING GIN (vector)",
    "CREATE INDEX IF NOT EXISTS documents_name_idx ON documents (name)",
];

pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        key TEXT PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        fragment TEXT NOT NULL DEFAULT '',
        kind TEXT NOT NULL DEFAULT '',
        field TEXT NOT NULL DEFAULT '',
        project_id TEXT NOT NULL DEFAULT '',
        weight TEXT NOT NULL DEFAULT 'D',
        raw TEXT NOT NULL DEFAULT '',
        escaped INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS documents_name_idx ON documents (name)",
    r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS documents_fts USING fts5(
        key UNINDEXED,
        vector,
        weight UNINDEXED,
        tokenize = 'porter unicode61'
    )
    "#,
];

/// Insert a document row, or overwrite every column of the row already stored
/// under the same key.
pub const POSTGRES_UPSERT: &str = r#"
    INSERT INTO documents (key, name, fragment, kind, field, project_id, vector, raw, escaped)
    VALUES ($1, $2, $3, $4, $5, $6, setweight(to_tsvector($7), $8::"char"), $9, $10)
    ON CONFLICT (key) DO UPDATE SET
        name = EXCLUDED.name,
        fragment = EXCLUDED.fragment,
        kind = EXCLUDED.kind,
        field = EXCLUDED.field,
        project_id = EXCLUDED.project_id,
        vector = EXCLUDED.vector,
        raw = EXCLUDED.raw,
        escaped = EXCLUDED.escaped
"#;

pub const SQLITE_UPSERT: &str = r#"
    INSERT INTO documents (key, name, fragment, kind, field, project_id, weight, raw, escaped)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT (key) DO UPDATE SET
        name = excluded.name,
        fragment = excluded.fragment,
        kind = excluded.kind,
        field = excluded.field,
        project_id = excluded.project_id,
        weight = excluded.weight,
        raw = excluded.raw,
        escaped = excluded.escaped
"#;

pub const SQLITE_FTS_DELETE: &str = "DELETE FROM documents_fts WHERE key = ?1";

pub const SQLITE_FTS_INSERT: &str =
    "INSERT INTO documents_fts (key, vector, weight) VALUES (?1, ?2, ?3)";
