//! Document synchronization and full-text search.
//!
//! These helpers sit on top of a [`Session`] and carry the rules shared by
//! every caller: empty documents delete their key, others are escaped and
//! upserted, and ranked search returns a key with a highlighted excerpt.

use sqlx::FromRow;
use tracing::{debug, info};

use search_types::{Document, DOCUMENT_ENTITY};

use crate::client::{Dialect, Session};
use crate::error::StorageError;
use crate::query::Query;

/// Ranked search over the PostgreSQL `tsvector` column.
pub const POSTGRES_SEARCH: &str = r#"
SELECT key, ts_headline(raw, q, 'StartSel="**", StopSel="**"') AS excerpt
FROM (
  SELECT key, raw, ts_rank(vector, q) AS rank, q
  FROM documents, plainto_tsquery($1) q
  WHERE vector @@ q
  ORDER BY rank DESC
) AS ranked
"#;

/// Ranked search over the SQLite FTS5 table. `bm25` is negative with better
/// matches lower, so scaling by the weight factor and sorting ascending puts
/// heavier-weighted documents first.
pub const SQLITE_SEARCH: &str = r#"
SELECT key, highlight(documents_fts, 1, '**', '**') AS excerpt
FROM documents_fts
WHERE documents_fts MATCH ?1
ORDER BY bm25(documents_fts) * CASE weight
    WHEN 'A' THEN 1.0
    WHEN 'B' THEN 0.4
    WHEN 'C' THEN 0.2
    ELSE 0.1
END
"#;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SearchHit {
    pub key: String,
    pub excerpt: String,
}

/// Bring storage in line with a freshly extracted document set.
///
/// Empty documents delete any row stored under their key; every other
/// document is escaped and upserted. Stops at the first error, leaving
/// earlier writes in place.
#[tracing::instrument(skip(session, documents), fields(count = documents.len()))]
pub async fn update_documents(
    session: &mut Session,
    documents: Vec<Document>,
) -> Result<(), StorageError> {
    for document in documents {
        if document.is_empty() {
            delete_document(session, &document.key).await?;
        } else {
            save_document(session, document).await?;
        }
    }
    Ok(())
}

/// Delete the document stored under `key`, if any.
pub async fn delete_document(session: &mut Session, key: &str) -> Result<u64, StorageError> {
    let deleted = session
        .delete(&Query::new(DOCUMENT_ENTITY).require("key", key))
        .await?;
    debug!(key, deleted, "Deleted empty document");
    Ok(deleted)
}

/// Escape and upsert one document.
pub async fn save_document(session: &mut Session, document: Document) -> Result<(), StorageError> {
    let document = document.escaped();
    session.put_document(&document).await
}

/// Delete every document whose owning resource is `name`.
///
/// Returns how many documents were removed.
#[tracing::instrument(skip(session))]
pub async fn delete_resource_documents(
    session: &mut Session,
    name: &str,
) -> Result<u64, StorageError> {
    let deleted = session
        .delete(&Query::new(DOCUMENT_ENTITY).require("name", name))
        .await?;
    if deleted > 0 {
        info!(name, deleted, "Deleted resource documents");
    }
    Ok(deleted)
}

/// Ranked full-text search. A blank query matches nothing.
#[tracing::instrument(skip(session))]
pub async fn search_documents(
    session: &mut Session,
    q: &str,
) -> Result<Vec<SearchHit>, StorageError> {
    let hits = match session.dialect() {
        Dialect::Postgres => {
            if q.trim().is_empty() {
                return Ok(Vec::new());
            }
            session.raw::<SearchHit>(POSTGRES_SEARCH, &[q]).await?
        }
        Dialect::Sqlite => match sqlite_match_expression(q) {
            Some(expr) => session.raw::<SearchHit>(SQLITE_SEARCH, &[&expr]).await?,
            None => return Ok(Vec::new()),
        },
    };
    debug!(hits = hits.len(), "Search complete");
    Ok(hits)
}

/// Turn free text into an FTS5 expression requiring every word, the same
/// reading `plainto_tsquery` gives it. Words are quoted so operator syntax in
/// the input is matched literally.
pub fn sqlite_match_expression(q: &str) -> Option<String> {
    let terms: Vec<String> = q
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" AND "))
    }
}
