//! Filter-based queries over stored documents.
//!
//! Requirements are equality filters joined with AND. Field names are checked
//! against the document columns when the query is run, so a query can only
//! ever reference known columns.

use crate::client::Dialect;
use crate::error::StorageError;

/// Maximum rows a single `run` reads into memory.
pub const MAX_RESULTS: i64 = 100_000;

/// A bound filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Bool(bool),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Equality filter on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub field: String,
    pub value: Value,
}

/// A query over one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub kind: String,
    pub offset: i64,
    pub descending: Option<String>,
    pub requirements: Vec<Requirement>,
}

impl Query {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            offset: 0,
            descending: None,
            requirements: Vec::new(),
        }
    }

    /// Require `field` to equal `value`.
    pub fn require(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.requirements.push(Requirement {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by `field`, largest first.
    pub fn descending(mut self, field: impl Into<String>) -> Self {
        self.descending = Some(field.into());
        self
    }

    /// Skip the first `offset` results.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset.max(0);
        self
    }

    /// Render the WHERE clause, numbering placeholders from `first_placeholder`.
    ///
    /// Returns an empty string when there are no requirements.
    pub(crate) fn where_clause(
        &self,
        dialect: Dialect,
        first_placeholder: usize,
    ) -> Result<(String, Vec<Value>), StorageError> {
        let mut clauses = Vec::with_capacity(self.requirements.len());
        let mut values = Vec::with_capacity(self.requirements.len());

        for (i, requirement) in self.requirements.iter().enumerate() {
            let column = column_for(&requirement.field)?;
            clauses.push(format!(
                "{} = {}",
                column,
                dialect.placeholder(first_placeholder + i)
            ));
            values.push(requirement.value.clone());
        }

        if clauses.is_empty() {
            Ok((String::new(), values))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), values))
        }
    }

    pub(crate) fn order_clause(&self) -> Result<String, StorageError> {
        match &self.descending {
            Some(field) => Ok(format!(" ORDER BY {} DESC", column_for(field)?)),
            None => Ok(" ORDER BY key".to_string()),
        }
    }
}

/// Map a model field name to its document column.
pub fn column_for(field: &str) -> Result<&'static str, StorageError> {
    match field {
        "key" | "Key" => Ok("key"),
        "name" | "Name" => Ok("name"),
        "fragment" | "Fragment" => Ok("fragment"),
        "kind" | "Kind" => Ok("kind"),
        "field" | "Field" => Ok("field"),
        "project_id" | "ProjectID" => Ok("project_id"),
        "escaped" | "Escaped" => Ok("escaped"),
        other => Err(StorageError::InvalidField(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_clause_postgres() {
        let query = Query::new("Document")
            .require("Key", "k")
            .require("ProjectID", "p");
        let (sql, values) = query.where_clause(Dialect::Postgres, 1).unwrap();
        assert_eq!(sql, " WHERE key = $1 AND project_id = $2");
        assert_eq!(values, vec![Value::from("k"), Value::from("p")]);
    }

    #[test]
    fn test_where_clause_sqlite_offset_numbering() {
        let query = Query::new("Document").require("name", "n");
        let (sql, _) = query.where_clause(Dialect::Sqlite, 3).unwrap();
        assert_eq!(sql, " WHERE name = ?3");
    }

    #[test]
    fn test_where_clause_empty() {
        let (sql, values) = Query::new("Document")
            .where_clause(Dialect::Sqlite, 1)
            .unwrap();
        assert!(sql.is_empty());
        assert!(values.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let query = Query::new("Document").require("key; DROP TABLE documents", "x");
        let err = query.where_clause(Dialect::Postgres, 1).unwrap_err();
        assert!(matches!(err, StorageError::InvalidField(_)));
    }

    #[test]
    fn test_order_clause() {
        assert_eq!(Query::new("Document").order_clause().unwrap(), " ORDER BY key");
        assert_eq!(
            Query::new("Document")
                .descending("ProjectID")
                .order_clause()
                .unwrap(),
            " ORDER BY project_id DESC"
        );
        assert!(Query::new("Document")
            .descending("CreateTime")
            .order_clause()
            .is_err());
    }

    #[test]
    fn test_negative_offset_clamped() {
        assert_eq!(Query::new("Document").offset(-5).offset, 0);
        assert_eq!(Query::new("Document").offset(7).offset, 7);
    }
}
