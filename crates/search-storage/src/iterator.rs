//! Result iterator for `Session::run`.
//!
//! All matching rows are fetched up front (bounded by `MAX_RESULTS`); the
//! iterator walks the in-memory copy.

use search_types::{Document, DOCUMENT_ENTITY};

use crate::key::Key;

/// Iterates query results, yielding each document with its key.
/// `None` signals there are no more results.
#[derive(Debug, Default)]
pub struct DocumentIterator {
    values: Vec<Document>,
    index: usize,
    cursor: String,
}

impl DocumentIterator {
    pub(crate) fn new(values: Vec<Document>) -> Self {
        Self {
            values,
            index: 0,
            cursor: String::new(),
        }
    }

    /// Key of the last document returned, empty before the first call to `next`.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Number of documents not yet returned.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.index
    }
}

impl Iterator for DocumentIterator {
    type Item = (Key, Document);

    fn next(&mut self) -> Option<Self::Item> {
        let document = self.values.get(self.index)?.clone();
        self.index += 1;
        self.cursor = document.key.clone();
        Some((Key::new(DOCUMENT_ENTITY, document.key.clone()), document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(key: &str) -> Document {
        Document {
            key: key.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_iterates_in_order_then_stops() {
        let mut it = DocumentIterator::new(vec![doc("a"), doc("b")]);
        assert_eq!(it.remaining(), 2);
        assert_eq!(it.cursor(), "");

        let (key, document) = it.next().unwrap();
        assert_eq!(key.to_string(), "Document:a");
        assert_eq!(document.key, "a");
        assert_eq!(it.cursor(), "a");

        let (key, _) = it.next().unwrap();
        assert_eq!(key.name, "b");
        assert!(it.next().is_none());
        assert!(it.next().is_none());
        assert_eq!(it.cursor(), "b");
    }

    #[test]
    fn test_empty_iterator() {
        let mut it = DocumentIterator::default();
        assert!(it.next().is_none());
        assert_eq!(it.remaining(), 0);
    }
}
