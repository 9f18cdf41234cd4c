//! Spec indexer: format dispatch and document extraction.

use tracing::{debug, info};

use search_types::{ApiSpec, Document, IndexerSettings, SpecName};

use crate::error::IndexerError;
use crate::extraction::{Extraction, ParsedSpec};
use crate::format::SpecFormat;

/// Extraction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Also produce method, schema and parameter sub-documents.
    pub fragments: bool,
}

impl From<&IndexerSettings> for IndexerConfig {
    fn from(settings: &IndexerSettings) -> Self {
        Self {
            fragments: settings.fragments,
        }
    }
}

/// Produces the documents that represent a spec.
#[derive(Debug, Clone, Default)]
pub struct Indexer {
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> IndexerConfig {
        self.config
    }

    /// Extraction variants this indexer runs, in order.
    pub fn extractions(&self) -> Vec<Extraction> {
        let mut extractions = vec![Extraction::Summary];
        if self.config.fragments {
            extractions.extend(Extraction::SUB_DOCUMENTS);
        }
        extractions
    }

    /// Build the documents for `spec` from its raw contents.
    ///
    /// A spec in an unrecognized format yields no documents. Contents that do
    /// not parse as the detected format are an error.
    pub fn documents_for_spec(
        &self,
        spec: &ApiSpec,
        contents: &[u8],
    ) -> Result<Vec<Document>, IndexerError> {
        let Some(format) = SpecFormat::detect(spec) else {
            debug!(name = %spec.name, mime_type = %spec.mime_type, "Skipping unrecognized spec format");
            return Ok(Vec::new());
        };

        let parsed = ParsedSpec::parse(format, contents)?;
        let name = SpecName::parse(&spec.name)?;

        let documents: Vec<Document> = self
            .extractions()
            .iter()
            .flat_map(|extraction| extraction.documents(parsed.tree(), spec, &name.project_id))
            .collect();

        info!(
            name = %spec.name,
            format = %format,
            count = documents.len(),
            "Extracted documents"
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_types::Weight;

    const NAME: &str = "projects/p/locations/global/apis/petstore/versions/v1/specs/openapi";

    const PETSTORE: &str = r#"
openapi: 3.0.0
info:
  title: Pet Store
  version: 1.0.0
  description: Find pets
paths:
  /pets:
    get:
      operationId: listPets
components:
  schemas:
    Pet:
      description: A pet
"#;

    fn petstore() -> ApiSpec {
        ApiSpec::new(NAME, "application/x.openapi+gzip;version=3").with_filename("openapi.yaml")
    }

    #[test]
    fn test_summary_only_by_default() {
        let docs = Indexer::default()
            .documents_for_spec(&petstore(), PETSTORE.as_bytes())
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].key, NAME);
        assert_eq!(docs[0].project_id, "p");
        assert_eq!(docs[0].vector.raw_text, "Pet Store\n1.0.0\nFind pets");
        assert_eq!(docs[0].vector.weight, Weight::A);
    }

    #[test]
    fn test_fragments_enabled() {
        let indexer = Indexer::new(IndexerConfig { fragments: true });
        let docs = indexer
            .documents_for_spec(&petstore(), PETSTORE.as_bytes())
            .unwrap();
        let keys: Vec<&str> = docs.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                NAME.to_string(),
                format!("{}#methods/listPets", NAME),
                format!("{}#schemas/Pet", NAME),
            ]
        );
        assert!(docs.iter().all(|d| d.name == NAME));
    }

    #[test]
    fn test_unrecognized_format_is_empty() {
        let spec = ApiSpec::new(NAME, "application/x.protobuf+zip");
        let docs = Indexer::default().documents_for_spec(&spec, b"\x00\x01").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_parse_failure_is_error() {
        let err = Indexer::default()
            .documents_for_spec(&petstore(), b"info: [")
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_invalid_name_is_error() {
        let spec = ApiSpec::new("apis/petstore", "application/x.openapi").with_filename("openapi.yaml");
        let err = Indexer::default()
            .documents_for_spec(&spec, PETSTORE.as_bytes())
            .unwrap_err();
        assert!(matches!(err, IndexerError::InvalidName(_)));
    }

    #[test]
    fn test_discovery_summary() {
        let spec = ApiSpec::new(
            "projects/p/locations/global/apis/library/versions/v1/specs/discovery",
            "application/x.discovery",
        );
        let contents = br#"{"ownerName": "Google", "title": "Library", "version": "v1", "description": "Books"}"#;
        let docs = Indexer::default().documents_for_spec(&spec, contents).unwrap();
        assert_eq!(docs[0].vector.raw_text, "Google\nLibrary\nv1\nBooks");
    }

    #[test]
    fn test_blank_info_yields_empty_document() {
        let docs = Indexer::default()
            .documents_for_spec(&petstore(), b"openapi: 3.0.0\npaths: {}\n")
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_empty());
    }
}
