//! Google API Discovery documents.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::tree::{lines, scalar_string, Section, SpecTree};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveryDocument {
    pub owner_name: Option<String>,
    pub title: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub version: Option<String>,
    pub description: Option<String>,
    pub parameters: BTreeMap<String, Parameter>,
    pub schemas: BTreeMap<String, Schema>,
    pub methods: BTreeMap<String, Method>,
    pub resources: BTreeMap<String, Resource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameter {
    pub description: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Schema {
    pub id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Method {
    pub id: Option<String>,
    pub path: Option<String>,
    pub http_method: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resource {
    pub methods: BTreeMap<String, Method>,
    pub resources: BTreeMap<String, Resource>,
}

impl DiscoveryDocument {
    pub fn parse(contents: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(contents)
    }
}

fn method_section(name: &str, method: &Method) -> Section {
    let id = method.id.as_deref().unwrap_or(name);
    let route = format!(
        "{} {}",
        method.http_method.as_deref().unwrap_or_default(),
        method.path.as_deref().unwrap_or_default()
    );
    Section::new(
        format!("methods/{}", id),
        lines([id, route.as_str(), method.description.as_deref().unwrap_or_default()]),
    )
}

fn collect_methods(resources: &BTreeMap<String, Resource>, out: &mut Vec<Section>) {
    for resource in resources.values() {
        for (name, method) in &resource.methods {
            out.push(method_section(name, method));
        }
        collect_methods(&resource.resources, out);
    }
}

impl SpecTree for DiscoveryDocument {
    fn summary(&self) -> String {
        lines([
            self.owner_name.as_deref().unwrap_or_default(),
            self.title.as_deref().unwrap_or_default(),
            self.version.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default(),
        ])
    }

    fn methods(&self) -> Vec<Section> {
        let mut sections: Vec<Section> = self
            .methods
            .iter()
            .map(|(name, method)| method_section(name, method))
            .collect();
        collect_methods(&self.resources, &mut sections);
        sections
    }

    fn schemas(&self) -> Vec<Section> {
        self.schemas
            .iter()
            .map(|(name, schema)| {
                let id = schema.id.as_deref().unwrap_or(name);
                Section::new(
                    format!("schemas/{}", name),
                    lines([id, schema.description.as_deref().unwrap_or_default()]),
                )
            })
            .collect()
    }

    fn parameters(&self) -> Vec<Section> {
        self.parameters
            .iter()
            .map(|(name, parameter)| {
                Section::new(
                    format!("parameters/{}", name),
                    lines([
                        name.as_str(),
                        parameter.location.as_deref().unwrap_or_default(),
                        parameter.description.as_deref().unwrap_or_default(),
                    ]),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY: &str = r#"{
        "kind": "discovery#restDescription",
        "ownerName": "Google",
        "title": "Library Agent API",
        "version": "v1",
        "description": "A simple Google Example Library API.",
        "parameters": {
            "key": {"type": "string", "location": "query", "description": "API key."}
        },
        "schemas": {
            "Book": {"id": "Book", "type": "object", "description": "A single book in the library."}
        },
        "resources": {
            "shelves": {
                "methods": {
                    "get": {
                        "id": "libraryagent.shelves.get",
                        "path": "v1/{+name}",
                        "httpMethod": "GET",
                        "description": "Gets a shelf."
                    }
                },
                "resources": {
                    "books": {
                        "methods": {
                            "borrow": {
                                "id": "libraryagent.shelves.books.borrow",
                                "path": "v1/{+name}:borrow",
                                "httpMethod": "POST",
                                "description": "Borrow a book from the library."
                            }
                        }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn test_summary() {
        let doc = DiscoveryDocument::parse(LIBRARY.as_bytes()).unwrap();
        assert_eq!(
            doc.summary(),
            "Google\nLibrary Agent API\nv1\nA simple Google Example Library API."
        );
    }

    #[test]
    fn test_nested_resources_walked() {
        let doc = DiscoveryDocument::parse(LIBRARY.as_bytes()).unwrap();
        let paths: Vec<String> = doc.methods().into_iter().map(|s| s.path).collect();
        assert_eq!(
            paths,
            vec![
                "methods/libraryagent.shelves.get",
                "methods/libraryagent.shelves.books.borrow",
            ]
        );
        let borrow = &doc.methods()[1];
        assert!(borrow.text.contains("POST v1/{+name}:borrow"));
    }

    #[test]
    fn test_schemas_and_parameters() {
        let doc = DiscoveryDocument::parse(LIBRARY.as_bytes()).unwrap();
        let schemas = doc.schemas();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas[0].path, "schemas/Book");
        assert_eq!(schemas[0].text, "Book\nA single book in the library.");

        let parameters = doc.parameters();
        assert_eq!(parameters[0].path, "parameters/key");
        assert_eq!(parameters[0].text, "key\nquery\nAPI key.");
    }

    #[test]
    fn test_invalid_json() {
        assert!(DiscoveryDocument::parse(b"title: not json").is_err());
    }
}
