//! API spec metadata and resource names.
//!
//! Spec names follow the registry format
//! `projects/{project}/locations/{location}/apis/{api}/versions/{version}/specs/{spec}`,
//! optionally suffixed with `@{revision}`. The `locations/{location}` segment may
//! be omitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Spec metadata as returned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    /// Fully-qualified resource name.
    pub name: String,
    /// File name of the spec contents, e.g. "openapi.yaml".
    pub filename: String,
    /// Declared MIME type, e.g. "application/x.openapi+gzip;version=3".
    pub mime_type: String,
}

impl ApiSpec {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: String::new(),
            mime_type: mime_type.into(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

/// Parsed components of a spec resource name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecName {
    pub project_id: String,
    pub location: String,
    pub api_id: String,
    pub version_id: String,
    pub spec_id: String,
    pub revision_id: Option<String>,
}

impl SpecName {
    pub fn parse(name: &str) -> Result<Self, SearchError> {
        let invalid = || SearchError::InvalidName(name.to_string());

        let parts: Vec<&str> = name.split('/').collect();
        let (project, location, rest) = match parts.as_slice() {
            ["projects", project, "locations", location, rest @ ..] => {
                (*project, (*location).to_string(), rest)
            }
            ["projects", project, rest @ ..] => (*project, "global".to_string(), rest),
            _ => return Err(invalid()),
        };

        let (api, version, spec) = match rest {
            ["apis", api, "versions", version, "specs", spec] => (*api, *version, *spec),
            _ => return Err(invalid()),
        };

        let (spec_id, revision_id) = match spec.split_once('@') {
            Some((id, revision)) if !revision.is_empty() => (id, Some(revision.to_string())),
            Some(_) => return Err(invalid()),
            None => (spec, None),
        };

        if [project, location.as_str(), api, version, spec_id]
            .iter()
            .any(|segment| segment.is_empty())
        {
            return Err(invalid());
        }

        Ok(Self {
            project_id: project.to_string(),
            location,
            api_id: api.to_string(),
            version_id: version.to_string(),
            spec_id: spec_id.to_string(),
            revision_id,
        })
    }
}

impl fmt::Display for SpecName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/apis/{}/versions/{}/specs/{}",
            self.project_id, self.location, self.api_id, self.version_id, self.spec_id
        )?;
        if let Some(revision) = &self.revision_id {
            write!(f, "@{}", revision)?;
        }
        Ok(())
    }
}
