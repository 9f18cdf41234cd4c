//! Spec format detection.
//!
//! Detection looks at the declared MIME type first. A discovery MIME type is
//! enough on its own; an OpenAPI MIME type is disambiguated by the file name
//! marker in the resource name or filename, then by a `version=` MIME
//! parameter. Anything else is not indexed.

use std::fmt;

use search_types::ApiSpec;

const V2_MARKERS: &[&str] = &["swagger.yaml", "swagger.json"];
const V3_MARKERS: &[&str] = &["openapi.yaml", "openapi.json"];

/// A spec format the indexer can extract documents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecFormat {
    Discovery,
    OpenApiV2,
    OpenApiV3,
}

impl SpecFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecFormat::Discovery => "discovery",
            SpecFormat::OpenApiV2 => "openapi-v2",
            SpecFormat::OpenApiV3 => "openapi-v3",
        }
    }

    /// Determine the format of `spec`, or `None` when it is not indexable.
    pub fn detect(spec: &ApiSpec) -> Option<Self> {
        let mime = spec.mime_type.to_ascii_lowercase();

        if mime.contains("discovery") {
            return Some(SpecFormat::Discovery);
        }
        if !mime.contains("openapi") {
            return None;
        }

        let has_marker = |markers: &[&str]| {
            markers
                .iter()
                .any(|m| spec.name.contains(m) || spec.filename.contains(m))
        };
        if has_marker(V2_MARKERS) {
            return Some(SpecFormat::OpenApiV2);
        }
        if has_marker(V3_MARKERS) {
            return Some(SpecFormat::OpenApiV3);
        }

        match mime_version(&mime) {
            Some(v) if v.starts_with('2') => Some(SpecFormat::OpenApiV2),
            Some(v) if v.starts_with('3') => Some(SpecFormat::OpenApiV3),
            _ => None,
        }
    }
}

impl fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn mime_version(mime: &str) -> Option<&str> {
    mime.split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("version="))
        .map(|v| v.trim_matches('"'))
        .next()
}
