//! Registry manifests: a file-backed snapshot of the resource type registry.
//!
//! # Shape
//!
//! ```toml
//! [types.genesyscloud_routing_queue.refs."outbound_email_address.route_id"]
//! target = "genesyscloud_routing_email_route"
//!
//! [types.genesyscloud_user.refs.manager]
//! target = "genesyscloud_user"
//! excluded = true
//!
//! [types.genesyscloud_flow]
//! ```
//!
//! The same shape is accepted as JSON or YAML. The format is picked from the
//! file extension.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::model::ReferenceAttribute;
use crate::registry::StaticRegistry;

/// Errors from reading or parsing a registry manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported manifest format for {0} (expected .toml, .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    #[error("failed to parse {format} manifest: {message}")]
    Parse {
        format: ManifestFormat,
        message: String,
    },
}

impl ManifestError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCode::ManifestNotFound
            }
            Self::Read { .. } => ErrorCode::InternalUnexpected,
            Self::UnsupportedFormat(_) => ErrorCode::UnsupportedManifestFormat,
            Self::Parse { .. } => ErrorCode::ManifestParseError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Pick the format from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

impl std::fmt::Display for ManifestFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        })
    }
}

/// On-disk manifest document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub types: BTreeMap<String, TypeEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeEntry {
    /// Attribute name to reference settings.
    #[serde(default)]
    pub refs: BTreeMap<String, RefEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefEntry {
    pub target: String,
    #[serde(default)]
    pub excluded: bool,
}

impl RegistryManifest {
    /// Convert into a registry. Targets are carried as written; unknown
    /// targets are reported by the graph builder, not here.
    #[must_use]
    pub fn into_registry(self) -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        for (type_name, entry) in self.types {
            registry.insert_type(type_name.as_str());
            for (attribute, settings) in entry.refs {
                let mut reference = ReferenceAttribute::new(attribute, settings.target);
                reference.excluded = settings.excluded;
                registry.insert_reference(type_name.as_str(), reference);
            }
        }
        registry
    }
}

/// Parse manifest text in the given format.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] when the document does not match the
/// manifest shape.
pub fn parse_manifest(content: &str, format: ManifestFormat) -> Result<RegistryManifest, ManifestError> {
    let parsed = match format {
        ManifestFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        ManifestFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        ManifestFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ManifestError::Parse { format, message })
}

/// Read a manifest file and build a [`StaticRegistry`] from it.
///
/// # Errors
///
/// Returns an error if the extension is not recognized, the file cannot be
/// read, or its contents do not parse.
#[instrument]
pub fn load_registry(path: &Path) -> Result<StaticRegistry, ManifestError> {
    let format = ManifestFormat::from_path(path)
        .ok_or_else(|| ManifestError::UnsupportedFormat(path.to_path_buf()))?;

    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let registry = parse_manifest(&content, format)?.into_registry();
    debug!(types = registry.len(), %format, "loaded registry manifest");
    Ok(registry)
}
