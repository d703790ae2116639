//! Resource types and the reference attributes that link them.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an exportable resource type, e.g. `genesyscloud_routing_queue`.
///
/// Ordering is plain string ordering; the graph builder relies on it for
/// deterministic node order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for ResourceType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ResourceType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An attribute on one resource type whose value is the ID of another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceAttribute {
    /// Attribute path on the owning type (e.g. `outbound_email_address.route_id`).
    pub attribute_name: String,
    /// Type the attribute points at.
    pub target_type: ResourceType,
    /// Excluded attributes are dropped from exports, so they never order
    /// resource creation.
    #[serde(default)]
    pub excluded: bool,
}

impl ReferenceAttribute {
    pub fn new(attribute_name: impl Into<String>, target_type: impl Into<ResourceType>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            target_type: target_type.into(),
            excluded: false,
        }
    }

    /// Same attribute, marked as excluded from export-time reference resolution.
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_type_serializes_as_plain_string() {
        let ty = ResourceType::new("genesyscloud_flow");
        let json = serde_json::to_string(&ty).expect("serialize");
        assert_eq!(json, "\"genesyscloud_flow\"");
        assert_eq!(ty.to_string(), "genesyscloud_flow");
    }

    #[test]
    fn reference_attribute_defaults_to_included() {
        let attr: ReferenceAttribute = serde_json::from_str(
            r#"{"attribute_name":"queue_id","target_type":"genesyscloud_routing_queue"}"#,
        )
        .expect("deserialize");
        assert!(!attr.excluded);
        assert_eq!(attr.target_type.as_str(), "genesyscloud_routing_queue");
    }

    #[test]
    fn excluded_builder_sets_flag() {
        let attr = ReferenceAttribute::new("manager", "genesyscloud_user").excluded();
        assert!(attr.excluded);
        assert_eq!(attr.attribute_name, "manager");
    }
}
