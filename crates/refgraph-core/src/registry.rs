//! The resource type registry seam.
//!
//! The grapher only ever reads a registry snapshot through
//! [`ResourceRegistry`]. [`StaticRegistry`] is the in-memory implementation
//! used by manifests and tests; provider code can implement the trait over
//! whatever exporter table it already keeps.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ReferenceAttribute, ResourceType};

/// Read-only view of every exportable resource type and its reference attributes.
pub trait ResourceRegistry {
    /// Every registered resource type.
    fn resource_types(&self) -> BTreeSet<ResourceType>;

    /// Reference attributes declared by `resource_type`.
    ///
    /// Unregistered types yield an empty list.
    fn reference_attributes(&self, resource_type: &ResourceType) -> Vec<ReferenceAttribute>;
}

/// Registry backed by an ordered map from type to its reference attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRegistry {
    types: BTreeMap<ResourceType, Vec<ReferenceAttribute>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resource_type` if it is not already present.
    pub fn insert_type(&mut self, resource_type: impl Into<ResourceType>) {
        self.types.entry(resource_type.into()).or_default();
    }

    /// Attach `attribute` to `owner`, registering `owner` if needed.
    ///
    /// The target type is not registered implicitly.
    pub fn insert_reference(&mut self, owner: impl Into<ResourceType>, attribute: ReferenceAttribute) {
        self.types.entry(owner.into()).or_default().push(attribute);
    }

    #[must_use]
    pub fn with_type(mut self, resource_type: impl Into<ResourceType>) -> Self {
        self.insert_type(resource_type);
        self
    }

    #[must_use]
    pub fn with_reference(
        mut self,
        owner: impl Into<ResourceType>,
        attribute_name: &str,
        target: impl Into<ResourceType>,
    ) -> Self {
        self.insert_reference(owner, ReferenceAttribute::new(attribute_name, target));
        self
    }

    #[must_use]
    pub fn with_excluded_reference(
        mut self,
        owner: impl Into<ResourceType>,
        attribute_name: &str,
        target: impl Into<ResourceType>,
    ) -> Self {
        self.insert_reference(owner, ReferenceAttribute::new(attribute_name, target).excluded());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn contains(&self, resource_type: &str) -> bool {
        self.types.contains_key(resource_type)
    }
}

impl ResourceRegistry for StaticRegistry {
    fn resource_types(&self) -> BTreeSet<ResourceType> {
        self.types.keys().cloned().collect()
    }

    fn reference_attributes(&self, resource_type: &ResourceType) -> Vec<ReferenceAttribute> {
        self.types.get(resource_type).cloned().unwrap_or_default()
    }
}

impl From<BTreeMap<ResourceType, Vec<ReferenceAttribute>>> for StaticRegistry {
    fn from(types: BTreeMap<ResourceType, Vec<ReferenceAttribute>>) -> Self {
        Self { types }
    }
}

impl<R: ResourceRegistry + ?Sized> ResourceRegistry for &R {
    fn resource_types(&self) -> BTreeSet<ResourceType> {
        (**self).resource_types()
    }

    fn reference_attributes(&self, resource_type: &ResourceType) -> Vec<ReferenceAttribute> {
        (**self).reference_attributes(resource_type)
    }
}
