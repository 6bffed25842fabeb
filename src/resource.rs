//! Resource model
//!
//! Value types for observed page assets and the push groups built from them.
//! Both types validate on construction and on deserialization, so a `Resource`
//! or `PushGroup` in hand always satisfies its invariants.

use crate::error::ResourceError;
use crate::types::ResourceType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// An observed page asset.
///
/// Identity is the `url`: two resources with the same url are equal and hash
/// the same regardless of their other attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawResource")]
pub struct Resource {
    url: String,
    order: u32,
    #[serde(rename = "type")]
    resource_type: ResourceType,
    size: u64,
    trainable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

/// Wire form of a resource, validated into [`Resource`].
#[derive(Debug, Clone, Deserialize)]
struct RawResource {
    url: String,
    order: i64,
    #[serde(rename = "type", default)]
    resource_type: ResourceType,
    #[serde(default)]
    size: u64,
    #[serde(default = "default_true")]
    trainable: bool,
    #[serde(default)]
    parent: Option<String>,
}

fn default_true() -> bool {
    true
}

impl TryFrom<RawResource> for Resource {
    type Error = ResourceError;

    fn try_from(raw: RawResource) -> Result<Self, Self::Error> {
        let mut resource = Resource::new(raw.url, raw.order)?
            .with_type(raw.resource_type)
            .with_size(raw.size)
            .with_trainable(raw.trainable);
        resource.parent = raw.parent;
        Ok(resource)
    }
}

impl Resource {
    /// Create a trainable resource of unknown type.
    ///
    /// Fails with `InvalidResource` when the url is empty or the order is negative.
    pub fn new(url: impl Into<String>, order: i64) -> Result<Self, ResourceError> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(ResourceError::EmptyUrl);
        }
        if order < 0 {
            return Err(ResourceError::NegativeOrder { url, order });
        }
        let order = u32::try_from(order)
            .map_err(|_| ResourceError::OrderOverflow { url: url.clone(), order })?;

        Ok(Self {
            url,
            order,
            resource_type: ResourceType::default(),
            size: 0,
            trainable: true,
            parent: None,
        })
    }

    pub fn with_type(mut self, resource_type: ResourceType) -> Self {
        self.resource_type = resource_type;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    pub fn with_trainable(mut self, trainable: bool) -> Self {
        self.trainable = trainable;
        self
    }

    /// Record the url of the resource whose load caused this one.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Reassign the rank; used once when a consensus ordering is applied.
    pub(crate) fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn trainable(&self) -> bool {
        self.trainable
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Host part of the url, lowercased. Falls back to the whole url when it has no scheme.
    pub fn host(&self) -> String {
        url_host(&self.url)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

/// Extract the lowercased host from an absolute url.
pub(crate) fn url_host(url: &str) -> String {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let authority = rest
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or(rest);
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = match host.rfind(':') {
        // keep bracketed IPv6 literals intact
        Some(idx) if !host[idx..].contains(']') => &host[..idx],
        _ => host,
    };
    host.to_ascii_lowercase()
}

/// An ordered run of resources sharing one dependency anchor.
///
/// `resources[0]` is the anchor and is never pushed; every later resource is
/// push-eligible and loads strictly after the one before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPushGroup")]
pub struct PushGroup {
    id: usize,
    name: String,
    resources: Vec<Resource>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPushGroup {
    id: usize,
    name: String,
    resources: Vec<Resource>,
}

impl TryFrom<RawPushGroup> for PushGroup {
    type Error = ResourceError;

    fn try_from(raw: RawPushGroup) -> Result<Self, Self::Error> {
        PushGroup::new(raw.id, raw.name, raw.resources)
    }
}

impl PushGroup {
    /// Build a group, enforcing anchor presence and strictly increasing order.
    pub fn new(
        id: usize,
        name: impl Into<String>,
        resources: Vec<Resource>,
    ) -> Result<Self, ResourceError> {
        let name = name.into();
        if resources.is_empty() {
            return Err(ResourceError::EmptyGroup { group: name });
        }
        for pair in resources.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if current.order <= previous.order {
                return Err(ResourceError::GroupOrder {
                    group: name,
                    url: current.url.clone(),
                    order: current.order,
                    previous: previous.url.clone(),
                    previous_order: previous.order,
                });
            }
        }
        Ok(Self {
            id,
            name,
            resources,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// The resource whose load triggers the rest of the group.
    pub fn anchor(&self) -> &Resource {
        &self.resources[0]
    }

    /// Push-eligible resources, i.e. everything after the anchor.
    pub fn push_resources(&self) -> &[Resource] {
        &self.resources[1..]
    }

    /// A group is trainable iff its anchor is.
    pub fn trainable(&self) -> bool {
        self.anchor().trainable
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Always false: a group holds at least its anchor.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Check that `order` is unique across a whole group list.
pub fn validate_group_orders(groups: &[PushGroup]) -> Result<(), ResourceError> {
    let mut seen: HashMap<u32, &str> = HashMap::new();
    for resource in groups.iter().flat_map(|g| g.resources.iter()) {
        if let Some(first) = seen.insert(resource.order, resource.url()) {
            return Err(ResourceError::DuplicateOrder {
                order: resource.order,
                first: first.to_string(),
                second: resource.url.clone(),
            });
        }
    }
    Ok(())
}
