//! Domain grouping of ranked resources.

use crate::error::ResourceError;
use crate::resource::{url_host, PushGroup, Resource};
use crate::stable_set::{CaptureTiming, GroupBuilder};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Groups ranked resources by url host.
///
/// Groups appear in the order their host is first seen, so the group list is
/// ordered by anchor `order`. Within a group resources keep ascending `order`;
/// the earliest one becomes the anchor. Parent back-references come from the
/// reference capture's initiator data.
#[derive(Debug, Clone, Default)]
pub struct DomainGroupBuilder {
    trainable_hosts: Option<BTreeSet<String>>,
}

impl DomainGroupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict trainability to the given hosts; resources on other hosts are
    /// marked untrainable.
    pub fn with_trainable_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.trainable_hosts = Some(
            hosts
                .into_iter()
                .map(|h| h.as_ref().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    fn host_trainable(&self, host: &str) -> bool {
        self.trainable_hosts
            .as_ref()
            .map_or(true, |hosts| hosts.contains(host))
    }
}

impl GroupBuilder for DomainGroupBuilder {
    fn build_groups(
        &self,
        mut ranked: Vec<Resource>,
        reference: &CaptureTiming,
    ) -> Result<Vec<PushGroup>, ResourceError> {
        ranked.sort_by_key(|r| r.order());

        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut buckets: Vec<(String, Vec<Resource>)> = Vec::new();

        for resource in ranked {
            let host = url_host(resource.url());
            let mut resource = match reference.initiator(resource.url()) {
                Some(initiator) if initiator != resource.url() => {
                    let initiator = initiator.to_string();
                    resource.with_parent(initiator)
                }
                _ => resource,
            };
            if !self.host_trainable(&host) {
                resource = resource.with_trainable(false);
            }

            let slot = *slots.entry(host.clone()).or_insert_with(|| {
                buckets.push((host, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(resource);
        }

        let groups = buckets
            .into_iter()
            .enumerate()
            .map(|(id, (host, resources))| PushGroup::new(id, host, resources))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(groups = groups.len(), "Built domain push groups");
        Ok(groups)
    }
}
