//! Derived, deduplicated view of container mounts.

use crate::types::{ContainerSummary, MountGroup};
use std::collections::HashMap;

/// Aggregate the mounts declared across all containers.
///
/// Mounts are keyed by their literal `source->destination` pair; a pair
/// appears at most once in the output regardless of how many containers
/// declare it, with the owning-container set unioned idempotently. Output is
/// stably sorted by source (byte order) for deterministic display.
///
/// This is a pure function of the container collection, recomputed from
/// scratch on every call; container lists are small enough that correctness
/// wins over incremental maintenance.
pub fn aggregate_mounts(containers: &[ContainerSummary]) -> Vec<MountGroup> {
    let mut groups: HashMap<String, MountGroup> = HashMap::new();

    for container in containers {
        for mount in &container.mounts {
            let key = format!("{}->{}", mount.source, mount.destination);
            let group = groups.entry(key).or_insert_with(|| MountGroup {
                descriptor: mount.clone(),
                container_ids: Vec::new(),
            });
            if !group.container_ids.contains(&container.id) {
                group.container_ids.push(container.id.clone());
            }
        }
    }

    let mut aggregated: Vec<MountGroup> = groups.into_values().collect();
    aggregated.sort_by(|a, b| a.descriptor.source.cmp(&b.descriptor.source));
    aggregated
}
