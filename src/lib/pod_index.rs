use std::collections::HashMap;

use crate::lib::kubernetes::PodResources;

/// Pods grouped by the node they are scheduled on.
///
/// Each node owns its pods in listing order. Pods that have not been
/// scheduled yet are not part of any node and are dropped at build time.
#[derive(Debug, Clone, Default)]
pub struct PodIndex {
    nodes: HashMap<String, Vec<PodResources>>,
}

impl PodIndex {
    /// Build the index from a full pod listing
    pub fn build(pods: impl IntoIterator<Item = PodResources>) -> Self {
        let mut nodes: HashMap<String, Vec<PodResources>> = HashMap::new();

        for pod in pods {
            let Some(node_name) = pod.node_name.clone().filter(|n| !n.is_empty()) else {
                continue;
            };
            nodes.entry(node_name).or_default().push(pod);
        }

        Self { nodes }
    }

    /// Pods scheduled on `node`, empty if there are none
    pub fn pods_on(&self, node: &str) -> &[PodResources] {
        self.nodes.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Sum of the memory requests of every container on `node`.
    ///
    /// Containers without a memory request count as zero.
    pub fn requests_for(&self, node: &str) -> i64 {
        self.pods_on(node)
            .iter()
            .flat_map(|pod| &pod.containers)
            .filter_map(|container| container.memory_request)
            .fold(0i64, i64::saturating_add)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn pod_count(&self) -> usize {
        self.nodes.values().map(Vec::len).sum()
    }
}
