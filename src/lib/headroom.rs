use std::collections::{HashMap, HashSet};

use log::{debug, info};
use serde::Serialize;

use crate::lib::kubernetes::{ClusterSnapshot, NodeUsage, PodResources, PodUsage};
use crate::lib::pod_index::PodIndex;
use crate::{KubernetesError::ResourceNotFound, Result};

/// Memory headroom figures for a single node, all in bytes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub name: String,
    pub allocatable: i64,
    pub used: i64,
    pub free: i64,
    pub requests: i64,
    /// `used / requests`; NaN or infinite when nothing is requested
    pub efficiency: f64,
    pub schedulable: i64,
    pub free_with_additional: i64,
    pub schedulable_with_additional: i64,
    pub sufficient: bool,
}

/// A container using more memory than it requested on a node short of headroom
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictableCandidate {
    pub node: String,
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub requested: i64,
    pub used: i64,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadroomReport {
    pub nodes: Vec<NodeSummary>,
    pub candidates: Vec<EvictableCandidate>,
}

impl HeadroomReport {
    pub fn insufficient_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| !n.sufficient).count()
    }
}

type ContainerMemory = HashMap<String, i64>;

/// Live container memory keyed by namespace, then pod, then container name
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    usage: HashMap<String, HashMap<String, ContainerMemory>>,
    len: usize,
}

impl UsageIndex {
    /// Index a pod metrics listing. The first entry wins on duplicate keys.
    pub fn build(pods: &[PodUsage]) -> Self {
        let mut index = Self::default();

        for pod in pods {
            let containers = index
                .usage
                .entry(pod.namespace.clone())
                .or_default()
                .entry(pod.name.clone())
                .or_default();
            for container in &pod.containers {
                if !containers.contains_key(&container.name) {
                    containers.insert(container.name.clone(), container.memory);
                    index.len += 1;
                }
            }
        }

        index
    }

    pub fn get(&self, namespace: &str, pod: &str, container: &str) -> Option<i64> {
        self.usage.get(namespace)?.get(pod)?.get(container).copied()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

pub struct HeadroomCalculator {
    additional: i64,
}

impl HeadroomCalculator {
    /// Create a calculator that checks room for `additional` bytes on each node
    pub fn new(additional: i64) -> Self {
        Self { additional }
    }

    /// Compute summaries for every node with metrics, in ascending name order,
    /// and the eviction candidates of the nodes that lack headroom.
    pub fn calculate(&self, snapshot: ClusterSnapshot) -> Result<HeadroomReport> {
        let ClusterSnapshot {
            nodes,
            pods,
            mut node_usage,
            pod_usage,
        } = snapshot;

        let allocatable: HashMap<String, i64> = nodes
            .into_iter()
            .map(|n| (n.name, n.allocatable_memory))
            .collect();
        let pods = PodIndex::build(pods);
        let usage = UsageIndex::build(&pod_usage);
        debug!(
            "Indexed {} pods on {} nodes and {} container metrics",
            pods.pod_count(),
            pods.node_count(),
            usage.len()
        );

        node_usage.sort_by(|a, b| a.name.cmp(&b.name));

        let mut report = HeadroomReport::default();
        for node in &node_usage {
            let node_allocatable = *allocatable
                .get(&node.name)
                .ok_or_else(|| ResourceNotFound(format!("node {}", node.name)))?;

            let summary = self.summarize(
                &node.name,
                node_allocatable,
                node.memory,
                pods.requests_for(&node.name),
            );

            if !summary.sufficient {
                debug!("Node {} lacks headroom, scanning its containers", node.name);
                report.candidates.extend(self.evictable_on(
                    &node.name,
                    pods.pods_on(&node.name),
                    &usage,
                ));
            }
            report.nodes.push(summary);
        }

        for name in nodes_without_metrics(&allocatable, &node_usage) {
            debug!("Skipping node {} without metrics", name);
        }

        info!(
            "{} of {} nodes have room for {} additional bytes, {} evictable containers",
            report.nodes.len() - report.insufficient_nodes(),
            report.nodes.len(),
            self.additional,
            report.candidates.len()
        );
        Ok(report)
    }

    /// Headroom figures for one node.
    ///
    /// With zero requests the efficiency is NaN (nothing used) or +infinity.
    pub fn summarize(&self, name: &str, allocatable: i64, used: i64, requests: i64) -> NodeSummary {
        let free = allocatable.saturating_sub(used);
        let efficiency = used as f64 / requests as f64;
        let schedulable = allocatable.saturating_sub(requests);
        let free_with_additional = free.saturating_sub(self.additional);
        let schedulable_with_additional = schedulable.saturating_sub(self.additional);

        NodeSummary {
            name: name.to_string(),
            allocatable,
            used,
            free,
            requests,
            efficiency,
            schedulable,
            free_with_additional,
            schedulable_with_additional,
            sufficient: free_with_additional > 0 && schedulable_with_additional > 0,
        }
    }

    /// Containers on `node` whose live usage exceeds their request and whose
    /// limit leaves something above the request.
    ///
    /// A container without a memory limit is treated as unbounded.
    pub fn evictable_on(
        &self,
        node: &str,
        pods: &[PodResources],
        usage: &UsageIndex,
    ) -> Vec<EvictableCandidate> {
        let mut candidates = Vec::new();

        for pod in pods {
            for container in &pod.containers {
                let requested = match container.memory_request {
                    Some(r) if r != 0 => r,
                    _ => continue,
                };
                if container.memory_limit.is_some_and(|limit| requested >= limit) {
                    continue;
                }

                let Some(used) = usage.get(&pod.namespace, &pod.name, &container.name) else {
                    continue;
                };
                if used > requested {
                    candidates.push(EvictableCandidate {
                        node: node.to_string(),
                        namespace: pod.namespace.clone(),
                        pod: pod.name.clone(),
                        container: container.name.clone(),
                        requested,
                        used,
                        limit: container.memory_limit,
                    });
                }
            }
        }

        candidates
    }
}

/// Names of listed nodes that report no metrics, in ascending order
fn nodes_without_metrics<'a>(
    allocatable: &'a HashMap<String, i64>,
    node_usage: &[NodeUsage],
) -> Vec<&'a str> {
    let reporting: HashSet<&str> = node_usage.iter().map(|n| n.name.as_str()).collect();
    let mut missing: Vec<&str> = allocatable
        .keys()
        .map(String::as_str)
        .filter(|name| !reporting.contains(name))
        .collect();
    missing.sort_unstable();
    missing
}
