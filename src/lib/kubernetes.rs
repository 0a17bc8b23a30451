use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::{Api, ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use log::{debug, info};
use serde::Deserialize;

use crate::lib::quantity::{MEMORY, memory_of, parse_quantity};
use crate::{
    Config as HeadroomConfig, ConfigError::FileError, ConfigError::InvalidValue,
    KubernetesError::ApiError, KubernetesError::ConnectionFailed,
    KubernetesError::InvalidResource, Result,
};

const METRICS_GROUP: &str = "metrics.k8s.io";
const METRICS_VERSION: &str = "v1beta1";

/// Allocatable memory of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapacity {
    pub name: String,
    pub allocatable_memory: i64,
}

/// Owned snapshot of a pod and the memory its containers declare
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodResources {
    pub namespace: String,
    pub name: String,
    pub node_name: Option<String>,
    pub containers: Vec<ContainerResources>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerResources {
    pub name: String,
    pub memory_request: Option<i64>,
    pub memory_limit: Option<i64>,
}

/// Current memory usage of a node from metrics.k8s.io
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUsage {
    pub name: String,
    pub memory: i64,
}

/// Current memory usage of a pod's containers from metrics.k8s.io
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodUsage {
    pub namespace: String,
    pub name: String,
    pub containers: Vec<ContainerUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUsage {
    pub name: String,
    pub memory: i64,
}

/// Everything read from the cluster for one run
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<NodeCapacity>,
    pub pods: Vec<PodResources>,
    pub node_usage: Vec<NodeUsage>,
    pub pod_usage: Vec<PodUsage>,
}

#[derive(Debug, Deserialize)]
struct UsageFields {
    #[serde(default)]
    usage: BTreeMap<String, Quantity>,
}

#[derive(Debug, Deserialize)]
struct PodMetricsFields {
    #[serde(default)]
    containers: Vec<ContainerMetricsFields>,
}

#[derive(Debug, Deserialize)]
struct ContainerMetricsFields {
    name: String,
    #[serde(default)]
    usage: BTreeMap<String, Quantity>,
}

pub struct KubernetesLoader {
    client: Client,
}

impl KubernetesLoader {
    pub async fn new(config: &HeadroomConfig) -> Result<Self> {
        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };

        let client = if let Some(ref path) = config.kubeconfig {
            debug!("Reading Kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| FileError(e.to_string()))?;
            let custom_config = Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .map_err(|e| InvalidValue(e.to_string()))?;

            debug!("Creating a Kubernetes client using custom Kubeconfig file");
            Client::try_from(custom_config).map_err(|e| ConnectionFailed(e.to_string()))?
        } else if config.context.is_some() {
            debug!("Using custom context for Kubeconfig");
            let custom_config = Config::from_kubeconfig(&options)
                .await
                .map_err(|e| InvalidValue(e.to_string()))?;

            debug!("Creating a Kubernetes client using custom context");
            Client::try_from(custom_config).map_err(|e| ConnectionFailed(e.to_string()))?
        } else {
            debug!("Creating a Kubernetes client using default Kubeconfig");
            Client::try_default()
                .await
                .map_err(|e| ConnectionFailed(e.to_string()))?
        };

        info!("Successfully created Kubernetes client");
        Ok(Self { client })
    }

    /// Read every listing the report needs, one call after another
    pub async fn snapshot(&self) -> Result<ClusterSnapshot> {
        let node_usage = self.get_node_metrics().await?;
        let nodes = self.get_nodes().await?;
        let pods = self.get_pods().await?;
        let pod_usage = self.get_pod_metrics().await?;

        Ok(ClusterSnapshot {
            nodes,
            pods,
            node_usage,
            pod_usage,
        })
    }

    pub async fn get_nodes(&self) -> Result<Vec<NodeCapacity>> {
        debug!("Listing all nodes");
        let api: Api<Node> = Api::all(self.client.clone());
        let nodes = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ApiError(e.to_string()))?;

        let nodes = nodes
            .items
            .iter()
            .map(node_capacity)
            .collect::<Result<Vec<_>>>()?;
        info!("Retrieved {} nodes", nodes.len());
        Ok(nodes)
    }

    pub async fn get_pods(&self) -> Result<Vec<PodResources>> {
        debug!("Listing all pods in all namespaces");
        let api: Api<Pod> = Api::all(self.client.clone());
        let pods = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ApiError(e.to_string()))?;

        let pods = pods
            .items
            .iter()
            .map(pod_resources)
            .collect::<Result<Vec<_>>>()?;
        info!("Retrieved {} pods", pods.len());
        Ok(pods)
    }

    pub async fn get_node_metrics(&self) -> Result<Vec<NodeUsage>> {
        debug!("Listing current node metrics");
        let objects = self.list_metrics("NodeMetrics", "nodes").await?;
        let usage = objects
            .into_iter()
            .map(node_usage)
            .collect::<Result<Vec<_>>>()?;
        info!("Retrieved metrics for {} nodes", usage.len());
        Ok(usage)
    }

    pub async fn get_pod_metrics(&self) -> Result<Vec<PodUsage>> {
        debug!("Listing current pod metrics in all namespaces");
        let objects = self.list_metrics("PodMetrics", "pods").await?;
        let usage = objects
            .into_iter()
            .map(pod_usage)
            .collect::<Result<Vec<_>>>()?;
        info!("Retrieved metrics for {} pods", usage.len());
        Ok(usage)
    }

    async fn list_metrics(&self, kind: &str, plural: &str) -> Result<Vec<DynamicObject>> {
        let gvk = GroupVersionKind::gvk(METRICS_GROUP, METRICS_VERSION, kind);
        let resource = ApiResource::from_gvk_with_plural(&gvk, plural);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ApiError(format!("{}.{}: {}", plural, METRICS_GROUP, e)))?;
        Ok(list.items)
    }
}

pub fn node_capacity(node: &Node) -> Result<NodeCapacity> {
    let name = node.metadata.name.clone().unwrap_or_default();
    let allocatable = node.status.as_ref().and_then(|s| s.allocatable.as_ref());

    Ok(NodeCapacity {
        allocatable_memory: memory_of(allocatable)?.unwrap_or(0),
        name,
    })
}

pub fn pod_resources(pod: &Pod) -> Result<PodResources> {
    let spec = pod.spec.as_ref();

    let containers = spec
        .map(|s| s.containers.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|container| -> Result<ContainerResources> {
            let resources = container.resources.as_ref();
            Ok(ContainerResources {
                name: container.name.clone(),
                memory_request: memory_of(resources.and_then(|r| r.requests.as_ref()))?,
                memory_limit: memory_of(resources.and_then(|r| r.limits.as_ref()))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PodResources {
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        name: pod.metadata.name.clone().unwrap_or_default(),
        node_name: spec
            .and_then(|s| s.node_name.clone())
            .filter(|n| !n.is_empty()),
        containers,
    })
}

pub fn node_usage(object: DynamicObject) -> Result<NodeUsage> {
    let name = object.metadata.name.unwrap_or_default();
    let fields: UsageFields = serde_json::from_value(object.data)
        .map_err(|e| InvalidResource(format!("node metrics {}: {}", name, e)))?;

    Ok(NodeUsage {
        memory: usage_memory(&fields.usage)?,
        name,
    })
}

pub fn pod_usage(object: DynamicObject) -> Result<PodUsage> {
    let namespace = object.metadata.namespace.unwrap_or_default();
    let name = object.metadata.name.unwrap_or_default();
    let fields: PodMetricsFields = serde_json::from_value(object.data)
        .map_err(|e| InvalidResource(format!("pod metrics {}/{}: {}", namespace, name, e)))?;

    let containers = fields
        .containers
        .into_iter()
        .map(|c| -> Result<ContainerUsage> {
            Ok(ContainerUsage {
                memory: usage_memory(&c.usage)?,
                name: c.name,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PodUsage {
        namespace,
        name,
        containers,
    })
}

fn usage_memory(usage: &BTreeMap<String, Quantity>) -> Result<i64> {
    Ok(usage
        .get(MEMORY)
        .map(|q| parse_quantity(&q.0))
        .transpose()?
        .unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, NodeStatus, PodSpec, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use serde_json::json;

    fn memory(value: &str) -> Option<BTreeMap<String, Quantity>> {
        Some(BTreeMap::from([(
            MEMORY.to_string(),
            Quantity(value.to_string()),
        )]))
    }

    fn container(name: &str, request: Option<&str>, limit: Option<&str>) -> Container {
        Container {
            name: name.to_string(),
            resources: Some(ResourceRequirements {
                requests: request.and_then(memory),
                limits: limit.and_then(memory),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn pod(node_name: Option<&str>, containers: Vec<Container>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("shop".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: node_name.map(str::to_string),
                containers,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_node_capacity_reads_allocatable_memory() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("node-a".to_string()),
                ..Default::default()
            },
            status: Some(NodeStatus {
                allocatable: memory("16Gi"),
                ..Default::default()
            }),
            ..Default::default()
        };

        let capacity = node_capacity(&node).unwrap();
        assert_eq!(capacity.name, "node-a");
        assert_eq!(capacity.allocatable_memory, 16 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_node_without_status_has_zero_allocatable() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("bare".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(node_capacity(&node).unwrap().allocatable_memory, 0);
    }

    #[test]
    fn test_pod_resources_reads_requests_and_limits() {
        let pod = pod(
            Some("node-a"),
            vec![
                container("app", Some("128Mi"), Some("256Mi")),
                container("sidecar", None, None),
            ],
        );

        let resources = pod_resources(&pod).unwrap();
        assert_eq!(resources.namespace, "shop");
        assert_eq!(resources.name, "web-0");
        assert_eq!(resources.node_name.as_deref(), Some("node-a"));
        assert_eq!(resources.containers.len(), 2);
        assert_eq!(resources.containers[0].memory_request, Some(128 * 1024 * 1024));
        assert_eq!(resources.containers[0].memory_limit, Some(256 * 1024 * 1024));
        assert_eq!(resources.containers[1].memory_request, None);
        assert_eq!(resources.containers[1].memory_limit, None);
    }

    #[test]
    fn test_empty_node_name_is_unassigned() {
        let resources = pod_resources(&pod(Some(""), vec![])).unwrap();
        assert_eq!(resources.node_name, None);
    }

    #[test]
    fn test_malformed_request_is_an_error() {
        let pod = pod(Some("node-a"), vec![container("app", Some("many"), None)]);
        assert!(pod_resources(&pod).is_err());
    }

    #[test]
    fn test_node_usage_from_metrics_object() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "NodeMetrics",
            "metadata": { "name": "node-a" },
            "timestamp": "2024-01-01T00:00:00Z",
            "window": "20s",
            "usage": { "cpu": "250m", "memory": "2048Ki" }
        }))
        .unwrap();

        let usage = node_usage(object).unwrap();
        assert_eq!(usage.name, "node-a");
        assert_eq!(usage.memory, 2048 * 1024);
    }

    #[test]
    fn test_node_usage_without_memory_is_zero() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "NodeMetrics",
            "metadata": { "name": "node-b" },
            "usage": { "cpu": "1" }
        }))
        .unwrap();

        assert_eq!(node_usage(object).unwrap().memory, 0);
    }

    #[test]
    fn test_pod_usage_from_metrics_object() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "PodMetrics",
            "metadata": { "name": "web-0", "namespace": "shop" },
            "containers": [
                { "name": "app", "usage": { "cpu": "10m", "memory": "150Mi" } },
                { "name": "sidecar", "usage": { "memory": "1000" } }
            ]
        }))
        .unwrap();

        let usage = pod_usage(object).unwrap();
        assert_eq!(usage.namespace, "shop");
        assert_eq!(usage.name, "web-0");
        assert_eq!(
            usage.containers,
            vec![
                ContainerUsage {
                    name: "app".to_string(),
                    memory: 150 * 1024 * 1024,
                },
                ContainerUsage {
                    name: "sidecar".to_string(),
                    memory: 1000,
                },
            ]
        );
    }

    #[test]
    fn test_pod_usage_with_malformed_container_is_an_error() {
        let object: DynamicObject = serde_json::from_value(json!({
            "apiVersion": "metrics.k8s.io/v1beta1",
            "kind": "PodMetrics",
            "metadata": { "name": "web-0", "namespace": "shop" },
            "containers": [ { "usage": { "memory": "1Mi" } } ]
        }))
        .unwrap();

        assert!(pod_usage(object).is_err());
    }
}
