//! Kubernetes Memory Headroom Library
//!
//! This library combines live node and pod metrics with declared memory
//! requests to report per-node memory headroom and the containers using more
//! memory than they requested.

pub mod lib {
    pub mod amount;
    pub mod cli;
    pub mod config;
    pub mod error;
    pub mod headroom;
    pub mod humanize;
    pub mod kubernetes;
    pub mod logger;
    pub mod output;
    pub mod pod_index;
    pub mod quantity;
    pub mod table;
    pub mod tui;
}

// Re-export commonly used types at the root level for convenience
pub use lib::amount::MemoryAmount;
pub use lib::cli::{Cli, OutputFormat};
pub use lib::config::Config;
pub use lib::error::{
    ByteSizeError, ConfigError, HeadroomError, KubernetesError, QuantityError, Result,
};
pub use lib::headroom::{
    EvictableCandidate, HeadroomCalculator, HeadroomReport, NodeSummary, UsageIndex,
};
pub use lib::kubernetes::{
    ClusterSnapshot, ContainerResources, ContainerUsage, KubernetesLoader, NodeCapacity,
    NodeUsage, PodResources, PodUsage,
};
pub use lib::logger::init_logger;
pub use lib::output::{AdditionalMemory, HeadroomOutput, OutputMetadata};
pub use lib::pod_index::PodIndex;
pub use lib::table::{print_report, render_candidates, render_nodes};
pub use lib::tui::display_report;
