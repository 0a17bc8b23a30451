use serde::Serialize;

use crate::MemoryAmount;
use crate::lib::headroom::{EvictableCandidate, HeadroomReport, NodeSummary};

/// Top-level JSON output containing metadata, node summaries and candidates
#[derive(Debug, Clone, Serialize)]
pub struct HeadroomOutput {
    pub metadata: OutputMetadata,
    pub nodes: Vec<NodeSummary>,
    pub candidates: Vec<EvictableCandidate>,
}

/// Metadata about the report generation
#[derive(Debug, Clone, Serialize)]
pub struct OutputMetadata {
    pub timestamp: String,
    pub context: Option<String>,
    pub additional_memory: AdditionalMemory,
    pub total_nodes: usize,
    pub insufficient_nodes: usize,
    pub total_candidates: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdditionalMemory {
    pub bytes: i64,
    pub label: String,
}

impl HeadroomOutput {
    /// Create a new HeadroomOutput
    pub fn new(context: Option<String>, additional: &MemoryAmount, report: HeadroomReport) -> Self {
        Self {
            metadata: OutputMetadata {
                timestamp: chrono::Utc::now().to_rfc3339(),
                context,
                additional_memory: AdditionalMemory {
                    bytes: additional.bytes(),
                    label: additional.label().to_string(),
                },
                total_nodes: report.nodes.len(),
                insufficient_nodes: report.insufficient_nodes(),
                total_candidates: report.candidates.len(),
            },
            nodes: report.nodes,
            candidates: report.candidates,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::headroom::HeadroomCalculator;
    use serde_json::Value;

    #[test]
    fn test_json_document_shape() {
        let calculator = HeadroomCalculator::new(100);
        let report = HeadroomReport {
            nodes: vec![
                calculator.summarize("node-a", 1000, 900, 950),
                calculator.summarize("node-b", 1000, 0, 0),
            ],
            candidates: vec![],
        };
        let amount = MemoryAmount::new(100, "100B");

        let output = HeadroomOutput::new(Some("prod".to_string()), &amount, report);
        let json: Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

        assert_eq!(json["metadata"]["context"], "prod");
        assert_eq!(json["metadata"]["additional_memory"]["bytes"], 100);
        assert_eq!(json["metadata"]["additional_memory"]["label"], "100B");
        assert_eq!(json["metadata"]["total_nodes"], 2);
        assert_eq!(json["metadata"]["insufficient_nodes"], 1);
        assert_eq!(json["nodes"][0]["free_with_additional"], 0);
        assert_eq!(json["nodes"][0]["sufficient"], false);
        // NaN has no JSON representation
        assert!(json["nodes"][1]["efficiency"].is_null());
        assert_eq!(json["candidates"].as_array().unwrap().len(), 0);
    }
}
