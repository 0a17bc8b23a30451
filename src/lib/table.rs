use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::lib::headroom::{EvictableCandidate, HeadroomReport, NodeSummary};
use crate::lib::humanize::{comma, ratio};

/// Row for the evictable containers table
#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Requested")]
    requested: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Limit")]
    limit: String,
}

impl From<&EvictableCandidate> for CandidateRow {
    fn from(c: &EvictableCandidate) -> Self {
        Self {
            node: c.node.clone(),
            namespace: c.namespace.clone(),
            pod: c.pod.clone(),
            container: c.container.clone(),
            requested: comma(c.requested),
            used: comma(c.used),
            limit: c.limit.map(comma).unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Node summary table. `label` is the additional amount as the user typed it.
pub fn render_nodes(nodes: &[NodeSummary], label: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "Name".to_string(),
        "Allocatable".to_string(),
        "Used".to_string(),
        "Free".to_string(),
        "Requests".to_string(),
        "Efficiency".to_string(),
        "Schedulable".to_string(),
        format!("Free - {}", label),
        format!("Schedulable - {}", label),
        "Ok?".to_string(),
    ]);

    for node in nodes {
        builder.push_record([
            node.name.clone(),
            comma(node.allocatable),
            comma(node.used),
            comma(node.free),
            comma(node.requests),
            ratio(node.efficiency),
            comma(node.schedulable),
            comma(node.free_with_additional),
            comma(node.schedulable_with_additional),
            node.sufficient.to_string(),
        ]);
    }

    builder.build().with(Style::rounded()).to_string()
}

/// Evictable containers table, or a single line when there are none
pub fn render_candidates(candidates: &[EvictableCandidate]) -> String {
    if candidates.is_empty() {
        return "No evictable containers found".to_string();
    }

    let rows: Vec<CandidateRow> = candidates.iter().map(CandidateRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print both tables to stdout
pub fn print_report(report: &HeadroomReport, label: &str) {
    println!("{}", render_nodes(&report.nodes, label));
    println!();
    println!("{}", render_candidates(&report.candidates));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lib::headroom::HeadroomCalculator;

    #[test]
    fn test_node_table_headers_carry_label() {
        let calculator = HeadroomCalculator::new(0);
        let nodes = vec![calculator.summarize("node-a", 8_000_000, 4_000_000, 3_000_000)];
        let table = render_nodes(&nodes, "512MiB");

        assert!(table.contains("Free - 512MiB"));
        assert!(table.contains("Schedulable - 512MiB"));
        assert!(table.contains("Ok?"));
        assert!(table.contains("8,000,000"));
        assert!(table.contains("1.33"));
        assert!(table.contains("true"));
    }

    #[test]
    fn test_node_table_shows_nan_efficiency() {
        let nodes = vec![HeadroomCalculator::new(0).summarize("idle", 1000, 0, 0)];
        assert!(render_nodes(&nodes, "0").contains("NaN"));
    }

    #[test]
    fn test_candidate_table() {
        let candidates = vec![EvictableCandidate {
            node: "node-a".to_string(),
            namespace: "shop".to_string(),
            pod: "web-0".to_string(),
            container: "app".to_string(),
            requested: 1_048_576,
            used: 2_097_152,
            limit: None,
        }];
        let table = render_candidates(&candidates);

        assert!(table.contains("Namespace"));
        assert!(table.contains("web-0"));
        assert!(table.contains("1,048,576"));
        assert!(table.contains("2,097,152"));
        assert!(table.contains(" - "));
    }

    #[test]
    fn test_no_candidates_message() {
        assert_eq!(render_candidates(&[]), "No evictable containers found");
    }
}
