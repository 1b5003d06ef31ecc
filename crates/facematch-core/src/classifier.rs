//! Threshold decision and human-readable match report.

use crate::types::Neighbor;
use serde::Serialize;
use std::fmt;

/// Largest nearest-neighbour distance still counted as a positive
/// identification for the shipped model.
pub const DISTANCE_THRESHOLD: f32 = 1.0;

const UNKNOWN: &str = "Unknown";
const RANK_TITLES: [&str; 3] = ["Nearest", "2nd Nearest", "3rd Nearest"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Label {
    Known(String),
    Unknown,
    /// Nothing registered to compare against.
    NoMatch,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Known(name) => f.write_str(name),
            Label::Unknown => f.write_str(UNKNOWN),
            Label::NoMatch => Ok(()),
        }
    }
}

/// Final decision for one probe, with the neighbours it was based on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: Label,
    pub neighbors: Vec<Neighbor>,
}

impl Classification {
    pub fn is_known(&self) -> bool {
        matches!(self.label, Label::Known(_))
    }

    /// Multi-line diagnostic listing up to three neighbours, distances to
    /// three decimals. Unknown results lead with an `Unknown` line.
    pub fn report(&self) -> String {
        let Some(nearest) = self.neighbors.first() else {
            return String::new();
        };

        let mut lines = Vec::with_capacity(8);
        if self.label == Label::Unknown {
            lines.push(UNKNOWN.to_string());
            lines.push(format!("Dist: {:.3}", nearest.distance));
        }
        for (title, neighbor) in RANK_TITLES.iter().zip(&self.neighbors) {
            lines.push(format!("{title}: {}", neighbor.name));
            lines.push(format!("Dist: {:.3}", neighbor.distance));
        }
        lines.join("\n")
    }
}

/// Label the nearest neighbour as known when strictly under `threshold`.
pub fn classify(neighbors: Vec<Neighbor>, threshold: f32) -> Classification {
    let label = match neighbors.first() {
        None => Label::NoMatch,
        Some(nearest) if nearest.distance < threshold => Label::Known(nearest.name.clone()),
        Some(_) => Label::Unknown,
    };
    Classification { label, neighbors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(name: &str, distance: f32) -> Neighbor {
        Neighbor {
            name: name.to_string(),
            distance,
        }
    }

    #[test]
    fn test_empty_neighbours_is_no_match() {
        let c = classify(Vec::new(), DISTANCE_THRESHOLD);
        assert_eq!(c.label, Label::NoMatch);
        assert_eq!(c.label.to_string(), "");
        assert_eq!(c.report(), "");
    }

    #[test]
    fn test_zero_distance_is_known() {
        let c = classify(vec![n("alice", 0.0), n("alice", 0.0)], DISTANCE_THRESHOLD);
        assert_eq!(c.label, Label::Known("alice".into()));
        assert_eq!(c.label.to_string(), "alice");
        assert!(c.is_known());
    }

    #[test]
    fn test_threshold_is_strict() {
        let c = classify(vec![n("alice", 1.0)], DISTANCE_THRESHOLD);
        assert_eq!(c.label, Label::Unknown);
        assert_eq!(c.label.to_string(), "Unknown");

        let c = classify(vec![n("alice", 0.999)], DISTANCE_THRESHOLD);
        assert_eq!(c.label, Label::Known("alice".into()));
    }

    #[test]
    fn test_report_known_two_neighbours() {
        let c = classify(vec![n("alice", 0.41234), n("bob", 1.2)], DISTANCE_THRESHOLD);
        assert_eq!(
            c.report(),
            "Nearest: alice\nDist: 0.412\n2nd Nearest: bob\nDist: 1.200"
        );
    }

    #[test]
    fn test_report_known_three_neighbours() {
        let c = classify(
            vec![n("alice", 0.1), n("bob", 0.2), n("carol", 0.3)],
            DISTANCE_THRESHOLD,
        );
        let report = c.report();
        assert!(report.ends_with("3rd Nearest: carol\nDist: 0.300"));
        assert_eq!(report.lines().count(), 6);
    }

    #[test]
    fn test_report_unknown_leads_with_unknown() {
        let c = classify(vec![n("alice", 1.3856), n("bob", 2.0)], DISTANCE_THRESHOLD);
        assert_eq!(
            c.report(),
            "Unknown\nDist: 1.386\nNearest: alice\nDist: 1.386\n2nd Nearest: bob\nDist: 2.000"
        );
    }

    #[test]
    fn test_report_caps_at_three_ranks() {
        let c = classify(
            vec![n("a", 0.1), n("b", 0.2), n("c", 0.3), n("d", 0.4)],
            DISTANCE_THRESHOLD,
        );
        let report = c.report();
        assert_eq!(report.lines().count(), 6);
        assert!(!report.contains(": d"));
    }

    #[test]
    fn test_label_serializes_tagged() {
        let json = serde_json::to_string(&Label::Known("alice".into())).unwrap();
        assert_eq!(json, r#"{"kind":"known","name":"alice"}"#);
    }
}
