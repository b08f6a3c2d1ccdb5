//! Roadmap data types handed to the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One validated step of a project roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapStep {
    /// 1-based position in the roadmap. Always assigned from array
    /// position, never taken from the model.
    pub step_number: u32,
    pub title: String,
    pub description: String,
    /// Free-form duration text, e.g. "30 minutes".
    pub estimated_time: String,
    pub materials_needed: Vec<String>,
}

/// Which pipeline stage made a generation attempt give up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The model never produced usable text.
    Transport,
    /// The text was not a non-empty JSON array.
    Malformed,
    /// An element of the array failed step validation.
    Schema,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Transport => "transport",
            Self::Malformed => "malformed",
            Self::Schema => "schema",
        };
        f.write_str(s)
    }
}

/// Terminal state of a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RoadmapOutcome {
    Generated,
    Fallback(FailureKind),
}

/// The result of one roadmap generation: never empty, numbered `1..=N`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roadmap {
    outcome: RoadmapOutcome,
    generated_at: DateTime<Utc>,
    steps: Vec<RoadmapStep>,
}

impl Roadmap {
    pub(crate) fn generated(steps: Vec<RoadmapStep>) -> Self {
        Self::with_outcome(RoadmapOutcome::Generated, steps)
    }

    pub(crate) fn fallback(kind: FailureKind, steps: Vec<RoadmapStep>) -> Self {
        Self::with_outcome(RoadmapOutcome::Fallback(kind), steps)
    }

    fn with_outcome(outcome: RoadmapOutcome, steps: Vec<RoadmapStep>) -> Self {
        debug_assert!(!steps.is_empty(), "a roadmap always has at least one step");
        Self {
            outcome,
            generated_at: Utc::now(),
            steps,
        }
    }

    pub fn steps(&self) -> &[RoadmapStep] {
        &self.steps
    }

    pub fn outcome(&self) -> RoadmapOutcome {
        self.outcome
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, RoadmapOutcome::Fallback(_))
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Consume the roadmap, keeping only the ordered steps.
    pub fn into_steps(self) -> Vec<RoadmapStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(n: u32) -> RoadmapStep {
        RoadmapStep {
            step_number: n,
            title: format!("Step {n}"),
            description: "Do it".to_string(),
            estimated_time: "10 minutes".to_string(),
            materials_needed: vec!["glue".to_string()],
        }
    }

    #[test]
    fn step_serializes_with_storage_field_names() {
        let value = serde_json::to_value(step(1)).unwrap();
        assert_eq!(
            value,
            json!({
                "step_number": 1,
                "title": "Step 1",
                "description": "Do it",
                "estimated_time": "10 minutes",
                "materials_needed": ["glue"]
            })
        );
    }

    #[test]
    fn outcome_serialization() {
        assert_eq!(
            serde_json::to_value(RoadmapOutcome::Generated).unwrap(),
            json!({ "status": "generated" })
        );
        assert_eq!(
            serde_json::to_value(RoadmapOutcome::Fallback(FailureKind::Schema)).unwrap(),
            json!({ "status": "fallback", "reason": "schema" })
        );
    }

    #[test]
    fn generated_roadmap_accessors() {
        let roadmap = Roadmap::generated(vec![step(1), step(2)]);
        assert_eq!(roadmap.outcome(), RoadmapOutcome::Generated);
        assert!(!roadmap.is_fallback());
        assert_eq!(roadmap.len(), 2);
        assert_eq!(roadmap.into_steps()[1].step_number, 2);
    }

    #[test]
    fn fallback_roadmap_reports_reason() {
        let roadmap = Roadmap::fallback(FailureKind::Transport, vec![step(1)]);
        assert!(roadmap.is_fallback());
        assert_eq!(
            roadmap.outcome(),
            RoadmapOutcome::Fallback(FailureKind::Transport)
        );
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::Transport.to_string(), "transport");
        assert_eq!(FailureKind::Malformed.to_string(), "malformed");
        assert_eq!(FailureKind::Schema.to_string(), "schema");
    }
}
