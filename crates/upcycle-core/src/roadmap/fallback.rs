//! Hand-authored roadmaps returned when generation fails.
//!
//! Output depends only on the [`FailureKind`], so two failures of the same
//! kind always produce identical steps.

use super::types::{FailureKind, Roadmap, RoadmapStep};

fn plan_step(description: &str) -> RoadmapStep {
    RoadmapStep {
        step_number: 1,
        title: "Plan Your Project".to_owned(),
        description: description.to_owned(),
        estimated_time: "1 hour".to_owned(),
        materials_needed: vec!["paper".to_owned(), "pencil".to_owned()],
    }
}

fn gather_step() -> RoadmapStep {
    RoadmapStep {
        step_number: 2,
        title: "Gather Materials".to_owned(),
        description: "Collect all needed materials based on your plan.".to_owned(),
        estimated_time: "varies".to_owned(),
        materials_needed: Vec::new(),
    }
}

/// Build the fallback roadmap for a failed generation.
///
/// Unparseable output gets a single planning step; a silent model or
/// invalid steps get planning plus gathering.
pub fn fallback_roadmap(kind: FailureKind) -> Roadmap {
    let steps = match kind {
        FailureKind::Malformed => vec![plan_step(
            "A detailed roadmap could not be created. Start by planning your project.",
        )],
        FailureKind::Transport => vec![
            plan_step(
                "A detailed roadmap could not be generated because the assistant did not \
                 respond. Start by planning your approach.",
            ),
            gather_step(),
        ],
        FailureKind::Schema => vec![
            plan_step(
                "A detailed roadmap could not be generated because the suggested steps were \
                 incomplete. Start by planning your approach.",
            ),
            gather_step(),
        ],
    };
    Roadmap::fallback(kind, steps)
}
