//! Turn a project photo and a short description into a step-by-step
//! upcycling roadmap using a vision language model.

pub mod model;
pub mod project;
pub mod roadmap;

pub use project::{DraftError, ProjectDraft};
pub use roadmap::{Roadmap, RoadmapGenerator, RoadmapStep};
