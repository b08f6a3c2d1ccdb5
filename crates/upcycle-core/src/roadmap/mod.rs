//! Roadmap generation: prompt construction, response normalization, step
//! validation, fallbacks, and the [`RoadmapGenerator`] that ties them
//! together.

pub mod fallback;
pub mod generate;
pub mod normalize;
pub mod prompt;
pub mod types;
pub mod validate;

pub use fallback::fallback_roadmap;
pub use generate::{
    GeneratorConfig, MalformedOutput, PipelineFailure, RoadmapGenerator, parse_step_array,
    reconcile_response,
};
pub use normalize::{LiteralRepair, normalize_response, slice_json_array};
pub use prompt::{MAX_STEPS, MIN_STEPS, build_roadmap_prompt};
pub use types::{FailureKind, Roadmap, RoadmapOutcome, RoadmapStep};
pub use validate::{SchemaError, validate_step, validate_steps};
