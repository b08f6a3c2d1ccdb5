//! Roadmap generation: prompt, retrieve, normalize, parse, validate, and
//! fall back.
//!
//! ```text
//! PROMPTING -> RETRIEVING -> NORMALIZING -> PARSING -> VALIDATING -> SUCCESS
//!                  |                           |            |
//!                  +---------------------------+------------+--> FALLBACK
//! ```
//!
//! The model is called (with retries) at most once per generation. Parse
//! and validation failures never trigger a new model call.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::model::{ImagePayload, ResponseRetriever, RetryConfig, VisionModel};
use crate::project::ProjectDraft;

use super::fallback::fallback_roadmap;
use super::normalize::{LiteralRepair, normalize_response, slice_json_array};
use super::prompt::build_roadmap_prompt;
use super::types::{FailureKind, Roadmap, RoadmapStep};
use super::validate::{SchemaError, json_type_name, validate_steps};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Settings for [`RoadmapGenerator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub retry: RetryConfig,
    pub literal_repair: LiteralRepair,
}

/// The response text could not be read as a non-empty JSON array.
#[derive(Debug, Error)]
pub enum MalformedOutput {
    #[error("response is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),

    #[error("response is a JSON {found}, expected an array")]
    NotAnArray { found: &'static str },

    #[error("response array contains no steps")]
    EmptyArray,
}

/// Why a generation attempt ended in the fallback roadmap.
#[derive(Debug, Error)]
pub enum PipelineFailure {
    #[error("no usable response from model `{model}`")]
    Transport { model: String },

    #[error("malformed model output: {0}")]
    Malformed(#[from] MalformedOutput),

    #[error("invalid roadmap step: {0}")]
    Schema(#[from] SchemaError),
}

impl PipelineFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } => FailureKind::Transport,
            Self::Malformed(_) => FailureKind::Malformed,
            Self::Schema(_) => FailureKind::Schema,
        }
    }
}

// ---------------------------------------------------------------------------
// Text stages
// ---------------------------------------------------------------------------

/// Parse normalized text into the array of step records.
///
/// If the first parse fails, the text is re-sliced to its outermost
/// `[`..`]` and parsed once more.
pub fn parse_step_array(text: &str) -> Result<Vec<Value>, MalformedOutput> {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(first_err) => {
            debug!(error = %first_err, "JSON parse failed, re-slicing array");
            let Some(resliced) = slice_json_array(text) else {
                return Err(MalformedOutput::NotJson(first_err));
            };
            serde_json::from_str(resliced).map_err(MalformedOutput::NotJson)?
        }
    };

    match value {
        Value::Array(items) if items.is_empty() => Err(MalformedOutput::EmptyArray),
        Value::Array(items) => Ok(items),
        other => Err(MalformedOutput::NotAnArray {
            found: json_type_name(&other),
        }),
    }
}

/// Run the text-only half of the pipeline on a raw model response:
/// normalize, parse, validate.
pub fn reconcile_response(
    raw: &str,
    repair: LiteralRepair,
) -> Result<Vec<RoadmapStep>, PipelineFailure> {
    let normalized = normalize_response(raw, repair);
    debug!(normalized = %normalized, "normalized model response");

    let records = parse_step_array(&normalized)?;
    let steps = validate_steps(&records)?;
    Ok(steps)
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Produces a roadmap for every request, falling back to a hand-authored
/// one when the model's output cannot be used.
///
/// Holds no per-request state; share it behind an `Arc` across tasks.
#[derive(Debug, Clone)]
pub struct RoadmapGenerator {
    retriever: ResponseRetriever,
    literal_repair: LiteralRepair,
}

impl RoadmapGenerator {
    pub fn new(model: Arc<dyn VisionModel>, config: GeneratorConfig) -> Self {
        Self {
            retriever: ResponseRetriever::new(model, config.retry),
            literal_repair: config.literal_repair,
        }
    }

    /// Generate a roadmap for a project photo. Never fails.
    pub async fn generate(
        &self,
        image: &ImagePayload,
        project_name: &str,
        description: &str,
    ) -> Roadmap {
        let generation_id = Uuid::new_v4();
        let span = info_span!("roadmap", %generation_id, project = project_name);

        async move {
            match self.try_generate(image, project_name, description).await {
                Ok(steps) => {
                    info!(steps = steps.len(), "roadmap generated");
                    Roadmap::generated(steps)
                }
                Err(failure) => {
                    warn!(
                        kind = %failure.kind(),
                        error = %failure,
                        "roadmap generation failed, using fallback"
                    );
                    fallback_roadmap(failure.kind())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Generate a roadmap for a validated project draft.
    pub async fn generate_for(&self, draft: &ProjectDraft) -> Roadmap {
        self.generate(draft.image(), draft.name(), draft.description())
            .await
    }

    async fn try_generate(
        &self,
        image: &ImagePayload,
        project_name: &str,
        description: &str,
    ) -> Result<Vec<RoadmapStep>, PipelineFailure> {
        let prompt = build_roadmap_prompt(project_name, description);

        let raw = self
            .retriever
            .retrieve(&prompt, image)
            .await
            .ok_or_else(|| PipelineFailure::Transport {
                model: self.retriever.model_name().to_owned(),
            })?;
        debug!(raw = %raw, "raw model response");

        reconcile_response(&raw, self.literal_repair)
    }
}
