//! The `VisionModel` trait -- the seam between the pipeline and a
//! generative text/vision provider.
//!
//! The trait is object-safe so the generator can hold an
//! `Arc<dyn VisionModel>` and tests can swap in scripted fakes.

use async_trait::async_trait;
use thiserror::Error;

use super::image::ImagePayload;

/// Failure of a single model call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("prompt blocked by provider: {reason}")]
    Blocked { reason: String },

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("failed to decode model response: {0}")]
    Decode(String),
}

impl ModelError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Rate limits, timeouts, and server errors are transient. Rejected
    /// credentials, malformed requests, and safety blocks are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::Decode(_) => true,
            Self::Status { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::Blocked { .. } | Self::InvalidApiKey(_) => false,
        }
    }
}

/// A generative model that answers a text prompt about an image.
///
/// Implementations perform exactly one provider call per invocation; retry
/// policy lives in [`super::ResponseRetriever`].
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Identifier used in logs (e.g. the provider's model name).
    fn name(&self) -> &str;

    /// Send `prompt` and `image` to the model and return its raw text.
    ///
    /// An `Ok` with empty text is a valid outcome; callers decide whether
    /// to treat it as a failure.
    async fn generate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ModelError>;
}

// Compile-time assertion: VisionModel must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn VisionModel) {}
};
