//! Generative model access: the [`VisionModel`] trait, the Gemini adapter,
//! image payloads, and the retrying [`ResponseRetriever`].
//!
//! # Architecture
//!
//! ```text
//! RoadmapGenerator
//!     |
//!     v
//! ResponseRetriever --retrieve(prompt, image)--> Option<String>
//!     |   (bounded attempts, exponential backoff)
//!     v
//! Arc<dyn VisionModel> --generate(prompt, image)--> Result<String, ModelError>
//!     |
//!     +-- GeminiClient (reqwest, generateContent)
//!     +-- test fakes
//! ```

pub mod gemini;
pub mod image;
pub mod retry;
pub mod trait_def;

pub use gemini::{GeminiClient, GeminiConfig};
pub use image::{ImageError, ImageFormat, ImagePayload};
pub use retry::{ResponseRetriever, RetryConfig};
pub use trait_def::{ModelError, VisionModel};
