//! User-supplied project input, checked before any model call.

use thiserror::Error;

use crate::model::{ImageError, ImagePayload};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("project name is empty")]
    EmptyName,

    #[error("project description is empty")]
    EmptyDescription,

    #[error("project photo is unusable: {0}")]
    Image(#[from] ImageError),
}

/// A project the user wants a roadmap for: a name, a description, and one
/// photo of the starting item.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    name: String,
    description: String,
    image: ImagePayload,
}

impl ProjectDraft {
    /// Trim and check the text fields, then sniff the photo format.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        image_bytes: Vec<u8>,
    ) -> Result<Self, DraftError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(DraftError::EmptyName);
        }
        let description = description.into().trim().to_owned();
        if description.is_empty() {
            return Err(DraftError::EmptyDescription);
        }
        let image = ImagePayload::from_bytes(image_bytes)?;

        Ok(Self {
            name,
            description,
            image,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image(&self) -> &ImagePayload {
        &self.image
    }
}
