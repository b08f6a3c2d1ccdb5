//! `upcycle roadmap`: generate a roadmap for a project photo.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use upcycle_core::model::GeminiClient;
use upcycle_core::{ProjectDraft, Roadmap, RoadmapGenerator};

use crate::config::UpcycleConfig;

/// Read the photo, run the pipeline against Gemini, and return the roadmap.
pub async fn generate_roadmap(
    config: &UpcycleConfig,
    image: &Path,
    name: &str,
    description: &str,
) -> Result<Roadmap> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("failed to read image {}", image.display()))?;
    let draft = ProjectDraft::new(name, description, bytes).context("invalid project input")?;

    let client =
        GeminiClient::new(config.gemini.clone()).context("failed to create Gemini client")?;
    let generator = RoadmapGenerator::new(Arc::new(client), config.generator.clone());

    tracing::info!(
        model = %config.gemini.model,
        image = %image.display(),
        format = %draft.image().format(),
        "requesting roadmap"
    );
    Ok(generator.generate_for(&draft).await)
}

/// Execute the `upcycle roadmap` command.
pub async fn run_roadmap(
    config: &UpcycleConfig,
    image: &Path,
    name: &str,
    description: &str,
    output: Option<&Path>,
) -> Result<()> {
    let roadmap = generate_roadmap(config, image, name, description).await?;
    let json = serde_json::to_string_pretty(&roadmap).context("failed to serialize roadmap")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("failed to write roadmap to {}", path.display()))?;
            println!("Roadmap ({} steps) written to {}", roadmap.len(), path.display());
        }
        None => println!("{json}"),
    }

    if roadmap.is_fallback() {
        eprintln!("warning: the model's answer could not be used; a generic roadmap was returned");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use upcycle_core::model::GeminiConfig;
    use upcycle_core::roadmap::{FailureKind, GeneratorConfig, RoadmapOutcome};
    use upcycle_test_utils::{MockGemini, gemini_text_response, sample_jpeg, steps_array_text};

    fn config_for(mock: &MockGemini) -> UpcycleConfig {
        UpcycleConfig {
            gemini: GeminiConfig::new("test-key").with_base_url(mock.base_url()),
            generator: GeneratorConfig::default(),
        }
    }

    #[tokio::test]
    async fn writes_generated_roadmap_to_output_file() {
        let mock = MockGemini::start(vec![(
            200,
            gemini_text_response(&steps_array_text(&["Clean", "Cut", "Assemble"])),
        )])
        .await;
        let tmp = tempfile::TempDir::new().unwrap();
        let image = tmp.path().join("chair.jpg");
        std::fs::write(&image, sample_jpeg()).unwrap();
        let output = tmp.path().join("roadmap.json");

        run_roadmap(
            &config_for(&mock),
            &image,
            "Chair",
            "Refinish a chair",
            Some(&output),
        )
        .await
        .unwrap();

        let written: Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["outcome"], json!({ "status": "generated" }));
        let steps = written["steps"].as_array().unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[2]["step_number"], 3);
        assert_eq!(steps[2]["title"], "Assemble");
    }

    #[tokio::test]
    async fn unusable_answer_still_yields_a_roadmap() {
        let mock = MockGemini::start(vec![(200, gemini_text_response("I can't see the image."))]).await;
        let tmp = tempfile::TempDir::new().unwrap();
        let image = tmp.path().join("jar.jpg");
        std::fs::write(&image, sample_jpeg()).unwrap();

        let roadmap = generate_roadmap(&config_for(&mock), &image, "Jar", "Jar lantern")
            .await
            .unwrap();

        assert_eq!(
            roadmap.outcome(),
            RoadmapOutcome::Fallback(FailureKind::Malformed)
        );
        assert_eq!(mock.hits(), 1);
    }

    #[tokio::test]
    async fn rejects_unrecognised_image_before_calling_model() {
        let mock = MockGemini::start(Vec::new()).await;
        let tmp = tempfile::TempDir::new().unwrap();
        let image = tmp.path().join("notes.txt");
        std::fs::write(&image, "just text").unwrap();

        let err = generate_roadmap(&config_for(&mock), &image, "Jar", "Jar lantern")
            .await
            .unwrap_err();

        assert!(format!("{err:#}").contains("unrecognised image format"));
        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test]
    async fn missing_image_file_is_an_error() {
        let mock = MockGemini::start(Vec::new()).await;
        let tmp = tempfile::TempDir::new().unwrap();

        let err = generate_roadmap(
            &config_for(&mock),
            &tmp.path().join("missing.jpg"),
            "Jar",
            "Jar lantern",
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("failed to read image"));
    }
}
