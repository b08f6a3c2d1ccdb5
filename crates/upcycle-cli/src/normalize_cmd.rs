//! `upcycle normalize`: reconcile a saved model response offline.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use upcycle_core::RoadmapStep;
use upcycle_core::roadmap::{LiteralRepair, reconcile_response};

/// Read the response text from `file`, or stdin when `None`.
pub fn read_response(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read response file {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read response from stdin")?;
            Ok(raw)
        }
    }
}

/// Normalize, parse, and validate `raw`, attaching the failure category to
/// any error.
pub fn reconcile_text(raw: &str, repair: LiteralRepair) -> Result<Vec<RoadmapStep>> {
    reconcile_response(raw, repair).map_err(|failure| {
        let kind = failure.kind();
        anyhow::Error::new(failure).context(format!("model response rejected ({kind})"))
    })
}

/// Execute the `upcycle normalize` command.
pub fn run_normalize(file: Option<&Path>, strict: bool) -> Result<()> {
    let raw = read_response(file)?;
    let repair = if strict {
        LiteralRepair::Off
    } else {
        LiteralRepair::Coerce
    };

    let steps = reconcile_text(&raw, repair)?;
    let json = serde_json::to_string_pretty(&steps).context("failed to serialize steps")?;
    println!("{json}");
    Ok(())
}
