//! `vellum extract` and `vellum preview`: offline access to the extractor
//! and the render dispatch.

use std::error::Error;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::core::config::{path_display, Config};
use crate::core::extract::{extract_artifacts_with, Extraction};
use crate::core::store::Settings;
use crate::ui::render::{render_artifact, RenderPlan, ViewMode};
use crate::ui::theme::Theme;

/// Reads `file`, or stdin when no file is given.
pub fn read_input(file: Option<&Path>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path_display(path), e).into()),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

pub fn extract_text(text: &str, scope: &str, config: &Config) -> Extraction {
    extract_artifacts_with(text, scope, &config.extract_options())
}

pub fn run_extract<W: Write>(
    file: Option<&Path>,
    scope: &str,
    config: &Config,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let text = read_input(file)?;
    let extraction = extract_text(&text, scope, config);
    writeln!(out, "{}", serde_json::to_string_pretty(&extraction)?)?;
    Ok(())
}

/// Render plan for the `index`-th (1-based) artifact found in `text`.
pub fn preview_plan(
    text: &str,
    index: usize,
    raw: bool,
    config: &Config,
) -> Result<RenderPlan, String> {
    let extraction = extract_text(text, "preview", config);
    let count = extraction.artifacts.len();
    let artifact = index
        .checked_sub(1)
        .and_then(|i| extraction.artifacts.get(i))
        .ok_or_else(|| match count {
            0 => "No artifacts found in input".to_string(),
            n => format!("No artifact {index}: input has {n} (numbered from 1)"),
        })?;

    let settings = Settings::from(config);
    // A terminal has no platform preference to ask; `system` reads as dark.
    let theme = Theme::for_mode(settings.theme, true);
    let mode = if raw { ViewMode::Raw } else { ViewMode::Preview };
    Ok(render_artifact(artifact, mode, &theme, settings.syntax))
}

pub fn run_preview<W: Write>(
    file: &Path,
    index: usize,
    raw: bool,
    config: &Config,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let text = read_input(Some(file))?;
    let plan = preview_plan(&text, index, raw, config)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
    Ok(())
}
