use std::collections::HashMap;

use tracing::warn;

use crate::core::artifact::Artifact;
use crate::ui::render::{render_artifact, RenderPlan, ViewMode};
use crate::ui::theme::Theme;

/// How long the "copied" indicator stays lit.
pub const COPIED_FLASH_MS: i64 = 2_000;

/// Per-view interaction state for a set of artifact cards.
///
/// At most one artifact is fullscreen at a time; entering fullscreen on
/// another artifact takes it over.
#[derive(Debug, Default, Clone)]
pub struct ArtifactViewer {
    fullscreen: Option<String>,
    view_modes: HashMap<String, ViewMode>,
    copied_until: HashMap<String, i64>,
}

impl ArtifactViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fullscreen(&self) -> Option<&str> {
        self.fullscreen.as_deref()
    }

    pub fn is_fullscreen(&self, id: &str) -> bool {
        self.fullscreen.as_deref() == Some(id)
    }

    /// Toggles fullscreen for `id`. Returns whether it is now fullscreen.
    pub fn toggle_fullscreen(&mut self, id: &str) -> bool {
        if self.is_fullscreen(id) {
            self.fullscreen = None;
            false
        } else {
            self.fullscreen = Some(id.to_string());
            true
        }
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = None;
    }

    pub fn view_mode(&self, id: &str) -> ViewMode {
        self.view_modes.get(id).copied().unwrap_or_default()
    }

    pub fn toggle_view_mode(&mut self, id: &str) -> ViewMode {
        let next = self.view_mode(id).toggled();
        self.view_modes.insert(id.to_string(), next);
        next
    }

    pub fn is_copied(&self, id: &str, now: i64) -> bool {
        self.copied_until.get(id).is_some_and(|until| now < *until)
    }

    /// Copies the artifact with `copier`. A failure is logged and leaves the
    /// indicator off; nothing is retried.
    pub fn copy_with<F>(&mut self, artifact: &Artifact, now: i64, copier: F) -> bool
    where
        F: FnOnce(&Artifact) -> Result<(), crate::ui::actions::ArtifactActionError>,
    {
        match copier(artifact) {
            Ok(()) => {
                self.copied_until
                    .insert(artifact.id.clone(), now + COPIED_FLASH_MS);
                true
            }
            Err(err) => {
                warn!(id = %artifact.id, error = %err, "copy to clipboard failed");
                self.copied_until.remove(&artifact.id);
                false
            }
        }
    }

    pub fn copy(&mut self, artifact: &Artifact, now: i64) -> bool {
        self.copy_with(artifact, now, crate::ui::actions::copy_artifact)
    }

    /// Drops state for artifacts that are no longer shown.
    pub fn retain(&mut self, artifacts: &[Artifact]) {
        let live = |id: &str| artifacts.iter().any(|a| a.id == id);
        if self.fullscreen.as_deref().is_some_and(|id| !live(id)) {
            self.fullscreen = None;
        }
        self.view_modes.retain(|id, _| live(id));
        self.copied_until.retain(|id, _| live(id));
    }

    pub fn plan(&self, artifact: &Artifact, theme: &Theme, syntax: bool) -> RenderPlan {
        render_artifact(artifact, self.view_mode(&artifact.id), theme, syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::artifact::ArtifactKind;
    use crate::ui::actions::ArtifactActionError;

    fn artifact(id: &str) -> Artifact {
        Artifact {
            id: id.into(),
            kind: ArtifactKind::Json,
            title: "JSON Data".into(),
            description: None,
            content: "{\"a\":1}".into(),
            language: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn fullscreen_moves_between_artifacts() {
        let mut viewer = ArtifactViewer::new();
        assert!(viewer.toggle_fullscreen("b"));
        assert!(viewer.toggle_fullscreen("a"));
        assert!(viewer.is_fullscreen("a"));
        assert!(!viewer.is_fullscreen("b"));

        assert!(!viewer.toggle_fullscreen("a"));
        assert_eq!(viewer.fullscreen(), None);
    }

    #[test]
    fn view_mode_is_per_artifact() {
        let mut viewer = ArtifactViewer::new();
        let a = artifact("a");
        assert_eq!(viewer.toggle_view_mode("a"), ViewMode::Raw);
        assert_eq!(viewer.view_mode("b"), ViewMode::Preview);
        assert_eq!(
            viewer.plan(&a, &Theme::dark_default(), false),
            RenderPlan::Monospace {
                text: "{\"a\":1}".into()
            }
        );
        viewer.toggle_view_mode("a");
        assert_eq!(viewer.plan(&a, &Theme::dark_default(), false).name(), "json");
    }

    #[test]
    fn copied_indicator_flashes_then_reverts() {
        let mut viewer = ArtifactViewer::new();
        let a = artifact("a");
        assert!(viewer.copy_with(&a, 1_000, |_| Ok(())));
        assert!(viewer.is_copied("a", 1_500));
        assert!(!viewer.is_copied("a", 1_000 + COPIED_FLASH_MS));

        assert!(viewer.copy_with(&a, 5_000, |_| Ok(())));
        assert!(!viewer.copy_with(&a, 5_100, |_| {
            Err(ArtifactActionError::Clipboard("no clipboard".into()))
        }));
        assert!(!viewer.is_copied("a", 5_200));
    }

    #[test]
    fn retain_forgets_removed_artifacts() {
        let mut viewer = ArtifactViewer::new();
        viewer.toggle_fullscreen("gone");
        viewer.toggle_view_mode("gone");
        viewer.toggle_view_mode("kept");
        viewer.retain(&[artifact("kept")]);
        assert_eq!(viewer.fullscreen(), None);
        assert_eq!(viewer.view_mode("kept"), ViewMode::Raw);
        assert_eq!(viewer.view_mode("gone"), ViewMode::Preview);
    }
}
