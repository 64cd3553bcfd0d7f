use crate::core::config::data::{path_display, Config};
use crate::core::extract::ExtractOptions;

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

impl Config {
    /// One line per key, in the order `vellum config` prints them.
    pub fn display_lines(&self) -> Vec<String> {
        let defaults = ExtractOptions::default();
        let mut lines = Vec::new();
        match &self.base_url {
            Some(url) => lines.push(format!("  base-url: {url}")),
            None => lines.push(format!("  base-url: (unset, default: {})", self.api_base_url())),
        }
        match &self.default_model {
            Some(model) => lines.push(format!("  default-model: {model}")),
            None => lines.push("  default-model: (unset)".to_string()),
        }
        match &self.theme {
            Some(theme) => lines.push(format!("  theme: {theme}")),
            None => lines.push("  theme: (unset, default: system)".to_string()),
        }
        lines.push(format!("  syntax: {}", on_off(self.syntax.unwrap_or(true))));
        match self.min_text_lines {
            Some(n) => lines.push(format!("  min-text-lines: {n}")),
            None => lines.push(format!(
                "  min-text-lines: (unset, default: {})",
                defaults.min_text_lines
            )),
        }
        lines.push(format!(
            "  promote-untagged-json: {}",
            on_off(
                self.promote_untagged_json
                    .unwrap_or(defaults.promote_untagged_json)
            )
        ));
        match &self.download_dir {
            Some(dir) => lines.push(format!("  download-dir: {}", path_display(dir))),
            None => lines.push("  download-dir: (unset, current directory)".to_string()),
        }
        if self.personas.is_empty() {
            lines.push("  personas: (none)".to_string());
        } else {
            lines.push("  personas:".to_string());
            for persona in &self.personas {
                lines.push(format!("    {}: {}", persona.id, persona.display_name));
            }
        }
        lines
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        for line in self.display_lines() {
            println!("{line}");
        }
    }
}
