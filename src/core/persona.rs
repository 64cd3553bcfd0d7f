use crate::core::config::{Config, Persona};

/// Holds the configured personas and which one, if any, is active.
///
/// Personas are display data here: the active one contributes a system
/// prompt and an optional model override to outgoing requests.
#[derive(Debug, Clone, Default)]
pub struct PersonaManager {
    personas: Vec<Persona>,
    active_persona: Option<Persona>,
}

impl PersonaManager {
    pub fn from_config(config: &Config) -> Self {
        PersonaManager {
            personas: config.personas.clone(),
            active_persona: None,
        }
    }

    pub fn list_personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn find_persona_by_id(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id.eq_ignore_ascii_case(id))
    }

    pub fn set_active_persona(&mut self, persona_id: &str) -> Result<(), String> {
        match self.find_persona_by_id(persona_id) {
            Some(persona) => {
                self.active_persona = Some(persona.clone());
                Ok(())
            }
            None => {
                let available_ids: Vec<&str> =
                    self.personas.iter().map(|p| p.id.as_str()).collect();
                Err(format!(
                    "Persona '{}' not found. Available personas: {}",
                    persona_id,
                    available_ids.join(", ")
                ))
            }
        }
    }

    pub fn clear_active_persona(&mut self) {
        self.active_persona = None;
    }

    pub fn get_active_persona(&self) -> Option<&Persona> {
        self.active_persona.as_ref()
    }

    /// Name shown for the user's own messages.
    pub fn get_display_name(&self) -> String {
        match &self.active_persona {
            Some(persona) => persona.display_name.clone(),
            None => "You".to_string(),
        }
    }

    /// System prompt for the next request: the persona's prompt, then its
    /// bio with `{{user}}` replaced by the persona's own name.
    pub fn system_prompt(&self) -> Option<String> {
        let persona = self.active_persona.as_ref()?;
        let bio = persona
            .bio
            .as_deref()
            .map(|bio| bio.replace("{{user}}", &persona.display_name));
        match (persona.system_prompt.as_deref(), bio) {
            (Some(prompt), Some(bio)) => Some(format!("{prompt}\n\n{bio}")),
            (Some(prompt), None) => Some(prompt.to_string()),
            (None, Some(bio)) => Some(bio),
            (None, None) => None,
        }
    }

    /// Model to request: the active persona's override, else `fallback`.
    pub fn model<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.active_persona
            .as_ref()
            .and_then(|p| p.model.as_deref())
            .unwrap_or(fallback)
    }
}
