/// Backend model offered in the settings picker
///
/// The choice is kept in UI state and saved to the config file. It is not
/// part of the `/chat` request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelChoice {
    #[default]
    MistralLarge,
    MistralMedium,
    MistralSmall,
}

impl ModelChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelChoice::MistralLarge => "mistral-large-latest",
            ModelChoice::MistralMedium => "mistral-medium",
            ModelChoice::MistralSmall => "mistral-small-latest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mistral-large-latest" => Some(ModelChoice::MistralLarge),
            "mistral-medium" => Some(ModelChoice::MistralMedium),
            "mistral-small-latest" => Some(ModelChoice::MistralSmall),
            _ => None,
        }
    }

    pub fn all() -> Vec<ModelChoice> {
        vec![
            ModelChoice::MistralLarge,
            ModelChoice::MistralMedium,
            ModelChoice::MistralSmall,
        ]
    }

    pub fn index(&self) -> usize {
        Self::all().iter().position(|m| m == self).unwrap_or(0)
    }
}
