use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two model variants offered by the model selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelId {
    #[default]
    Flash,
    Pro,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::Flash, ModelId::Pro];

    /// Identifier sent to the remote API.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Flash => "gemini-2.5-flash",
            ModelId::Pro => "gemini-3-pro-preview",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModelId::Flash => "Gemini 2.5 Flash (Fast)",
            ModelId::Pro => "Gemini 3 Pro (Reasoning)",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            ModelId::Flash => "flash",
            ModelId::Pro => "pro",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        ModelId::ALL
            .into_iter()
            .find(|model| model.short_name() == normalized || model.as_str() == normalized)
            .ok_or_else(|| {
                format!("unknown model: {value} (expected one of: flash, pro, gemini-2.5-flash, gemini-3-pro-preview)")
            })
    }
}

impl TryFrom<String> for ModelId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelId> for String {
    fn from(value: ModelId) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_full_identifiers() {
        assert_eq!("flash".parse::<ModelId>(), Ok(ModelId::Flash));
        assert_eq!(" PRO ".parse::<ModelId>(), Ok(ModelId::Pro));
        assert_eq!("gemini-3-pro-preview".parse::<ModelId>(), Ok(ModelId::Pro));
        assert_eq!("gemini-2.5-flash".parse::<ModelId>(), Ok(ModelId::Flash));
    }

    #[test]
    fn rejects_unknown_models() {
        let err = "gpt-4o".parse::<ModelId>().unwrap_err();
        assert!(err.contains("gpt-4o"));
    }

    #[test]
    fn exactly_two_variants_with_flash_default() {
        assert_eq!(ModelId::ALL.len(), 2);
        assert_eq!(ModelId::default(), ModelId::Flash);
        assert_ne!(ModelId::Flash.label(), ModelId::Pro.label());
    }
}
