//! Interface language.
//!
//! Only the strings the core hands to exporters and notices live here; all
//! other wording belongs to the presentation layer.

use serde::{Deserialize, Serialize};

/// Supported interface languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Spanish.
    #[default]
    Es,
    /// English.
    En,
}

impl Language {
    /// Returns the ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Es => "es",
            Self::En => "en",
        }
    }

    /// Text shown instead of a count for quota-marker rows.
    pub fn quota_exceeded_label(&self) -> &'static str {
        match self {
            Self::Es => "Cuota API superada",
            Self::En => "API quota exceeded",
        }
    }

    /// Notice listing how many domains were left unprocessed.
    pub fn not_processed_notice(&self, count: usize) -> String {
        match self {
            Self::Es => format!(
                "{count} dominios no se han podido analizar porque las claves API proporcionadas \
                 no son válidas o han alcanzado su límite diario de consultas. Por favor, verifica \
                 y añade claves API válidas; los dominios no analizados se mantendrán pendientes."
            ),
            Self::En => format!(
                "{count} domains could not be analyzed because the provided API keys are either \
                 invalid or have reached their daily quota. Please verify and add valid API keys; \
                 the unprocessed domains will remain pending."
            ),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "es" | "spanish" | "español" => Ok(Self::Es),
            "en" | "english" => Ok(Self::En),
            _ => Err(format!("Unknown language: {s}. Use: es, en")),
        }
    }
}
