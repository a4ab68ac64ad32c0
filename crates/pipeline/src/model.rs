//! Summarization model selection and pricing tiers.

use serde::{Deserialize, Serialize};

use crate::ModelId;

/// Model id priced at the cheap tier; every other model is priced as premium.
pub const ECONOMY_MODEL: &str = "gpt-3.5-turbo";

/// A summarization model together with the name shown in rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub id: ModelId,
    /// Label used in summary headings, e.g. `"GPT-3.5"`.
    pub display_name: String,
}

impl ModelSpec {
    pub fn new(id: ModelId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Looks up one of the selectable models by id.
    pub fn known(id: &str) -> Option<Self> {
        KNOWN_MODELS
            .iter()
            .find(|(model, _)| *model == id)
            .and_then(|(model, name)| ModelId::new(*model).map(|m| Self::new(m, *name)))
    }

    pub fn price_tier(&self) -> PriceTier {
        PriceTier::for_model(&self.id)
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            id: ModelId(ECONOMY_MODEL.to_string()),
            display_name: "GPT-3.5".to_string(),
        }
    }
}

/// Selectable models as `(id, display name)`.
pub const KNOWN_MODELS: &[(&str, &str)] = &[("gpt-3.5-turbo", "GPT-3.5"), ("gpt-4", "GPT-4")];

/// Two-tier pricing used by the cost guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Economy,
    Premium,
}

impl PriceTier {
    pub fn for_model(model: &ModelId) -> Self {
        if model.as_str() == ECONOMY_MODEL {
            PriceTier::Economy
        } else {
            PriceTier::Premium
        }
    }

    /// Price in USD per thousand tokens.
    pub fn per_thousand_tokens(self) -> f64 {
        match self {
            PriceTier::Economy => 0.002,
            PriceTier::Premium => 0.06,
        }
    }
}
