use crate::llm::{Rationale, RationaleConfidence, Timeframe};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

const MAX_LIST_ITEMS: usize = 5;

/// Rationale object as emitted by a text-generation provider. Everything but
/// `rationale` is optional and normalised on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRationale {
    pub rationale: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}

impl LlmRationale {
    pub fn validate_and_into_rationale(self) -> anyhow::Result<Rationale> {
        let rationale = self.rationale.trim().to_string();
        ensure!(!rationale.is_empty(), "rationale must be non-empty");

        Ok(Rationale {
            rationale,
            key_factors: clean_lines(self.key_factors),
            warnings: clean_lines(self.warnings),
            timeframe: self
                .timeframe
                .as_deref()
                .and_then(Timeframe::parse)
                .unwrap_or(Timeframe::MediumTerm),
            confidence: self
                .confidence
                .as_deref()
                .and_then(RationaleConfidence::parse)
                .unwrap_or(RationaleConfidence::Medium),
        })
    }
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}
