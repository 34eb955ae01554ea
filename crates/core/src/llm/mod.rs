pub mod anthropic;
pub mod error;
pub mod json;
pub mod template;

use crate::domain::recommendation::Recommendation;
use crate::scoring::labels::ScoreLabels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct RationaleInput {
    pub name: String,
    pub recommendation: Recommendation,
    pub labels: ScoreLabels,
}

impl RationaleInput {
    pub fn new(name: impl Into<String>, recommendation: Recommendation) -> Self {
        let labels = ScoreLabels::describe(&recommendation);
        Self {
            name: name.into(),
            recommendation,
            labels,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Timeframe {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl Timeframe {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short-term" => Some(Timeframe::ShortTerm),
            "medium-term" => Some(Timeframe::MediumTerm),
            "long-term" => Some(Timeframe::LongTerm),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RationaleConfidence {
    High,
    Medium,
    Low,
}

impl RationaleConfidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(RationaleConfidence::High),
            "medium" => Some(RationaleConfidence::Medium),
            "low" => Some(RationaleConfidence::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rationale {
    pub rationale: String,
    pub key_factors: Vec<String>,
    pub warnings: Vec<String>,
    pub timeframe: Timeframe,
    pub confidence: RationaleConfidence,
}

impl Rationale {
    /// Splits off the text; the rest is stored next to it as structured detail.
    pub fn into_parts(self) -> (String, RationaleDetails) {
        let details = RationaleDetails {
            key_factors: self.key_factors,
            warnings: self.warnings,
            timeframe: self.timeframe,
            confidence: self.confidence,
        };
        (self.rationale, details)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleDetails {
    pub key_factors: Vec<String>,
    pub warnings: Vec<String>,
    pub timeframe: Timeframe,
    pub confidence: RationaleConfidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Template,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Template => "template",
        }
    }
}

/// Turns a numeric recommendation into human-readable text. Implementations
/// are handed to the batch runner explicitly; nothing selects one globally.
#[async_trait::async_trait]
pub trait RationaleGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_rationale(&self, input: &RationaleInput) -> anyhow::Result<Rationale>;
}
