use crate::domain::recommendation::Recommendation;
use crate::llm::{
    Provider, Rationale, RationaleConfidence, RationaleGenerator, RationaleInput, Timeframe,
};

/// Plain-text summary of the component scores. Used whenever no generated
/// rationale is available; absent components are left out. Scores always
/// keep a fractional part (`50.0`, not `50`).
pub fn fallback_summary(rec: &Recommendation) -> String {
    let mut parts = vec![format!("Price Score: {:?}", rec.price_score)];
    if let Some(fs) = rec.financial_score {
        parts.push(format!("Financial Score: {fs:?}"));
    }
    if let Some(sc) = rec.sentiment_score {
        parts.push(format!("Sentiment Score: {sc:?}"));
    }
    parts.join(", ")
}

/// Generator that never calls out; produces the score summary as the rationale.
#[derive(Debug, Clone, Default)]
pub struct TemplateRationale;

#[async_trait::async_trait]
impl RationaleGenerator for TemplateRationale {
    fn provider(&self) -> Provider {
        Provider::Template
    }

    async fn generate_rationale(&self, input: &RationaleInput) -> anyhow::Result<Rationale> {
        Ok(Rationale {
            rationale: fallback_summary(&input.recommendation),
            key_factors: Vec::new(),
            warnings: Vec::new(),
            timeframe: Timeframe::MediumTerm,
            confidence: RationaleConfidence::Low,
        })
    }
}
