use crate::domain::recommendation::Recommendation;
use crate::scoring::NEUTRAL_SCORE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTrend {
    Upward,
    Stable,
    Downward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialHealth {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

pub fn price_trend(price_score: f64) -> PriceTrend {
    if price_score > 55.0 {
        PriceTrend::Upward
    } else if price_score < 45.0 {
        PriceTrend::Downward
    } else {
        PriceTrend::Stable
    }
}

pub fn financial_health(financial_score: f64) -> FinancialHealth {
    if financial_score > 60.0 {
        FinancialHealth::Strong
    } else if financial_score < 40.0 {
        FinancialHealth::Weak
    } else {
        FinancialHealth::Moderate
    }
}

pub fn sentiment_label(sentiment_score: f64) -> SentimentLabel {
    if sentiment_score > 60.0 {
        SentimentLabel::Positive
    } else if sentiment_score < 40.0 {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

/// Qualitative description of a recommendation's components, used when
/// asking for rationale text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLabels {
    pub price_trend: PriceTrend,
    pub financial_health: Option<FinancialHealth>,
    pub sentiment: SentimentLabel,
}

impl ScoreLabels {
    /// Missing sentiment is described as neutral.
    pub fn describe(rec: &Recommendation) -> Self {
        Self {
            price_trend: price_trend(rec.price_score),
            financial_health: rec.financial_score.map(financial_health),
            sentiment: sentiment_label(rec.sentiment_score.unwrap_or(NEUTRAL_SCORE)),
        }
    }
}
