use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Invest,
    Hold,
    DontInvest,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Invest => "invest",
            RecommendationType::Hold => "hold",
            RecommendationType::DontInvest => "dont_invest",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which invest band a score fell into. Both tiers surface as
/// [`RecommendationType::Invest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestStrength {
    Strong,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-scores feeding one classification. Produced per call, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBundle {
    pub price_score: f64,
    pub financial_score: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub confidence: Option<f64>,
}

/// Engine output. Carries no subject identity and no timestamp; the caller
/// attaches both when persisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_type: RecommendationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invest_strength: Option<InvestStrength>,
    pub investment_score: f64,
    pub risk_level: RiskLevel,
    pub price_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
}

/// A company or an asset. The two id spaces never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubjectId {
    Company(i64),
    Asset(i64),
}

impl SubjectId {
    pub fn company_id(&self) -> Option<i64> {
        match self {
            SubjectId::Company(id) => Some(*id),
            SubjectId::Asset(_) => None,
        }
    }

    pub fn asset_id(&self) -> Option<i64> {
        match self {
            SubjectId::Company(_) => None,
            SubjectId::Asset(id) => Some(*id),
        }
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubjectId::Company(id) => write!(f, "company:{id}"),
            SubjectId::Asset(id) => write!(f, "asset:{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn labels_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_value(RecommendationType::DontInvest).unwrap(),
            json!("dont_invest")
        );
        assert_eq!(serde_json::to_value(RiskLevel::High).unwrap(), json!("high"));
        assert_eq!(RecommendationType::DontInvest.to_string(), "dont_invest");
    }

    #[test]
    fn subject_id_exposes_exactly_one_side() {
        let company = SubjectId::Company(7);
        assert_eq!(company.company_id(), Some(7));
        assert_eq!(company.asset_id(), None);

        let asset = SubjectId::Asset(3);
        assert_eq!(asset.company_id(), None);
        assert_eq!(asset.asset_id(), Some(3));
        assert_eq!(asset.to_string(), "asset:3");
    }

    #[test]
    fn absent_components_are_omitted_from_json() {
        let rec = Recommendation {
            recommendation_type: RecommendationType::Hold,
            invest_strength: None,
            investment_score: 50.0,
            risk_level: RiskLevel::Medium,
            price_score: 50.0,
            financial_score: None,
            sentiment_score: Some(50.0),
            confidence_level: Some(0.0),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert!(v.get("financial_score").is_none());
        assert_eq!(v["sentiment_score"], json!(50.0));
        assert_eq!(v["recommendation_type"], json!("hold"));
    }
}
