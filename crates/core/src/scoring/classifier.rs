use crate::domain::recommendation::{
    InvestStrength, Recommendation, RecommendationType, RiskLevel, ScoreBundle,
};
use crate::domain::records::{FinancialStatement, PricePoint, SentimentRecord};
use crate::scoring::{
    compute_financial_score, compute_price_score, compute_sentiment_score, round2,
};

/// Average confidence above which sentiment earns its larger weight.
pub const CONFIDENCE_GATE: f64 = 0.5;

const STRONG_INVEST: f64 = 70.0;
const MODERATE_INVEST: f64 = 55.0;
const HOLD: f64 = 40.0;
const PRICE_FINANCIAL_INVEST: f64 = 60.0;

const HIGH_RISK_FINANCIAL: f64 = 30.0;
const LOW_RISK_FINANCIAL: f64 = 60.0;
const HIGH_RISK_SENTIMENT: f64 = 40.0;
const LOW_RISK_SENTIMENT: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct CompanyWeights {
    price: f64,
    financial: f64,
    sentiment: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AssetWeights {
    price: f64,
    sentiment: f64,
}

const COMPANY_CONFIDENT: CompanyWeights = CompanyWeights {
    price: 0.3,
    financial: 0.3,
    sentiment: 0.4,
};
const COMPANY_UNCERTAIN: CompanyWeights = CompanyWeights {
    price: 0.4,
    financial: 0.4,
    sentiment: 0.2,
};
const ASSET_CONFIDENT: AssetWeights = AssetWeights {
    price: 0.5,
    sentiment: 0.5,
};
const ASSET_UNCERTAIN: AssetWeights = AssetWeights {
    price: 0.7,
    sentiment: 0.3,
};

fn company_weights(confidence: f64) -> CompanyWeights {
    if confidence > CONFIDENCE_GATE {
        COMPANY_CONFIDENT
    } else {
        COMPANY_UNCERTAIN
    }
}

fn asset_weights(confidence: f64) -> AssetWeights {
    if confidence > CONFIDENCE_GATE {
        ASSET_CONFIDENT
    } else {
        ASSET_UNCERTAIN
    }
}

/// Company without a sentiment signal: an even price/financial blend.
pub fn classify_company_price_financial(price_score: f64, financial_score: f64) -> Recommendation {
    let investment_score = 0.5 * price_score + 0.5 * financial_score;

    let recommendation_type = if investment_score >= PRICE_FINANCIAL_INVEST {
        RecommendationType::Invest
    } else if investment_score >= HOLD {
        RecommendationType::Hold
    } else {
        RecommendationType::DontInvest
    };

    let risk_level = if financial_score < HIGH_RISK_FINANCIAL {
        RiskLevel::High
    } else if financial_score > LOW_RISK_FINANCIAL {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    Recommendation {
        recommendation_type,
        invest_strength: None,
        investment_score: round2(investment_score),
        risk_level,
        price_score: round2(price_score),
        financial_score: Some(round2(financial_score)),
        sentiment_score: None,
        confidence_level: None,
    }
}

/// Company with all three signals; sentiment weight depends on its confidence.
pub fn classify_company_full(
    price_score: f64,
    financial_score: f64,
    sentiment_score: f64,
    avg_confidence: f64,
) -> Recommendation {
    let w = company_weights(avg_confidence);
    let investment_score =
        w.price * price_score + w.financial * financial_score + w.sentiment * sentiment_score;

    let (recommendation_type, invest_strength) = tiered_recommendation(investment_score);

    let risk_level = if sentiment_score < HIGH_RISK_SENTIMENT || financial_score < HIGH_RISK_FINANCIAL
    {
        RiskLevel::High
    } else if sentiment_score > LOW_RISK_SENTIMENT && financial_score > LOW_RISK_FINANCIAL {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    Recommendation {
        recommendation_type,
        invest_strength,
        investment_score: round2(investment_score),
        risk_level,
        price_score: round2(price_score),
        financial_score: Some(round2(financial_score)),
        sentiment_score: Some(round2(sentiment_score)),
        confidence_level: Some(round2(avg_confidence)),
    }
}

/// Asset (no financial statements): price and sentiment only.
pub fn classify_asset(price_score: f64, sentiment_score: f64, avg_confidence: f64) -> Recommendation {
    let w = asset_weights(avg_confidence);
    let investment_score = w.price * price_score + w.sentiment * sentiment_score;

    let (recommendation_type, invest_strength) = tiered_recommendation(investment_score);

    let risk_level = if sentiment_score < HIGH_RISK_SENTIMENT {
        RiskLevel::High
    } else if sentiment_score > LOW_RISK_SENTIMENT {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    };

    Recommendation {
        recommendation_type,
        invest_strength,
        investment_score: round2(investment_score),
        risk_level,
        price_score: round2(price_score),
        financial_score: None,
        sentiment_score: Some(round2(sentiment_score)),
        confidence_level: Some(round2(avg_confidence)),
    }
}

fn tiered_recommendation(investment_score: f64) -> (RecommendationType, Option<InvestStrength>) {
    if investment_score >= STRONG_INVEST {
        (RecommendationType::Invest, Some(InvestStrength::Strong))
    } else if investment_score >= MODERATE_INVEST {
        (RecommendationType::Invest, Some(InvestStrength::Moderate))
    } else if investment_score >= HOLD {
        (RecommendationType::Hold, None)
    } else {
        (RecommendationType::DontInvest, None)
    }
}

/// Runs the calculators and returns the sub-scores a classification needs.
/// Financial and sentiment inputs are optional because not every subject has them.
pub fn score_bundle(
    prices: &[PricePoint],
    statements: Option<&[FinancialStatement]>,
    sentiment: Option<&[SentimentRecord]>,
) -> ScoreBundle {
    let price_score = compute_price_score(prices);
    let financial_score = statements.map(compute_financial_score);
    let (sentiment_score, confidence) = match sentiment.map(compute_sentiment_score) {
        Some((score, confidence)) => (Some(score), Some(confidence)),
        None => (None, None),
    };

    ScoreBundle {
        price_score,
        financial_score,
        sentiment_score,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn weight_sets_sum_to_one() {
        for w in [COMPANY_CONFIDENT, COMPANY_UNCERTAIN] {
            assert!((w.price + w.financial + w.sentiment - 1.0).abs() < 1e-12);
        }
        for w in [ASSET_CONFIDENT, ASSET_UNCERTAIN] {
            assert!((w.price + w.sentiment - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn company_without_sentiment_strong_scores_invest_low_risk() {
        let rec = classify_company_price_financial(80.0, 80.0);
        assert_eq!(rec.investment_score, 80.0);
        assert_eq!(rec.recommendation_type, RecommendationType::Invest);
        assert_eq!(rec.risk_level, RiskLevel::Low);
        assert_eq!(rec.sentiment_score, None);
        assert_eq!(rec.confidence_level, None);
    }

    #[test]
    fn company_without_sentiment_weak_scores_dont_invest_high_risk() {
        let rec = classify_company_price_financial(30.0, 20.0);
        assert_eq!(rec.investment_score, 25.0);
        assert_eq!(rec.recommendation_type, RecommendationType::DontInvest);
        assert_eq!(rec.risk_level, RiskLevel::High);
    }

    #[test]
    fn company_without_sentiment_band_edges() {
        assert_eq!(
            classify_company_price_financial(60.0, 60.0).recommendation_type,
            RecommendationType::Invest
        );
        let hold = classify_company_price_financial(40.0, 40.0);
        assert_eq!(hold.recommendation_type, RecommendationType::Hold);
        assert_eq!(hold.risk_level, RiskLevel::Medium);
        assert_eq!(
            classify_company_price_financial(39.0, 40.0).recommendation_type,
            RecommendationType::DontInvest
        );
        // 60 is not > 60 and 30 is not < 30.
        assert_eq!(classify_company_price_financial(50.0, 60.0).risk_level, RiskLevel::Medium);
        assert_eq!(classify_company_price_financial(50.0, 30.0).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn confident_company_blend_at_sixty_is_moderate_invest_medium_risk() {
        let rec = classify_company_full(60.0, 60.0, 60.0, 0.6);
        assert_eq!(rec.investment_score, 60.0);
        assert_eq!(rec.recommendation_type, RecommendationType::Invest);
        assert_eq!(rec.invest_strength, Some(InvestStrength::Moderate));
        assert_eq!(rec.risk_level, RiskLevel::Medium);
        assert_eq!(rec.confidence_level, Some(0.6));
    }

    #[test]
    fn company_confidence_gate_is_strict() {
        let confident = classify_company_full(0.0, 0.0, 100.0, 0.51);
        assert_eq!(confident.investment_score, 40.0);
        let uncertain = classify_company_full(0.0, 0.0, 100.0, 0.5);
        assert_eq!(uncertain.investment_score, 20.0);
    }

    #[test]
    fn company_full_risk_rules() {
        assert_eq!(classify_company_full(50.0, 80.0, 39.0, 0.9).risk_level, RiskLevel::High);
        assert_eq!(classify_company_full(50.0, 29.0, 90.0, 0.9).risk_level, RiskLevel::High);
        assert_eq!(classify_company_full(50.0, 61.0, 71.0, 0.9).risk_level, RiskLevel::Low);
        assert_eq!(classify_company_full(50.0, 60.0, 71.0, 0.9).risk_level, RiskLevel::Medium);
        assert_eq!(classify_company_full(50.0, 61.0, 70.0, 0.9).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn company_full_tiers() {
        let strong = classify_company_full(80.0, 80.0, 80.0, 0.9);
        assert_eq!(strong.recommendation_type, RecommendationType::Invest);
        assert_eq!(strong.invest_strength, Some(InvestStrength::Strong));

        let hold = classify_company_full(50.0, 50.0, 50.0, 0.9);
        assert_eq!(hold.recommendation_type, RecommendationType::Hold);
        assert_eq!(hold.invest_strength, None);

        let out = classify_company_full(10.0, 10.0, 10.0, 0.1);
        assert_eq!(out.recommendation_type, RecommendationType::DontInvest);
    }

    #[test]
    fn empty_sentiment_window_drags_company_blend() {
        // No sentiment records: score 0.0 with confidence 0.0 flows straight in.
        let (sentiment, confidence) = compute_sentiment_score(&[]);
        let rec = classify_company_full(50.0, 50.0, sentiment, confidence);
        assert_eq!(rec.investment_score, 40.0);
        assert_eq!(rec.recommendation_type, RecommendationType::Hold);
        assert_eq!(rec.risk_level, RiskLevel::High);
    }

    #[test]
    fn uncertain_asset_leans_on_price() {
        // 0.7*90 + 0.3*20 = 69, which clears the 55 invest band.
        let rec = classify_asset(90.0, 20.0, 0.3);
        assert_eq!(rec.investment_score, 69.0);
        assert_eq!(rec.recommendation_type, RecommendationType::Invest);
        assert_eq!(rec.invest_strength, Some(InvestStrength::Moderate));
        assert_eq!(rec.risk_level, RiskLevel::High);
        assert_eq!(rec.financial_score, None);
    }

    #[test]
    fn confident_asset_splits_evenly() {
        let rec = classify_asset(90.0, 20.0, 0.8);
        assert_eq!(rec.investment_score, 55.0);
        assert_eq!(rec.invest_strength, Some(InvestStrength::Moderate));

        let rec = classify_asset(40.0, 80.0, 0.8);
        assert_eq!(rec.investment_score, 60.0);
        assert_eq!(rec.risk_level, RiskLevel::Low);

        let rec = classify_asset(40.0, 70.0, 0.8);
        assert_eq!(rec.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn outputs_are_rounded_to_two_decimals() {
        let rec = classify_company_full(33.333, 66.667, 12.3456, 0.123456);
        assert_eq!(rec.price_score, 33.33);
        assert_eq!(rec.financial_score, Some(66.67));
        assert_eq!(rec.sentiment_score, Some(12.35));
        assert_eq!(rec.confidence_level, Some(0.12));
        assert_eq!(rec.investment_score, round2(0.4 * 33.333 + 0.4 * 66.667 + 0.2 * 12.3456));
    }

    #[test]
    fn half_cent_blends_round_to_even() {
        let rec = classify_company_price_financial(50.25, 50.0);
        assert_eq!(rec.investment_score, 50.12);

        // 0.25% revenue growth lands exactly on 50.125.
        let statements = [
            FinancialStatement {
                period_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
                revenue: 100.25,
            },
            FinancialStatement {
                period_end_date: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
                revenue: 100.0,
            },
        ];
        let financial = compute_financial_score(&statements);
        assert_eq!(financial, 50.125);
        let rec = classify_company_price_financial(50.0, financial);
        assert_eq!(rec.financial_score, Some(50.12));
        assert_eq!(rec.investment_score, 50.06);
    }

    #[test]
    fn classification_is_deterministic() {
        let a = classify_company_full(61.237, 48.9, 73.1, 0.51);
        let b = classify_company_full(61.237, 48.9, 73.1, 0.51);
        assert_eq!(a, b);
        assert_eq!(a.investment_score.to_bits(), b.investment_score.to_bits());

        let a = classify_asset(12.5, 87.25, 0.49);
        let b = classify_asset(12.5, 87.25, 0.49);
        assert_eq!(a.investment_score.to_bits(), b.investment_score.to_bits());

        let a = classify_company_price_financial(71.11, 22.22);
        let b = classify_company_price_financial(71.11, 22.22);
        assert_eq!(a, b);
    }

    #[test]
    fn score_bundle_runs_only_the_requested_calculators() {
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        let prices: Vec<PricePoint> = (0..60)
            .map(|i| PricePoint {
                date: as_of - Duration::days(i),
                close_price: if i < 30 { 120.0 } else { 100.0 },
            })
            .collect();
        let sentiment = [SentimentRecord {
            sentiment_score: 1.0,
            confidence_level: 0.9,
            publish_date: as_of,
        }];

        let bundle = score_bundle(&prices, None, Some(&sentiment));
        assert!((bundle.price_score - 60.0).abs() < 1e-9);
        assert_eq!(bundle.financial_score, None);
        assert_eq!(bundle.sentiment_score, Some(100.0));
        assert_eq!(bundle.confidence, Some(0.9));

        let bundle = score_bundle(&[], Some(&[]), Some(&[]));
        assert_eq!(bundle.price_score, 50.0);
        assert_eq!(bundle.financial_score, Some(50.0));
        assert_eq!(bundle.sentiment_score, Some(0.0));
        assert_eq!(bundle.confidence, Some(0.0));
    }
}
