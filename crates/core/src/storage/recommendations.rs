use crate::batch::{RecommendationStore, StoredRecommendation};
use anyhow::Context;

#[derive(Debug, Clone)]
pub struct PgRecommendationStore {
    pool: sqlx::PgPool,
}

impl PgRecommendationStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RecommendationStore for PgRecommendationStore {
    async fn save(&self, record: &StoredRecommendation) -> anyhow::Result<i64> {
        insert_recommendation(&self.pool, record).await
    }
}

/// Inserts one row; exactly one of `company_id`/`asset_id` is set.
pub async fn insert_recommendation(
    pool: &sqlx::PgPool,
    record: &StoredRecommendation,
) -> anyhow::Result<i64> {
    let rec = &record.recommendation;
    let details = record
        .rationale_details
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .context("serialize rationale_details failed")?;

    let recommendation_id: i64 = sqlx::query_scalar(
        "INSERT INTO investment_recommendation \
         (company_id, asset_id, recommendation_type, investment_score, risk_level, \
          price_score, financial_score, sentiment_score, confidence_level, \
          rationale_summary, rationale_details, rationale_provider, recommendation_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::jsonb, $12, $13) \
         RETURNING recommendation_id::bigint",
    )
    .persistent(false)
    .bind(record.subject.company_id())
    .bind(record.subject.asset_id())
    .bind(rec.recommendation_type.as_str())
    .bind(rec.investment_score)
    .bind(rec.risk_level.as_str())
    .bind(rec.price_score)
    .bind(rec.financial_score)
    .bind(rec.sentiment_score)
    .bind(rec.confidence_level)
    .bind(&record.rationale_summary)
    .bind(details)
    .bind(record.rationale_provider)
    .bind(record.recommended_at)
    .fetch_one(pool)
    .await
    .with_context(|| format!("insert investment_recommendation failed ({})", record.subject))?;

    Ok(recommendation_id)
}
