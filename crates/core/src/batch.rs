//! Batch orchestration around the scoring engine.
//!
//! The runner owns all I/O: it fetches records through a [`SubjectSource`],
//! classifies each subject, asks a [`RationaleGenerator`] for text and hands the
//! result to a [`RecommendationStore`]. One subject failing never stops the
//! rest of the batch; failures are collected in the [`BatchSummary`].

use crate::domain::recommendation::{Recommendation, Subject, SubjectId};
use crate::domain::records::{
    filter_sentiment_window, validate_price_point, validate_sentiment_record, validate_statement,
    FinancialStatement, PricePoint, SentimentRecord,
};
use crate::llm::template::fallback_summary;
use crate::llm::{Provider, RationaleDetails, RationaleGenerator, RationaleInput};
use crate::scoring::classifier::score_bundle;
use crate::scoring::{classify_asset, classify_company_full, classify_company_price_financial};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait SubjectSource: Send + Sync {
    async fn list_companies(&self) -> anyhow::Result<Vec<Subject>>;

    async fn list_assets(&self) -> anyhow::Result<Vec<Subject>>;

    async fn find_company(&self, company_id: i64) -> anyhow::Result<Option<Subject>>;

    /// Most recent closes on or before `as_of`, any order.
    async fn price_history(
        &self,
        subject: SubjectId,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>>;

    async fn financial_statements(
        &self,
        company_id: i64,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<FinancialStatement>>;

    /// Records published in the trailing sentiment window ending at `as_of`.
    async fn sentiment_records(
        &self,
        subject: SubjectId,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<SentimentRecord>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecommendation {
    pub subject: SubjectId,
    pub recommendation: Recommendation,
    pub rationale_summary: String,
    /// `None` when the score summary stood in for a generated rationale.
    pub rationale_details: Option<RationaleDetails>,
    pub rationale_provider: &'static str,
    pub recommended_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Returns the id of the stored row.
    async fn save(&self, record: &StoredRecommendation) -> anyhow::Result<i64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Companies,
    Assets,
}

impl BatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchKind::Companies => "companies",
            BatchKind::Assets => "assets",
        }
    }
}

/// Which classifier variant companies go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompanyScoring {
    PriceFinancial,
    #[default]
    WithSentiment,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub as_of: NaiveDate,
    /// Stamped on every stored recommendation of the run.
    pub recommended_at: DateTime<Utc>,
    pub company_scoring: CompanyScoring,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub kind: BatchKind,
    pub succeeded: usize,
    pub failed: Vec<(SubjectId, String)>,
}

impl BatchSummary {
    fn new(kind: BatchKind) -> Self {
        Self {
            kind,
            succeeded: 0,
            failed: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

#[derive(Debug, Clone)]
pub struct SubjectOutcome {
    pub record_id: i64,
    pub stored: StoredRecommendation,
}

pub struct RecommendationBatchRunner {
    source: Arc<dyn SubjectSource>,
    store: Arc<dyn RecommendationStore>,
    rationale: Arc<dyn RationaleGenerator>,
    options: RunOptions,
}

impl RecommendationBatchRunner {
    pub fn new(
        source: Arc<dyn SubjectSource>,
        store: Arc<dyn RecommendationStore>,
        rationale: Arc<dyn RationaleGenerator>,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            store,
            rationale,
            options,
        }
    }

    pub async fn run_companies(&self) -> anyhow::Result<BatchSummary> {
        let companies = self
            .source
            .list_companies()
            .await
            .context("list companies failed")?;
        Ok(self.run_batch(BatchKind::Companies, companies).await)
    }

    pub async fn run_assets(&self) -> anyhow::Result<BatchSummary> {
        let assets = self
            .source
            .list_assets()
            .await
            .context("list assets failed")?;
        Ok(self.run_batch(BatchKind::Assets, assets).await)
    }

    /// On-demand recompute for one company.
    pub async fn run_company(&self, company_id: i64) -> anyhow::Result<SubjectOutcome> {
        let subject = self
            .source
            .find_company(company_id)
            .await
            .with_context(|| format!("lookup company {company_id} failed"))?
            .with_context(|| format!("company {company_id} not found"))?;
        self.process_subject(&subject).await
    }

    async fn run_batch(&self, kind: BatchKind, subjects: Vec<Subject>) -> BatchSummary {
        let mut summary = BatchSummary::new(kind);
        if subjects.is_empty() {
            tracing::info!(kind = kind.as_str(), "no subjects to classify");
            return summary;
        }

        tracing::info!(kind = kind.as_str(), subjects = subjects.len(), as_of = %self.options.as_of, "batch started");

        for subject in &subjects {
            match self.process_subject(subject).await {
                Ok(outcome) => {
                    summary.succeeded += 1;
                    tracing::debug!(
                        subject = %subject.id,
                        name = %subject.name,
                        record_id = outcome.record_id,
                        recommendation = %outcome.stored.recommendation.recommendation_type,
                        investment_score = outcome.stored.recommendation.investment_score,
                        "stored recommendation"
                    );
                }
                Err(err) => {
                    tracing::warn!(subject = %subject.id, name = %subject.name, error = %err, "subject failed; continuing");
                    summary.failed.push((subject.id, format!("{err:#}")));
                }
            }
        }

        tracing::info!(
            kind = kind.as_str(),
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            "batch finished"
        );
        summary
    }

    async fn process_subject(&self, subject: &Subject) -> anyhow::Result<SubjectOutcome> {
        let recommendation = self.classify(subject.id).await?;
        let (rationale_summary, rationale_details, rationale_provider) =
            self.rationale_for(subject, &recommendation).await;

        let stored = StoredRecommendation {
            subject: subject.id,
            recommendation,
            rationale_summary,
            rationale_details,
            rationale_provider,
            recommended_at: self.options.recommended_at,
        };
        let record_id = self
            .store
            .save(&stored)
            .await
            .with_context(|| format!("store recommendation for {} failed", subject.id))?;

        Ok(SubjectOutcome { record_id, stored })
    }

    /// Fetches the subject's records and runs the matching classifier variant.
    pub async fn classify(&self, subject: SubjectId) -> anyhow::Result<Recommendation> {
        let as_of = self.options.as_of;
        let prices = self
            .source
            .price_history(subject, as_of)
            .await
            .with_context(|| format!("fetch prices for {subject} failed"))?;
        for p in &prices {
            validate_price_point(p)?;
        }

        match subject {
            SubjectId::Company(company_id) => {
                let statements = self
                    .source
                    .financial_statements(company_id, as_of)
                    .await
                    .with_context(|| format!("fetch statements for {subject} failed"))?;
                for s in &statements {
                    validate_statement(s)?;
                }

                match self.options.company_scoring {
                    CompanyScoring::PriceFinancial => {
                        let b = score_bundle(&prices, Some(&statements), None);
                        Ok(classify_company_price_financial(
                            b.price_score,
                            b.financial_score.unwrap_or_default(),
                        ))
                    }
                    CompanyScoring::WithSentiment => {
                        let sentiment = self.sentiment_window(subject).await?;
                        let b = score_bundle(&prices, Some(&statements), Some(&sentiment));
                        Ok(classify_company_full(
                            b.price_score,
                            b.financial_score.unwrap_or_default(),
                            b.sentiment_score.unwrap_or_default(),
                            b.confidence.unwrap_or_default(),
                        ))
                    }
                }
            }
            SubjectId::Asset(_) => {
                let sentiment = self.sentiment_window(subject).await?;
                let b = score_bundle(&prices, None, Some(&sentiment));
                Ok(classify_asset(
                    b.price_score,
                    b.sentiment_score.unwrap_or_default(),
                    b.confidence.unwrap_or_default(),
                ))
            }
        }
    }

    async fn sentiment_window(&self, subject: SubjectId) -> anyhow::Result<Vec<SentimentRecord>> {
        let records = self
            .source
            .sentiment_records(subject, self.options.as_of)
            .await
            .with_context(|| format!("fetch sentiment for {subject} failed"))?;
        for r in &records {
            validate_sentiment_record(r)?;
        }
        Ok(filter_sentiment_window(&records, self.options.as_of))
    }

    /// Generated text when the provider succeeds, otherwise the score summary.
    async fn rationale_for(
        &self,
        subject: &Subject,
        recommendation: &Recommendation,
    ) -> (String, Option<RationaleDetails>, &'static str) {
        let input = RationaleInput::new(subject.name.clone(), recommendation.clone());
        match self.rationale.generate_rationale(&input).await {
            Ok(r) => {
                let (text, details) = r.into_parts();
                (text, Some(details), self.rationale.provider().as_str())
            }
            Err(err) => {
                tracing::warn!(
                    subject = %subject.id,
                    provider = self.rationale.provider().as_str(),
                    error = %err,
                    "rationale generation failed; using score summary"
                );
                (fallback_summary(recommendation), None, Provider::Template.as_str())
            }
        }
    }
}
