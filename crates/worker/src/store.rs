use scorecard_core::batch::{RecommendationStore, StoredRecommendation};
use scorecard_core::storage::recommendations::PgRecommendationStore;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Logs what would be stored instead of writing it.
#[derive(Debug, Default)]
pub struct DryRunStore {
    next_id: AtomicI64,
}

#[async_trait::async_trait]
impl RecommendationStore for DryRunStore {
    async fn save(&self, record: &StoredRecommendation) -> anyhow::Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let recommendation = serde_json::to_string(&record.recommendation)?;
        let details = serde_json::to_string(&record.rationale_details)?;
        tracing::info!(
            dry_run = true,
            subject = %record.subject,
            %recommendation,
            rationale = %record.rationale_summary,
            rationale_details = %details,
            "recommendation (not stored)"
        );
        Ok(id)
    }
}

pub fn build(pool: sqlx::PgPool, dry_run: bool) -> Arc<dyn RecommendationStore> {
    if dry_run {
        Arc::new(DryRunStore::default())
    } else {
        Arc::new(PgRecommendationStore::new(pool))
    }
}
