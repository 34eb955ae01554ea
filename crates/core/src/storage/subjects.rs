use crate::batch::SubjectSource;
use crate::domain::recommendation::{Subject, SubjectId};
use crate::domain::records::{
    window_start, FinancialStatement, PricePoint, SentimentRecord, SENTIMENT_WINDOW_DAYS,
};
use crate::scoring::price::REQUIRED_POINTS;
use anyhow::Context;
use chrono::NaiveDate;

/// Reads subjects and their records from the tables the ingestion side
/// maintains. Read-only.
#[derive(Debug, Clone)]
pub struct PgSubjectSource {
    pool: sqlx::PgPool,
}

impl PgSubjectSource {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

fn subjects(rows: Vec<(i64, String)>, id: fn(i64) -> SubjectId) -> Vec<Subject> {
    rows.into_iter()
        .map(|(raw_id, name)| Subject {
            id: id(raw_id),
            name: name.trim().to_string(),
        })
        .collect()
}

#[async_trait::async_trait]
impl SubjectSource for PgSubjectSource {
    async fn list_companies(&self) -> anyhow::Result<Vec<Subject>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT company_id::bigint, company_name FROM company ORDER BY company_id",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("select company failed")?;
        Ok(subjects(rows, SubjectId::Company))
    }

    async fn list_assets(&self) -> anyhow::Result<Vec<Subject>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT asset_id::bigint, asset_name FROM asset ORDER BY asset_id",
        )
        .persistent(false)
        .fetch_all(&self.pool)
        .await
        .context("select asset failed")?;
        Ok(subjects(rows, SubjectId::Asset))
    }

    async fn find_company(&self, company_id: i64) -> anyhow::Result<Option<Subject>> {
        let row = sqlx::query_as::<_, (i64, String)>(
            "SELECT company_id::bigint, company_name FROM company WHERE company_id = $1",
        )
        .persistent(false)
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("select company {company_id} failed"))?;
        Ok(row.map(|(id, name)| Subject {
            id: SubjectId::Company(id),
            name: name.trim().to_string(),
        }))
    }

    async fn price_history(
        &self,
        subject: SubjectId,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<PricePoint>> {
        let (sql, id) = match subject {
            SubjectId::Company(id) => (
                "SELECT date, close_price::float8 FROM stock_price \
                 WHERE company_id = $1 AND date <= $2 \
                 ORDER BY date DESC LIMIT $3",
                id,
            ),
            SubjectId::Asset(id) => (
                "SELECT date, price::float8 FROM asset_price \
                 WHERE asset_id = $1 AND date <= $2 \
                 ORDER BY date DESC LIMIT $3",
                id,
            ),
        };

        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(sql)
            .persistent(false)
            .bind(id)
            .bind(as_of)
            .bind(REQUIRED_POINTS as i64)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("select prices for {subject} failed"))?;

        Ok(rows
            .into_iter()
            .map(|(date, close_price)| PricePoint { date, close_price })
            .collect())
    }

    async fn financial_statements(
        &self,
        company_id: i64,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<FinancialStatement>> {
        let rows = sqlx::query_as::<_, (NaiveDate, f64)>(
            "SELECT period_end_date, revenue::float8 FROM financial_statement \
             WHERE company_id = $1 AND period_end_date <= $2 AND revenue IS NOT NULL \
             ORDER BY period_end_date DESC LIMIT 2",
        )
        .persistent(false)
        .bind(company_id)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("select financial_statement for company {company_id} failed"))?;

        Ok(rows
            .into_iter()
            .map(|(period_end_date, revenue)| FinancialStatement {
                period_end_date,
                revenue,
            })
            .collect())
    }

    async fn sentiment_records(
        &self,
        subject: SubjectId,
        as_of: NaiveDate,
    ) -> anyhow::Result<Vec<SentimentRecord>> {
        let (sql, id) = match subject {
            SubjectId::Company(id) => (
                "SELECT sa.sentiment_score::float8, sa.confidence_level::float8, sc.publish_date::date \
                 FROM sentiment_analysis sa \
                 JOIN scraped_content sc ON sa.content_id = sc.content_id \
                 WHERE sc.company_id = $1 AND sc.publish_date::date BETWEEN $2 AND $3",
                id,
            ),
            SubjectId::Asset(id) => (
                "SELECT sa.sentiment_score::float8, sa.confidence_level::float8, sc.publish_date::date \
                 FROM sentiment_analysis sa \
                 JOIN scraped_content sc ON sa.content_id = sc.content_id \
                 WHERE sc.asset_id = $1 AND sc.publish_date::date BETWEEN $2 AND $3",
                id,
            ),
        };

        let rows = sqlx::query_as::<_, (f64, f64, NaiveDate)>(sql)
            .persistent(false)
            .bind(id)
            .bind(window_start(as_of, SENTIMENT_WINDOW_DAYS))
            .bind(as_of)
            .fetch_all(&self.pool)
            .await
            .with_context(|| format!("select sentiment for {subject} failed"))?;

        Ok(rows
            .into_iter()
            .map(|(sentiment_score, confidence_level, publish_date)| SentimentRecord {
                sentiment_score,
                confidence_level,
                publish_date,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_rows_to_subjects() {
        let out = subjects(
            vec![(1, " Acme ".to_string()), (2, "Globex".to_string())],
            SubjectId::Company,
        );
        assert_eq!(out[0].id, SubjectId::Company(1));
        assert_eq!(out[0].name, "Acme");
        assert_eq!(out[1].id, SubjectId::Company(2));

        let out = subjects(vec![(5, "Gold".to_string())], SubjectId::Asset);
        assert_eq!(out[0].id, SubjectId::Asset(5));
    }
}
