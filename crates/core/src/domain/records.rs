use anyhow::ensure;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

pub const SENTIMENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub period_end_date: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentRecord {
    /// In [-1, 1].
    pub sentiment_score: f64,
    /// In [0, 1].
    pub confidence_level: f64,
    pub publish_date: NaiveDate,
}

/// First date (inclusive) of a trailing window ending at `as_of`.
pub fn window_start(as_of: NaiveDate, days: i64) -> NaiveDate {
    as_of - Duration::days(days)
}

/// Keeps the records published within the trailing sentiment window ending at `as_of`.
pub fn filter_sentiment_window(records: &[SentimentRecord], as_of: NaiveDate) -> Vec<SentimentRecord> {
    let start = window_start(as_of, SENTIMENT_WINDOW_DAYS);
    records
        .iter()
        .filter(|r| r.publish_date >= start && r.publish_date <= as_of)
        .copied()
        .collect()
}

pub fn validate_price_point(p: &PricePoint) -> anyhow::Result<()> {
    ensure!(
        p.close_price.is_finite(),
        "close_price must be finite (date={}, got {})",
        p.date,
        p.close_price
    );
    Ok(())
}

pub fn validate_statement(s: &FinancialStatement) -> anyhow::Result<()> {
    ensure!(
        s.revenue.is_finite(),
        "revenue must be finite (period_end_date={}, got {})",
        s.period_end_date,
        s.revenue
    );
    Ok(())
}

pub fn validate_sentiment_record(r: &SentimentRecord) -> anyhow::Result<()> {
    ensure!(
        (-1.0..=1.0).contains(&r.sentiment_score),
        "sentiment_score must be between -1 and 1 (got {})",
        r.sentiment_score
    );
    ensure!(
        (0.0..=1.0).contains(&r.confidence_level),
        "confidence_level must be between 0 and 1 (got {})",
        r.confidence_level
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(score: f64, confidence: f64, publish_date: NaiveDate) -> SentimentRecord {
        SentimentRecord {
            sentiment_score: score,
            confidence_level: confidence,
            publish_date,
        }
    }

    #[test]
    fn window_start_counts_back_calendar_days() {
        assert_eq!(window_start(d(2026, 3, 31), 30), d(2026, 3, 1));
        assert_eq!(window_start(d(2026, 3, 1), 60), d(2025, 12, 31));
    }

    #[test]
    fn sentiment_window_is_inclusive_on_both_ends() {
        let as_of = d(2026, 3, 31);
        let records = vec![
            record(0.1, 0.5, d(2026, 3, 1)),
            record(0.2, 0.5, d(2026, 2, 28)),
            record(0.3, 0.5, d(2026, 3, 31)),
            record(0.4, 0.5, d(2026, 4, 1)),
        ];
        let kept = filter_sentiment_window(&records, as_of);
        let scores: Vec<f64> = kept.iter().map(|r| r.sentiment_score).collect();
        assert_eq!(scores, vec![0.1, 0.3]);
    }

    #[test]
    fn rejects_out_of_contract_sentiment() {
        let today = d(2026, 1, 1);
        assert!(validate_sentiment_record(&record(1.0, 1.0, today)).is_ok());
        assert!(validate_sentiment_record(&record(-1.0, 0.0, today)).is_ok());
        assert!(validate_sentiment_record(&record(1.2, 0.5, today)).is_err());
        assert!(validate_sentiment_record(&record(0.0, -0.1, today)).is_err());
        assert!(validate_sentiment_record(&record(f64::NAN, 0.5, today)).is_err());
    }

    #[test]
    fn rejects_non_finite_amounts() {
        let today = d(2026, 1, 1);
        assert!(validate_price_point(&PricePoint { date: today, close_price: f64::INFINITY }).is_err());
        assert!(validate_statement(&FinancialStatement { period_end_date: today, revenue: f64::NAN }).is_err());
        assert!(validate_statement(&FinancialStatement { period_end_date: today, revenue: 0.0 }).is_ok());
    }
}
