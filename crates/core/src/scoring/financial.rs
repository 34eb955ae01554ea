use crate::domain::records::FinancialStatement;
use crate::scoring::{centered_score, clamp_score, NEUTRAL_SCORE};

/// Revenue growth between the two most recent statements on the 0..100 scale.
pub fn compute_financial_score(statements: &[FinancialStatement]) -> f64 {
    if statements.len() < 2 {
        return NEUTRAL_SCORE;
    }

    let mut sorted: Vec<&FinancialStatement> = statements.iter().collect();
    sorted.sort_by(|a, b| b.period_end_date.cmp(&a.period_end_date));

    let current = sorted[0].revenue;
    let previous = sorted[1].revenue;

    if previous == 0.0 {
        return NEUTRAL_SCORE;
    }

    clamp_score(centered_score((current - previous) / previous))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stmt(year: i32, month: u32, revenue: f64) -> FinancialStatement {
        FinancialStatement {
            period_end_date: NaiveDate::from_ymd_opt(year, month, 28).unwrap(),
            revenue,
        }
    }

    #[test]
    fn fewer_than_two_statements_are_neutral() {
        assert_eq!(compute_financial_score(&[]), 50.0);
        assert_eq!(compute_financial_score(&[stmt(2025, 12, 1.0e9)]), 50.0);
    }

    #[test]
    fn zero_previous_revenue_is_neutral() {
        assert_eq!(compute_financial_score(&[stmt(2025, 12, 5.0e6), stmt(2025, 9, 0.0)]), 50.0);
        assert_eq!(compute_financial_score(&[stmt(2025, 12, -5.0e6), stmt(2025, 9, 0.0)]), 50.0);
    }

    #[test]
    fn growth_maps_around_fifty() {
        let s = compute_financial_score(&[stmt(2025, 12, 120.0), stmt(2025, 9, 100.0)]);
        assert!((s - 60.0).abs() < 1e-9);
        let s = compute_financial_score(&[stmt(2025, 12, 80.0), stmt(2025, 9, 100.0)]);
        assert!((s - 40.0).abs() < 1e-9);
    }

    #[test]
    fn uses_two_most_recent_statements_in_any_order() {
        let statements = [
            stmt(2024, 12, 1.0),
            stmt(2025, 9, 100.0),
            stmt(2023, 6, 1.0e12),
            stmt(2025, 12, 150.0),
        ];
        let s = compute_financial_score(&statements);
        assert!((s - 75.0).abs() < 1e-9);
    }

    #[test]
    fn extreme_growth_and_collapse_are_clamped() {
        assert_eq!(compute_financial_score(&[stmt(2025, 12, 500.0), stmt(2025, 9, 100.0)]), 100.0);
        assert_eq!(compute_financial_score(&[stmt(2025, 12, -200.0), stmt(2025, 9, 100.0)]), 0.0);
    }
}
