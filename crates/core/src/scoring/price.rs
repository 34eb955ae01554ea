use crate::domain::records::PricePoint;
use crate::scoring::{centered_score, clamp_score, NEUTRAL_SCORE};

/// Points averaged in each half of the momentum comparison.
pub const HALF_WINDOW: usize = 30;
pub const REQUIRED_POINTS: usize = HALF_WINDOW * 2;

/// Momentum score from the 60 most recent closes: the mean of the latest 30
/// against the mean of the 30 before them. Input order does not matter.
pub fn compute_price_score(prices: &[PricePoint]) -> f64 {
    if prices.len() < REQUIRED_POINTS {
        return NEUTRAL_SCORE;
    }

    let mut sorted: Vec<&PricePoint> = prices.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let avg_recent = mean_close(&sorted[..HALF_WINDOW]);
    let avg_prior = mean_close(&sorted[HALF_WINDOW..REQUIRED_POINTS]);

    if avg_prior == 0.0 {
        return NEUTRAL_SCORE;
    }

    let price_change = (avg_recent - avg_prior) / avg_prior;
    clamp_score(centered_score(price_change))
}

fn mean_close(points: &[&PricePoint]) -> f64 {
    points.iter().map(|p| p.close_price).sum::<f64>() / points.len() as f64
}
