use crate::domain::records::SentimentRecord;
use crate::scoring::centered_score;

/// `(score, confidence)` reported for an empty sentiment window.
///
/// This is the raw value 0.0, not the neutral 50.0 the other calculators use:
/// the empty case bypasses the 50-centered scaling applied to non-empty
/// windows, and downstream blends see a score of 0.
pub const EMPTY_WINDOW_SENTIMENT: (f64, f64) = (0.0, 0.0);

/// Averages the sentiment and confidence of records already restricted to the
/// trailing window, returning `(scaled_score, avg_confidence)`.
///
/// The scaled score is not clamped; it stays in [0, 100] as long as each
/// record's score is within [-1, 1].
pub fn compute_sentiment_score(records: &[SentimentRecord]) -> (f64, f64) {
    if records.is_empty() {
        return EMPTY_WINDOW_SENTIMENT;
    }

    let n = records.len() as f64;
    let avg_sentiment = records.iter().map(|r| r.sentiment_score).sum::<f64>() / n;
    let avg_confidence = records.iter().map(|r| r.confidence_level).sum::<f64>() / n;

    (centered_score(avg_sentiment), avg_confidence)
}
