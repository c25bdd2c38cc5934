//! Recency re-ranking
//!
//! Blends how recently a note changed into its relevance score:
//!
//! ```text
//! decay = min(1, 2^(-age / half_life))
//! score = (base + decay * boost) / (boost + 1)
//! ```
//!
//! A document without a usable date has decay 0 and keeps `base / (boost + 1)`.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default date field used for recency
pub const DEFAULT_RECENCY_FIELD: &str = "modified";

/// Recency overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecencyConfig {
    /// Date-valued field holding the document timestamp
    pub field: String,
    /// Age at which decay reaches 0.5
    pub half_life: Duration,
    /// Weight of recency relative to the base score
    pub boost: f32,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            field: DEFAULT_RECENCY_FIELD.to_string(),
            half_life: Duration::from_secs(86400 * 7), // 7 days
            boost: 0.1,
        }
    }
}

/// Applies [`RecencyConfig`] against a fixed "now".
#[derive(Debug, Clone)]
pub struct RecencyScorer {
    half_life_secs: f64,
    boost: f32,
    current_time: i64,
}

impl RecencyScorer {
    pub fn new(config: &RecencyConfig) -> Self {
        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::at(config, current_time)
    }

    /// Scorer with an explicit current time (unix seconds).
    pub fn at(config: &RecencyConfig, current_time: i64) -> Self {
        Self {
            half_life_secs: config.half_life.as_secs_f64(),
            boost: config.boost.max(0.0),
            current_time,
        }
    }

    pub fn current_time(&self) -> i64 {
        self.current_time
    }

    /// Decay for a document of the given age in seconds. Negative ages
    /// (timestamps in the future) clamp to 1.
    pub fn decay(&self, age_secs: f64) -> f32 {
        if age_secs.is_nan() {
            return 0.0;
        }
        if self.half_life_secs <= 0.0 {
            return if age_secs <= 0.0 { 1.0 } else { 0.0 };
        }
        (-age_secs / self.half_life_secs).exp2().min(1.0) as f32
    }

    /// Decay for a document timestamp (unix seconds), 0 when missing.
    pub fn decay_at(&self, timestamp: Option<i64>) -> f32 {
        match timestamp {
            Some(ts) => self.decay((self.current_time - ts) as f64),
            None => 0.0,
        }
    }

    /// Blend `base` with the recency of `timestamp`.
    pub fn rescore(&self, base: f32, timestamp: Option<i64>) -> f32 {
        let decay = self.decay_at(timestamp);
        (base + decay * self.boost) / (self.boost + 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;
    const WEEK: i64 = 86400 * 7;

    fn scorer() -> RecencyScorer {
        RecencyScorer::at(&RecencyConfig::default(), NOW)
    }

    #[test]
    fn test_default_config() {
        let config = RecencyConfig::default();
        assert_eq!(config.field, "modified");
        assert_eq!(config.half_life, Duration::from_secs(604800));
        assert!((config.boost - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_decay_at_zero_age() {
        assert_eq!(scorer().decay(0.0), 1.0);
        assert_eq!(scorer().decay_at(Some(NOW)), 1.0);
    }

    #[test]
    fn test_decay_at_half_life() {
        let d = scorer().decay_at(Some(NOW - WEEK));
        assert!((d - 0.5).abs() < 1e-6, "decay was {d}");
        let d = scorer().decay_at(Some(NOW - 2 * WEEK));
        assert!((d - 0.25).abs() < 1e-6, "decay was {d}");
    }

    #[test]
    fn test_decay_tends_to_zero() {
        assert_eq!(scorer().decay(f64::INFINITY), 0.0);
        assert!(scorer().decay_at(Some(0)) < 1e-6);
    }

    #[test]
    fn test_future_timestamps_clamp_to_one() {
        assert_eq!(scorer().decay_at(Some(NOW + WEEK)), 1.0);
    }

    #[test]
    fn test_missing_date_scales_base() {
        let s = scorer();
        let score = s.rescore(2.0, None);
        assert!((score - 2.0 / 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_rescore_bounds() {
        let s = scorer();
        let boost = 0.1f32;
        for base in [0.0f32, 0.3, 1.0, 7.5] {
            let low = base / (boost + 1.0);
            let high = (base + boost) / (boost + 1.0);
            for ts in [None, Some(0), Some(NOW - WEEK), Some(NOW)] {
                let score = s.rescore(base, ts);
                assert!(score >= low - 1e-6 && score <= high + 1e-6, "{score} not in [{low}, {high}]");
            }
            assert!((s.rescore(base, Some(NOW)) - high).abs() < 1e-6);
        }
    }

    #[test]
    fn test_newer_ranks_higher_on_equal_base() {
        let s = scorer();
        assert!(s.rescore(1.0, Some(NOW - 3600)) > s.rescore(1.0, Some(NOW - 30 * 86400)));
    }

    #[test]
    fn test_zero_half_life() {
        let config = RecencyConfig {
            half_life: Duration::ZERO,
            ..Default::default()
        };
        let s = RecencyScorer::at(&config, NOW);
        assert_eq!(s.decay_at(Some(NOW)), 1.0);
        assert_eq!(s.decay_at(Some(NOW - 1)), 0.0);
    }

    #[test]
    fn test_negative_boost_is_clamped() {
        let config = RecencyConfig {
            boost: -5.0,
            ..Default::default()
        };
        let s = RecencyScorer::at(&config, NOW);
        assert_eq!(s.rescore(0.75, Some(NOW)), 0.75);
    }
}
