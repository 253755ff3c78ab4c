//! Tunables the services take from the environment.

use recsys_core::model::Interaction;
use std::time::Duration;

/// Category score deltas and recommendation size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Added to the category score on `user_liked`
    pub like_delta: f64,
    /// Added on `user_disliked`
    pub dislike_delta: f64,
    /// Added on `user_purchased`
    pub purchase_delta: f64,
    /// Products returned by the latest-recommendation read
    pub recommendation_limit: i64,
}

impl ScoringConfig {
    /// Delta for one interaction kind.
    #[must_use]
    pub const fn delta(&self, interaction: Interaction) -> f64 {
        match interaction {
            Interaction::Like => self.like_delta,
            Interaction::Dislike => self.dislike_delta,
            Interaction::Purchase => self.purchase_delta,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            like_delta: 2.0,
            dislike_delta: -1.0,
            purchase_delta: 5.0,
            recommendation_limit: 5,
        }
    }
}

/// Time to live of each cache key family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// `user:<id>`
    pub user_ttl: Duration,
    /// `recommendations:user:<id>`
    pub recommendation_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            user_ttl: Duration::from_secs(3600),
            recommendation_ttl: Duration::from_secs(3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deltas() {
        let scoring = ScoringConfig::default();
        assert!((scoring.delta(Interaction::Like) - 2.0).abs() < f64::EPSILON);
        assert!((scoring.delta(Interaction::Dislike) + 1.0).abs() < f64::EPSILON);
        assert!((scoring.delta(Interaction::Purchase) - 5.0).abs() < f64::EPSILON);
        assert_eq!(scoring.recommendation_limit, 5);
    }
}
