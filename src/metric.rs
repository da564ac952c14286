//! Metric rows - analysis snapshots for a challenge
//!
//! Many snapshots may exist per challenge; they form a time series ordered by
//! `analyzed_at`. The store never computes these values, it only keeps them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `metrics` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub challenge_id: Option<i64>,
    pub completion_rate: Option<f64>,
    pub engagement_score: Option<f64>,
    pub sales_conversion: Option<f64>,
    pub reactivation_rate: Option<f64>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `metrics` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMetric {
    pub challenge_id: Option<i64>,
    pub completion_rate: Option<f64>,
    pub engagement_score: Option<f64>,
    pub sales_conversion: Option<f64>,
    pub reactivation_rate: Option<f64>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl NewMetric {
    /// Start an empty snapshot for a challenge
    pub fn for_challenge(challenge_id: i64) -> Self {
        Self {
            challenge_id: Some(challenge_id),
            ..Self::default()
        }
    }

    pub fn with_completion_rate(mut self, value: f64) -> Self {
        self.completion_rate = Some(value);
        self
    }

    pub fn with_engagement_score(mut self, value: f64) -> Self {
        self.engagement_score = Some(value);
        self
    }

    pub fn with_sales_conversion(mut self, value: f64) -> Self {
        self.sales_conversion = Some(value);
        self
    }

    pub fn with_reactivation_rate(mut self, value: f64) -> Self {
        self.reactivation_rate = Some(value);
        self
    }

    /// Override the analysis timestamp
    pub fn with_analyzed_at(mut self, at: DateTime<Utc>) -> Self {
        self.analyzed_at = Some(at);
        self
    }
}
