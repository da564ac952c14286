//! Challenge rows and goal categories
//!
//! Challenges run in a four-week cycle, each week targeting one goal:
//! - `Engagement`: get members talking
//! - `Retention`: keep them coming back
//! - `Sales`: convert interest into purchases
//! - `Reactivation`: win back members who went quiet
//!
//! The stored `goal` column is free text; [`Goal`] is the vocabulary the
//! tooling uses when it has to pick or validate a label.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Goal categories of the weekly cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    Engagement,
    Retention,
    Sales,
    Reactivation,
}

impl Goal {
    /// Get the label stored in `challenges.goal`
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Engagement => "engagement",
            Goal::Retention => "retention",
            Goal::Sales => "sales",
            Goal::Reactivation => "reactivation",
        }
    }

    /// All goals in cycle order
    pub fn all() -> &'static [Goal] {
        &[
            Goal::Engagement,
            Goal::Retention,
            Goal::Sales,
            Goal::Reactivation,
        ]
    }

    /// Goal of a given week number. Weeks outside 1-4 fall back to
    /// engagement.
    pub fn for_week(week: i64) -> Goal {
        match week {
            2 => Goal::Retention,
            3 => Goal::Sales,
            4 => Goal::Reactivation,
            _ => Goal::Engagement,
        }
    }
}

impl FromStr for Goal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "engagement" => Ok(Goal::Engagement),
            "retention" => Ok(Goal::Retention),
            "sales" | "conversion" => Ok(Goal::Sales),
            "reactivation" => Ok(Goal::Reactivation),
            _ => Err(Error::Parse(format!("Unknown goal: {}", s))),
        }
    }
}

impl std::fmt::Display for Goal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of the `challenges` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Store-generated surrogate key
    pub id: i64,
    /// Logical ordering key
    pub week: i64,
    /// Category label, usually one of [`Goal`]
    pub goal: String,
    pub title: String,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Challenge {
    /// Parse the stored goal label, if it is one of the known categories
    pub fn goal_kind(&self) -> Option<Goal> {
        self.goal.parse().ok()
    }
}

/// Insert payload for the `challenges` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewChallenge {
    pub week: Option<i64>,
    pub goal: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl NewChallenge {
    /// Create a payload with all required fields set
    pub fn new(week: i64, goal: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            week: Some(week),
            goal: Some(goal.into()),
            title: Some(title.into()),
            description: None,
            created_at: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the insertion timestamp
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_cycle() {
        assert_eq!(Goal::for_week(1), Goal::Engagement);
        assert_eq!(Goal::for_week(2), Goal::Retention);
        assert_eq!(Goal::for_week(3), Goal::Sales);
        assert_eq!(Goal::for_week(4), Goal::Reactivation);
    }

    #[test]
    fn test_weeks_outside_cycle_default_to_engagement() {
        for week in [0, -3, 5, 6, 8, 52] {
            assert_eq!(Goal::for_week(week), Goal::Engagement, "week {}", week);
        }
    }

    #[test]
    fn test_goal_parse() {
        assert_eq!("Retention".parse::<Goal>().unwrap(), Goal::Retention);
        assert_eq!("conversion".parse::<Goal>().unwrap(), Goal::Sales);
        assert!("growth".parse::<Goal>().is_err());
    }

    #[test]
    fn test_goal_kind_of_free_text() {
        let mut challenge = Challenge {
            id: 1,
            week: 1,
            goal: "engagement".to_string(),
            title: "Share a productivity tip".to_string(),
            description: None,
            created_at: None,
        };
        assert_eq!(challenge.goal_kind(), Some(Goal::Engagement));

        challenge.goal = "community spirit".to_string();
        assert_eq!(challenge.goal_kind(), None);
    }
}
