//! Read-only summaries over stored rows
//!
//! Nothing here computes a metric. Averages are taken over the snapshot
//! values callers stored; NULL values are ignored.

use std::collections::BTreeMap;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use crate::Result;
use super::SqliteStore;

/// Per-goal totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub goal: String,
    pub challenges: usize,
    pub responses: usize,
    pub snapshots: usize,
    pub avg_completion_rate: Option<f64>,
    pub avg_engagement_score: Option<f64>,
    pub avg_sales_conversion: Option<f64>,
    pub avg_reactivation_rate: Option<f64>,
}

impl SqliteStore {
    /// Totals per distinct `goal` label, sorted by label
    pub fn goal_summary(&self) -> Result<Vec<GoalSummary>> {
        let mut summaries: BTreeMap<String, GoalSummary> = BTreeMap::new();

        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.goal, COUNT(DISTINCT c.id), COUNT(r.id)
            FROM challenges c
            LEFT JOIN responses r ON r.challenge_id = c.id
            GROUP BY c.goal
            "#,
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        for row in rows {
            let (goal, challenges, responses) = row?;
            let entry = summaries.entry(goal.clone()).or_insert_with(|| GoalSummary {
                goal,
                ..GoalSummary::default()
            });
            entry.challenges = challenges as usize;
            entry.responses = responses as usize;
        }

        let mut stmt = self.conn.prepare(
            r#"
            SELECT c.goal, COUNT(m.id),
                   AVG(m.completion_rate), AVG(m.engagement_score),
                   AVG(m.sales_conversion), AVG(m.reactivation_rate)
            FROM metrics m
            JOIN challenges c ON c.id = m.challenge_id
            GROUP BY c.goal
            "#,
        )?;
        let rows = stmt.query_map(params![], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                [
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ],
            ))
        })?;
        for row in rows {
            let (goal, snapshots, [completion, engagement, sales, reactivation]) = row?;
            // Every metric row here joined a challenge, so the goal is already present
            if let Some(entry) = summaries.get_mut(&goal) {
                entry.snapshots = snapshots as usize;
                entry.avg_completion_rate = completion;
                entry.avg_engagement_score = engagement;
                entry.avg_sales_conversion = sales;
                entry.avg_reactivation_rate = reactivation;
            }
        }

        Ok(summaries.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewChallenge, NewMetric, NewResponse, NewUser};

    #[test]
    fn test_goal_summary() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(&NewUser::new("alice")).unwrap();
        let tip = store
            .create_challenge(&NewChallenge::new(1, "engagement", "Share a productivity tip"))
            .unwrap();
        let intro = store
            .create_challenge(&NewChallenge::new(5, "engagement", "Introduce yourself"))
            .unwrap();
        store
            .create_challenge(&NewChallenge::new(3, "sales", "Show your setup"))
            .unwrap();

        for challenge_id in [tip.id, tip.id, intro.id] {
            store
                .create_response(&NewResponse::new(Some(user.id), Some(challenge_id)))
                .unwrap();
        }
        store
            .create_metric(&NewMetric::for_challenge(tip.id).with_completion_rate(0.2).with_engagement_score(4.0))
            .unwrap();
        store
            .create_metric(&NewMetric::for_challenge(intro.id).with_completion_rate(0.6))
            .unwrap();

        let summary = store.goal_summary().unwrap();
        assert_eq!(summary.len(), 2);

        let engagement = &summary[0];
        assert_eq!(engagement.goal, "engagement");
        assert_eq!(engagement.challenges, 2);
        assert_eq!(engagement.responses, 3);
        assert_eq!(engagement.snapshots, 2);
        assert!((engagement.avg_completion_rate.unwrap() - 0.4).abs() < 1e-9);
        assert_eq!(engagement.avg_engagement_score, Some(4.0));
        assert!(engagement.avg_sales_conversion.is_none());

        let sales = &summary[1];
        assert_eq!(sales.goal, "sales");
        assert_eq!(sales.challenges, 1);
        assert_eq!(sales.responses, 0);
        assert_eq!(sales.snapshots, 0);
        assert!(sales.avg_completion_rate.is_none());
    }

    #[test]
    fn test_empty_store_summary() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(store.goal_summary().unwrap().is_empty());
    }
}
