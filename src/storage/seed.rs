//! Seed dataset
//!
//! One challenge per week of the first goal cycle plus two members, enough
//! to exercise every table by hand.

use crate::{Goal, NewChallenge, NewUser, Result};
use super::SqliteStore;

/// Outcome of [`load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { users: usize, challenges: usize },
    /// The store already held challenges; nothing was written
    AlreadySeeded,
}

/// The seed challenges, in week order
pub fn challenges() -> Vec<NewChallenge> {
    vec![
        NewChallenge::new(1, Goal::Engagement.as_str(), "Share a productivity tip")
            .with_description("Post one habit or tool that saves you time every week."),
        NewChallenge::new(2, Goal::Retention.as_str(), "Seven-day streak")
            .with_description("Check in every day this week and tell us what kept you going."),
        NewChallenge::new(3, Goal::Sales.as_str(), "Show your setup")
            .with_description("Share the gear or plan you use and what made you pick it."),
        NewChallenge::new(4, Goal::Reactivation.as_str(), "Welcome back")
            .with_description("Haven't posted in a while? Tell us what you've been up to."),
    ]
}

/// The seed members
pub fn users() -> Vec<NewUser> {
    vec![NewUser::new("alice"), NewUser::new("bob")]
}

/// Load the seed dataset in a single transaction.
///
/// Does nothing when the challenges table is not empty, so running it twice
/// is harmless.
pub fn load(store: &SqliteStore) -> Result<SeedOutcome> {
    let outcome = store.transaction(|tx| {
        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM challenges", [], |row| row.get(0))?;
        if existing > 0 {
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let users = users();
        for user in &users {
            SqliteStore::insert_user(tx, user)?;
        }
        let challenges = challenges();
        for challenge in &challenges {
            SqliteStore::insert_challenge(tx, challenge)?;
        }

        Ok(SeedOutcome::Seeded {
            users: users.len(),
            challenges: challenges.len(),
        })
    })?;

    match outcome {
        SeedOutcome::Seeded { users, challenges } => {
            tracing::info!("Seeded {} users and {} challenges", users, challenges);
        }
        SeedOutcome::AlreadySeeded => {
            tracing::info!("Store already holds challenges, skipping seed");
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_covers_goal_cycle() {
        let seeds = challenges();
        for (i, seed) in seeds.iter().enumerate() {
            let week = seed.week.unwrap();
            assert_eq!(week, i as i64 + 1);
            assert_eq!(seed.goal.as_deref(), Some(Goal::for_week(week).as_str()));
        }
    }

    #[test]
    fn test_load_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = load(&store).unwrap();
        assert_eq!(first, SeedOutcome::Seeded { users: 2, challenges: 4 });

        let tip = store.get_challenge(1).unwrap().unwrap();
        assert_eq!(tip.week, 1);
        assert_eq!(tip.goal, "engagement");
        assert_eq!(tip.title, "Share a productivity tip");

        assert_eq!(load(&store).unwrap(), SeedOutcome::AlreadySeeded);
        assert_eq!(store.count_challenges().unwrap(), 4);
        assert_eq!(store.count_users().unwrap(), 2);
    }
}
