//! Challenge operations
//!
//! Challenges are append-only: there is no update path, so `created_at`
//! never changes once written.

use rusqlite::{Connection, OptionalExtension, Row, params};
use crate::{Challenge, Error, NewChallenge, Result};
use super::schema::sql_now;
use super::{errors, time, SqliteStore};

const CHALLENGE_COLUMNS: &str = "id, week, goal, title, description, created_at";

const INSERT_CHALLENGE: &str = concat!(
    "INSERT INTO challenges (week, goal, title, description, created_at) ",
    "VALUES (?1, ?2, ?3, ?4, COALESCE(?5, ",
    sql_now!(),
    "))"
);

impl SqliteStore {
    /// Create a challenge. `week`, `goal` and `title` are required.
    pub fn create_challenge(&self, new: &NewChallenge) -> Result<Challenge> {
        let challenge = self.transaction(|tx| {
            let id = Self::insert_challenge(tx, new)?;
            Self::query_challenge(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("challenges {}", id)))
        })?;
        tracing::debug!(
            "Created challenge {} (week {}, {})",
            challenge.id,
            challenge.week,
            challenge.goal
        );
        Ok(challenge)
    }

    /// Insert without opening a transaction; returns the generated id
    pub(crate) fn insert_challenge(conn: &Connection, new: &NewChallenge) -> Result<i64> {
        let created_at = time::encode_opt(new.created_at.as_ref())?;
        conn.execute(
            INSERT_CHALLENGE,
            params![
                new.week,
                new.goal,
                new.title,
                new.description,
                created_at,
            ],
        )
        .map_err(|e| errors::classify(e, "insert into challenges"))?;
        Ok(conn.last_insert_rowid())
    }

    fn query_challenge(conn: &Connection, id: i64) -> Result<Option<Challenge>> {
        let sql = format!("SELECT {} FROM challenges WHERE id = ?1", CHALLENGE_COLUMNS);
        conn.query_row(&sql, [id], row_to_challenge)
            .optional()
            .map_err(Into::into)
    }

    /// Get a challenge by id
    pub fn get_challenge(&self, id: i64) -> Result<Option<Challenge>> {
        Self::query_challenge(&self.conn, id)
    }

    /// All challenges in week order
    pub fn list_challenges(&self) -> Result<Vec<Challenge>> {
        self.select_challenges("1 = 1", "week, id", params![])
    }

    /// Challenges scheduled for one week (duplicates are allowed)
    pub fn challenges_for_week(&self, week: i64) -> Result<Vec<Challenge>> {
        self.select_challenges("week = ?1", "id", params![week])
    }

    /// Challenges with the given goal label
    pub fn challenges_by_goal(&self, goal: &str) -> Result<Vec<Challenge>> {
        self.select_challenges("goal = ?1", "week, id", params![goal])
    }

    pub(crate) fn challenges_by_id(&self) -> Result<Vec<Challenge>> {
        self.select_challenges("1 = 1", "id", params![])
    }

    fn select_challenges(
        &self,
        filter: &str,
        order: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Challenge>> {
        let sql = format!(
            "SELECT {} FROM challenges WHERE {} ORDER BY {}",
            CHALLENGE_COLUMNS, filter, order
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let challenges = stmt
            .query_map(args, row_to_challenge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(challenges)
    }

    /// Delete a challenge that no response or metric references
    pub fn delete_challenge(&self, id: i64) -> Result<()> {
        self.delete_row(
            "challenges",
            id,
            &[("responses", "challenge_id"), ("metrics", "challenge_id")],
        )
    }

    /// Count all challenges
    pub fn count_challenges(&self) -> Result<usize> {
        self.count_rows("challenges")
    }
}

fn row_to_challenge(row: &Row) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: row.get(0)?,
        week: row.get(1)?,
        goal: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        created_at: time::column(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewMetric, NewResponse, NewUser};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_first_challenge_gets_id_one() {
        let store = SqliteStore::open_in_memory().unwrap();
        let challenge = store
            .create_challenge(&NewChallenge::new(1, "engagement", "Share a productivity tip"))
            .unwrap();

        assert_eq!(challenge.id, 1);
        assert_eq!(challenge.week, 1);
        assert_eq!(challenge.goal, "engagement");
        assert!(challenge.description.is_none());
        assert!(challenge.created_at.is_some());
    }

    #[test]
    fn test_required_fields() {
        let store = SqliteStore::open_in_memory().unwrap();
        let complete = NewChallenge::new(2, "retention", "Check in on a friend");

        let cases = [
            (NewChallenge { week: None, ..complete.clone() }, "challenges.week"),
            (NewChallenge { goal: None, ..complete.clone() }, "challenges.goal"),
            (NewChallenge { title: None, ..complete.clone() }, "challenges.title"),
        ];
        for (payload, expected) in cases {
            match store.create_challenge(&payload).unwrap_err() {
                Error::ConstraintViolation(column) => assert_eq!(column, expected),
                other => panic!("unexpected error: {:?}", other),
            }
        }
        assert_eq!(store.count_challenges().unwrap(), 0);

        let ok = store.create_challenge(&complete).unwrap();
        assert!(ok.description.is_none());
    }

    #[test]
    fn test_ids_strictly_increase() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut last = 0;
        for week in 1..=6 {
            let id = store
                .create_challenge(&NewChallenge::new(week, "engagement", format!("Week {}", week)))
                .unwrap()
                .id;
            assert!(id > last);
            last = id;
        }

        store.delete_challenge(last).unwrap();
        let after_delete = store
            .create_challenge(&NewChallenge::new(7, "sales", "Week 7"))
            .unwrap();
        assert!(after_delete.id > last);
    }

    #[test]
    fn test_filters_and_ordering() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.create_challenge(&NewChallenge::new(3, "sales", "Late")).unwrap();
        store.create_challenge(&NewChallenge::new(1, "engagement", "Early")).unwrap();
        store.create_challenge(&NewChallenge::new(1, "engagement", "Early again")).unwrap();

        let titles: Vec<String> = store
            .list_challenges()
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Early", "Early again", "Late"]);

        assert_eq!(store.challenges_for_week(1).unwrap().len(), 2);
        assert_eq!(store.challenges_by_goal("sales").unwrap().len(), 1);
        assert!(store.challenges_by_goal("reactivation").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_created_at_and_description() {
        let store = SqliteStore::open_in_memory().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap();
        let challenge = store
            .create_challenge(
                &NewChallenge::new(4, "reactivation", "Come back")
                    .with_description("Invite a lapsed member")
                    .with_created_at(at),
            )
            .unwrap();

        assert_eq!(challenge.created_at, Some(at));
        assert_eq!(challenge.description.as_deref(), Some("Invite a lapsed member"));
    }

    #[test]
    fn test_delete_with_dependants_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(&NewUser::new("alice")).unwrap();
        let answered = store
            .create_challenge(&NewChallenge::new(1, "engagement", "Answered"))
            .unwrap();
        let measured = store
            .create_challenge(&NewChallenge::new(2, "retention", "Measured"))
            .unwrap();
        store
            .create_response(&NewResponse::new(Some(user.id), Some(answered.id)))
            .unwrap();
        store
            .create_metric(&NewMetric::for_challenge(measured.id).with_completion_rate(0.4))
            .unwrap();

        assert!(matches!(
            store.delete_challenge(answered.id),
            Err(Error::ReferentialViolation(_))
        ));
        assert!(matches!(
            store.delete_challenge(measured.id),
            Err(Error::ReferentialViolation(_))
        ));
        assert_eq!(store.count_challenges().unwrap(), 2);
    }

    #[test]
    fn test_engine_enforces_restrict_on_raw_delete() {
        let store = SqliteStore::open_in_memory().unwrap();
        let challenge = store
            .create_challenge(&NewChallenge::new(1, "engagement", "Answered"))
            .unwrap();
        store
            .create_response(&NewResponse::new(None, Some(challenge.id)))
            .unwrap();

        let err = store
            .connection()
            .execute("DELETE FROM challenges WHERE id = ?1", [challenge.id])
            .unwrap_err();
        assert!(matches!(
            errors::classify(err, "delete from challenges"),
            Error::ReferentialViolation(_)
        ));
    }

    #[test]
    fn test_delete_missing_challenge() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(store.delete_challenge(99), Err(Error::NotFound(_))));
    }
}
