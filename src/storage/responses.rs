//! Response operations

use rusqlite::{Connection, OptionalExtension, Row, params};
use crate::response::AnswerRecord;
use crate::{Error, NewResponse, Response, Result};
use super::schema::sql_now;
use super::{errors, time, SqliteStore};

const RESPONSE_COLUMNS: &str = "id, user_id, challenge_id, content, created_at";

const INSERT_RESPONSE: &str = concat!(
    "INSERT INTO responses (user_id, challenge_id, content, created_at) ",
    "VALUES (?1, ?2, ?3, COALESCE(?4, ",
    sql_now!(),
    "))"
);

impl SqliteStore {
    /// Record a response. Either reference may be NULL; a non-NULL one must exist.
    pub fn create_response(&self, new: &NewResponse) -> Result<Response> {
        let response = self.transaction(|tx| {
            let id = Self::insert_response(tx, new)?;
            Self::query_response(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("responses {}", id)))
        })?;
        tracing::debug!(
            "Created response {} (user {:?}, challenge {:?})",
            response.id,
            response.user_id,
            response.challenge_id
        );
        Ok(response)
    }

    /// Insert without opening a transaction; returns the generated id
    pub(crate) fn insert_response(conn: &Connection, new: &NewResponse) -> Result<i64> {
        Self::check_reference(conn, "responses.user_id", "users", new.user_id)?;
        Self::check_reference(conn, "responses.challenge_id", "challenges", new.challenge_id)?;
        let created_at = time::encode_opt(new.created_at.as_ref())?;
        conn.execute(
            INSERT_RESPONSE,
            params![
                new.user_id,
                new.challenge_id,
                new.content,
                created_at,
            ],
        )
        .map_err(|e| errors::classify(e, "insert into responses"))?;
        Ok(conn.last_insert_rowid())
    }

    fn query_response(conn: &Connection, id: i64) -> Result<Option<Response>> {
        let sql = format!("SELECT {} FROM responses WHERE id = ?1", RESPONSE_COLUMNS);
        conn.query_row(&sql, [id], row_to_response)
            .optional()
            .map_err(Into::into)
    }

    /// Get a response by id
    pub fn get_response(&self, id: i64) -> Result<Option<Response>> {
        Self::query_response(&self.conn, id)
    }

    /// All responses, oldest id first
    pub fn list_responses(&self) -> Result<Vec<Response>> {
        self.select_responses("1 = 1", params![])
    }

    /// Responses to one challenge, in submission order
    pub fn responses_for_challenge(&self, challenge_id: i64) -> Result<Vec<Response>> {
        self.select_responses("challenge_id = ?1", params![challenge_id])
    }

    /// Responses by one user, in submission order
    pub fn responses_for_user(&self, user_id: i64) -> Result<Vec<Response>> {
        self.select_responses("user_id = ?1", params![user_id])
    }

    fn select_responses(&self, filter: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<Response>> {
        let sql = format!(
            "SELECT {} FROM responses WHERE {} ORDER BY julianday(created_at), id",
            RESPONSE_COLUMNS, filter
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let responses = stmt
            .query_map(args, row_to_response)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(responses)
    }

    /// A user's latest answers with the challenge each one belongs to, newest first
    pub fn recent_answers_for_user(&self, user_id: i64, limit: usize) -> Result<Vec<AnswerRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.id, r.user_id, r.challenge_id, r.content, r.created_at,
                   c.title, c.week, c.goal
            FROM responses r
            LEFT JOIN challenges c ON c.id = r.challenge_id
            WHERE r.user_id = ?1
            ORDER BY julianday(r.created_at) DESC, r.id DESC
            LIMIT ?2
            "#,
        )?;

        let answers = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok(AnswerRecord {
                    response: row_to_response(row)?,
                    challenge_title: row.get(5)?,
                    week: row.get(6)?,
                    goal: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(answers)
    }

    /// Delete a response
    pub fn delete_response(&self, id: i64) -> Result<()> {
        self.delete_row("responses", id, &[])
    }

    /// Count all responses
    pub fn count_responses(&self) -> Result<usize> {
        self.count_rows("responses")
    }
}

fn row_to_response(row: &Row) -> rusqlite::Result<Response> {
    Ok(Response {
        id: row.get(0)?,
        user_id: row.get(1)?,
        challenge_id: row.get(2)?,
        content: row.get(3)?,
        created_at: time::column(row, 4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewChallenge, NewUser};
    use chrono::{Duration, TimeZone, Utc};

    fn store_with_challenge() -> (SqliteStore, i64, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store.create_user(&NewUser::new("alice")).unwrap();
        let challenge = store
            .create_challenge(&NewChallenge::new(1, "engagement", "Share a productivity tip"))
            .unwrap();
        (store, user.id, challenge.id)
    }

    #[test]
    fn test_response_retrievable_by_challenge() {
        let (store, user_id, challenge_id) = store_with_challenge();
        assert_eq!(challenge_id, 1);

        let response = store
            .create_response(
                &NewResponse::new(Some(user_id), Some(1)).with_content("Time-box your inbox"),
            )
            .unwrap();
        assert!(response.created_at.is_some());

        let found = store.responses_for_challenge(1).unwrap();
        assert_eq!(found, vec![response]);
    }

    #[test]
    fn test_unknown_references_are_rejected() {
        let (store, user_id, challenge_id) = store_with_challenge();

        let bad_challenge = store.create_response(&NewResponse::new(Some(user_id), Some(challenge_id + 100)));
        assert!(matches!(bad_challenge, Err(Error::ReferentialViolation(_))));

        let bad_user = store.create_response(&NewResponse::new(Some(user_id + 100), Some(challenge_id)));
        match bad_user {
            Err(Error::ReferentialViolation(msg)) => assert!(msg.contains("responses.user_id")),
            other => panic!("unexpected result: {:?}", other),
        }

        assert_eq!(store.count_responses().unwrap(), 0);
    }

    #[test]
    fn test_null_references_are_allowed() {
        let (store, user_id, challenge_id) = store_with_challenge();

        let orphan = store.create_response(&NewResponse::new(None, None)).unwrap();
        assert!(orphan.user_id.is_none() && orphan.challenge_id.is_none());
        assert!(orphan.content.is_none());

        store.create_response(&NewResponse::new(None, Some(challenge_id))).unwrap();
        store.create_response(&NewResponse::new(Some(user_id), None)).unwrap();
        assert_eq!(store.count_responses().unwrap(), 3);
    }

    #[test]
    fn test_recent_answers_newest_first() {
        let (store, user_id, challenge_id) = store_with_challenge();
        let start = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        for day in 0..5 {
            store
                .create_response(
                    &NewResponse::new(Some(user_id), Some(challenge_id))
                        .with_content(format!("day {}", day))
                        .with_created_at(start + Duration::days(day)),
                )
                .unwrap();
        }
        store
            .create_response(
                &NewResponse::new(Some(user_id), None)
                    .with_content("loose")
                    .with_created_at(start - Duration::days(1)),
            )
            .unwrap();

        let recent = store.recent_answers_for_user(user_id, 3).unwrap();
        let contents: Vec<_> = recent
            .iter()
            .map(|a| a.response.content.clone().unwrap())
            .collect();
        assert_eq!(contents, vec!["day 4", "day 3", "day 2"]);
        assert_eq!(recent[0].challenge_title.as_deref(), Some("Share a productivity tip"));
        assert_eq!(recent[0].week, Some(1));

        let all = store.recent_answers_for_user(user_id, 20).unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.last().unwrap().challenge_title.is_none());
    }

    #[test]
    fn test_order_follows_instants_not_text() {
        let (store, user_id, challenge_id) = store_with_challenge();

        // 18:00 UTC, but sorts after the native format as text
        store
            .connection()
            .execute(
                "INSERT INTO responses (user_id, challenge_id, content, created_at) \
                 VALUES (?1, ?2, 'imported', '2024-04-01T20:00:00+02:00')",
                params![user_id, challenge_id],
            )
            .unwrap();
        store
            .create_response(
                &NewResponse::new(Some(user_id), Some(challenge_id))
                    .with_content("native")
                    .with_created_at(Utc.with_ymd_and_hms(2024, 4, 1, 19, 0, 0).unwrap()),
            )
            .unwrap();

        let contents = |responses: Vec<Response>| -> Vec<String> {
            responses.into_iter().filter_map(|r| r.content).collect()
        };
        assert_eq!(contents(store.responses_for_challenge(challenge_id).unwrap()), vec!["imported", "native"]);
        assert_eq!(contents(store.responses_for_user(user_id).unwrap()), vec!["imported", "native"]);

        let recent = store.recent_answers_for_user(user_id, 1).unwrap();
        assert_eq!(recent[0].response.content.as_deref(), Some("native"));
    }

    #[test]
    fn test_responses_for_user_and_delete() {
        let (store, user_id, challenge_id) = store_with_challenge();
        let other = store.create_user(&NewUser::new("bob")).unwrap();
        let first = store.create_response(&NewResponse::new(Some(user_id), Some(challenge_id))).unwrap();
        store.create_response(&NewResponse::new(Some(other.id), Some(challenge_id))).unwrap();

        assert_eq!(store.responses_for_user(user_id).unwrap().len(), 1);

        store.delete_response(first.id).unwrap();
        assert!(store.get_response(first.id).unwrap().is_none());
        assert!(store.responses_for_user(user_id).unwrap().is_empty());
        assert!(matches!(store.delete_response(first.id), Err(Error::NotFound(_))));

        // once the response is gone the user can be deleted too
        store.delete_user(user_id).unwrap();
    }
}
