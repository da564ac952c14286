//! Metric snapshot operations
//!
//! Snapshots are stored exactly as supplied, except NaN, which SQLite would
//! silently turn into NULL. Ordering is by the instant in `analyzed_at`
//! (whatever format wrote it) with the id as tie breaker, so the latest
//! snapshot is well defined even when two share a timestamp.

use rusqlite::{Connection, OptionalExtension, Row, params};
use crate::{Error, Metric, NewMetric, Result};
use super::schema::sql_now;
use super::{errors, time, SqliteStore};

const METRIC_COLUMNS: &str = "id, challenge_id, completion_rate, engagement_score, \
    sales_conversion, reactivation_rate, analyzed_at";

const INSERT_METRIC: &str = concat!(
    "INSERT INTO metrics (challenge_id, completion_rate, engagement_score, ",
    "sales_conversion, reactivation_rate, analyzed_at) ",
    "VALUES (?1, ?2, ?3, ?4, ?5, COALESCE(?6, ",
    sql_now!(),
    "))"
);

impl SqliteStore {
    /// Store an analysis snapshot
    pub fn create_metric(&self, new: &NewMetric) -> Result<Metric> {
        let metric = self.transaction(|tx| {
            let id = Self::insert_metric(tx, new)?;
            Self::query_metric(tx, id)?
                .ok_or_else(|| Error::NotFound(format!("metrics {}", id)))
        })?;
        tracing::debug!("Created metric {} (challenge {:?})", metric.id, metric.challenge_id);
        Ok(metric)
    }

    /// Insert without opening a transaction; returns the generated id
    pub(crate) fn insert_metric(conn: &Connection, new: &NewMetric) -> Result<i64> {
        Self::check_reference(conn, "metrics.challenge_id", "challenges", new.challenge_id)?;
        check_finite(new)?;
        let analyzed_at = time::encode_opt(new.analyzed_at.as_ref())?;
        conn.execute(
            INSERT_METRIC,
            params![
                new.challenge_id,
                new.completion_rate,
                new.engagement_score,
                new.sales_conversion,
                new.reactivation_rate,
                analyzed_at,
            ],
        )
        .map_err(|e| errors::classify(e, "insert into metrics"))?;
        Ok(conn.last_insert_rowid())
    }

    fn query_metric(conn: &Connection, id: i64) -> Result<Option<Metric>> {
        let sql = format!("SELECT {} FROM metrics WHERE id = ?1", METRIC_COLUMNS);
        conn.query_row(&sql, [id], row_to_metric)
            .optional()
            .map_err(Into::into)
    }

    /// Get a metric snapshot by id
    pub fn get_metric(&self, id: i64) -> Result<Option<Metric>> {
        Self::query_metric(&self.conn, id)
    }

    /// All snapshots, oldest analysis first
    pub fn list_metrics(&self) -> Result<Vec<Metric>> {
        self.select_metrics("1 = 1", "julianday(analyzed_at), id", params![])
    }

    /// Snapshot history of one challenge, oldest first
    pub fn metrics_for_challenge(&self, challenge_id: i64) -> Result<Vec<Metric>> {
        self.select_metrics("challenge_id = ?1", "julianday(analyzed_at), id", params![challenge_id])
    }

    /// Most recent snapshot of one challenge
    pub fn latest_metric_for_challenge(&self, challenge_id: i64) -> Result<Option<Metric>> {
        let metrics = self.select_metrics(
            "challenge_id = ?1",
            "julianday(analyzed_at) DESC, id DESC LIMIT 1",
            params![challenge_id],
        )?;
        Ok(metrics.into_iter().next())
    }

    pub(crate) fn metrics_by_id(&self) -> Result<Vec<Metric>> {
        self.select_metrics("1 = 1", "id", params![])
    }

    fn select_metrics(
        &self,
        filter: &str,
        order: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Metric>> {
        let sql = format!(
            "SELECT {} FROM metrics WHERE {} ORDER BY {}",
            METRIC_COLUMNS, filter, order
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let metrics = stmt
            .query_map(args, row_to_metric)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(metrics)
    }

    /// Delete a snapshot
    pub fn delete_metric(&self, id: i64) -> Result<()> {
        self.delete_row("metrics", id, &[])
    }

    /// Count all snapshots
    pub fn count_metrics(&self) -> Result<usize> {
        self.count_rows("metrics")
    }
}

/// Reject NaN measurements; infinities are stored as REAL values
fn check_finite(new: &NewMetric) -> Result<()> {
    let columns = [
        ("metrics.completion_rate", new.completion_rate),
        ("metrics.engagement_score", new.engagement_score),
        ("metrics.sales_conversion", new.sales_conversion),
        ("metrics.reactivation_rate", new.reactivation_rate),
    ];
    for (column, value) in columns {
        if value.is_some_and(f64::is_nan) {
            return Err(Error::InvalidValue(format!("{} is NaN", column)));
        }
    }
    Ok(())
}

fn row_to_metric(row: &Row) -> rusqlite::Result<Metric> {
    Ok(Metric {
        id: row.get(0)?,
        challenge_id: row.get(1)?,
        completion_rate: row.get(2)?,
        engagement_score: row.get(3)?,
        sales_conversion: row.get(4)?,
        reactivation_rate: row.get(5)?,
        analyzed_at: time::column(row, 6)?,
    })
}
