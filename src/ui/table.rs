use chrono::{DateTime, Utc};
use tabled::{settings::Style, Table, Tabled};
use crate::storage::{DbStats, GoalSummary};
use crate::{Challenge, Metric, Response, User};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        render(&self.rows)
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounded table, or an empty string when there is nothing to show
fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn time_cell(value: Option<DateTime<Utc>>) -> String {
    cell(value.map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()))
}

fn rate_cell(value: Option<f64>) -> String {
    cell(value.map(|v| format!("{:.3}", v)))
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}

pub fn stats_table(stats: &DbStats) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Users", &stats.users.to_string());
    builder.add_row("Challenges", &stats.challenges.to_string());
    builder.add_row("Responses", &stats.responses.to_string());
    builder.add_row("Metric snapshots", &stats.metrics.to_string());
    builder.add_row("Schema version", &stats.schema_version.to_string());
    builder.build()
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Last active")]
    last_active: String,
    #[tabled(rename = "Joined")]
    joined_at: String,
}

pub fn users_table(users: &[User]) -> String {
    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id,
            username: u.username.clone(),
            active: cell(u.is_active.map(|a| if a { "yes" } else { "no" })),
            last_active: time_cell(u.last_active),
            joined_at: time_cell(u.joined_at),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct ChallengeRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Week")]
    week: i64,
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

pub fn challenges_table(challenges: &[Challenge]) -> String {
    let rows: Vec<ChallengeRow> = challenges
        .iter()
        .map(|c| ChallengeRow {
            id: c.id,
            week: c.week,
            goal: c.goal.clone(),
            title: clip(&c.title, 40),
            description: cell(c.description.as_deref().map(|d| clip(d, 48))),
            created_at: time_cell(c.created_at),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct ResponseRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "User")]
    user_id: String,
    #[tabled(rename = "Challenge")]
    challenge_id: String,
    #[tabled(rename = "Content")]
    content: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

pub fn responses_table(responses: &[Response]) -> String {
    let rows: Vec<ResponseRow> = responses
        .iter()
        .map(|r| ResponseRow {
            id: r.id,
            user_id: cell(r.user_id),
            challenge_id: cell(r.challenge_id),
            content: cell(r.content.as_deref().map(|c| clip(c, 60))),
            created_at: time_cell(r.created_at),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Challenge")]
    challenge_id: String,
    #[tabled(rename = "Completion")]
    completion_rate: String,
    #[tabled(rename = "Engagement")]
    engagement_score: String,
    #[tabled(rename = "Sales conv.")]
    sales_conversion: String,
    #[tabled(rename = "Reactivation")]
    reactivation_rate: String,
    #[tabled(rename = "Analyzed")]
    analyzed_at: String,
}

pub fn metrics_table(metrics: &[Metric]) -> String {
    let rows: Vec<MetricRow> = metrics
        .iter()
        .map(|m| MetricRow {
            id: m.id,
            challenge_id: cell(m.challenge_id),
            completion_rate: rate_cell(m.completion_rate),
            engagement_score: rate_cell(m.engagement_score),
            sales_conversion: rate_cell(m.sales_conversion),
            reactivation_rate: rate_cell(m.reactivation_rate),
            analyzed_at: time_cell(m.analyzed_at),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct GoalRow {
    #[tabled(rename = "Goal")]
    goal: String,
    #[tabled(rename = "Challenges")]
    challenges: usize,
    #[tabled(rename = "Responses")]
    responses: usize,
    #[tabled(rename = "Snapshots")]
    snapshots: usize,
    #[tabled(rename = "Avg completion")]
    completion: String,
    #[tabled(rename = "Avg engagement")]
    engagement: String,
    #[tabled(rename = "Avg sales conv.")]
    sales: String,
    #[tabled(rename = "Avg reactivation")]
    reactivation: String,
}

pub fn goal_summary_table(summary: &[GoalSummary]) -> String {
    let rows: Vec<GoalRow> = summary
        .iter()
        .map(|s| GoalRow {
            goal: s.goal.clone(),
            challenges: s.challenges,
            responses: s.responses,
            snapshots: s.snapshots,
            completion: rate_cell(s.avg_completion_rate),
            engagement: rate_cell(s.avg_engagement_score),
            sales: rate_cell(s.avg_sales_conversion),
            reactivation: rate_cell(s.avg_reactivation_rate),
        })
        .collect();
    render(&rows)
}
