use crate::{ChallengeCommand, MetricArgs, MetricCommand, OutputMode, ResponseCommand, UserCommand, emit_success, envelope};
use chrono::Utc;
use community_ai::config::{self, StoreConfig};
use community_ai::storage::{schema, seed, SeedOutcome, Snapshot, SqliteStore};
use community_ai::ui::{self, Icons, section, success};
use community_ai::{Goal, NewChallenge, NewMetric, NewResponse, NewUser};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolved settings shared by every command
pub struct Context {
    pub output_mode: OutputMode,
    pub database: PathBuf,
    pub config_path: PathBuf,
    pub config: StoreConfig,
}

impl Context {
    fn open(&self) -> anyhow::Result<SqliteStore> {
        config::ensure_db_dir(&self.database)?;
        let store = SqliteStore::open_with(&self.database, &self.config.store_options())?;
        Ok(store)
    }

    fn is_human(&self) -> bool {
        self.output_mode.is_human()
    }

    fn emit<T: Serialize>(&self, command: &str, data: &T) -> anyhow::Result<()> {
        emit_success(self.output_mode, command, serde_json::to_value(data)?)
    }
}

/// Print a table, or a placeholder when it is empty
fn print_table(table: String, empty: &str) {
    if table.is_empty() {
        println!("{} {}", Icons::EMPTY, ui::muted(empty));
    } else {
        println!("{}", table);
    }
}

pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let config = StoreConfig {
        database: Some(ctx.database.to_string_lossy().to_string()),
        busy_timeout_ms: ctx.config.busy_timeout_ms,
    };
    config::write_config(&ctx.config_path, &config, force)?;
    let store = ctx.open()?;
    let version = store.schema_version()?;

    if ctx.is_human() {
        ui::header("Initialized community_ai store");
        ui::info("Config", &ctx.config_path.display().to_string());
        ui::info("Database", &ctx.database.display().to_string());
        ui::info("Schema version", &version.to_string());
        success("Ready");
    } else {
        ctx.emit("init", &serde_json::json!({
            "config": ctx.config_path,
            "database": ctx.database,
            "schema_version": version,
        }))?;
    }
    Ok(())
}

pub fn run_schema(ctx: &Context) -> anyhow::Result<()> {
    let statements: Vec<String> = schema::all_schema_statements()
        .into_iter()
        .map(|s| s.trim().to_string())
        .collect();

    if ctx.is_human() {
        println!("-- schema: {} (version {})", schema::SCHEMA_NAME, schema::current_version());
        for stmt in &statements {
            println!("{};\n", stmt);
        }
    } else {
        ctx.emit("schema", &serde_json::json!({
            "schema": schema::SCHEMA_NAME,
            "version": schema::current_version(),
            "statements": statements,
        }))?;
    }
    Ok(())
}

pub fn run_seed(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let outcome = seed::load(&store)?;

    if ctx.is_human() {
        match outcome {
            SeedOutcome::Seeded { users, challenges } => {
                println!("{} Seeded {} users and {} challenges", Icons::SEED, users, challenges);
                print_table(ui::challenges_table(&store.list_challenges()?), "No challenges");
            }
            SeedOutcome::AlreadySeeded => {
                ui::warn("Store already holds challenges; seed skipped");
            }
        }
    } else {
        let data = match outcome {
            SeedOutcome::Seeded { users, challenges } => serde_json::json!({
                "seeded": true,
                "users": users,
                "challenges": challenges,
            }),
            SeedOutcome::AlreadySeeded => serde_json::json!({ "seeded": false }),
        };
        ctx.emit("seed", &data)?;
    }
    Ok(())
}

pub fn run_stats(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let stats = store.stats()?;

    if ctx.is_human() {
        ui::title(Icons::STATS, "Statistics");
        ui::summary_row(Icons::DATABASE, &ctx.database.display().to_string());
        println!("{}", ui::stats_table(&stats));
    } else {
        ctx.emit("stats", &stats)?;
    }
    Ok(())
}

pub fn run_summary(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let summary = store.goal_summary()?;

    if ctx.is_human() {
        ui::title(Icons::CHART, "Goal summary");
        print_table(ui::goal_summary_table(&summary), "No challenges yet");
    } else {
        ctx.emit("summary", &summary)?;
    }
    Ok(())
}

pub fn run_export(ctx: &Context, output: Option<&Path>) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let snapshot = store.snapshot()?;

    match output {
        Some(path) => {
            config::ensure_db_dir(path)?;
            std::fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
            if ctx.is_human() {
                success(&format!("Exported store to {}", path.display()));
            } else {
                ctx.emit("export", &serde_json::json!({ "path": path }))?;
            }
        }
        None => println!("{}", export_document(ctx.output_mode, &snapshot)?),
    }
    Ok(())
}

/// Snapshot text for stdout: the bare dump for humans, the usual envelope with `--json`
fn export_document(mode: OutputMode, snapshot: &Snapshot) -> anyhow::Result<String> {
    let data = serde_json::to_value(snapshot)?;
    let document = match mode {
        OutputMode::Human => data,
        OutputMode::Json => envelope("export", data),
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

pub fn run_user(ctx: &Context, command: UserCommand) -> anyhow::Result<()> {
    let store = ctx.open()?;

    match command {
        UserCommand::Add { username, inactive, joined_at } => {
            let new = NewUser {
                joined_at,
                ..NewUser::new(username).with_active(!inactive)
            };
            let user = store.create_user(&new)?;
            if ctx.is_human() {
                success(&format!("Created user {} ({})", user.id, user.username));
            } else {
                ctx.emit("user.add", &user)?;
            }
        }

        UserCommand::Show { id, answers } => {
            let user = store
                .get_user(id)?
                .ok_or_else(|| anyhow::anyhow!("user {} not found", id))?;
            let recent = store.recent_answers_for_user(id, answers)?;

            if ctx.is_human() {
                let status = if user.is_active() {
                    "active".style(ui::theme().active.clone()).to_string()
                } else {
                    "inactive".style(ui::theme().inactive.clone()).to_string()
                };
                println!("{} {} #{} ({})", Icons::PERSON, user.username.bold(), user.id, status);
                print_table(ui::users_table(std::slice::from_ref(&user)), "");

                section("Recent answers");
                if recent.is_empty() {
                    println!("{} {}", Icons::EMPTY, ui::muted("No answers yet"));
                }
                for answer in &recent {
                    let label = match (&answer.challenge_title, answer.week) {
                        (Some(title), Some(week)) => format!("week {} - {}", week, title),
                        _ => "no challenge".to_string(),
                    };
                    println!(
                        "{} {} {}",
                        Icons::SPEECH,
                        ui::dim(&label),
                        answer.response.content.as_deref().unwrap_or("")
                    );
                }
            } else {
                ctx.emit("user.show", &serde_json::json!({ "user": user, "answers": recent }))?;
            }
        }

        UserCommand::List { active, username } => {
            let users = match (active, username) {
                (_, Some(name)) => {
                    let matches = store.find_users_by_username(&name)?;
                    if active {
                        matches.into_iter().filter(|u| u.is_active()).collect()
                    } else {
                        matches
                    }
                }
                (true, None) => store.list_active_users()?,
                (false, None) => store.list_users()?,
            };
            if ctx.is_human() {
                print_table(ui::users_table(&users), "No users");
            } else {
                ctx.emit("user.list", &users)?;
            }
        }

        UserCommand::Activate { id } => set_active(ctx, &store, id, true)?,
        UserCommand::Deactivate { id } => set_active(ctx, &store, id, false)?,

        UserCommand::Touch { id, at, clear } => {
            let at = if clear { None } else { Some(at.unwrap_or_else(Utc::now)) };
            let user = store.set_user_last_active(id, at)?;
            if ctx.is_human() {
                match user.last_active {
                    Some(at) => success(&format!("User {} last active at {}", user.id, at.format("%Y-%m-%d %H:%M:%S"))),
                    None => success(&format!("Cleared last activity of user {}", user.id)),
                }
            } else {
                ctx.emit("user.touch", &user)?;
            }
        }

        UserCommand::Delete { id } => {
            store.delete_user(id)?;
            if ctx.is_human() {
                println!("{} Deleted user {}", Icons::DEL, id);
            } else {
                ctx.emit("user.delete", &serde_json::json!({ "id": id }))?;
            }
        }
    }
    Ok(())
}

fn set_active(ctx: &Context, store: &SqliteStore, id: i64, active: bool) -> anyhow::Result<()> {
    let user = store.set_user_active(id, active)?;
    if ctx.is_human() {
        let state = if active { "active" } else { "inactive" };
        success(&format!("User {} ({}) is now {}", user.id, user.username, state));
    } else {
        let command = if active { "user.activate" } else { "user.deactivate" };
        ctx.emit(command, &user)?;
    }
    Ok(())
}

pub fn run_challenge(ctx: &Context, command: ChallengeCommand) -> anyhow::Result<()> {
    let store = ctx.open()?;

    match command {
        ChallengeCommand::Add { week, goal, title, description } => {
            let goal = match goal {
                Some(label) => {
                    if label.parse::<Goal>().is_err() && ctx.is_human() {
                        ui::warn(&format!("'{}' is not one of the cycle goals; storing it as given", label));
                    }
                    label
                }
                None => Goal::for_week(week).as_str().to_string(),
            };
            let mut new = NewChallenge::new(week, goal, title);
            new.description = description;
            let challenge = store.create_challenge(&new)?;

            if ctx.is_human() {
                success(&format!(
                    "Created challenge {} (week {}, {})",
                    challenge.id, challenge.week, challenge.goal
                ));
            } else {
                ctx.emit("challenge.add", &challenge)?;
            }
        }

        ChallengeCommand::Show { id } => {
            let challenge = store
                .get_challenge(id)?
                .ok_or_else(|| anyhow::anyhow!("challenge {} not found", id))?;
            let responses = store.responses_for_challenge(id)?;
            let latest = store.latest_metric_for_challenge(id)?;

            if ctx.is_human() {
                println!(
                    "{} {} (week {}, {})",
                    Icons::TROPHY,
                    challenge.title.bold(),
                    challenge.week,
                    challenge.goal
                );
                if let Some(description) = &challenge.description {
                    println!("   {}", ui::dim(description));
                }

                section("Responses");
                print_table(ui::responses_table(&responses), "No responses yet");

                section("Latest metrics");
                match &latest {
                    Some(metric) => print_table(ui::metrics_table(std::slice::from_ref(metric)), ""),
                    None => println!("{} {}", Icons::EMPTY, ui::muted("Not analyzed yet")),
                }
            } else {
                ctx.emit("challenge.show", &serde_json::json!({
                    "challenge": challenge,
                    "responses": responses,
                    "latest_metric": latest,
                }))?;
            }
        }

        ChallengeCommand::List { week, goal } => {
            let challenges = match (week, goal) {
                (Some(week), goal) => {
                    let in_week = store.challenges_for_week(week)?;
                    match goal {
                        Some(goal) => in_week.into_iter().filter(|c| c.goal == goal).collect(),
                        None => in_week,
                    }
                }
                (None, Some(goal)) => store.challenges_by_goal(&goal)?,
                (None, None) => store.list_challenges()?,
            };
            if ctx.is_human() {
                print_table(ui::challenges_table(&challenges), "No challenges");
            } else {
                ctx.emit("challenge.list", &challenges)?;
            }
        }

        ChallengeCommand::Delete { id } => {
            store.delete_challenge(id)?;
            if ctx.is_human() {
                println!("{} Deleted challenge {}", Icons::DEL, id);
            } else {
                ctx.emit("challenge.delete", &serde_json::json!({ "id": id }))?;
            }
        }
    }
    Ok(())
}

pub fn run_response(ctx: &Context, command: ResponseCommand) -> anyhow::Result<()> {
    let store = ctx.open()?;

    match command {
        ResponseCommand::Add { user, challenge, content } => {
            let mut new = NewResponse::new(user, challenge);
            new.content = content;
            let response = store.create_response(&new)?;
            if ctx.is_human() {
                success(&format!("Recorded response {}", response.id));
            } else {
                ctx.emit("response.add", &response)?;
            }
        }

        ResponseCommand::Show { id } => {
            let response = store
                .get_response(id)?
                .ok_or_else(|| anyhow::anyhow!("response {} not found", id))?;
            if ctx.is_human() {
                print_table(ui::responses_table(std::slice::from_ref(&response)), "");
                if let Some(content) = &response.content {
                    println!("{} {}", Icons::SPEECH, content);
                }
            } else {
                ctx.emit("response.show", &response)?;
            }
        }

        ResponseCommand::List { challenge, user } => {
            let responses = match (challenge, user) {
                (Some(challenge), user) => {
                    let for_challenge = store.responses_for_challenge(challenge)?;
                    match user {
                        Some(user) => for_challenge
                            .into_iter()
                            .filter(|r| r.user_id == Some(user))
                            .collect(),
                        None => for_challenge,
                    }
                }
                (None, Some(user)) => store.responses_for_user(user)?,
                (None, None) => store.list_responses()?,
            };
            if ctx.is_human() {
                print_table(ui::responses_table(&responses), "No responses");
            } else {
                ctx.emit("response.list", &responses)?;
            }
        }

        ResponseCommand::Delete { id } => {
            store.delete_response(id)?;
            if ctx.is_human() {
                println!("{} Deleted response {}", Icons::DEL, id);
            } else {
                ctx.emit("response.delete", &serde_json::json!({ "id": id }))?;
            }
        }
    }
    Ok(())
}

impl From<MetricArgs> for NewMetric {
    fn from(args: MetricArgs) -> Self {
        NewMetric {
            challenge_id: args.challenge,
            completion_rate: args.completion_rate,
            engagement_score: args.engagement_score,
            sales_conversion: args.sales_conversion,
            reactivation_rate: args.reactivation_rate,
            analyzed_at: args.analyzed_at,
        }
    }
}

pub fn run_metric(ctx: &Context, command: MetricCommand) -> anyhow::Result<()> {
    let store = ctx.open()?;

    match command {
        MetricCommand::Add(args) => {
            let metric = store.create_metric(&NewMetric::from(args))?;
            if ctx.is_human() {
                success(&format!("Recorded metric snapshot {}", metric.id));
                print_table(ui::metrics_table(std::slice::from_ref(&metric)), "");
            } else {
                ctx.emit("metric.add", &metric)?;
            }
        }

        MetricCommand::Show { id } => {
            let metric = store
                .get_metric(id)?
                .ok_or_else(|| anyhow::anyhow!("metric snapshot {} not found", id))?;
            if ctx.is_human() {
                print_table(ui::metrics_table(std::slice::from_ref(&metric)), "");
            } else {
                ctx.emit("metric.show", &metric)?;
            }
        }

        MetricCommand::List { challenge } => {
            let metrics = match challenge {
                Some(challenge) => store.metrics_for_challenge(challenge)?,
                None => store.list_metrics()?,
            };
            if ctx.is_human() {
                ui::title(Icons::CHART, "Metric snapshots");
                print_table(ui::metrics_table(&metrics), "No snapshots");
            } else {
                ctx.emit("metric.list", &metrics)?;
            }
        }

        MetricCommand::Latest { challenge } => {
            let latest = store.latest_metric_for_challenge(challenge)?;
            if ctx.is_human() {
                match &latest {
                    Some(metric) => print_table(ui::metrics_table(std::slice::from_ref(metric)), ""),
                    None => println!(
                        "{} {}",
                        Icons::EMPTY,
                        ui::muted(&format!("Challenge {} has no snapshots", challenge))
                    ),
                }
            } else {
                ctx.emit("metric.latest", &latest)?;
            }
        }

        MetricCommand::Delete { id } => {
            store.delete_metric(id)?;
            if ctx.is_human() {
                println!("{} Deleted metric snapshot {}", Icons::DEL, id);
            } else {
                ctx.emit("metric.delete", &serde_json::json!({ "id": id }))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_to_stdout_wraps_json_mode() {
        let store = SqliteStore::open_in_memory().unwrap();
        seed::load(&store).unwrap();
        let snapshot = store.snapshot().unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&export_document(OutputMode::Json, &snapshot).unwrap()).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["command"], "export");
        assert_eq!(json["data"]["challenges"].as_array().unwrap().len(), 4);

        let bare: serde_json::Value =
            serde_json::from_str(&export_document(OutputMode::Human, &snapshot).unwrap()).unwrap();
        assert_eq!(bare["schema"], "community_ai");
        assert!(bare.get("ok").is_none());
    }
}
