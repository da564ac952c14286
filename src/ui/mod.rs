pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, muted, section, success, summary_row, title, warn};
pub use table::{TableBuilder, challenges_table, goal_summary_table, metrics_table, responses_table, stats_table, users_table};
pub use theme::{theme, Theme};
