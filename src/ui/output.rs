use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

/// A decorative line, or nothing in quiet mode
fn decoration(quiet: bool, line: impl FnOnce() -> String) -> Option<String> {
    if quiet {
        None
    } else {
        Some(line())
    }
}

fn print_decoration(line: Option<String>) {
    if let Some(line) = line {
        println!("{}", line);
    }
}

pub fn header(text: &str) {
    print_decoration(header_line(text, is_quiet()));
}

fn header_line(text: &str, quiet: bool) -> Option<String> {
    decoration(quiet, || format!("{} {}", Icons::ROCKET, text.style(theme().header.clone())))
}

/// Icon-prefixed heading above a table
pub fn title(icon: &str, text: &str) {
    print_decoration(title_line(icon, text, is_quiet()));
}

fn title_line(icon: &str, text: &str, quiet: bool) -> Option<String> {
    decoration(quiet, || format!("{} {}", icon, text.style(theme().header.clone())))
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    print_decoration(decoration(is_quiet(), || {
        format!(
            "{} {}: {}",
            Icons::INFO.style(theme().info.clone()),
            label.style(theme().dim.clone()),
            value
        )
    }));
}

pub fn section(title: &str) {
    print_decoration(section_line(title, is_quiet()));
}

fn section_line(title: &str, quiet: bool) -> Option<String> {
    decoration(quiet, || format!("\n━{}━", title.style(theme().header.clone())))
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn summary_row(label: &str, value: &str) {
    print_decoration(summary_line(label, value, is_quiet()));
}

fn summary_line(label: &str, value: &str, quiet: bool) -> Option<String> {
    decoration(quiet, || format!("  {} {}", label.style(theme().dim.clone()), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_suppresses_every_decoration() {
        assert!(header_line("Initialized", true).is_none());
        assert!(title_line(Icons::STATS, "Statistics", true).is_none());
        assert!(section_line("Responses", true).is_none());
        assert!(summary_line("db", "community_ai.db", true).is_none());
    }

    #[test]
    fn test_decorations_print_by_default() {
        assert!(title_line(Icons::CHART, "Goal summary", false).unwrap().contains("Goal summary"));
        assert!(section_line("Responses", false).unwrap().contains("Responses"));
        assert!(summary_line("db", "community_ai.db", false).unwrap().ends_with("community_ai.db"));
    }
}
