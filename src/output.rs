use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// Decorative human output is suppressed when `COMMUNITY_AI_QUIET` is set
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("COMMUNITY_AI_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
