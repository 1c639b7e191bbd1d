use super::*;

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_apply_without_file_or_env() {
    assert_eq!(settings_from_sources(None, no_env), Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let settings = settings_from_sources(
        Some("database_url = \"sqlite://./forms.db\"\nlog_filter = \"debug\"\n"),
        no_env,
    );
    assert_eq!(settings.database_url, "sqlite://./forms.db");
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn app_prefixed_env_wins_over_plain_env_and_file() {
    let settings = settings_from_sources(Some("database_url = \"file.db\"\n"), |key| {
        match key {
            "DATABASE_URL" => Some("plain.db".into()),
            "APP__DATABASE_URL" => Some("app.db".into()),
            "APP__LOG_FILTER" => Some("warn".into()),
            _ => None,
        }
    });
    assert_eq!(settings.database_url, "app.db");
    assert_eq!(settings.log_filter, "warn");
}

#[test]
fn malformed_file_is_ignored() {
    let settings = settings_from_sources(Some("database_url = ["), no_env);
    assert_eq!(settings, Settings::default());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn normalizes_single_colon_sqlite_shorthand() {
    assert_eq!(
        normalize_database_url("sqlite:data\\test.db"),
        "sqlite://data/test.db"
    );
}

#[test]
fn keeps_memory_and_full_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("  sqlite://./x.db  "),
        "sqlite://./x.db"
    );
    assert_eq!(normalize_database_url(""), Settings::default().database_url);
}
