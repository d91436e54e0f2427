// tests/logging.rs

use sdmflow::cli::LogLevel;
use sdmflow::logging::resolve_filter;
use tracing::level_filters::LevelFilter;

#[test]
fn cli_level_overrides_environment() {
    let filter = resolve_filter(Some(LogLevel::Debug), Some("error"));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
}

#[test]
fn environment_directive_is_used_without_cli_level() {
    let filter = resolve_filter(None, Some(" warn "));
    assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
}

#[test]
fn default_is_info() {
    assert_eq!(resolve_filter(None, None).max_level_hint(), Some(LevelFilter::INFO));
    assert_eq!(resolve_filter(None, Some("")).max_level_hint(), Some(LevelFilter::INFO));
}
