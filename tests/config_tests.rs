//! Configuration loading tests

use std::io::Write;

use affiliate_attribution::config::{NotifierKind, SameSitePolicy, StaticConfig};
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_missing_file_uses_defaults() {
    let config = StaticConfig::load("/nonexistent/affiliate-config.toml");

    assert_eq!(config.attribution.cookie_name, "x_affiliate_key");
    assert_eq!(
        config.attribution.param_aliases,
        vec!["aff_key", "aff", "affiliate"]
    );
    assert_eq!(config.attribution.retention_days, 30);
    assert_eq!(config.attribution.shop_prefix, "/shop");
    assert_eq!(config.attribution.notifier, NotifierKind::Local);
}

#[test]
fn test_load_attribution_section_from_file() {
    let file = write_config(
        r#"
[server]
port = 9090

[attribution]
cookie_name = "aff_ref"
param_aliases = ["ref", "aff_key"]
retention_days = 7
same_site = "Strict"
shop_prefix = "/store"
notifier = "http"
endpoint_url = "https://example.com/aff/capture"
payload_field = "aff_key"
"#,
    );

    let config = StaticConfig::load(file.path().to_str().unwrap());

    assert_eq!(config.server.port, 9090);
    let attribution = &config.attribution;
    assert_eq!(attribution.cookie_name, "aff_ref");
    assert_eq!(attribution.param_aliases, vec!["ref", "aff_key"]);
    assert_eq!(attribution.retention_days, 7);
    assert_eq!(attribution.same_site, SameSitePolicy::Strict);
    assert_eq!(attribution.shop_prefix, "/store");
    assert_eq!(attribution.notifier, NotifierKind::Http);
    assert_eq!(attribution.payload_field, "aff_key");
    // 未配置的字段保持默认
    assert_eq!(attribution.session_cookie_name, "aff_session");
}

#[test]
fn test_invalid_values_fall_back_to_defaults() {
    let file = write_config(
        r#"
[attribution]
cookie_name = "bad name;"
param_aliases = ["", "  "]
retention_days = 0
shop_prefix = "shop"
"#,
    );

    let config = StaticConfig::load(file.path().to_str().unwrap());

    assert_eq!(config.attribution.cookie_name, "x_affiliate_key");
    assert_eq!(
        config.attribution.param_aliases,
        vec!["aff_key", "aff", "affiliate"]
    );
    assert_eq!(config.attribution.retention_days, 30);
    assert_eq!(config.attribution.shop_prefix, "/shop");
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = StaticConfig::default();
    config.attribution.cookie_name = "saved_key".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = StaticConfig::load(path.to_str().unwrap());
    assert_eq!(loaded.attribution.cookie_name, "saved_key");
}
