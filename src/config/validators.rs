//! 配置校验
//!
//! 非法值回退为默认值，返回问题描述供启动时输出。

use super::structs::{
    AttributionConfig, default_capture_path, default_cookie_name, default_max_key_length,
    default_param_aliases, default_payload_field, default_retention_days,
    default_session_cookie_name, default_shop_prefix,
};

/// Cookie 名称只允许 RFC 6265 token 字符
pub fn validate_cookie_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cookie name cannot be empty".to_string());
    }
    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_graphic() || SEPARATORS.contains(c))
    {
        return Err(format!("cookie name '{}' contains invalid character {:?}", name, c));
    }
    Ok(())
}

/// 路由前缀必须以 '/' 开头
pub fn validate_route_prefix(prefix: &str) -> Result<(), String> {
    if !prefix.starts_with('/') {
        return Err(format!("route prefix '{}' must start with '/'", prefix));
    }
    if prefix.contains(char::is_whitespace) {
        return Err(format!("route prefix '{}' contains whitespace", prefix));
    }
    Ok(())
}

/// 校验并修正 attribution 配置，返回发现的问题
pub fn sanitize_attribution(config: &mut AttributionConfig) -> Vec<String> {
    let mut problems = Vec::new();

    if let Err(e) = validate_cookie_name(&config.cookie_name) {
        problems.push(format!("attribution.cookie_name: {}, using default", e));
        config.cookie_name = default_cookie_name();
    }

    if let Err(e) = validate_cookie_name(&config.session_cookie_name) {
        problems.push(format!("attribution.session_cookie_name: {}, using default", e));
        config.session_cookie_name = default_session_cookie_name();
    }

    config.param_aliases.retain(|alias| !alias.trim().is_empty());
    if config.param_aliases.is_empty() {
        problems.push("attribution.param_aliases is empty, using defaults".to_string());
        config.param_aliases = default_param_aliases();
    }

    if config.retention_days == 0 {
        problems.push("attribution.retention_days must be > 0, using default".to_string());
        config.retention_days = default_retention_days();
    }

    if let Err(e) = validate_route_prefix(&config.shop_prefix) {
        problems.push(format!("attribution.shop_prefix: {}, using default", e));
        config.shop_prefix = default_shop_prefix();
    }

    if let Err(e) = validate_route_prefix(&config.capture_path) {
        problems.push(format!("attribution.capture_path: {}, using default", e));
        config.capture_path = default_capture_path();
    }

    if config.payload_field.trim().is_empty() {
        problems.push("attribution.payload_field is empty, using default".to_string());
        config.payload_field = default_payload_field();
    }

    if config.max_key_length == 0 {
        problems.push("attribution.max_key_length must be > 0, using default".to_string());
        config.max_key_length = default_max_key_length();
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_cookie_name() {
        assert!(validate_cookie_name("x_affiliate_key").is_ok());
        assert!(validate_cookie_name("aff-key").is_ok());
        assert!(validate_cookie_name("").is_err());
        assert!(validate_cookie_name("aff key").is_err());
        assert!(validate_cookie_name("aff;key").is_err());
        assert!(validate_cookie_name("aff=key").is_err());
    }

    #[test]
    fn test_validate_route_prefix() {
        assert!(validate_route_prefix("/shop").is_ok());
        assert!(validate_route_prefix("shop").is_err());
        assert!(validate_route_prefix("/sh op").is_err());
    }

    #[test]
    fn test_sanitize_keeps_valid_config() {
        let mut config = AttributionConfig::default();
        assert!(sanitize_attribution(&mut config).is_empty());
        assert_eq!(config.param_aliases, default_param_aliases());
    }

    #[test]
    fn test_sanitize_restores_defaults() {
        let mut config = AttributionConfig {
            cookie_name: "bad name".to_string(),
            param_aliases: vec!["  ".to_string()],
            retention_days: 0,
            shop_prefix: "shop".to_string(),
            payload_field: String::new(),
            ..AttributionConfig::default()
        };

        let problems = sanitize_attribution(&mut config);

        assert_eq!(problems.len(), 5);
        assert_eq!(config.cookie_name, "x_affiliate_key");
        assert_eq!(config.param_aliases, default_param_aliases());
        assert_eq!(config.retention_days, 30);
        assert_eq!(config.shop_prefix, "/shop");
        assert_eq!(config.payload_field, "key");
    }

    #[test]
    fn test_sanitize_drops_blank_aliases_only() {
        let mut config = AttributionConfig {
            param_aliases: vec!["ref".to_string(), "".to_string(), "partner".to_string()],
            ..AttributionConfig::default()
        };
        assert!(sanitize_attribution(&mut config).is_empty());
        assert_eq!(config.param_aliases, vec!["ref", "partner"]);
    }
}
