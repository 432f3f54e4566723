use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumMessage, IntoEnumIterator};

/// Cookie SameSite 策略
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr, EnumMessage,
)]
#[serde(rename_all = "PascalCase")]
#[strum(serialize_all = "PascalCase")]
pub enum SameSitePolicy {
    #[strum(message = "Most secure, only same-site requests carry cookies")]
    Strict,
    #[default]
    #[strum(message = "Default, allows top-level navigation to carry cookies")]
    Lax,
    #[strum(message = "No restrictions, requires Secure attribute")]
    None,
}

impl std::fmt::Display for SameSitePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for SameSitePolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lax" => Ok(Self::Lax),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid SameSite policy: '{}'. Valid: Strict, Lax, None",
                s
            )),
        }
    }
}

/// 通知投递方式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr, EnumMessage,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotifierKind {
    #[strum(message = "POST the key to endpoint_url")]
    Http,
    #[default]
    #[strum(message = "Record the key on the in-process attribution session")]
    Local,
    #[strum(message = "Only log the notification")]
    Log,
}

impl std::str::FromStr for NotifierKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "local" => Ok(Self::Local),
            "log" => Ok(Self::Log),
            _ => Err(format!(
                "Invalid notifier: '{}'. Valid: http, local, log",
                s
            )),
        }
    }
}

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 服务器地址、端口、CPU 数量
/// - logging: 日志配置
/// - attribution: Cookie 名称、参数别名、保留期、通知端点
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub attribution: AttributionConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config file > 默认值
    /// ENV 前缀：AFF，分隔符：__
    /// 示例：AFF__ATTRIBUTION__SHOP_PREFIX=/store
    pub fn load(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("AFF")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("attribution.param_aliases")
                    .try_parsing(true),
            );

        let mut config = match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        };

        for problem in super::validators::sanitize_attribution(&mut config.attribution) {
            eprintln!("[ERROR] {}", problem);
        }

        config
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        Self::default()
            .to_documented_toml()
            .unwrap_or_else(|e| format!("# Error generating sample config: {}\n", e))
    }

    /// TOML 正文，末尾附上枚举配置项的可选值说明
    fn to_documented_toml(&self) -> crate::errors::Result<String> {
        let mut content = toml::to_string_pretty(self)?;
        content.push_str("\n# attribution.notifier:\n");
        content.push_str(&describe_options::<NotifierKind>());
        content.push_str("# attribution.same_site:\n");
        content.push_str(&describe_options::<SameSitePolicy>());
        Ok(content)
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = self.to_documented_toml()?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 每个枚举值一行注释：`#   value    message`
fn describe_options<E>() -> String
where
    E: IntoEnumIterator + AsRef<str> + EnumMessage,
{
    E::iter()
        .map(|option| {
            format!(
                "#   {:<8} {}\n",
                option.as_ref(),
                option.get_message().unwrap_or_default()
            )
        })
        .collect()
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 推广归因配置
///
/// 不同部署使用的 Cookie 名、参数别名和 SameSite 各不相同，全部作为配置项。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 按顺序检查的 query 参数名，第一个非空值生效
    #[serde(default = "default_param_aliases")]
    pub param_aliases: Vec<String>,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default)]
    pub same_site: SameSitePolicy,
    #[serde(default)]
    pub cookie_secure: bool,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// 购物流程路径前缀，只有这些页面会发送通知
    #[serde(default = "default_shop_prefix")]
    pub shop_prefix: String,
    #[serde(default)]
    pub notifier: NotifierKind,
    /// `http` 通知的目标地址
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    #[serde(default = "default_payload_field")]
    pub payload_field: String,
    #[serde(default = "default_notify_timeout_ms")]
    pub notify_timeout_ms: u64,
    /// 捕获端点路由
    #[serde(default = "default_capture_path")]
    pub capture_path: String,
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,
    #[serde(default = "default_session_capacity")]
    pub session_capacity: u64,
    #[serde(default = "default_max_key_length")]
    pub max_key_length: usize,
}

impl AttributionConfig {
    /// Cookie 与会话的保留期
    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.retention_days) * 24 * 60 * 60)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    /// 路径是否属于购物流程
    pub fn is_shop_path(&self, path: &str) -> bool {
        path.starts_with(&self.shop_prefix)
    }
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

pub(crate) fn default_cookie_name() -> String {
    "x_affiliate_key".to_string()
}

pub(crate) fn default_param_aliases() -> Vec<String> {
    vec![
        "aff_key".to_string(),
        "aff".to_string(),
        "affiliate".to_string(),
    ]
}

pub(crate) fn default_retention_days() -> u32 {
    30
}

pub(crate) fn default_shop_prefix() -> String {
    "/shop".to_string()
}

fn default_endpoint_url() -> String {
    "http://127.0.0.1:8080/affiliate/capture".to_string()
}

pub(crate) fn default_payload_field() -> String {
    "key".to_string()
}

fn default_notify_timeout_ms() -> u64 {
    2000
}

pub(crate) fn default_capture_path() -> String {
    "/affiliate/capture".to_string()
}

pub(crate) fn default_session_cookie_name() -> String {
    "aff_session".to_string()
}

fn default_session_capacity() -> u64 {
    100_000
}

pub(crate) fn default_max_key_length() -> usize {
    64
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            param_aliases: default_param_aliases(),
            retention_days: default_retention_days(),
            same_site: SameSitePolicy::default(),
            cookie_secure: false,
            cookie_domain: None,
            shop_prefix: default_shop_prefix(),
            notifier: NotifierKind::default(),
            endpoint_url: default_endpoint_url(),
            payload_field: default_payload_field(),
            notify_timeout_ms: default_notify_timeout_ms(),
            capture_path: default_capture_path(),
            session_cookie_name: default_session_cookie_name(),
            session_capacity: default_session_capacity(),
            max_key_length: default_max_key_length(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_is_thirty_days_by_default() {
        let config = AttributionConfig::default();
        assert_eq!(config.retention(), Duration::from_secs(30 * 86_400));
    }

    #[test]
    fn test_shop_path_is_a_prefix_match() {
        let config = AttributionConfig::default();
        assert!(config.is_shop_path("/shop"));
        assert!(config.is_shop_path("/shop/cart"));
        assert!(!config.is_shop_path("/about"));
        assert!(!config.is_shop_path("/"));
    }

    #[test]
    fn test_enum_parsing_is_case_insensitive() {
        assert_eq!("STRICT".parse::<SameSitePolicy>(), Ok(SameSitePolicy::Strict));
        assert_eq!("Http".parse::<NotifierKind>(), Ok(NotifierKind::Http));
        assert!("sometimes".parse::<SameSitePolicy>().is_err());
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).expect("sample should parse");
        assert_eq!(parsed.attribution.cookie_name, "x_affiliate_key");
        assert_eq!(parsed.attribution.notifier, NotifierKind::Local);
        assert_eq!(parsed.attribution.same_site, SameSitePolicy::Lax);
    }

    #[test]
    fn test_sample_config_documents_enum_options() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("#   http"));
        assert!(sample.contains("#   local"));
        assert!(sample.contains("#   log"));
        assert!(sample.contains("POST the key to endpoint_url"));
        assert!(sample.contains("#   Strict"));
        assert!(sample.contains("requires Secure attribute"));
    }
}
