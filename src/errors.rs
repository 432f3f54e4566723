use std::fmt;

#[derive(Debug, Clone)]
pub enum AttributionError {
    Config(String),
    Validation(String),
    CookieWrite(String),
    Notification(String),
    Network(String),
    Serialization(String),
    UrlParse(String),
    FileOperation(String),
}

impl AttributionError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            AttributionError::Config(_) => "E001",
            AttributionError::Validation(_) => "E002",
            AttributionError::CookieWrite(_) => "E003",
            AttributionError::Notification(_) => "E004",
            AttributionError::Network(_) => "E005",
            AttributionError::Serialization(_) => "E006",
            AttributionError::UrlParse(_) => "E007",
            AttributionError::FileOperation(_) => "E008",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            AttributionError::Config(_) => "Configuration Error",
            AttributionError::Validation(_) => "Validation Error",
            AttributionError::CookieWrite(_) => "Cookie Write Error",
            AttributionError::Notification(_) => "Notification Error",
            AttributionError::Network(_) => "Network Error",
            AttributionError::Serialization(_) => "Serialization Error",
            AttributionError::UrlParse(_) => "URL Parse Error",
            AttributionError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            AttributionError::Config(msg)
            | AttributionError::Validation(msg)
            | AttributionError::CookieWrite(msg)
            | AttributionError::Notification(msg)
            | AttributionError::Network(msg)
            | AttributionError::Serialization(msg)
            | AttributionError::UrlParse(msg)
            | AttributionError::FileOperation(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for AttributionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for AttributionError {}

// 便捷的构造函数
impl AttributionError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        AttributionError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        AttributionError::Validation(msg.into())
    }

    pub fn cookie_write<T: Into<String>>(msg: T) -> Self {
        AttributionError::CookieWrite(msg.into())
    }

    pub fn notification<T: Into<String>>(msg: T) -> Self {
        AttributionError::Notification(msg.into())
    }

    pub fn network<T: Into<String>>(msg: T) -> Self {
        AttributionError::Network(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        AttributionError::Serialization(msg.into())
    }

    pub fn url_parse<T: Into<String>>(msg: T) -> Self {
        AttributionError::UrlParse(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        AttributionError::FileOperation(msg.into())
    }
}

impl From<std::io::Error> for AttributionError {
    fn from(err: std::io::Error) -> Self {
        AttributionError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for AttributionError {
    fn from(err: serde_json::Error) -> Self {
        AttributionError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for AttributionError {
    fn from(err: url::ParseError) -> Self {
        AttributionError::UrlParse(err.to_string())
    }
}

impl From<ureq::Error> for AttributionError {
    fn from(err: ureq::Error) -> Self {
        AttributionError::Network(err.to_string())
    }
}

impl From<toml::ser::Error> for AttributionError {
    fn from(err: toml::ser::Error) -> Self {
        AttributionError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttributionError>;
