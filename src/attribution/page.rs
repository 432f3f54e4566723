use url::Url;

use crate::errors::Result;

/// 当前页面地址（路径 + query）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    path: String,
    query: Option<String>,
}

impl PageUrl {
    /// 解析完整 URL 或以 '/' 开头的相对地址
    pub fn parse(raw: &str) -> Result<Self> {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://localhost/")?.join(raw)?
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: url.path().to_string(),
            query: url.query().map(String::from),
        })
    }

    /// 从已拆分的请求路径与 query string 构建
    pub fn from_parts(path: &str, query: &str) -> Self {
        Self {
            path: if path.is_empty() { "/" } else { path }.to_string(),
            query: (!query.is_empty()).then(|| query.to_string()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// 返回指定参数第一次出现时的解码值
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute_url() {
        let page = PageUrl::parse("https://site/shop?aff_key=ABC123").unwrap();
        assert_eq!(page.path(), "/shop");
        assert_eq!(page.query_param("aff_key").as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_parse_relative_url() {
        let page = PageUrl::parse("/about?aff=X%20Y").unwrap();
        assert_eq!(page.path(), "/about");
        assert_eq!(page.query_param("aff").as_deref(), Some("X Y"));
    }

    #[test]
    fn test_parse_without_query() {
        let page = PageUrl::parse("https://site/").unwrap();
        assert_eq!(page.path(), "/");
        assert!(page.query().is_none());
        assert!(page.query_param("aff_key").is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let page = PageUrl::from_parts("/shop", "aff_key=&aff_key=LATE");
        assert_eq!(page.query_param("aff_key").as_deref(), Some(""));
    }

    #[test]
    fn test_from_parts_normalizes_empty_values() {
        let page = PageUrl::from_parts("", "");
        assert_eq!(page.path(), "/");
        assert!(page.query().is_none());
    }
}
