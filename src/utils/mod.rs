use std::path::PathBuf;
use uuid::Uuid;

const APP_DIR_NAME: &str = "elearn";

/// 默认数据目录，取不到系统目录时退回到 ./data
pub fn get_app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// 8 位短 ID
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// 带前缀的短 ID，例如 `c-1a2b3c4d`
pub fn new_prefixed_id(prefix: &str) -> String {
    format!("{}-{}", prefix, new_id())
}

/// HTML 转义
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// 只允许在系统浏览器中打开 http(s) 链接
pub fn is_web_url(url: &str) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids() {
        assert_eq!(new_id().len(), 8);
        let id = new_prefixed_id("c");
        assert!(id.starts_with("c-"));
        assert_eq!(id.len(), 10);
        assert_ne!(new_id(), new_id());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_is_web_url() {
        assert!(is_web_url("https://developer.mozilla.org/"));
        assert!(is_web_url("HTTP://example.com"));
        assert!(!is_web_url("file:///etc/passwd"));
        assert!(!is_web_url("javascript:alert(1)"));
    }
}
