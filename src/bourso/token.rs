//! ログインページからのクッキー・フォームトークン抽出

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::html::{cached_regex, cached_selector};
use crate::error::ScraperError;

/// ログインページのインラインスクリプトで設定されるクッキー名
pub const MIT_COOKIE_NAME: &str = "__brs_mit";

/// フォームのCSRFトークン（1回のページ読み込みで取得したもの）
#[derive(Clone, PartialEq, Eq)]
pub struct LoginToken(String);

impl LoginToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LoginToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LoginToken(***)")
    }
}

fn mit_cookie_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(&RE, r#"__brs_mit\s*=\s*([^";\s]+)"#)
}

/// `name` に `form[_token]` を含む input
fn primary_token_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, r#"input[name*="form[_token]"]"#)
}

fn fallback_token_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, r#"input[name="_token"]"#)
}

/// 1回目のログインページから `__brs_mit` の値を取り出す
pub fn extract_mit_cookie(html: &str) -> Result<String, ScraperError> {
    mit_cookie_re()
        .and_then(|re| re.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ScraperError::ElementNotFound(format!("{} クッキー", MIT_COOKIE_NAME)))
}

/// 2回目のログインページからフォームトークンを取り出す
///
/// `name` に `form[_token]` を含む input を優先し、なければ
/// `name="_token"` の hidden input を探す。
pub fn extract_token(html: &str) -> Result<LoginToken, ScraperError> {
    let document = Html::parse_document(html);

    [primary_token_selector(), fallback_token_selector()]
        .into_iter()
        .flatten()
        .find_map(|selector| {
            document
                .select(selector)
                .next()
                .and_then(|input| input.value().attr("value"))
                .filter(|value| !value.is_empty())
        })
        .map(|value| LoginToken(value.to_string()))
        .ok_or_else(|| ScraperError::ElementNotFound("form[_token]".into()))
}
