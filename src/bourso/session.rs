//! 1回の実行で使い回すHTTPセッション
//!
//! クッキーは reqwest の `Jar` に任せる。リダイレクトは既定のポリシーで
//! 追い、途中のレスポンスの `Set-Cookie` も Jar に入る。`Max-Age` /
//! `Expires` / `Path` / `Domain` の扱いも Jar 側で行う。

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::debug;

use crate::error::ScraperError;

/// 取得したページ（本文はテキストで保持）
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl PageResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct HttpSession {
    client: Client,
    base: String,
    base_url: Url,
    jar: Arc<Jar>,
    headers: HeaderMap,
}

impl HttpSession {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, ScraperError> {
        let base = base_url.into().trim_end_matches('/').to_string();
        let parsed = Url::parse(&format!("{}/", base))
            .map_err(|e| ScraperError::ClientInit(format!("base URL {}: {}", base, e)))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()
            .map_err(|e| ScraperError::ClientInit(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ScraperError::ClientInit(format!("User-Agent: {}", e)))?,
        );

        Ok(Self {
            client,
            base,
            base_url: parsed,
            jar,
            headers,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// サイト全体（`Path=/`）に送られるクッキーを追加する
    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let raw = format!("{}={}; Path=/", name.into(), value.into());
        self.jar.add_cookie_str(&raw, &self.base_url);
    }

    /// `/` 宛てのリクエストに付くクッキーの値
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies().remove(name)
    }

    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.cookies_for("/")
    }

    /// `path` 宛てのリクエストに付くクッキー
    pub fn cookies_for(&self, path: &str) -> BTreeMap<String, String> {
        let Ok(url) = self.base_url.join(path.trim_start_matches('/')) else {
            return BTreeMap::new();
        };
        self.jar
            .cookies(&url)
            .as_ref()
            .and_then(|header| header.to_str().ok())
            .map(parse_cookie_header)
            .unwrap_or_default()
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) -> Result<(), ScraperError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| ScraperError::InvalidInput(format!("{}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub async fn get(
        &mut self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<PageResponse, ScraperError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let builder = self.client.get(&url).query(query);
        self.send(builder, &[]).await
    }

    pub async fn post_form(
        &mut self,
        path: &str,
        form: &[(&str, String)],
        extra_headers: &[(HeaderName, String)],
    ) -> Result<PageResponse, ScraperError> {
        let url = self.url(path);
        debug!("POST {}", url);
        let builder = self.client.post(&url).form(form);
        self.send(builder, extra_headers).await
    }

    async fn send(
        &mut self,
        builder: RequestBuilder,
        extra_headers: &[(HeaderName, String)],
    ) -> Result<PageResponse, ScraperError> {
        let mut builder = builder.headers(self.headers.clone());
        for (name, value) in extra_headers {
            builder = builder.header(name.clone(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        debug!("status={}, {}bytes ({})", status, body.len(), final_url);
        Ok(PageResponse {
            status,
            content_type,
            body,
        })
    }
}

/// `a=1; b=2` 形式の `Cookie` ヘッダーを分解する
fn parse_cookie_header(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> HttpSession {
        HttpSession::new("https://example.test/", "agent", Duration::from_secs(5)).unwrap()
    }

    /// サーバーから `Set-Cookie` を受け取ったときと同じ経路で Jar に入れる
    fn receive(session: &HttpSession, path: &str, set_cookies: &[&'static str]) {
        let url = session.base_url.join(path.trim_start_matches('/')).unwrap();
        let values: Vec<HeaderValue> = set_cookies
            .iter()
            .copied()
            .map(HeaderValue::from_static)
            .collect();
        session.jar.set_cookies(&mut values.iter(), &url);
    }

    #[test]
    fn test_parse_cookie_header() {
        let parsed = parse_cookie_header("brsxds_abc=123; token=a=b; =nameless; garbage");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("brsxds_abc").map(String::as_str), Some("123"));
        assert_eq!(parsed.get("token").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_set_cookie_is_sent_site_wide() {
        let mut session = session();
        assert!(session.cookies().is_empty());

        session.set_cookie("b", "2");
        session.set_cookie("a", "1");
        assert_eq!(session.cookie("a").as_deref(), Some("1"));
        assert_eq!(session.cookies().len(), 2);
        assert_eq!(
            session.cookies_for("/budget/exporter-mouvements").get("b").map(String::as_str),
            Some("2")
        );
    }

    #[test]
    fn test_received_cookies_are_merged() {
        let mut session = session();
        session.set_cookie("__brs_mit", "mit");
        receive(&session, "/connexion/", &["PHPSESSID=s1; Path=/; HttpOnly", "b=2"]);

        let cookies = session.cookies_for("/connexion/");
        assert_eq!(cookies.get("PHPSESSID").map(String::as_str), Some("s1"));
        assert_eq!(cookies.get("__brs_mit").map(String::as_str), Some("mit"));

        receive(&session, "/", &["PHPSESSID=s2; Path=/"]);
        assert_eq!(session.cookie("PHPSESSID").as_deref(), Some("s2"));
    }

    #[test]
    fn test_max_age_zero_removes_cookie() {
        let mut session = session();
        session.set_cookie("__brs_mit", "mit");
        receive(&session, "/", &["__brs_mit=deleted; Max-Age=0; Path=/"]);
        assert_eq!(session.cookie("__brs_mit"), None);
    }

    #[test]
    fn test_past_expires_removes_cookie() {
        let session = session();
        receive(&session, "/", &["PHPSESSID=s1; Path=/"]);
        assert_eq!(session.cookie("PHPSESSID").as_deref(), Some("s1"));

        receive(
            &session,
            "/",
            &["PHPSESSID=gone; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/"],
        );
        assert_eq!(session.cookie("PHPSESSID"), None);
    }

    #[test]
    fn test_cookie_path_is_scoped() {
        let session = session();
        receive(&session, "/connexion/", &["login_step=1; Path=/connexion"]);

        assert_eq!(
            session.cookies_for("/connexion/").get("login_step").map(String::as_str),
            Some("1")
        );
        assert!(session.cookies_for("/budget/").get("login_step").is_none());
        assert_eq!(session.cookie("login_step"), None);
    }

    #[test]
    fn test_foreign_domain_cookie_is_rejected() {
        let session = session();
        receive(&session, "/", &["tracker=1; Domain=other.test; Path=/"]);
        assert!(session.cookies().is_empty());

        receive(&session, "/", &["shared=1; Domain=example.test; Path=/"]);
        assert_eq!(session.cookie("shared").as_deref(), Some("1"));
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let session = session();
        assert_eq!(session.url("/connexion/"), "https://example.test/connexion/");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpSession::new("not a url", "agent", Duration::from_secs(5));
        assert!(matches!(result, Err(ScraperError::ClientInit(_))));
    }

    #[test]
    fn test_set_header() {
        let mut session = session();
        session
            .set_header(HeaderName::from_static("accept-language"), "fr-FR")
            .unwrap();
        assert_eq!(session.headers.get("accept-language").unwrap(), "fr-FR");
        assert_eq!(session.headers.get(USER_AGENT).unwrap(), "agent");

        let bad = session.set_header(HeaderName::from_static("x-bad"), "line\nbreak");
        assert!(matches!(bad, Err(ScraperError::InvalidInput(_))));
    }
}
