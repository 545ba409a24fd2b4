use async_trait::async_trait;
use tracing::info;

use crate::config::BoursoConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

use super::account::resolve_account;
use super::export::fetch_export;
use super::handshake::{open_login_page, Authenticated};
use super::session::HttpSession;
use super::types::TransactionExport;

pub struct BoursoScraper {
    config: BoursoConfig,
    session: Option<HttpSession>,
    auth: Option<Authenticated>,
}

impl BoursoScraper {
    pub fn new(config: BoursoConfig) -> Self {
        Self {
            config,
            session: None,
            auth: None,
        }
    }

    pub fn config(&self) -> &BoursoConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&HttpSession> {
        self.session.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_some()
    }
}

#[async_trait]
impl Scraper for BoursoScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Initializing HTTP session for {}", self.config.base_url);
        self.config.validate()?;

        let session = HttpSession::new(
            self.config.base_url.as_str(),
            &self.config.user_agent,
            self.config.timeout,
        )?;
        self.session = Some(session);
        self.auth = None;
        Ok(())
    }

    async fn login(&mut self) -> Result<(), ScraperError> {
        let config = &self.config;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ScraperError::ClientInit("セッションが初期化されていません".into()))?;

        let login_page = open_login_page(session).await?;
        let keypad_page = login_page.load_keypad(session, &config.signatures).await?;
        let auth = keypad_page
            .submit(session, &config.client_number, &config.password)
            .await?;

        self.auth = Some(auth);
        info!("Login completed");
        Ok(())
    }

    async fn download(&mut self) -> Result<TransactionExport, ScraperError> {
        let auth = self.auth.as_ref().ok_or(ScraperError::NotLoggedIn)?;
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| ScraperError::ClientInit("セッションが初期化されていません".into()))?;

        let account_id =
            resolve_account(session, auth, self.config.account_id.as_deref()).await?;
        fetch_export(session, auth, &account_id, &self.config.range).await
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        self.auth = None;
        self.session = None;
        info!("Session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bourso_scraper_new() {
        let scraper = BoursoScraper::new(BoursoConfig::new("12345678", "12345678"));
        assert!(scraper.session().is_none());
        assert!(!scraper.is_logged_in());
    }

    #[tokio::test]
    async fn test_initialize_rejects_bad_input_before_network() {
        let mut scraper = BoursoScraper::new(BoursoConfig::new("abc", "12345678"));
        let result = scraper.initialize().await;
        assert!(matches!(result, Err(ScraperError::InvalidInput(_))));
        assert!(scraper.session().is_none());
    }

    #[tokio::test]
    async fn test_download_requires_login() {
        let mut scraper = BoursoScraper::new(BoursoConfig::new("12345678", "12345678"));
        scraper.initialize().await.unwrap();
        let result = scraper.download().await;
        assert!(matches!(result, Err(ScraperError::NotLoggedIn)));
    }

    #[tokio::test]
    async fn test_login_requires_initialize() {
        let mut scraper = BoursoScraper::new(BoursoConfig::new("12345678", "12345678"));
        let result = scraper.login().await;
        assert!(matches!(result, Err(ScraperError::ClientInit(_))));
    }
}
