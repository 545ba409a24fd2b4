use async_trait::async_trait;

use crate::bourso::TransactionExport;
use crate::error::ScraperError;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// 入力チェックとHTTPセッション作成
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// ログイン実行
    async fn login(&mut self) -> Result<(), ScraperError>;

    /// 取引明細CSVの取得
    async fn download(&mut self) -> Result<TransactionExport, ScraperError>;

    /// セッション破棄
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → login → download → close）
    async fn execute(&mut self) -> Result<TransactionExport, ScraperError> {
        self.initialize().await?;
        self.login().await?;
        let export = self.download().await?;
        self.close().await?;
        Ok(export)
    }
}
