use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::Local;
use tower::Service;
use tracing::info;

use crate::bourso::{BoursoScraper, ExportRange, SignatureTable};
use crate::config::BoursoConfig;
use crate::error::ScraperError;
use crate::last_run::LastRunStore;
use crate::table::TransactionTable;
use crate::traits::Scraper;

/// エクスポートリクエスト
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub config: BoursoConfig,
}

impl ExportRequest {
    pub fn new(client_number: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            config: BoursoConfig::new(client_number, password),
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.config = self.config.with_account_id(account_id);
        self
    }

    pub fn with_range(mut self, range: ExportRange) -> Self {
        self.config = self.config.with_range(range);
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_output_dir(path);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.with_base_url(base_url);
        self
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.config = self.config.with_signatures(signatures);
        self
    }
}

impl From<BoursoConfig> for ExportRequest {
    fn from(config: BoursoConfig) -> Self {
        Self { config }
    }
}

impl From<ExportRequest> for BoursoConfig {
    fn from(req: ExportRequest) -> Self {
        req.config
    }
}

/// エクスポート結果
#[derive(Debug)]
pub struct ExportResult {
    pub csv_path: PathBuf,
    pub account_id: String,
    pub table: TransactionTable,
}

/// tower::Serviceを実装したエクスポートサービス
///
/// ログイン → CSV取得 → 解析 → 出力ファイル保存 → 前回実行日時の記録 まで行う。
#[derive(Debug, Clone, Default)]
pub struct ExportService {}

impl ExportService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<ExportRequest> for ExportService {
    type Response = ExportResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ExportRequest) -> Self::Future {
        info!(
            "Export request received: client={}",
            req.config.client_number
        );

        Box::pin(async move {
            let config: BoursoConfig = req.into();
            let output_dir = config.output_dir.clone();
            let mut scraper = BoursoScraper::new(config);

            let export = scraper.execute().await?;
            let table = TransactionTable::parse(&export.body)?;

            std::fs::create_dir_all(&output_dir)?;
            let csv_path = output_dir.join(export.file_name());
            table.write_csv(&csv_path)?;
            info!("Saved CSV to {:?} ({} rows)", csv_path, table.len());

            LastRunStore::in_dir(&output_dir).record(Local::now().naive_local())?;

            Ok(ExportResult {
                csv_path,
                account_id: export.account_id,
                table,
            })
        })
    }
}
