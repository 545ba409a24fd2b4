//! BoursoBank スクレイパーライブラリ
//!
//! - 仮想キーパッド（画像の署名から数字を復元）付きのログインを再現
//! - 期間指定で取引明細CSVをエクスポート
//!
//! # 使用例
//!
//! ```rust,ignore
//! use boursobank_scraper::{ExportRequest, ExportService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ExportService::new();
//!
//!     let request = ExportRequest::new("12345678", "87654321")
//!         .with_output_dir("./output");
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("CSV saved: {:?}", result.csv_path);
//! }
//! ```
//!
//! # 段階ごとの実行
//!
//! ```rust,ignore
//! use boursobank_scraper::{BoursoConfig, BoursoScraper, Scraper};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = BoursoConfig::new("12345678", "87654321").with_account_id("a1b2c3");
//!     let mut scraper = BoursoScraper::new(config);
//!     scraper.initialize().await.unwrap();
//!     scraper.login().await.unwrap();
//!     let export = scraper.download().await.unwrap();
//!     println!("{}", export.file_name());
//! }
//! ```

pub mod bourso;
pub mod config;
pub mod error;
pub mod last_run;
pub mod service;
pub mod table;
pub mod traits;

// 主要な型をリエクスポート
pub use bourso::{BoursoScraper, ExportRange, SignatureTable, TransactionExport};
pub use config::BoursoConfig;
pub use error::ScraperError;
pub use last_run::{LastRunStore, RunDecision};
pub use service::{ExportRequest, ExportResult, ExportService};
pub use table::TransactionTable;
pub use traits::Scraper;
