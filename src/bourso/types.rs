//! BoursoBank 関連の型定義

use chrono::{Duration, NaiveDate};

use crate::error::ScraperError;

/// エクスポート期間（日付のみ、両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ExportRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ScraperError> {
        if from > to {
            return Err(ScraperError::InvalidInput(format!(
                "開始日 {} が終了日 {} より後です",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// `to` までの直近 `days` 日間
    pub fn last_days(to: NaiveDate, days: i64) -> Self {
        Self {
            from: to - Duration::days(days),
            to,
        }
    }

    /// エクスポートAPIの日付形式 (DD/MM/YYYY)
    pub fn from_param(&self) -> String {
        self.from.format("%d/%m/%Y").to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format("%d/%m/%Y").to_string()
    }
}

/// 検証済みのエクスポート（CSV本文）
#[derive(Debug, Clone)]
pub struct TransactionExport {
    pub account_id: String,
    pub range: ExportRange,
    pub body: String,
}

impl TransactionExport {
    pub fn file_name(&self) -> String {
        export_file_name(&self.account_id, &self.range)
    }
}

/// 出力ファイル名: `boursorama_transactions_<口座ID>_<YYYYMMDD>_<YYYYMMDD>.csv`
pub fn export_file_name(account_id: &str, range: &ExportRange) -> String {
    format!(
        "boursorama_transactions_{}_{}_{}.csv",
        account_id,
        range.from.format("%Y%m%d"),
        range.to.format("%Y%m%d")
    )
}
