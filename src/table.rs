//! エクスポートCSVの解析と書き出し

use std::path::Path;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use tracing::debug;

use crate::error::ScraperError;

/// 取引明細の表（ヘッダー + 行）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TransactionTable {
    /// `;` 区切りで解析し、だめなら `,` 区切りで再解析する
    pub fn parse(body: &str) -> Result<Self, ScraperError> {
        let body = body.trim_start_matches('\u{feff}');

        match Self::parse_with(body, b';') {
            Ok(table) if !table.looks_comma_separated() => Ok(table),
            Ok(_) => {
                debug!("Single column with commas; retrying with ',' delimiter");
                Self::parse_with(body, b',')
            }
            Err(e) => {
                debug!("Semicolon parse failed ({}); retrying with ','", e);
                Self::parse_with(body, b',')
            }
        }
    }

    fn parse_with(body: &str, delimiter: u8) -> Result<Self, ScraperError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::All)
            .from_reader(body.as_bytes());

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;

        Ok(Self { headers, rows })
    }

    fn looks_comma_separated(&self) -> bool {
        self.headers.len() == 1 && self.headers[0].contains(',')
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// カンマ区切り・ヘッダー付きで書き出す
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), ScraperError> {
        let mut writer = WriterBuilder::new().from_path(path.as_ref())?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
