//! 取引明細CSVの取得

use tracing::{info, warn};

use super::handshake::Authenticated;
use super::session::{HttpSession, PageResponse};
use super::types::{ExportRange, TransactionExport};
use crate::error::{snippet, ScraperError};

pub const EXPORT_PATH: &str = "/budget/exporter-mouvements";

const EXPORT_FORMAT: &str = "CSV";
const EXPORT_SNIPPET_CHARS: usize = 500;

/// エクスポートAPIのクエリ（空の項目もサーバー側で必須）
pub fn export_query(account_id: &str, range: &ExportRange) -> Vec<(&'static str, String)> {
    vec![
        ("movementSearch[selectedAccounts][]", account_id.to_string()),
        ("movementSearch[fromDate]", range.from_param()),
        ("movementSearch[toDate]", range.to_param()),
        ("movementSearch[format]", EXPORT_FORMAT.to_string()),
        ("movementSearch[filteredBy]", "filteredByCategory".to_string()),
        ("movementSearch[catergory]", String::new()),
        ("movementSearch[operationTypes]", String::new()),
        ("movementSearch[myBudgetPage]", "1".to_string()),
        ("movementSearch[submit]", String::new()),
    ]
}

pub async fn fetch_export(
    session: &mut HttpSession,
    _auth: &Authenticated,
    account_id: &str,
    range: &ExportRange,
) -> Result<TransactionExport, ScraperError> {
    if account_id.is_empty() {
        return Err(ScraperError::AccountNotFound);
    }

    info!(
        "Downloading CSV for account {} from {} to {}",
        account_id,
        range.from_param(),
        range.to_param()
    );
    let response = session
        .get(EXPORT_PATH, &export_query(account_id, range))
        .await?;
    validate_export(&response)?;

    info!("CSV fetched: {}bytes", response.body.len());
    Ok(TransactionExport {
        account_id: account_id.to_string(),
        range: *range,
        body: response.body,
    })
}

/// 2xx 以外、または CSV ではない HTML が返ってきた場合はエラー
pub fn validate_export(response: &PageResponse) -> Result<(), ScraperError> {
    if !response.is_success() {
        warn!("CSV fetch returned status {}", response.status);
        return Err(ScraperError::Download {
            status: response.status.as_u16(),
            snippet: snippet(&response.body, EXPORT_SNIPPET_CHARS),
        });
    }

    let is_csv = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("csv"));
    if !is_csv && response.body.trim_start().starts_with('<') {
        warn!("Response appears to be HTML, not CSV");
        return Err(ScraperError::DisguisedErrorPage(snippet(
            &response.body,
            EXPORT_SNIPPET_CHARS,
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reqwest::StatusCode;

    fn page(status: u16, content_type: Option<&str>, body: &str) -> PageResponse {
        PageResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_rejects_html_disguised_as_success() {
        let response = page(200, Some("text/html; charset=UTF-8"), "<!DOCTYPE html><p>Erreur</p>");
        assert!(matches!(
            validate_export(&response),
            Err(ScraperError::DisguisedErrorPage(_))
        ));

        let leading_ws = page(200, None, "\n  <html></html>");
        assert!(validate_export(&leading_ws).is_err());
    }

    #[test]
    fn test_accepts_csv_content_type() {
        let response = page(200, Some("text/csv; charset=UTF-8"), "<weird but csv>");
        assert!(validate_export(&response).is_ok());
    }

    #[test]
    fn test_accepts_non_markup_body() {
        let response = page(200, Some("text/html"), "dateOp;label;amount\n");
        assert!(validate_export(&response).is_ok());
    }

    #[test]
    fn test_rejects_non_success_status() {
        let long_body = "e".repeat(2000);
        let response = page(403, Some("text/html"), &long_body);
        match validate_export(&response) {
            Err(ScraperError::Download { status, snippet }) => {
                assert_eq!(status, 403);
                assert_eq!(snippet.len(), EXPORT_SNIPPET_CHARS);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_export_query() {
        let range = ExportRange::new(
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 10, 31).unwrap(),
        )
        .unwrap();
        let query = export_query("acc", &range);

        assert_eq!(query.len(), 9);
        assert!(query.contains(&("movementSearch[fromDate]", "01/10/2024".to_string())));
        assert!(query.contains(&("movementSearch[toDate]", "31/10/2024".to_string())));
        assert!(query.contains(&("movementSearch[format]", "CSV".to_string())));
        assert!(query.contains(&("movementSearch[catergory]", String::new())));
    }
}
