//! エクスポート対象の口座IDを決める

use std::sync::OnceLock;

use reqwest::StatusCode;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use super::handshake::Authenticated;
use super::html::cached_selector;
use super::session::HttpSession;
use crate::error::ScraperError;

pub const BUDGET_PATH: &str = "/mon-budget/generate";

fn account_field_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, r#"[name="movementSearch[selectedAccounts][]"]"#)
}

fn account_option_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, r#"select[name="movementSearch[selectedAccounts][]"] option"#)
}

/// 口座IDを決める
///
/// 指定があればそれを使い、なければ家計簿ページから探す。
pub async fn resolve_account(
    session: &mut HttpSession,
    _auth: &Authenticated,
    supplied: Option<&str>,
) -> Result<String, ScraperError> {
    if let Some(account) = supplied.map(str::trim).filter(|a| !a.is_empty()) {
        debug!("Using supplied account id");
        return Ok(account.to_string());
    }

    info!("Attempting to discover account id from {} ...", BUDGET_PATH);
    let page = session.get(BUDGET_PATH, &[]).await?;
    if page.status != StatusCode::OK {
        warn!(
            "Budget page returned status {}; cannot discover account id",
            page.status
        );
        return Err(ScraperError::AccountNotFound);
    }

    let account = find_account_id(&page.body).ok_or_else(|| {
        warn!("No account selector found on the budget page");
        ScraperError::AccountNotFound
    })?;
    info!("Discovered account id {}", account);
    Ok(account)
}

/// 家計簿ページから口座IDを探す
///
/// `name` が一致する要素の `value`、なければ同名 select の最初の option。
pub fn find_account_id(html: &str) -> Option<String> {
    let named = account_field_selector()?;
    let option = account_option_selector()?;
    let document = Html::parse_document(html);

    let value = document
        .select(named)
        .next()
        .and_then(|el| el.value().attr("value"))
        .filter(|v| !v.trim().is_empty())
        .or_else(|| {
            document
                .select(option)
                .next()
                .and_then(|el| el.value().attr("value"))
                .filter(|v| !v.trim().is_empty())
        })?;

    Some(value.trim().to_string())
}
