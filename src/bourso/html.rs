//! セレクター・正規表現のキャッシュ

use std::sync::OnceLock;

use regex::Regex;
use scraper::Selector;
use tracing::error;

/// 初回だけ解析してキャッシュする（解析に失敗した場合は None）
pub(crate) fn cached_selector(
    cell: &'static OnceLock<Option<Selector>>,
    css: &str,
) -> Option<&'static Selector> {
    cell.get_or_init(|| {
        Selector::parse(css)
            .map_err(|e| error!("Invalid selector {}: {:?}", css, e))
            .ok()
    })
    .as_ref()
}

pub(crate) fn cached_regex(
    cell: &'static OnceLock<Option<Regex>>,
    pattern: &str,
) -> Option<&'static Regex> {
    cell.get_or_init(|| {
        Regex::new(pattern)
            .map_err(|e| error!("Invalid regex {}: {}", pattern, e))
            .ok()
    })
    .as_ref()
}
