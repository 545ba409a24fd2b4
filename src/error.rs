use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("入力値エラー: {0}")]
    InvalidInput(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("HTTPクライアント初期化エラー: {0}")]
    ClientInit(String),

    #[error("通信エラー: {0}")]
    Http(String),

    #[error("タイムアウト: {0}")]
    Timeout(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("要素が見つかりません: {0}")]
    ElementNotFound(String),

    #[error("キーパッドに対応するラベルがない数字です: {0}")]
    UnmappableDigit(u32),

    #[error("ログインエラー: status={status}, body={snippet}")]
    Login { status: u16, snippet: String },

    #[error("ログインしていません")]
    NotLoggedIn,

    #[error("口座IDが見つかりません")]
    AccountNotFound,

    #[error("ダウンロードエラー: status={status}, body={snippet}")]
    Download { status: u16, snippet: String },

    #[error("CSVではなくHTMLが返されました: {0}")]
    DisguisedErrorPage(String),

    #[error("CSV解析エラー: {0}")]
    Csv(String),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperError::Timeout(e.to_string())
        } else {
            ScraperError::Http(e.to_string())
        }
    }
}

impl From<csv::Error> for ScraperError {
    fn from(e: csv::Error) -> Self {
        ScraperError::Csv(e.to_string())
    }
}

/// レスポンス本文の先頭 `max_chars` 文字だけを切り出す（全文はログに出さない）
pub(crate) fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_is_bounded() {
        let body = "x".repeat(1000);
        assert_eq!(snippet(&body, 400).len(), 400);
        assert_eq!(snippet("short", 400), "short");
    }

    #[test]
    fn test_snippet_counts_chars_not_bytes() {
        assert_eq!(snippet("•••••", 3), "•••");
    }

    #[test]
    fn test_login_error_display() {
        let err = ScraperError::Login {
            status: 500,
            snippet: "oops".into(),
        };
        assert_eq!(err.to_string(), "ログインエラー: status=500, body=oops");
    }
}
