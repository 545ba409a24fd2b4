use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::bourso::{ExportRange, SignatureTable};
use crate::error::ScraperError;

pub const DEFAULT_BASE_URL: &str = "https://clients.boursobank.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36";
/// 暗証番号の桁数
pub const PIN_LENGTH: usize = 8;
/// 期間未指定時のエクスポート日数
pub const DEFAULT_EXPORT_DAYS: i64 = 30;

#[derive(Clone)]
pub struct BoursoConfig {
    pub client_number: String,
    pub password: String,
    pub account_id: Option<String>,
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub range: ExportRange,
    pub output_dir: PathBuf,
    pub signatures: SignatureTable,
}

impl Default for BoursoConfig {
    fn default() -> Self {
        Self {
            client_number: String::new(),
            password: String::new(),
            account_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(60),
            range: ExportRange::last_days(Local::now().date_naive(), DEFAULT_EXPORT_DAYS),
            output_dir: PathBuf::from("output"),
            signatures: SignatureTable::default(),
        }
    }
}

// 暗証番号をログに出さない
impl fmt::Debug for BoursoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoursoConfig")
            .field("client_number", &self.client_number)
            .field("password", &"***")
            .field("account_id", &self.account_id)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("range", &self.range)
            .field("output_dir", &self.output_dir)
            .field("signatures", &self.signatures.len())
            .finish()
    }
}

impl BoursoConfig {
    pub fn new(client_number: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client_number: client_number.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_range(mut self, range: ExportRange) -> Self {
        self.range = range;
        self
    }

    /// 開始日だけ指定（終了日は今日）
    pub fn with_from_date(mut self, from: NaiveDate) -> Self {
        self.range = ExportRange {
            from,
            to: Local::now().date_naive(),
        };
        self
    }

    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    pub fn with_signatures(mut self, signatures: SignatureTable) -> Self {
        self.signatures = signatures;
        self
    }

    /// 通信前の入力チェック
    pub fn validate(&self) -> Result<(), ScraperError> {
        if self.client_number.is_empty() || !self.client_number.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ScraperError::InvalidInput(
                "顧客番号は数字のみで指定してください".into(),
            ));
        }
        if self.password.chars().count() != PIN_LENGTH
            || !self.password.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ScraperError::InvalidInput(format!(
                "暗証番号は{}桁の数字で指定してください",
                PIN_LENGTH
            )));
        }
        ExportRange::new(self.range.from, self.range.to)?;
        if self.signatures.is_empty() {
            return Err(ScraperError::Config("署名テーブルが空です".into()));
        }
        Ok(())
    }
}
