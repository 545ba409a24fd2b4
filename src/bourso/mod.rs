//! BoursoBank スクレイパーモジュール
//!
//! 仮想キーパッド付きのログインを通して取引明細CSVを取得する

pub mod account;
pub mod credential;
pub mod export;
pub mod handshake;
mod html;
pub mod keypad;
mod scraper;
pub mod session;
pub mod signature;
pub mod token;
mod types;

pub use credential::{encode_pin, EncodedCredential};
pub use handshake::{open_login_page, Authenticated, KeypadPage, LoginPage};
pub use keypad::{decode_keypad, extract_challenge, DecodedKeypad, KeypadMapping, UnresolvedKey};
pub use self::scraper::BoursoScraper;
pub use session::{HttpSession, PageResponse};
pub use signature::SignatureTable;
pub use token::{extract_token, LoginToken};
pub use types::{export_file_name, ExportRange, TransactionExport};
