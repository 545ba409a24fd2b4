//! ログインハンドシェイク
//!
//! 各段階は前の段階を消費して次の段階を返す。キーパッドの対応表と
//! チャレンジ値は同じ取得結果 (`KeypadPage`) にしか存在しないため、
//! 別の読み込みの値と混ざることはない。
//!
//! ```text
//! open_login_page ─▶ LoginPage ─load_keypad─▶ KeypadPage ─submit─▶ Authenticated
//! ```

use reqwest::header::{HeaderName, REFERER};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::credential::{encode_pin, EncodedCredential};
use super::keypad::{decode_keypad, extract_challenge, DecodedKeypad};
use super::session::{HttpSession, PageResponse};
use super::signature::SignatureTable;
use super::token::{extract_mit_cookie, extract_token, LoginToken, MIT_COOKIE_NAME};
use crate::error::{snippet, ScraperError};

pub const LOGIN_PATH: &str = "/connexion/";
pub const KEYPAD_PATH: &str = "/connexion/clavier-virtuel?_hinclude=1";
pub const PASSWORD_PATH: &str = "/connexion/saisie-mot-de-passe";

const AJAX_MARKER: &str = "XMLHttpRequest";
const LOGIN_SNIPPET_CHARS: usize = 400;

/// フォームトークン取得済み
#[derive(Debug)]
pub struct LoginPage {
    token: LoginToken,
}

/// キーパッド取得済み（対応表・チャレンジ値はこの読み込み限り）
#[derive(Debug)]
pub struct KeypadPage {
    token: LoginToken,
    keypad: DecodedKeypad,
    challenge: Option<String>,
}

/// ログイン済みの証明（認証の実体はセッションのクッキー）
#[derive(Debug)]
pub struct Authenticated {
    _private: (),
}

fn ensure_page_ok(page: &PageResponse, what: &str) -> Result<(), ScraperError> {
    if page.is_success() {
        Ok(())
    } else {
        Err(ScraperError::Navigation(format!(
            "{}: status={}",
            what, page.status
        )))
    }
}

/// ログインページを2回読み込み、`__brs_mit` クッキーとフォームトークンを得る
pub async fn open_login_page(session: &mut HttpSession) -> Result<LoginPage, ScraperError> {
    info!("Fetching login page to collect the obfuscation cookie...");
    let first = session.get(LOGIN_PATH, &[]).await?;
    ensure_page_ok(&first, "ログインページ")?;

    let cookie_value = extract_mit_cookie(&first.body)?;
    debug!("Found {} cookie", MIT_COOKIE_NAME);
    session.set_cookie(MIT_COOKIE_NAME, cookie_value);

    let second = session.get(LOGIN_PATH, &[]).await?;
    ensure_page_ok(&second, "ログインページ (2回目)")?;

    let token = extract_token(&second.body).map_err(|e| {
        warn!("Could not find form[_token]. The page structure may have changed.");
        e
    })?;
    debug!("Found form token");

    Ok(LoginPage { token })
}

impl LoginPage {
    pub fn token(&self) -> &LoginToken {
        &self.token
    }

    /// キーパッドを取得し、対応表とチャレンジ値を同じレスポンスから取り出す
    pub async fn load_keypad(
        self,
        session: &mut HttpSession,
        table: &SignatureTable,
    ) -> Result<KeypadPage, ScraperError> {
        info!("Fetching virtual keypad...");
        let page = session.get(KEYPAD_PATH, &[]).await?;
        ensure_page_ok(&page, "仮想キーパッド")?;

        let keypad = decode_keypad(&page.body, table);
        if keypad.is_complete() {
            debug!("Found full mapping for digits 0-9");
        } else {
            warn!(
                "Only found mapping for {} digits; expected 10. Continuing anyway.",
                keypad.mapping.len()
            );
        }

        let challenge = extract_challenge(&page.body);
        if challenge.is_none() {
            warn!("Could not extract matrixRandomChallenge; submitting without it");
        }

        Ok(KeypadPage {
            token: self.token,
            keypad,
            challenge,
        })
    }
}

impl KeypadPage {
    pub fn keypad(&self) -> &DecodedKeypad {
        &self.keypad
    }

    pub fn challenge(&self) -> Option<&str> {
        self.challenge.as_deref()
    }

    /// 暗証番号をエンコードしてログインフォームを送信する
    ///
    /// リダイレクトを追った後の最終ステータスが 200 / 302 以外ならログイン失敗。
    /// 本文の中身までは確認しない。
    pub async fn submit(
        self,
        session: &mut HttpSession,
        client_number: &str,
        pin: &str,
    ) -> Result<Authenticated, ScraperError> {
        let encoded = encode_pin(pin, &self.keypad.mapping)?;
        let form = build_login_form(
            client_number,
            &encoded,
            pin.chars().count(),
            &self.token,
            self.challenge.as_deref(),
        );

        let headers: [(HeaderName, String); 2] = [
            (REFERER, session.url(LOGIN_PATH)),
            (
                HeaderName::from_static("x-requested-with"),
                AJAX_MARKER.to_string(),
            ),
        ];

        info!("Submitting login form...");
        let response = session.post_form(PASSWORD_PATH, &form, &headers).await?;

        if response.status != StatusCode::OK && response.status != StatusCode::FOUND {
            warn!("Login POST returned status {}", response.status);
            return Err(ScraperError::Login {
                status: response.status.as_u16(),
                snippet: snippet(&response.body, LOGIN_SNIPPET_CHARS),
            });
        }

        info!(
            "Login POST done (status {}), {} cookies in session",
            response.status,
            session.cookies().len()
        );
        Ok(Authenticated { _private: () })
    }
}

/// ログインフォームの項目（チャレンジ値がなければその項目ごと省く）
pub fn build_login_form(
    client_number: &str,
    encoded: &EncodedCredential,
    pin_len: usize,
    token: &LoginToken,
    challenge: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("form[clientNumber]", client_number.to_string()),
        ("form[password]", encoded.as_str().to_string()),
        ("form[ajx]", "1".to_string()),
        ("form[platformAuthenticatorAvailable]", "-1".to_string()),
        ("form[passwordAck]", "{}".to_string()),
        ("form[fakePassword]", "•".repeat(pin_len)),
        ("form[_token]", token.as_str().to_string()),
    ];
    if let Some(challenge) = challenge {
        form.push(("form[matrixRandomChallenge]", challenge.to_string()));
    }
    form
}
