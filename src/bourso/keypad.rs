//! 仮想キーパッドの解析
//!
//! キーパッドの各ボタンは `data-matrix-key` にラベル（ページ読み込みごとに
//! 変わる3文字程度の文字列）を持ち、数字は画像としてしか表示されない。
//! 画像 `src` の長さを署名テーブルで数字に戻して 数字 → ラベル の対応を作る。

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::html::{cached_regex, cached_selector};
use super::signature::SignatureTable;

/// 数字 (0-9) → ラベル の対応
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypadMapping {
    labels: BTreeMap<u8, String>,
}

impl KeypadMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, digit: u8, label: impl Into<String>) -> Option<String> {
        self.labels.insert(digit, label.into())
    }

    pub fn label(&self, digit: u8) -> Option<&str> {
        self.labels.get(&digit).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.labels.len() == 10
    }

    pub fn digits(&self) -> impl Iterator<Item = u8> + '_ {
        self.labels.keys().copied()
    }
}

impl<S: Into<String>> FromIterator<(u8, S)> for KeypadMapping {
    fn from_iter<I: IntoIterator<Item = (u8, S)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|(d, l)| (d, l.into())).collect(),
        }
    }
}

/// 数字に解決できなかったボタン
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedKey {
    pub label: String,
    /// 画像が見つからなかった場合は None
    pub signature: Option<usize>,
}

/// キーパッド解析結果（解決できたものと、できなかったものの両方を保持）
#[derive(Debug, Clone, Default)]
pub struct DecodedKeypad {
    pub mapping: KeypadMapping,
    pub unresolved: Vec<UnresolvedKey>,
}

impl DecodedKeypad {
    pub fn is_complete(&self) -> bool {
        self.mapping.is_complete()
    }
}

fn key_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, "[data-matrix-key]")
}

fn img_selector() -> Option<&'static Selector> {
    static SEL: OnceLock<Option<Selector>> = OnceLock::new();
    cached_selector(&SEL, "img")
}

fn challenge_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    cached_regex(
        &RE,
        r#"\$\(\s*"\[data-matrix-random-challenge\]"\s*\)\.val\(\s*(?:"(?P<dq>[^"]*)"|'(?P<sq>[^']*)')\s*\)"#,
    )
}

/// キーパッドHTMLを解析して 数字 → ラベル の対応を作る
///
/// 署名テーブルにない画像があっても中断しない（一部の数字だけでも
/// 暗証番号に必要な分が揃っていればログインできるため）。
pub fn decode_keypad(html: &str, table: &SignatureTable) -> DecodedKeypad {
    let mut decoded = DecodedKeypad::default();
    let (Some(key_sel), Some(img_sel)) = (key_selector(), img_selector()) else {
        return decoded;
    };
    let fragment = Html::parse_fragment(html);

    for key in fragment.select(key_sel) {
        let label = key.value().attr("data-matrix-key").unwrap_or_default().to_string();

        let signature = key
            .select(img_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| src.chars().count());

        let Some(signature) = signature else {
            warn!("Keypad key without image, skipping");
            decoded.unresolved.push(UnresolvedKey {
                label,
                signature: None,
            });
            continue;
        };

        match table.resolve(signature) {
            Some(digit) => {
                if decoded.mapping.insert(digit, label).is_some() {
                    warn!("Digit {} resolved by more than one key; keeping the last", digit);
                }
            }
            None => {
                warn!(
                    "Unknown keypad image length: {}. The signature table may need updating.",
                    signature
                );
                decoded.unresolved.push(UnresolvedKey {
                    label,
                    signature: Some(signature),
                });
            }
        }
    }

    debug!(
        "Keypad decoded: {} digits, {} unresolved",
        decoded.mapping.len(),
        decoded.unresolved.len()
    );
    decoded
}

/// キーパッドHTMLに埋め込まれた matrixRandomChallenge を取り出す
pub fn extract_challenge(html: &str) -> Option<String> {
    let caps = challenge_re()?.captures(html)?;
    caps.name("dq")
        .or_else(|| caps.name("sq"))
        .map(|m| m.as_str().to_string())
        .filter(|value| !value.is_empty())
}
