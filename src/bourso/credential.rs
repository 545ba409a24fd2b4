//! 暗証番号 → ラベル列 への変換

use std::fmt;

use super::keypad::KeypadMapping;
use crate::error::ScraperError;

/// ラベル同士の区切り文字
pub const LABEL_DELIMITER: &str = "|";

/// サーバーに送るエンコード済み暗証番号（1回のログイン送信にだけ使う）
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedCredential(String);

impl EncodedCredential {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncodedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodedCredential(***)")
    }
}

/// 暗証番号の各桁を左から順にラベルへ置き換えて `|` で連結する
///
/// 対応表にない数字が1つでもあれば失敗する（部分的なエンコードはしない）。
pub fn encode_pin(pin: &str, mapping: &KeypadMapping) -> Result<EncodedCredential, ScraperError> {
    let labels = pin
        .chars()
        .map(|ch| {
            let digit = ch.to_digit(10).ok_or_else(|| {
                ScraperError::InvalidInput("暗証番号は数字のみです".into())
            })?;
            mapping
                .label(digit as u8)
                .ok_or(ScraperError::UnmappableDigit(digit))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EncodedCredential(labels.join(LABEL_DELIMITER)))
}
