//! キーパッド画像の署名 → 数字 の対応表
//!
//! 署名はボタン画像の `src` 属性の文字数。サイトの描画が変わると
//! 古くなるため、JSONファイルから差し替えられるようにしている。

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// 2024年11月時点で観測された値
const DEFAULT_SIGNATURES: [(usize, u8); 10] = [
    (419, 0),
    (259, 1),
    (1131, 2),
    (979, 3),
    (763, 4),
    (839, 5),
    (1075, 6),
    (1359, 7),
    (1023, 8),
    (1047, 9),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<usize, u8>", into = "BTreeMap<usize, u8>")]
pub struct SignatureTable {
    entries: BTreeMap<usize, u8>,
}

impl SignatureTable {
    /// 対応表を作成（数字は0-9、同じ数字の重複は不可）
    pub fn new(entries: impl IntoIterator<Item = (usize, u8)>) -> Result<Self, ScraperError> {
        let mut map = BTreeMap::new();
        let mut seen = [false; 10];

        for (signature, digit) in entries {
            if digit > 9 {
                return Err(ScraperError::Config(format!(
                    "署名 {} の値 {} は数字(0-9)ではありません",
                    signature, digit
                )));
            }
            if seen[digit as usize] {
                return Err(ScraperError::Config(format!(
                    "数字 {} が複数の署名に割り当てられています",
                    digit
                )));
            }
            seen[digit as usize] = true;
            if map.insert(signature, digit).is_some() {
                return Err(ScraperError::Config(format!(
                    "署名 {} が重複しています",
                    signature
                )));
            }
        }

        Ok(Self { entries: map })
    }

    /// JSONファイル (`{"419": 0, ...}`) から読み込み
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScraperError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScraperError> {
        serde_json::from_str(raw)
            .map_err(|e| ScraperError::Config(format!("署名テーブルの読み込みに失敗: {}", e)))
    }

    pub fn resolve(&self, signature: usize) -> Option<u8> {
        self.entries.get(&signature).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 0-9 の全数字が揃っているか
    pub fn is_complete(&self) -> bool {
        self.entries.len() == 10
    }
}

impl Default for SignatureTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_SIGNATURES.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<usize, u8>> for SignatureTable {
    type Error = ScraperError;

    fn try_from(entries: BTreeMap<usize, u8>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<SignatureTable> for BTreeMap<usize, u8> {
    fn from(table: SignatureTable) -> Self {
        table.entries
    }
}
