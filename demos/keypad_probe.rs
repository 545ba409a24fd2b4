//! 保存したキーパッドHTMLを解析し、署名テーブルの更新が必要か確認する
//!
//! ```text
//! cargo run --example keypad_probe -- clavier.html [signatures.json]
//! ```

use boursobank_scraper::bourso::{decode_keypad, extract_challenge};
use boursobank_scraper::SignatureTable;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let html_path = args
        .next()
        .expect("usage: keypad_probe <keypad.html> [signatures.json]");

    let table = match args.next() {
        Some(path) => SignatureTable::from_json_file(&path).expect("署名テーブルの読み込みに失敗"),
        None => SignatureTable::default(),
    };

    let html = std::fs::read_to_string(&html_path).expect("HTMLファイルの読み込みに失敗");
    let decoded = decode_keypad(&html, &table);

    println!("=== Keypad Probe ===");
    for digit in decoded.mapping.digits() {
        println!("{} -> {}", digit, decoded.mapping.label(digit).unwrap_or_default());
    }
    for key in &decoded.unresolved {
        match key.signature {
            Some(len) => println!("未解決: label={} length={}", key.label, len),
            None => println!("未解決: label={} (画像なし)", key.label),
        }
    }
    println!(
        "完全な対応表: {} / チャレンジ値: {}",
        decoded.is_complete(),
        if extract_challenge(&html).is_some() { "あり" } else { "なし" }
    );
}
