use std::path::PathBuf;

use boursobank_scraper::bourso::export_file_name;
use boursobank_scraper::{
    BoursoConfig, ExportRange, ExportRequest, ExportService, LastRunStore,
    RunDecision, SignatureTable,
};
use chrono::Local;
use clap::Parser;
use tower::Service;
use tracing_subscriber::EnvFilter;

/// 前回実行から30日以上経っていれば、取引明細CSVをエクスポートする
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// true / 1 / yes で通信せずに出力ファイル名だけ表示
    dry_run: String,
    /// 顧客番号（数字のみ）
    client_number: String,
    /// 8桁の暗証番号
    password: String,
    /// 口座ID（空文字なら家計簿ページから探す）
    account: String,

    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// 署名テーブルのJSONファイル（省略時は組み込みの値）
    #[arg(long)]
    signatures: Option<PathBuf>,
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    println!("Run on: {}", Local::now().to_rfc3339());

    if let Err(e) = std::fs::create_dir_all(&args.output_dir) {
        eprintln!("出力ディレクトリを作成できません: {}", e);
        std::process::exit(1);
    }

    let store = LastRunStore::in_dir(&args.output_dir);
    let now = Local::now().naive_local();
    let from = match store.throttle(now) {
        Ok(RunDecision::Proceed { from }) => from,
        Ok(RunDecision::Skip {
            last_run,
            elapsed_days,
        }) => {
            println!(
                "Stopping: less than 30 days since last run ({}, {} days ago).",
                last_run, elapsed_days
            );
            return;
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    let range = match ExportRange::new(from, now.date()) {
        Ok(range) => range,
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = BoursoConfig::new(&args.client_number, &args.password)
        .with_range(range)
        .with_output_dir(&args.output_dir);
    if !args.account.trim().is_empty() {
        config = config.with_account_id(args.account.trim());
    }
    if let Some(path) = &args.signatures {
        match SignatureTable::from_json_file(path) {
            Ok(table) => config = config.with_signatures(table),
            Err(e) => {
                eprintln!("エラー: {}", e);
                std::process::exit(1);
            }
        }
    }

    if is_truthy(&args.dry_run) {
        if let Err(e) = config.validate() {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
        let account = format!("dry_run_{}", args.account.trim());
        println!(
            "Dry run: would save {:?}",
            args.output_dir.join(export_file_name(&account, &range))
        );
        return;
    }

    println!("=== BoursoBank Export ===");

    let mut service = ExportService::new();
    match service.call(ExportRequest::from(config)).await {
        Ok(result) => {
            println!("成功! {}件 CSV保存先: {:?}", result.table.len(), result.csv_path);
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            std::process::exit(1);
        }
    }
}
