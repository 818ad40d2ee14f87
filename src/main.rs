use clap::Parser;
use order_fetch::core::dates;
use order_fetch::utils::{logger, validation::Validate};
use order_fetch::{ApiConfig, CliConfig, EtlEngine, EtlError, FetchPipeline, LocalStorage};

fn fail(e: EtlError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        order_fetch::utils::error::ErrorSeverity::Low => 1,
        order_fetch::utils::error::ErrorSeverity::Medium => 2,
        order_fetch::utils::error::ErrorSeverity::High => 1,
        order_fetch::utils::error::ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting order-fetch CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證 CLI 參數
    if let Err(e) = cli.validate() {
        fail(e);
    }

    // 載入 API 設定並套用 CLI 解析出的日期區間
    let mut config = match ApiConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => fail(e),
    };
    if let Err(e) = config.validate() {
        fail(e);
    }

    let range = match dates::resolve(&cli.dates, config.precise_timestamp) {
        Ok(range) => range,
        Err(e) => fail(e),
    };
    tracing::info!("Fetching {} from {} to {}", config.name, range.0, range.1);
    config.apply_date_range(range.0, range.1);

    let monitor_enabled = cli.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let name = config.name.clone();
    let storage = LocalStorage::new(cli.output_path.clone());
    let pipeline = FetchPipeline::new(storage, config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(Some(output_path)) => {
            tracing::info!("✅ Fetch run completed successfully!");
            println!("✅ Fetch run completed successfully!");
            println!("📁 Output saved under {}/{}", cli.output_path, output_path);
        }
        Ok(None) => {
            println!("No data for {}.", name);
        }
        Err(e) => fail(e),
    }

    println!("\nData processing complete.");
}
