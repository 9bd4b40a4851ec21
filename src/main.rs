use clap::Parser;
use troca_market::utils::{logger, validation::Validate};
use troca_market::{App, AppConfig, CliConfig, MarketError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 載入配置（檔案不存在時改用環境變數）
    let config = AppConfig::load(&cli.config);

    let json_logs = cli.log_json || config.as_ref().map(|c| c.json_logs()).unwrap_or(false);
    let log_level = config.as_ref().ok().and_then(|c| c.log_level());
    if json_logs {
        logger::init_json_logger(cli.verbose, log_level);
    } else {
        logger::init_cli_logger(cli.verbose, log_level);
    }

    tracing::info!("Starting troca CLI");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli.command);
    }

    let result = match config {
        Ok(config) => run(config, cli).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        report(&e);
        // 根據錯誤嚴重程度決定退出碼
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(config: AppConfig, cli: CliConfig) -> troca_market::Result<()> {
    // 驗證配置
    config.validate()?;

    let app = App::start(config).await?;
    let mut stdout = std::io::stdout().lock();
    app.run(cli.command, &mut stdout).await
}

fn report(e: &MarketError) {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}
