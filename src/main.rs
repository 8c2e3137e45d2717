use clap::error::ErrorKind;
use clap::Parser;
use guild_ratings::config::LogFormat;
use guild_ratings::utils::{logger, validation::Validate};
use guild_ratings::{
    CliConfig, GuildError, GuildRanker, HttpDataSource, LocalStorage, RankingEngine,
    StdoutStorage,
};

#[tokio::main]
async fn main() {
    let config = match CliConfig::try_parse() {
        Ok(config) => config,
        Err(e) => {
            let exit_code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                ErrorKind::MissingRequiredArgument => 1,
                _ => 2,
            };
            let _ = e.print();
            std::process::exit(exit_code);
        }
    };

    logger::init_logger(
        config.log_level.as_str(),
        config.log_format == LogFormat::Json,
    );

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ Run failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

async fn run(config: &CliConfig) -> Result<(), GuildError> {
    config.validate()?;
    let settings = config.load_settings()?;
    settings.validate()?;

    let source = HttpDataSource::from_settings(&settings)?;
    let ranker = GuildRanker::new(source, settings.ranker_options(config.number))
        .with_monitoring(config.monitor);

    if config.monitor {
        tracing::info!("🔍 Resource monitoring enabled");
    }

    let location = match &config.output {
        Some(output) => {
            let engine = RankingEngine::new(ranker, LocalStorage::new(".".to_string()));
            engine
                .run_until(config.guild_id, output, interrupted())
                .await?
        }
        None => {
            let engine = RankingEngine::new(ranker, StdoutStorage);
            engine
                .run_until(config.guild_id, "", interrupted())
                .await?
        }
    };

    tracing::info!("✅ Report written to {}", location);
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
