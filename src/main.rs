use std::sync::Arc;

use anyhow::Context;

use math_practice::app::App;
use math_practice::cli::Repl;
use math_practice::config::ClientConfig;
use math_practice::session::FileStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("invalid MATH_PRACTICE_* configuration")?;

    // Logs go to a rolling file so they don't interleave with the chat.
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "math-practice.log");
    let (writer, _log_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer)
        .init();

    tracing::info!(api_url = %config.api_url, "Starting math-practice");

    let storage = Arc::new(FileStorage::new(&config.session_path));
    let app = App::build(config, storage)
        .await
        .context("failed to initialize client")?;

    Repl::new(app).run().await?;

    tracing::info!("Exiting");
    Ok(())
}
