use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// トレーシングサブスクライバーを初期化
/// 本番環境では JSON、開発環境では人が読みやすい形式で出力する
pub fn init_tracing(environment: Environment) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if environment.is_production() {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_target(false).json())
            .with(filter)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(filter)
            .try_init()?;
    }

    Ok(())
}

/// 端末 UI 用: `RUST_LOG` が設定されている場合のみ stderr へ出力する
pub fn init_client_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Ok(filter) = EnvFilter::try_from_default_env() else {
        return Ok(());
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()?;

    Ok(())
}
