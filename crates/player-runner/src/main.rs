//! Islands Player Runner - composition root binary

use std::path::Path;
use std::sync::Arc;

use islands_player::PlayerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "islands_player=debug,islands_player_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Islands Player");

    let config = PlayerConfig::from_env();
    let factory = Arc::new(config.socket_factory());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    islands_player_runner::run(islands_player_runner::RunnerDeps { config, factory }, shutdown)
        .await
}

fn load_dotenv() {
    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        if Path::new(filename).exists() {
            let _ = dotenvy::from_filename(filename);
        }
    }
}
