use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use islands_player::ports::outbound::SocketFactory;
use islands_player::{GameSession, PlayerConfig};

/// How long to wait for the leave reply on shutdown.
const LEAVE_GRACE: Duration = Duration::from_secs(2);

pub struct RunnerDeps {
    pub config: PlayerConfig,
    pub factory: Arc<dyn SocketFactory>,
}

/// Join the configured game, send the configured messages, then stay in the
/// channel until `shutdown` resolves.
pub async fn run(deps: RunnerDeps, shutdown: impl Future<Output = ()>) -> anyhow::Result<()> {
    let RunnerDeps { config, factory } = deps;

    tracing::info!(
        url = %config.socket_url,
        player = %config.player_name,
        topic_suffix = %config.topic_suffix,
        "Starting session"
    );

    let mut session = GameSession::new(factory);
    if let Err(e) = session.start(&config.player_name, &config.topic_suffix)?.await {
        anyhow::bail!("could not join game:{}: {}", config.topic_suffix, e);
    }

    // Failures below are already logged by the session.
    if let Some(greeting) = &config.greeting {
        let _ = session.say_hello(greeting.as_str())?.await;
    }
    if config.new_game {
        let _ = session.new_game()?.await;
    }

    shutdown.await;
    tracing::info!("Shutting down");

    let leave = session.leave()?;
    if tokio::time::timeout(LEAVE_GRACE, leave).await.is_err() {
        tracing::warn!("No leave reply before shutdown");
    }
    if let Some(socket) = session.connection() {
        socket.disconnect();
    }
    Ok(())
}
