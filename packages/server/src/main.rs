use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::filesystem::FilesystemBlobStore;
use mq::{MqConfig, QueuePublisher};
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::avatar::{AvatarManager, SeaOrmAvatarIndex, spawn_sweep_task};
use server::config::AppConfig;
use server::events::{DisabledEventPublisher, EventPublisher, QueueEventPublisher};
use server::notify::{LogNotifier, MailerSendNotifier, Notifier};
use server::registration::RegistrationService;
use server::repository::SeaOrmUserRepository;
use server::state::AppState;
use server::{build_router, database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    database::ensure_indexes(&db)
        .await
        .context("Failed to create unique indexes")?;
    info!("Database ready");

    let blobs = FilesystemBlobStore::new(
        config.storage.avatars_path.clone(),
        config.storage.max_avatar_size,
    )
    .await
    .with_context(|| {
        format!(
            "Failed to open avatar storage at {}",
            config.storage.avatars_path.display()
        )
    })?;
    let avatars = Arc::new(AvatarManager::new(
        Arc::new(SeaOrmAvatarIndex::new(db.clone())),
        Arc::new(blobs),
    ));

    let notifier: Arc<dyn Notifier> = match config.mail.api_key.clone() {
        Some(key) => Arc::new(
            MailerSendNotifier::new(&config.mail, key).context("Failed to build mail client")?,
        ),
        None => {
            info!("No mail API key configured, welcome emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let events: Arc<dyn EventPublisher> = if config.mq.enabled {
        let publisher = QueuePublisher::connect(
            &MqConfig {
                url: config.mq.url.clone(),
                pool_size: config.mq.pool_size,
            },
            config.mq.queue_name.clone(),
        )
        .await
        .context("Failed to initialize MQ")?;
        info!(queue = %config.mq.queue_name, "MQ connected");
        Arc::new(QueueEventPublisher::new(publisher))
    } else {
        info!("MQ disabled, registration events will not be published");
        Arc::new(DisabledEventPublisher)
    };

    let users = Arc::new(RegistrationService::new(
        Arc::new(SeaOrmUserRepository::new(db.clone())),
        avatars.clone(),
        notifier,
        events,
    ));

    let sweep = (config.storage.sweep_interval_secs > 0).then(|| {
        spawn_sweep_task(
            avatars.clone(),
            Duration::from_secs(config.storage.sweep_interval_secs),
            Duration::from_secs(config.storage.sweep_grace_secs),
        )
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        config,
        users: users.clone(),
        avatars,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweep {
        handle.abort();
    }
    info!("Waiting for in-flight side effects");
    users.drain_side_effects().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
