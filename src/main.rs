//! Tuition billing webhook service.

use std::sync::Arc;

use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tuition_billing::adapters::http::{billing_router, BillingAppState};
use tuition_billing::adapters::postgres::{
    PostgresBillingStore, PostgresEnrollmentReader, PostgresReviewQueue,
    PostgresWebhookEventRepository,
};
use tuition_billing::application::BillingPorts;
use tuition_billing::config::AppConfig;
use tuition_billing::domain::payments::IdempotentWebhookProcessor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let ports = BillingPorts {
        enrollment: Arc::new(PostgresEnrollmentReader::new(pool.clone())),
        billing: Arc::new(PostgresBillingStore::new(pool.clone())),
        review_queue: Arc::new(PostgresReviewQueue::new(pool.clone())),
        rates: config.billing.rate_table(),
        default_program: config.billing.program_code()?,
    };
    let processor = IdempotentWebhookProcessor::new(
        Arc::new(PostgresWebhookEventRepository::new(pool.clone())),
        Arc::new(ports.handler_registry()),
    );
    let state = BillingAppState::new(config.payment.webhook_verifier(), processor);

    let app = billing_router()
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        default_program = %ports.default_program,
        "tuition billing listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("shutdown signal received");
}
