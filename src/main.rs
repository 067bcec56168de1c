use {
    sqlx::postgres::PgPoolOptions,
    std::{sync::Arc, time::Duration},
    storefront_sync::{
        AppState,
        adapters::razorpay_client::{RazorpayGateway, UnconfiguredGateway},
        config::Config,
        domain::gateway::PaymentGateway,
        services::ReconciliationEngine,
    },
    tokio::signal,
    tracing_subscriber::EnvFilter,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env().expect("invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    let gateway: Arc<dyn PaymentGateway> = match RazorpayGateway::from_config(&config.razorpay)
        .expect("failed to build payment gateway client")
    {
        Some(gateway) => Arc::new(gateway),
        None => {
            tracing::warn!("razorpay credentials missing, payment endpoints will fail closed");
            Arc::new(UnconfiguredGateway)
        }
    };
    if config.razorpay.webhook_secret.is_none() {
        tracing::warn!("RAZORPAY_WEBHOOK_SECRET missing, webhooks will be rejected");
    }

    let engine = ReconciliationEngine::new(pool, gateway, config.razorpay.clone(), config.pricing);
    let state = AppState::new(engine, config.jwt_secret.reveal());
    let app = storefront_sync::adapters::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
