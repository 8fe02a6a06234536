use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use saldo_api::config::Config;
use saldo_store::PostgresLedger;

#[tokio::main]
async fn main() {
    saldo_api::telemetry::init();

    // The only fatal error class: bail out before binding the listener.
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "configuration error");
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .min_connections(config.pool_size)
        .max_connections(config.pool_size)
        .connect(&config.database_url)
        .await
    {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to the store");
            std::process::exit(1);
        }
    };

    let ledger = PostgresLedger::new(pool);
    if let Err(e) = ledger.migrate().await {
        tracing::error!(error = %e, "failed to apply schema migration");
        std::process::exit(1);
    }

    let app = saldo_api::app::build_app(Arc::new(ledger.clone()));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind listener");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // Drain pooled connections before exiting.
    ledger.close().await;
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
