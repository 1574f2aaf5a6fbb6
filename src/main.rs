//! Admin backend for the onboarding chatbot
//!

use anyhow::{Context, anyhow};
use axum::http::Method;
use chatbot_admin_api::api;
use chatbot_admin_api::infrastructure::database::DatabaseConnection;
use chatbot_admin_api::infrastructure::settings::Settings;
use chatbot_admin_api::service_collection;
use di_axum::RouterServiceProviderExtensions;
use log::info;
use tokio::runtime::{Builder, Runtime};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server())
}

async fn web_server() -> anyhow::Result<()> {
    let provider = service_collection()
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    let settings = provider.get_required::<Settings>();
    settings
        .database_options()
        .with_context(|| format!("invalid DATABASE_URL `{}`", settings.database_url))?;

    let database = provider.get_required::<DatabaseConnection>();
    sqlx::migrate!().run(&**database).await?;
    info!("database migrations applied");

    let app = api::router()
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT])
                .allow_origin(Any),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for shutdown signal: {e}");
    }
}
