// Storefront JSON server
//
// This binary starts the web server with:
// - Actix-web for HTTP serving
// - The storefront search/location/AI endpoints
// - A pooled HTTP client for the gift search backend

#[cfg(feature = "server")]
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use actix_web::{web, App, HttpServer};
    use anyhow::Context;
    use tracing_subscriber::EnvFilter;
    use uchigift::storefront::api::handlers::{self, AppState};
    use uchigift::storefront::{AppConfig, BackendClient, GiftBackend};

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let client = BackendClient::new(&config.api_base, config.request_timeout)
        .context("failed to build backend client")?;
    tracing::info!(
        api_base = %client.api_base(),
        timeout_ms = config.request_timeout.as_millis() as u64,
        page_size = config.page_size,
        debounce_ms = config.debounce.as_millis() as u64,
        "Search backend configured"
    );

    let backend: Arc<dyn GiftBackend> = Arc::new(client);
    let state = web::Data::new(AppState::new(backend, config.page_size));

    tracing::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || App::new().app_data(state.clone()).configure(handlers::configure))
        .bind(config.bind_addr)
        .with_context(|| format!("failed to bind {}", config.bind_addr))?
        .run()
        .await?;

    Ok(())
}

#[cfg(not(feature = "server"))]
fn main() {
    eprintln!("This binary requires the 'server' feature. Run with: cargo run --features server");
}
