use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use urlshort::api::{self, AppState};
use urlshort::config::AppConfig;
use urlshort::services::{DELETE_FLUSH_PERIOD, DeleteService};
use urlshort::storage::StorageFactory;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = match AppConfig::from_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let storage = StorageFactory::create(&config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let delete_service = Arc::new(DeleteService::new(Arc::clone(&storage), DELETE_FLUSH_PERIOD));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let delete_worker = {
        let delete_service = Arc::clone(&delete_service);
        tokio::spawn(async move { delete_service.run(shutdown_rx).await })
    };

    let bind_address = config.server_address.clone();
    let state = web::Data::new(AppState::new(
        config,
        Arc::clone(&storage),
        Arc::clone(&delete_service),
    ));

    info!("starting server at http://{}", bind_address);

    HttpServer::new({
        let state = state.clone();
        move || {
            App::new()
                .app_data(state.clone())
                .wrap(middleware::Compress::default())
                .wrap(middleware::Logger::default())
                .configure(api::configure)
        }
    })
    .bind(bind_address)?
    .run()
    .await?;

    // Stop the deletion pipeline; buffered requests are abandoned by design.
    let _ = shutdown_tx.send(true);
    let _ = delete_worker.await;

    storage.shutdown().await;
    info!("shutdown complete");

    Ok(())
}
