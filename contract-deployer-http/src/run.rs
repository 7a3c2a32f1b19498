use crate::{
    metrics::Metrics,
    routers::{configure_router, AppRouter},
    settings::Settings,
};
use actix_web::{App, HttpServer};
use futures::future;
use std::{io, sync::Arc};
use tracing_actix_web::TracingLogger;

pub async fn run(settings: Settings) -> io::Result<()> {
    let socket_addr = settings.server.addr;
    let metrics_enabled = settings.metrics.enabled;
    let metrics_addr = settings.metrics.addr;
    let metrics_endpoint = settings.metrics.route.clone();

    tracing::info!("contract deployer is starting at {}", socket_addr);
    let app_router = Arc::new(
        AppRouter::new(settings)
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?,
    );
    let metrics = Metrics::new(metrics_endpoint);
    let server_future = {
        let middleware = metrics.middleware().clone();
        HttpServer::new(move || {
            App::new()
                .wrap(TracingLogger::default())
                .wrap(middleware.clone())
                .configure(configure_router(&*app_router))
        })
        .bind(socket_addr)?
        .run()
    };

    if !metrics_enabled {
        return server_future.await;
    }

    let server_future = tokio::spawn(async move { server_future.await });
    let metrics_future = tokio::spawn(async move { metrics.run_server(metrics_addr).await });

    let (server_future, metrics_future) = future::try_join(server_future, metrics_future).await?;

    server_future?;
    metrics_future?;
    Ok(())
}
