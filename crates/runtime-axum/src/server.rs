use axum::Router;

use runtime::instrument;

use std::net::SocketAddr;
use std::time::Duration;

/// Serve `app` on `bind` until `cancel` fires, then drain connections for up to
/// `shutdown_timeout` before dropping them.
pub async fn run_server(
    cancel: tokio_util::sync::CancellationToken,
    bind: SocketAddr,
    app: Router,
    shutdown_timeout: Duration,
) -> Result<(), std::io::Error> {
    let handle = axum_server::Handle::new();

    let shutdown_handle = handle.clone();
    tokio::task::spawn(instrument!("shutdown task"; async move {
        cancel.cancelled().await;

        info!("Attempting graceful webserver shutdown with {}s timeout", shutdown_timeout.as_secs_f32());
        shutdown_handle.graceful_shutdown(Some(shutdown_timeout));
    }));

    info!("web server listening on {}", bind);

    axum_server::bind(bind)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    info!("web server exiting");
    Ok(())
}
