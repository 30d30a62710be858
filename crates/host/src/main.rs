#[macro_use]
extern crate tracing;

use arc_crusade::config::{self, ADMIN_TOKEN_ENV, USAGE};
use runtime::utils::format_error_disp;
use runtime::{RunHandle, Task};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_token = std::env::var(ADMIN_TOKEN_ENV).ok();
    let Some(config) = config::from_args(std::env::args(), env_token)? else {
        print!("{USAGE}");
        return Ok(());
    };

    runtime::log::setup_logger("arc_crusade")?;
    info!("embedding {}", config.target_url);

    let app = arc_crusade::build_app(&config)?;
    let bind = config.bind;
    let shutdown_timeout = config.shutdown_timeout();

    let tasks = vec![
        Task::new("webserver", move |cancel| async move {
            if let Err(e) = runtime_axum::server::run_server(cancel, bind, app, shutdown_timeout).await {
                error!("web server failed: {}", format_error_disp(&e));
            }
        }),
    ];

    runtime::run(RunHandle::new(), tasks, None).await?;
    Ok(())
}
