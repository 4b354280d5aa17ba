use std::net::TcpListener;
use std::sync::Arc;

use crate::access_control::AllowAll;
use crate::cmd::{async_runtime, ConfigArgs};
use crate::config;
use crate::context::AppContext;
use crate::logging::{self, LogArgs};
use crate::{router, shutdown};

#[derive(clap::Args, Debug)]
pub struct Args {
    #[clap(flatten)]
    config: ConfigArgs,
    #[clap(flatten)]
    log: LogArgs,
}

/// Runs the migration proxy server.
pub fn run(args: Args) -> anyhow::Result<()> {
    logging::init_logging(&args.log);
    config::load_settings(args.config.config_path)?;
    let runtime = async_runtime()?;
    let listener = TcpListener::bind(config::settings().application.address())?;

    runtime.block_on(async move { serve(listener).await })
}

async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    let ctx = AppContext::new(Arc::new(AllowAll));
    let app = router(ctx);

    listener.set_nonblocking(true)?;
    let listener = tokio::net::TcpListener::from_std(listener)?;

    tracing::info!(addr = %config::settings().application.address(), "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await?;

    Ok(())
}
