use std::net::TcpListener;
use std::sync::Arc;

use migrate_proxy::access_control::AllowAll;
use migrate_proxy::context::AppContext;

/// Spawns the proxy on a random local port and returns its base url
/// (teacher convention: `control/tests/it/support/context.rs::spawn_app`).
pub async fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("a free local port");
    let addr = listener.local_addr().expect("listener has a local addr");

    let ctx = AppContext::new(Arc::new(AllowAll));
    let app = migrate_proxy::router(ctx);

    listener.set_nonblocking(true).expect("nonblocking listener");
    let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server to run cleanly");
    });

    format!("http://{addr}")
}
