use axum::Router;
use tokio::net::TcpListener;

/// Serves a router on a loopback port and returns its base URL.
///
/// The router factory receives the base URL so handlers can emit absolute links.
pub(crate) async fn serve<F>(router: F) -> String
where
    F: FnOnce(String) -> Router,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|_| unreachable!());
    let address = listener.local_addr().unwrap_or_else(|_| unreachable!());
    let base_url = format!("http://{address}");

    let app = router(base_url.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    base_url
}
