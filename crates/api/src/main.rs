use std::sync::Arc;

#[tokio::main]
async fn main() {
    tillwerk_observability::init();

    let addr = std::env::var("TILLWERK_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let dev_token = std::env::var("TILLWERK_DEV_TOKEN").unwrap_or_else(|_| {
        tracing::warn!("TILLWERK_DEV_TOKEN not set; using insecure dev default");
        "dev-token".to_string()
    });

    let services =
        tillwerk_api::app::dev_services(&dev_token).expect("invalid builtin plugin schema");
    let dispatcher =
        tillwerk_api::app::build_dispatcher(&services).expect("route table misconfigured");
    let app = tillwerk_api::app::build_app(Arc::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
