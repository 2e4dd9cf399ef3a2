use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use museos_cli::config::ServerConfig;
use std::io;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;

const NO_CACHE: &str = "no-store, no-cache, must-revalidate, max-age=0";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("el puerto {addr} ya está en uso. Cierra la otra instancia o usa otro puerto")]
    PortInUse { addr: String },

    #[error("no se pudo iniciar el servidor en {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("error del servidor: {0}")]
    Io(#[from] io::Error),
}

/// Static files under `config.root`, with `/` answering the landing page.
/// Every response carries the CORS and no-cache headers.
pub fn build_router(config: &ServerConfig) -> Router {
    let landing = config.root.join(&config.landing);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route_service("/", ServeFile::new(landing))
        .fallback_service(ServeDir::new(&config.root))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(NO_CACHE),
        ))
        .layer(TraceLayer::new_for_http())
}

pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.addr();
    TcpListener::bind(&addr).await.map_err(|source| {
        if source.kind() == io::ErrorKind::AddrInUse {
            ServerError::PortInUse { addr: addr.clone() }
        } else {
            ServerError::Bind {
                addr: addr.clone(),
                source,
            }
        }
    })
}

/// Serves until Ctrl-C.
pub async fn serve(listener: TcpListener, config: &ServerConfig) -> Result<(), ServerError> {
    let app = build_router(config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler available, run until the process is killed
        std::future::pending::<()>().await;
    }
}
