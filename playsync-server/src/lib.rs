use std::{
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

mod auth;
mod comments;
mod config;
mod context;
mod dashboard;
mod docs;
mod envelope;
mod errors;
mod healthcheck;
mod likes;
mod logging;
mod playlists;
mod schemas;
mod serialized;
mod subscriptions;
mod tweets;
mod uploads;
mod users;
mod videos;

pub use config::{ConfigError, ServerConfig};
pub use context::ServerContext;
pub use logging::init_logger;

use playsync_store::PlaySync;
use uploads::MAX_UPLOAD_BYTES;

pub type Router = axum::Router<ServerContext>;

/// Starts the PlaySync server
pub async fn run_server(playsync: PlaySync, config: ServerConfig) {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, config.port).into();

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .expect("CORS origin is a valid header value"),
        )
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let context = ServerContext {
        playsync: Arc::new(playsync),
        config: Arc::new(config),
    };

    let version_one_router = Router::new()
        .nest("/users", users::router())
        .nest("/videos", videos::router())
        .nest("/comments", comments::router())
        .nest("/likes", likes::router())
        .nest("/subscriptions", subscriptions::router())
        .nest("/playlist", playlists::router())
        .nest("/tweets", tweets::router())
        .nest("/dashboard", dashboard::router())
        .nest("/healthcheck", healthcheck::router());

    let root_router = Router::new()
        .nest("/api/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    log::info!("Listening on port {}", addr.port());

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}
